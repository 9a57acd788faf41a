//! Caller identity.
//!
//! Authentication happens upstream. The authenticator forwards the caller
//! in three headers:
//! - `x-user-id` (required)
//! - `x-user-email`
//! - `x-user-role` (`admin` and `super_admin` are staff)

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        matches!(self.role.as_deref(), Some("admin") | Some("super_admin"))
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Staff role required"))
        }
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(&parts.headers, USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Missing caller identity"))?;

        Ok(Identity {
            user_id,
            email: header(&parts.headers, USER_EMAIL_HEADER),
            role: header(&parts.headers, USER_ROLE_HEADER).map(|r| r.to_ascii_lowercase()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Option<&str>) -> Identity {
        Identity {
            user_id: "u1".into(),
            email: None,
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn test_staff_roles() {
        assert!(identity(Some("admin")).is_admin());
        assert!(identity(Some("super_admin")).is_admin());
        assert!(!identity(Some("member")).is_admin());
        assert!(!identity(None).is_admin());
        assert!(identity(None).require_admin().is_err());
    }

    #[test]
    fn test_blank_header_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_EMAIL_HEADER, "   ".parse().unwrap());
        headers.insert(USER_ID_HEADER, " u7 ".parse().unwrap());
        assert_eq!(header(&headers, USER_EMAIL_HEADER), None);
        assert_eq!(header(&headers, USER_ID_HEADER).as_deref(), Some("u7"));
    }
}

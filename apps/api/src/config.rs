//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use shepherd_commerce::{GatewayConfig, ReconciliationConfig};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Public base URL of the application
    pub app_url: String,

    /// Paystack secret key (optional in development)
    pub paystack_secret_key: Option<String>,

    /// Paystack API root
    pub paystack_base_url: String,

    /// Checkout redirect target
    pub paystack_callback_url: String,

    /// Bound on a single provider call
    pub gateway_timeout: Duration,

    /// Reject webhooks without `x-paystack-signature`
    pub require_webhook_signature: bool,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let config = ApiConfig {
            port: env::var("SHEPHERD_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SHEPHERD_PORT".to_string()))?,

            database_path: env::var("SHEPHERD_DATABASE_PATH")
                .unwrap_or_else(|_| "./shepherd.db".to_string())
                .into(),

            paystack_secret_key: env::var("PAYSTACK_SECRET_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),

            paystack_base_url: env::var("PAYSTACK_BASE_URL")
                .unwrap_or_else(|_| shepherd_commerce::gateway::DEFAULT_BASE_URL.to_string()),

            paystack_callback_url: env::var("PAYSTACK_CALLBACK_URL")
                .unwrap_or_else(|_| format!("{}/api/v1/payments/verify", app_url.trim_end_matches('/'))),

            gateway_timeout: Duration::from_secs(
                env::var("GATEWAY_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("GATEWAY_TIMEOUT_SECS".to_string()))?,
            ),

            require_webhook_signature: env::var("REQUIRE_WEBHOOK_SIGNATURE")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("REQUIRE_WEBHOOK_SIGNATURE".to_string()))?,

            app_url,
        };

        if config.gateway_timeout.is_zero() {
            return Err(ConfigError::InvalidValue("GATEWAY_TIMEOUT_SECS".to_string()));
        }

        Ok(config)
    }

    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig::new(
            self.paystack_secret_key.clone(),
            self.paystack_callback_url.clone(),
        )
        .with_base_url(self.paystack_base_url.clone())
        .with_timeout(self.gateway_timeout)
    }

    pub fn reconciliation(&self) -> ReconciliationConfig {
        ReconciliationConfig {
            require_webhook_signature: self.require_webhook_signature,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

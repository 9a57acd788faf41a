//! # Business References
//!
//! Human-readable identifiers for orders and payments.
//!
//! ```text
//! Order number:       ORD-<millis base36>-<4 random base36>   ORD-LZ3K9Q1A-7F2C
//! Payment reference:  PAY_<millis>_<9 random base36>          PAY_1718000000000_k3j9x0a1b
//! ```
//!
//! Uniqueness is enforced by UNIQUE indexes; collisions are retried by
//! the caller.

use chrono::Utc;
use rand::Rng;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Encodes a non-negative integer in lowercase base36.
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

fn random_base36<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Builds an order number from a timestamp and a random source.
pub fn order_number_with<R: Rng + ?Sized>(millis: u64, rng: &mut R) -> String {
    format!(
        "ORD-{}-{}",
        to_base36(millis).to_uppercase(),
        random_base36(rng, 4).to_uppercase()
    )
}

/// Builds a payment reference from a timestamp and a random source.
pub fn payment_ref_with<R: Rng + ?Sized>(millis: u64, rng: &mut R) -> String {
    format!("PAY_{}_{}", millis, random_base36(rng, 9))
}

/// Fresh order number for the current instant.
pub fn generate_order_number() -> String {
    order_number_with(now_millis(), &mut rand::thread_rng())
}

/// Fresh payment reference for the current instant.
pub fn generate_payment_ref() -> String {
    payment_ref_with(now_millis(), &mut rand::thread_rng())
}

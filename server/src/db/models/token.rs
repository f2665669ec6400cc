//! One-time token model
//!
//! Backs the password-reset, email-verification and phone-OTP flows.
//! Raw secrets are never stored; only their hex-encoded SHA-256 digest.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenPurpose {
    PasswordReset,
    EmailVerify,
    PhoneOtp,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::PasswordReset => "PASSWORD_RESET",
            TokenPurpose::EmailVerify => "EMAIL_VERIFY",
            TokenPurpose::PhoneOtp => "PHONE_OTP",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneTimeToken {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub purpose: TokenPurpose,
    /// Hex-encoded SHA-256 of the raw secret
    pub token_hash: String,
    pub expires_at: String,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub used: bool,
    /// Failed verification attempts (OTP flows cap these)
    #[serde(default)]
    pub attempts: i64,
    pub created_at: String,
}

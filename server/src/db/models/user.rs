//! User and role models

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

// =============================================================================
// Roles
// =============================================================================

/// Marketplace roles. Buyers are any authenticated user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Seller,
    Rider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Seller => "SELLER",
            Role::Rider => "RIDER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Role::Admin),
            "SELLER" => Some(Role::Seller),
            "RIDER" => Some(Role::Rider),
            _ => None,
        }
    }
}

/// Approval status for SELLER/RIDER applications.
/// ADMIN roles are always stored as APPROVED.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ApprovalStatus::Pending),
            "APPROVED" => Some(ApprovalStatus::Approved),
            "REJECTED" => Some(ApprovalStatus::Rejected),
            _ => None,
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    /// Unique account email
    pub email: String,
    /// Unique phone, null until profile completion
    pub phone: Option<String>,
    /// Argon2 hash; the repository binds it on writes, responses never carry it
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email_verified_at: Option<String>,
    pub phone_verified_at: Option<String>,
    pub created_at: String,
}

impl User {
    /// Verify a password against the stored Argon2 hash
    pub fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.password_hash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password with Argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }
}

/// Per-user role row
///
/// Capability requires `is_active && status == APPROVED`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub status: ApprovalStatus,
    /// Identity verification flag, checked before seller approval
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub kyc_verified: bool,
    pub created_at: String,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// API payloads
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteProfilePayload {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Public projection of a user (no credentials)
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub roles: Vec<RoleSummary>,
}

#[derive(Debug, Serialize)]
pub struct RoleSummary {
    pub role: Role,
    pub status: ApprovalStatus,
    pub is_active: bool,
}

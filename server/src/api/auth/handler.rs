//! Auth API handlers
//!
//! Login and forgot-password deliberately return the same response for
//! known and unknown accounts, so the API cannot be used to probe which
//! emails are registered.

use axum::{Json, extract::State};
use chrono::{Duration, Utc};
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{CurrentUser, RoleGrant};
use crate::core::ServerState;
use crate::db::models::{
    CompleteProfilePayload, LoginPayload, RegisterPayload, Role, RoleSummary, TokenPurpose, User,
    UserProfile,
};
use crate::db::repository::{
    ShopRepository, TokenRepository, UserRepository, UserRoleRepository,
};
use crate::security_log;
use crate::services::mailer;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_PASSWORD_LEN, MAX_SHORT_TEXT_LEN,
    validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

const RESET_TOKEN_TTL_MIN: i64 = 30;
const EMAIL_TOKEN_TTL_MIN: i64 = 24 * 60;
const OTP_TTL_MIN: i64 = 10;
const MAX_TOKEN_ATTEMPTS: i64 = 5;

// =============================================================================
// Helpers
// =============================================================================

/// Hex SHA-256 of a raw secret; only digests are stored
fn hash_token(raw: &str) -> String {
    hex::encode(digest::digest(&digest::SHA256, raw.as_bytes()))
}

fn expiry(minutes: i64) -> String {
    (Utc::now() + Duration::minutes(minutes)).to_rfc3339()
}

/// Six-digit OTP code
fn generate_otp() -> AppResult<String> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 4];
    rng.fill(&mut bytes)
        .map_err(|_| AppError::internal("Random generator failure"))?;
    let n = u32::from_be_bytes(bytes) % 1_000_000;
    Ok(format!("{n:06}"))
}

async fn build_profile(state: &ServerState, user: &User) -> AppResult<UserProfile> {
    let id = user
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("User record has no id"))?
        .to_string();
    let roles = UserRoleRepository::new(state.db.clone())
        .find_for_user(&id)
        .await?
        .into_iter()
        .map(|r| RoleSummary {
            role: r.role,
            status: r.status,
            is_active: r.is_active,
        })
        .collect();

    Ok(UserProfile {
        id,
        name: user.name.clone(),
        email: user.email.clone(),
        phone: user.phone.clone(),
        email_verified: user.email_verified_at.is_some(),
        phone_verified: user.phone_verified_at.is_some(),
        roles,
    })
}

async fn issue_token(state: &ServerState, user: &User) -> AppResult<String> {
    let id = user
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("User record has no id"))?
        .to_string();
    let grants: Vec<RoleGrant> = UserRoleRepository::new(state.db.clone())
        .find_for_user(&id)
        .await?
        .into_iter()
        .filter(|r| r.is_active)
        .map(|r| RoleGrant {
            role: r.role,
            status: r.status,
        })
        .collect();

    state
        .jwt_service
        .generate_token(&id, &user.name, &user.email, &grants)
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))
}

// =============================================================================
// Registration / login
// =============================================================================

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterPayload>,
) -> AppResult<Json<AppResponse<AuthResponse>>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.email, "email", MAX_EMAIL_LEN)?;
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation("Password is too long"));
    }

    let password_hash = User::hash_password(&payload.password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

    let users = UserRepository::new(state.db.clone());
    if let Some(phone) = &payload.phone
        && users.find_by_phone(phone).await?.is_some()
    {
        return Err(AppError::conflict("Phone number is already registered"));
    }
    let user = users
        .create(payload.name, payload.email, payload.phone, password_hash)
        .await
        .map_err(|e| match e {
            crate::db::repository::RepoError::Duplicate(_) => {
                AppError::conflict("Email is already registered")
            }
            other => other.into(),
        })?;

    // Kick off email verification right away
    if let Some(id) = &user.id {
        let raw = Uuid::new_v4().to_string();
        TokenRepository::new(state.db.clone())
            .issue(
                &id.to_string(),
                TokenPurpose::EmailVerify,
                hash_token(&raw),
                expiry(EMAIL_TOKEN_TTL_MIN),
            )
            .await?;
        mailer::send_email(&user.email, "Verify your email", &raw);
    }

    security_log!("INFO", "user_registered", email = user.email.clone());

    let token = issue_token(&state, &user).await?;
    let profile = build_profile(&state, &user).await?;
    Ok(ok(AuthResponse {
        token,
        user: profile,
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginPayload>,
) -> AppResult<Json<AppResponse<AuthResponse>>> {
    let users = UserRepository::new(state.db.clone());

    // Same rejection for unknown email and wrong password
    let user = users
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    let valid = user
        .verify_password(&payload.password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;
    if !valid {
        security_log!("WARN", "login_failed", email = payload.email.clone());
        return Err(AppError::invalid_credentials());
    }

    security_log!("INFO", "login_ok", email = user.email.clone());

    let token = issue_token(&state, &user).await?;
    let profile = build_profile(&state, &user).await?;
    Ok(ok(AuthResponse {
        token,
        user: profile,
    }))
}

// =============================================================================
// Profile
// =============================================================================

/// GET /api/auth/profile
pub async fn profile(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<UserProfile>> {
    let user = UserRepository::new(state.db.clone())
        .find_by_id(&current.id)
        .await?
        .ok_or_else(|| AppError::not_found("Account no longer exists"))?;
    Ok(Json(build_profile(&state, &user).await?))
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<CompleteProfilePayload>,
) -> AppResult<Json<UserProfile>> {
    let users = UserRepository::new(state.db.clone());

    // A changed phone number must be free, and must be re-verified
    if let Some(phone) = &payload.phone {
        let existing = users
            .find_by_id(&current.id)
            .await?
            .ok_or_else(|| AppError::not_found("Account no longer exists"))?;
        if existing.phone.as_deref() != Some(phone.as_str()) {
            if users.find_by_phone(phone).await?.is_some() {
                return Err(AppError::conflict("Phone number is already registered"));
            }
            users.clear_phone_verification(&current.id).await?;
        }
    }

    let user = users
        .update_profile(&current.id, payload.name, payload.phone)
        .await?;
    Ok(Json(build_profile(&state, &user).await?))
}

#[derive(Deserialize)]
pub struct ChangePasswordPayload {
    pub current_password: String,
    pub new_password: String,
}

/// PUT /api/auth/password
pub async fn change_password(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<ChangePasswordPayload>,
) -> AppResult<Json<AppResponse<()>>> {
    if payload.new_password.len() < 8 {
        return Err(AppError::validation(
            "Password must be at least 8 characters",
        ));
    }

    let users = UserRepository::new(state.db.clone());
    let user = users
        .find_by_id(&current.id)
        .await?
        .ok_or_else(|| AppError::not_found("Account no longer exists"))?;

    let valid = user
        .verify_password(&payload.current_password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;
    if !valid {
        return Err(AppError::validation("Current password is incorrect"));
    }

    let hash = User::hash_password(&payload.new_password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;
    users.set_password_hash(&current.id, hash).await?;

    security_log!("INFO", "password_changed", user = current.id.clone());
    Ok(ok_with_message((), "Password updated"))
}

// =============================================================================
// Password reset
// =============================================================================

#[derive(Deserialize)]
pub struct ForgotPasswordPayload {
    pub email: String,
}

/// POST /api/auth/forgot-password
///
/// Always answers the same way; the reset email only goes out when the
/// account exists.
pub async fn forgot_password(
    State(state): State<ServerState>,
    Json(payload): Json<ForgotPasswordPayload>,
) -> AppResult<Json<AppResponse<()>>> {
    let users = UserRepository::new(state.db.clone());
    if let Some(user) = users.find_by_email(&payload.email).await? {
        if let Some(id) = &user.id {
            let raw = Uuid::new_v4().to_string();
            TokenRepository::new(state.db.clone())
                .issue(
                    &id.to_string(),
                    TokenPurpose::PasswordReset,
                    hash_token(&raw),
                    expiry(RESET_TOKEN_TTL_MIN),
                )
                .await?;
            mailer::send_email(&user.email, "Reset your password", &raw);
        }
    } else {
        security_log!("WARN", "reset_unknown_email", email = payload.email.clone());
    }

    Ok(ok_with_message(
        (),
        "If that account exists, a reset link has been sent",
    ))
}

#[derive(Deserialize)]
pub struct ResetPasswordPayload {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<ServerState>,
    Json(payload): Json<ResetPasswordPayload>,
) -> AppResult<Json<AppResponse<()>>> {
    if payload.new_password.len() < 8 {
        return Err(AppError::validation(
            "Password must be at least 8 characters",
        ));
    }

    let users = UserRepository::new(state.db.clone());
    let user = users
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| AppError::validation("Invalid or expired token"))?;
    let user_id = user
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("User record has no id"))?
        .to_string();

    consume_token(&state, &user_id, TokenPurpose::PasswordReset, &payload.token).await?;

    let hash = User::hash_password(&payload.new_password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;
    users.set_password_hash(&user_id, hash).await?;

    security_log!("INFO", "password_reset", user = user_id.clone());
    Ok(ok_with_message((), "Password updated"))
}

/// Check a raw secret against the live token, counting failed attempts
/// and burning the token on success.
async fn consume_token(
    state: &ServerState,
    user_id: &str,
    purpose: TokenPurpose,
    raw: &str,
) -> AppResult<()> {
    let tokens = TokenRepository::new(state.db.clone());
    let token = tokens
        .find_live(user_id, purpose)
        .await?
        .ok_or_else(|| AppError::validation("Invalid or expired token"))?;
    let token_id = token
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("Token record has no id"))?
        .to_string();

    if token.attempts >= MAX_TOKEN_ATTEMPTS {
        return Err(AppError::validation("Too many attempts, request a new code"));
    }

    if token.token_hash != hash_token(raw) {
        let attempts = tokens.record_attempt(&token_id).await?;
        security_log!(
            "WARN",
            "token_mismatch",
            user = user_id.to_string(),
            attempts = attempts
        );
        return Err(AppError::validation("Invalid or expired token"));
    }

    tokens
        .consume(&token_id)
        .await?
        .ok_or_else(|| AppError::validation("Invalid or expired token"))?;
    Ok(())
}

// =============================================================================
// Email verification
// =============================================================================

#[derive(Deserialize)]
pub struct EmailPayload {
    pub email: String,
}

/// POST /api/auth/verify-email
pub async fn send_email_verification(
    State(state): State<ServerState>,
    Json(payload): Json<EmailPayload>,
) -> AppResult<Json<AppResponse<()>>> {
    let users = UserRepository::new(state.db.clone());
    if let Some(user) = users.find_by_email(&payload.email).await? {
        if user.email_verified_at.is_none() {
            if let Some(id) = &user.id {
                let raw = Uuid::new_v4().to_string();
                TokenRepository::new(state.db.clone())
                    .issue(
                        &id.to_string(),
                        TokenPurpose::EmailVerify,
                        hash_token(&raw),
                        expiry(EMAIL_TOKEN_TTL_MIN),
                    )
                    .await?;
                mailer::send_email(&user.email, "Verify your email", &raw);
            }
        }
    }

    Ok(ok_with_message(
        (),
        "If that account exists, a verification link has been sent",
    ))
}

#[derive(Deserialize)]
pub struct ConfirmEmailPayload {
    pub email: String,
    pub token: String,
}

/// POST /api/auth/verify-email/confirm
pub async fn confirm_email(
    State(state): State<ServerState>,
    Json(payload): Json<ConfirmEmailPayload>,
) -> AppResult<Json<AppResponse<()>>> {
    let users = UserRepository::new(state.db.clone());
    let user = users
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| AppError::validation("Invalid or expired token"))?;
    let user_id = user
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("User record has no id"))?
        .to_string();

    consume_token(&state, &user_id, TokenPurpose::EmailVerify, &payload.token).await?;
    users.mark_email_verified(&user_id).await?;

    Ok(ok_with_message((), "Email verified"))
}

// =============================================================================
// Phone OTP
// =============================================================================

/// POST /api/auth/otp/send
pub async fn send_otp(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<()>>> {
    let user = UserRepository::new(state.db.clone())
        .find_by_id(&current.id)
        .await?
        .ok_or_else(|| AppError::not_found("Account no longer exists"))?;
    let phone = user
        .phone
        .as_ref()
        .ok_or_else(|| AppError::validation("No phone number on profile"))?;

    let code = generate_otp()?;
    TokenRepository::new(state.db.clone())
        .issue(
            &current.id,
            TokenPurpose::PhoneOtp,
            hash_token(&code),
            expiry(OTP_TTL_MIN),
        )
        .await?;
    mailer::send_sms(phone, &code);

    Ok(ok_with_message((), "Verification code sent"))
}

#[derive(Deserialize)]
pub struct VerifyOtpPayload {
    pub code: String,
}

/// POST /api/auth/otp/verify
pub async fn verify_otp(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<VerifyOtpPayload>,
) -> AppResult<Json<AppResponse<()>>> {
    consume_token(&state, &current.id, TokenPurpose::PhoneOtp, &payload.code).await?;
    UserRepository::new(state.db.clone())
        .mark_phone_verified(&current.id)
        .await?;
    Ok(ok_with_message((), "Phone verified"))
}

// =============================================================================
// Role applications
// =============================================================================

#[derive(Deserialize)]
pub struct SellerApplication {
    pub shop_name: String,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// POST /api/auth/apply/seller
///
/// Creates the PENDING seller role and the (unapproved) shop in one go.
/// The shop stays invisible to buyers until an admin approves the seller.
pub async fn apply_seller(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<SellerApplication>,
) -> AppResult<Json<AppResponse<Vec<RoleSummary>>>> {
    let name = payload.shop_name.trim();
    validate_required_text(name, "shop_name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let roles = UserRoleRepository::new(state.db.clone());
    roles.create(&current.id, Role::Seller).await?;

    ShopRepository::new(state.db.clone())
        .create(
            &current.id,
            name.to_string(),
            payload.description.unwrap_or_default(),
            payload.latitude,
            payload.longitude,
        )
        .await?;

    security_log!("INFO", "seller_application", user = current.id.clone());
    list_role_summaries(&state, &current.id).await.map(ok)
}

/// POST /api/auth/apply/rider
pub async fn apply_rider(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<RoleSummary>>>> {
    UserRoleRepository::new(state.db.clone())
        .create(&current.id, Role::Rider)
        .await?;

    security_log!("INFO", "rider_application", user = current.id.clone());
    list_role_summaries(&state, &current.id).await.map(ok)
}

/// GET /api/auth/roles
pub async fn list_roles(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<RoleSummary>>> {
    list_role_summaries(&state, &current.id).await.map(Json)
}

async fn list_role_summaries(
    state: &ServerState,
    user_id: &str,
) -> AppResult<Vec<RoleSummary>> {
    Ok(UserRoleRepository::new(state.db.clone())
        .find_for_user(user_id)
        .await?
        .into_iter()
        .map(|r| RoleSummary {
            role: r.role,
            status: r.status,
            is_active: r.is_active,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;

    async fn test_state() -> ServerState {
        ServerState::for_tests(Config::from_env()).await
    }

    async fn register_user(state: &ServerState, email: &str, phone: Option<&str>) -> String {
        let response = register(
            State(state.clone()),
            Json(RegisterPayload {
                name: "Amina".to_string(),
                email: email.to_string(),
                phone: phone.map(str::to_string),
                password: "long enough password".to_string(),
            }),
        )
        .await
        .expect("register");
        response.0.data.unwrap().user.id
    }

    #[tokio::test]
    async fn login_does_not_reveal_which_emails_exist() {
        let state = test_state().await;
        register_user(&state, "amina@sokoni.test", None).await;

        let unknown_email = login(
            State(state.clone()),
            Json(LoginPayload {
                email: "ghost@sokoni.test".to_string(),
                password: "long enough password".to_string(),
            }),
        )
        .await
        .unwrap_err();

        let wrong_password = login(
            State(state.clone()),
            Json(LoginPayload {
                email: "amina@sokoni.test".to_string(),
                password: "not the password".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(unknown_email.to_string(), wrong_password.to_string());
    }

    #[tokio::test]
    async fn forgot_password_answers_identically_for_any_email() {
        let state = test_state().await;
        register_user(&state, "amina@sokoni.test", None).await;

        let known = forgot_password(
            State(state.clone()),
            Json(ForgotPasswordPayload {
                email: "amina@sokoni.test".to_string(),
            }),
        )
        .await
        .unwrap();
        let unknown = forgot_password(
            State(state.clone()),
            Json(ForgotPasswordPayload {
                email: "ghost@sokoni.test".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(known.0.message, unknown.0.message);
    }

    #[tokio::test]
    async fn otp_verification_caps_failed_attempts() {
        let state = test_state().await;
        let user_id = register_user(&state, "amina@sokoni.test", Some("+254700000001")).await;
        let current = CurrentUser {
            id: user_id,
            name: "Amina".to_string(),
            email: "amina@sokoni.test".to_string(),
            roles: vec![],
        };

        send_otp(State(state.clone()), current.clone()).await.unwrap();

        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let err = verify_otp(
                State(state.clone()),
                current.clone(),
                Json(VerifyOtpPayload {
                    code: "000000".to_string(),
                }),
            )
            .await
            .unwrap_err();
            assert!(err.to_string().contains("Invalid or expired"));
        }

        // the cap hits even with the right shape of code
        let capped = verify_otp(
            State(state.clone()),
            current,
            Json(VerifyOtpPayload {
                code: "123456".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(capped.to_string().contains("Too many attempts"));
    }

    #[tokio::test]
    async fn phone_numbers_are_unique_across_accounts() {
        let state = test_state().await;
        let amina_id = register_user(&state, "amina@sokoni.test", Some("+254700000001")).await;

        // a second account cannot register the same number
        let taken = register(
            State(state.clone()),
            Json(RegisterPayload {
                name: "Wanjiku".to_string(),
                email: "wanjiku@sokoni.test".to_string(),
                phone: Some("+254700000001".to_string()),
                password: "long enough password".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(taken.to_string().contains("already registered"));

        // nor claim it later through a profile update
        let wanjiku_id = register_user(&state, "wanjiku@sokoni.test", None).await;
        let wanjiku = CurrentUser {
            id: wanjiku_id,
            name: "Wanjiku".to_string(),
            email: "wanjiku@sokoni.test".to_string(),
            roles: vec![],
        };
        let grab = update_profile(
            State(state.clone()),
            wanjiku,
            Json(CompleteProfilePayload {
                name: None,
                phone: Some("+254700000001".to_string()),
            }),
        )
        .await;
        assert!(grab.is_err());

        // keeping your own number is not a conflict
        let amina = CurrentUser {
            id: amina_id,
            name: "Amina".to_string(),
            email: "amina@sokoni.test".to_string(),
            roles: vec![],
        };
        update_profile(
            State(state.clone()),
            amina,
            Json(CompleteProfilePayload {
                name: None,
                phone: Some("+254700000001".to_string()),
            }),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn register_rejects_overlong_fields() {
        let state = test_state().await;

        let err = register(
            State(state.clone()),
            Json(RegisterPayload {
                name: "x".repeat(MAX_NAME_LEN + 1),
                email: "amina@sokoni.test".to_string(),
                phone: None,
                password: "long enough password".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let state = test_state().await;
        register_user(&state, "amina@sokoni.test", None).await;

        let duplicate = register(
            State(state.clone()),
            Json(RegisterPayload {
                name: "Impostor".to_string(),
                email: "amina@sokoni.test".to_string(),
                phone: None,
                password: "another password".to_string(),
            }),
        )
        .await;
        assert!(duplicate.is_err());
    }
}

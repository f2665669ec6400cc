//! One-time token repository
//!
//! Password-reset links, email-verification links and phone OTPs. Only
//! digests are stored; issuing a new token invalidates any live one for
//! the same (user, purpose).

use super::{BaseRepository, RepoError, RepoResult, now_rfc3339, parse_record_id};
use crate::db::models::{OneTimeToken, TokenPurpose};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TOKEN_TABLE: &str = "one_time_token";
const USER_TABLE: &str = "user";

#[derive(Clone)]
pub struct TokenRepository {
    base: BaseRepository,
}

impl TokenRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Issue a token: earlier unused tokens for the same user and purpose
    /// are burned first, so only the newest secret works.
    pub async fn issue(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
        token_hash: String,
        expires_at: String,
    ) -> RepoResult<OneTimeToken> {
        let user_rid = parse_record_id(USER_TABLE, user_id)?;

        self.base
            .db()
            .query(
                "UPDATE one_time_token SET used = true \
                 WHERE user = $user AND purpose = $purpose AND used = false",
            )
            .bind(("user", user_rid.clone()))
            .bind(("purpose", purpose))
            .await?;

        let tokens: Vec<OneTimeToken> = self
            .base
            .db()
            .query(
                "CREATE one_time_token SET \
                 user = $user, \
                 purpose = $purpose, \
                 token_hash = $token_hash, \
                 expires_at = $expires_at, \
                 used = false, \
                 attempts = 0, \
                 created_at = $created_at",
            )
            .bind(("user", user_rid))
            .bind(("purpose", purpose))
            .bind(("token_hash", token_hash))
            .bind(("expires_at", expires_at))
            .bind(("created_at", now_rfc3339()))
            .await?
            .take(0)?;
        tokens
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to issue token".to_string()))
    }

    /// The live (unused, unexpired) token for a user and purpose, if any
    pub async fn find_live(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
    ) -> RepoResult<Option<OneTimeToken>> {
        let user_rid = parse_record_id(USER_TABLE, user_id)?;
        let tokens: Vec<OneTimeToken> = self
            .base
            .db()
            .query(
                "SELECT * FROM one_time_token \
                 WHERE user = $user AND purpose = $purpose \
                 AND used = false AND expires_at > $now \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .bind(("user", user_rid))
            .bind(("purpose", purpose))
            .bind(("now", now_rfc3339()))
            .await?
            .take(0)?;
        Ok(tokens.into_iter().next())
    }

    /// Burn a token after successful verification. Conditional on `used =
    /// false` so a raced second consume matches nothing.
    pub async fn consume(&self, token_id: &str) -> RepoResult<Option<OneTimeToken>> {
        let rid = parse_record_id(TOKEN_TABLE, token_id)?;
        let tokens: Vec<OneTimeToken> = self
            .base
            .db()
            .query(
                "UPDATE one_time_token SET used = true \
                 WHERE id = $id AND used = false RETURN AFTER",
            )
            .bind(("id", rid))
            .await?
            .take(0)?;
        Ok(tokens.into_iter().next())
    }

    /// Count a failed verification attempt; returns the updated total
    pub async fn record_attempt(&self, token_id: &str) -> RepoResult<i64> {
        let rid = parse_record_id(TOKEN_TABLE, token_id)?;
        let tokens: Vec<OneTimeToken> = self
            .base
            .db()
            .query("UPDATE one_time_token SET attempts = attempts + 1 WHERE id = $id RETURN AFTER")
            .bind(("id", rid))
            .await?
            .take(0)?;
        tokens
            .into_iter()
            .next()
            .map(|t| t.attempts)
            .ok_or_else(|| RepoError::NotFound(format!("Token not found: {token_id}")))
    }
}

//! User and user-role repositories

use super::{BaseRepository, RepoError, RepoResult, now_rfc3339, parse_record_id};
use crate::db::models::{ApprovalStatus, Role, User, UserRole};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const USER_TABLE: &str = "user";
const USER_ROLE_TABLE: &str = "user_role";

// =============================================================================
// User Repository
// =============================================================================

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let rid = parse_record_id(USER_TABLE, id)?;
        let user: Option<User> = self.base.db().select(rid).await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let users: Vec<User> = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email")
            .bind(("email", email.to_string()))
            .await?
            .take(0)?;
        Ok(users.into_iter().next())
    }

    pub async fn find_by_phone(&self, phone: &str) -> RepoResult<Option<User>> {
        let users: Vec<User> = self
            .base
            .db()
            .query("SELECT * FROM user WHERE phone = $phone")
            .bind(("phone", phone.to_string()))
            .await?
            .take(0)?;
        Ok(users.into_iter().next())
    }

    /// Raw CREATE so the password hash is bound explicitly; the model
    /// never serializes it.
    pub async fn create(
        &self,
        name: String,
        email: String,
        phone: Option<String>,
        password_hash: String,
    ) -> RepoResult<User> {
        let users: Vec<User> = self
            .base
            .db()
            .query(
                "CREATE user SET \
                 name = $name, \
                 email = $email, \
                 phone = $phone, \
                 password_hash = $password_hash, \
                 email_verified_at = NONE, \
                 phone_verified_at = NONE, \
                 created_at = $created_at",
            )
            .bind(("name", name))
            .bind(("email", email))
            .bind(("phone", phone))
            .bind(("password_hash", password_hash))
            .bind(("created_at", now_rfc3339()))
            .await?
            .take(0)?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    pub async fn update_profile(
        &self,
        id: &str,
        name: Option<String>,
        phone: Option<String>,
    ) -> RepoResult<User> {
        let rid = parse_record_id(USER_TABLE, id)?;
        let users: Vec<User> = self
            .base
            .db()
            .query(
                "UPDATE user SET \
                 name = IF $name != NONE THEN $name ELSE name END, \
                 phone = IF $phone != NONE THEN $phone ELSE phone END \
                 WHERE id = $id RETURN AFTER",
            )
            .bind(("id", rid))
            .bind(("name", name))
            .bind(("phone", phone))
            .await?
            .take(0)?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("User {id}")))
    }

    pub async fn set_password_hash(&self, id: &str, password_hash: String) -> RepoResult<()> {
        let rid = parse_record_id(USER_TABLE, id)?;
        self.base
            .db()
            .query("UPDATE user SET password_hash = $hash WHERE id = $id")
            .bind(("id", rid))
            .bind(("hash", password_hash))
            .await?
            .check()?;
        Ok(())
    }

    pub async fn mark_email_verified(&self, id: &str) -> RepoResult<()> {
        let rid = parse_record_id(USER_TABLE, id)?;
        self.base
            .db()
            .query("UPDATE user SET email_verified_at = $now WHERE id = $id")
            .bind(("id", rid))
            .bind(("now", now_rfc3339()))
            .await?
            .check()?;
        Ok(())
    }

    pub async fn mark_phone_verified(&self, id: &str) -> RepoResult<()> {
        let rid = parse_record_id(USER_TABLE, id)?;
        self.base
            .db()
            .query("UPDATE user SET phone_verified_at = $now WHERE id = $id")
            .bind(("id", rid))
            .bind(("now", now_rfc3339()))
            .await?
            .check()?;
        Ok(())
    }

    /// Drop phone verification after a phone number change
    pub async fn clear_phone_verification(&self, id: &str) -> RepoResult<()> {
        let rid = parse_record_id(USER_TABLE, id)?;
        self.base
            .db()
            .query("UPDATE user SET phone_verified_at = NONE WHERE id = $id")
            .bind(("id", rid))
            .await?
            .check()?;
        Ok(())
    }

    pub async fn count(&self) -> RepoResult<i64> {
        count_table(self.base.db(), "SELECT count() AS total FROM user GROUP ALL").await
    }
}

// =============================================================================
// UserRole Repository
// =============================================================================

#[derive(Clone)]
pub struct UserRoleRepository {
    base: BaseRepository,
}

impl UserRoleRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find the active role row for a user, if any
    pub async fn find_active(&self, user_id: &str, role: Role) -> RepoResult<Option<UserRole>> {
        let user_rid = parse_record_id(USER_TABLE, user_id)?;
        let rows: Vec<UserRole> = self
            .base
            .db()
            .query(
                "SELECT * FROM user_role \
                 WHERE user = $user AND role = $role AND is_active = true",
            )
            .bind(("user", user_rid))
            .bind(("role", role))
            .await?
            .take(0)?;
        Ok(rows.into_iter().next())
    }

    pub async fn find_for_user(&self, user_id: &str) -> RepoResult<Vec<UserRole>> {
        let user_rid = parse_record_id(USER_TABLE, user_id)?;
        let rows: Vec<UserRole> = self
            .base
            .db()
            .query("SELECT * FROM user_role WHERE user = $user")
            .bind(("user", user_rid))
            .await?
            .take(0)?;
        Ok(rows)
    }

    /// Create a role application. SELLER/RIDER start PENDING; ADMIN rows
    /// are created APPROVED (provisioning path only).
    pub async fn create(&self, user_id: &str, role: Role) -> RepoResult<UserRole> {
        let user_rid = parse_record_id(USER_TABLE, user_id)?;
        let status = match role {
            Role::Admin => ApprovalStatus::Approved,
            _ => ApprovalStatus::Pending,
        };

        // Raw CREATE binding the user rid so the link is stored as a
        // record, not its string form.
        let rows: Vec<UserRole> = self
            .base
            .db()
            .query(
                "CREATE user_role SET \
                 user = $user, \
                 role = $role, \
                 is_active = true, \
                 status = $status, \
                 kyc_verified = false, \
                 created_at = $created_at",
            )
            .bind(("user", user_rid))
            .bind(("role", role))
            .bind(("status", status))
            .bind(("created_at", now_rfc3339()))
            .await?
            .take(0)
            .map_err(|e| match RepoError::from(e) {
                RepoError::Duplicate(_) => {
                    RepoError::Duplicate(format!("{} application already exists", role.as_str()))
                }
                other => other,
            })?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create role".to_string()))
    }

    pub async fn find_by_id(&self, role_id: &str) -> RepoResult<Option<UserRole>> {
        let rid = parse_record_id(USER_ROLE_TABLE, role_id)?;
        let row: Option<UserRole> = self.base.db().select(rid).await?;
        Ok(row)
    }

    pub async fn set_status(&self, role_id: &str, status: ApprovalStatus) -> RepoResult<UserRole> {
        let rid = parse_record_id(USER_ROLE_TABLE, role_id)?;
        let rows: Vec<UserRole> = self
            .base
            .db()
            .query("UPDATE user_role SET status = $status WHERE id = $id RETURN AFTER")
            .bind(("id", rid))
            .bind(("status", status))
            .await?
            .take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Role {role_id}")))
    }

    pub async fn set_kyc_verified(&self, role_id: &str, verified: bool) -> RepoResult<()> {
        let rid = parse_record_id(USER_ROLE_TABLE, role_id)?;
        self.base
            .db()
            .query("UPDATE user_role SET kyc_verified = $v WHERE id = $id")
            .bind(("id", rid))
            .bind(("v", verified))
            .await?
            .check()?;
        Ok(())
    }

    /// Pending applications for admin review
    pub async fn list_pending(&self, role: Option<Role>) -> RepoResult<Vec<UserRole>> {
        let rows: Vec<UserRole> = self
            .base
            .db()
            .query(
                "SELECT * FROM user_role \
                 WHERE status = 'PENDING' AND ($role = NONE OR role = $role) \
                 ORDER BY created_at",
            )
            .bind(("role", role))
            .await?
            .take(0)?;
        Ok(rows)
    }
}

/// Shared count helper for `SELECT count() ... GROUP ALL` projections
pub(super) async fn count_table(db: &Surreal<Db>, query: &'static str) -> RepoResult<i64> {
    #[derive(serde::Deserialize)]
    struct Count {
        total: i64,
    }

    let counts: Vec<Count> = db.query(query).await?.take(0)?;
    Ok(counts.into_iter().next().map(|c| c.total).unwrap_or(0))
}

//! Wishlist repository

use super::{BaseRepository, RepoError, RepoResult, now_rfc3339, parse_record_id};
use crate::db::models::WishlistItem;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const USER_TABLE: &str = "user";
const PRODUCT_TABLE: &str = "product";

#[derive(Clone)]
pub struct WishlistRepository {
    base: BaseRepository,
}

impl WishlistRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Add a product to the user's wishlist. The unique (user, product)
    /// index makes repeat adds fail as duplicates.
    pub async fn add(&self, user_id: &str, product_id: &str) -> RepoResult<WishlistItem> {
        let user_rid = parse_record_id(USER_TABLE, user_id)?;
        let product_rid = parse_record_id(PRODUCT_TABLE, product_id)?;

        let items: Vec<WishlistItem> = self
            .base
            .db()
            .query(
                "CREATE wishlist SET \
                 user = $user, \
                 product = $product, \
                 created_at = $created_at",
            )
            .bind(("user", user_rid))
            .bind(("product", product_rid))
            .bind(("created_at", now_rfc3339()))
            .await?
            .take(0)
            .map_err(|e| match RepoError::from(e) {
                RepoError::Duplicate(_) => {
                    RepoError::Duplicate("Product is already wishlisted".to_string())
                }
                other => other,
            })?;
        items
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to add wishlist item".to_string()))
    }

    /// Remove a wishlisted product; returns whether anything was removed
    pub async fn remove(&self, user_id: &str, product_id: &str) -> RepoResult<bool> {
        let user_rid = parse_record_id(USER_TABLE, user_id)?;
        let product_rid = parse_record_id(PRODUCT_TABLE, product_id)?;

        let removed: Vec<WishlistItem> = self
            .base
            .db()
            .query(
                "DELETE wishlist WHERE user = $user AND product = $product \
                 RETURN BEFORE",
            )
            .bind(("user", user_rid))
            .bind(("product", product_rid))
            .await?
            .take(0)?;
        Ok(!removed.is_empty())
    }

    pub async fn list_for_user(&self, user_id: &str) -> RepoResult<Vec<WishlistItem>> {
        let user_rid = parse_record_id(USER_TABLE, user_id)?;
        let items: Vec<WishlistItem> = self
            .base
            .db()
            .query("SELECT * FROM wishlist WHERE user = $user ORDER BY created_at DESC")
            .bind(("user", user_rid))
            .await?
            .take(0)?;
        Ok(items)
    }
}

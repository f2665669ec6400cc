//! Review and rider-rating repositories

use super::{BaseRepository, RepoError, RepoResult, now_rfc3339, parse_record_id};
use crate::db::models::{Review, RiderRating};
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

const SHOP_TABLE: &str = "shop";
const USER_TABLE: &str = "user";

// =============================================================================
// Shop reviews
// =============================================================================

#[derive(Clone)]
pub struct ReviewRepository {
    base: BaseRepository,
}

impl ReviewRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Append-once insert; the unique index on `order` backs the duplicate
    /// rejection.
    pub async fn create(
        &self,
        order_id: &RecordId,
        shop_id: &RecordId,
        buyer_id: &RecordId,
        rating: i64,
        comment: Option<String>,
    ) -> RepoResult<Review> {
        let reviews: Vec<Review> = self
            .base
            .db()
            .query(
                "CREATE review SET \
                 order = $order, \
                 shop = $shop, \
                 buyer = $buyer, \
                 rating = $rating, \
                 comment = $comment, \
                 created_at = $created_at",
            )
            .bind(("order", order_id.clone()))
            .bind(("shop", shop_id.clone()))
            .bind(("buyer", buyer_id.clone()))
            .bind(("rating", rating))
            .bind(("comment", comment))
            .bind(("created_at", now_rfc3339()))
            .await?
            .take(0)
            .map_err(|e| match RepoError::from(e) {
                RepoError::Duplicate(_) => {
                    RepoError::Duplicate("Order already has a review".to_string())
                }
                other => other,
            })?;
        reviews
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create review".to_string()))
    }

    pub async fn find_by_order(&self, order_id: &str) -> RepoResult<Option<Review>> {
        let order_rid = parse_record_id("order", order_id)?;
        let reviews: Vec<Review> = self
            .base
            .db()
            .query("SELECT * FROM review WHERE order = $order")
            .bind(("order", order_rid))
            .await?
            .take(0)?;
        Ok(reviews.into_iter().next())
    }

    pub async fn list_for_shop(&self, shop_id: &str) -> RepoResult<Vec<Review>> {
        let shop_rid = parse_record_id(SHOP_TABLE, shop_id)?;
        let reviews: Vec<Review> = self
            .base
            .db()
            .query("SELECT * FROM review WHERE shop = $shop ORDER BY created_at DESC")
            .bind(("shop", shop_rid))
            .await?
            .take(0)?;
        Ok(reviews)
    }

    /// Mean rating over a shop's reviews; None when unreviewed
    pub async fn mean_for_shop(&self, shop_id: &str) -> RepoResult<Option<f64>> {
        let shop_rid = parse_record_id(SHOP_TABLE, shop_id)?;

        #[derive(serde::Deserialize)]
        struct Mean {
            mean: Option<f64>,
        }

        let means: Vec<Mean> = self
            .base
            .db()
            .query(
                "SELECT math::mean(rating) AS mean FROM review \
                 WHERE shop = $shop GROUP ALL",
            )
            .bind(("shop", shop_rid))
            .await?
            .take(0)?;
        Ok(means.into_iter().next().and_then(|m| m.mean))
    }
}

// =============================================================================
// Rider ratings
// =============================================================================

#[derive(Clone)]
pub struct RiderRatingRepository {
    base: BaseRepository,
}

impl RiderRatingRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(
        &self,
        delivery_id: &RecordId,
        rider_id: &RecordId,
        buyer_id: &RecordId,
        rating: i64,
        comment: Option<String>,
    ) -> RepoResult<RiderRating> {
        let ratings: Vec<RiderRating> = self
            .base
            .db()
            .query(
                "CREATE rider_rating SET \
                 delivery = $delivery, \
                 rider = $rider, \
                 buyer = $buyer, \
                 rating = $rating, \
                 comment = $comment, \
                 created_at = $created_at",
            )
            .bind(("delivery", delivery_id.clone()))
            .bind(("rider", rider_id.clone()))
            .bind(("buyer", buyer_id.clone()))
            .bind(("rating", rating))
            .bind(("comment", comment))
            .bind(("created_at", now_rfc3339()))
            .await?
            .take(0)
            .map_err(|e| match RepoError::from(e) {
                RepoError::Duplicate(_) => {
                    RepoError::Duplicate("Delivery already has a rating".to_string())
                }
                other => other,
            })?;
        ratings
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create rider rating".to_string()))
    }

    pub async fn list_for_rider(&self, rider_id: &str) -> RepoResult<Vec<RiderRating>> {
        let rider_rid = parse_record_id(USER_TABLE, rider_id)?;
        let ratings: Vec<RiderRating> = self
            .base
            .db()
            .query("SELECT * FROM rider_rating WHERE rider = $rider ORDER BY created_at DESC")
            .bind(("rider", rider_rid))
            .await?
            .take(0)?;
        Ok(ratings)
    }

    /// Mean rating over a rider's ratings, computed on read
    pub async fn mean_for_rider(&self, rider_id: &str) -> RepoResult<Option<f64>> {
        let rider_rid = parse_record_id(USER_TABLE, rider_id)?;

        #[derive(serde::Deserialize)]
        struct Mean {
            mean: Option<f64>,
        }

        let means: Vec<Mean> = self
            .base
            .db()
            .query(
                "SELECT math::mean(rating) AS mean FROM rider_rating \
                 WHERE rider = $rider GROUP ALL",
            )
            .bind(("rider", rider_rid))
            .await?
            .take(0)?;
        Ok(means.into_iter().next().and_then(|m| m.mean))
    }
}

//! Shop repository

use super::{BaseRepository, RepoError, RepoResult, now_rfc3339, parse_record_id};
use crate::db::models::{Shop, ShopUpdate};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const SHOP_TABLE: &str = "shop";
const USER_TABLE: &str = "user";

#[derive(Clone)]
pub struct ShopRepository {
    base: BaseRepository,
}

impl ShopRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Shop>> {
        let rid = parse_record_id(SHOP_TABLE, id)?;
        let shop: Option<Shop> = self.base.db().select(rid).await?;
        Ok(shop)
    }

    pub async fn find_by_owner(&self, owner_id: &str) -> RepoResult<Option<Shop>> {
        let owner_rid = parse_record_id(USER_TABLE, owner_id)?;
        let shops: Vec<Shop> = self
            .base
            .db()
            .query("SELECT * FROM shop WHERE owner = $owner")
            .bind(("owner", owner_rid))
            .await?
            .take(0)?;
        Ok(shops.into_iter().next())
    }

    pub async fn create(
        &self,
        owner_id: &str,
        name: String,
        description: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> RepoResult<Shop> {
        let owner_rid = parse_record_id(USER_TABLE, owner_id)?;
        let shops: Vec<Shop> = self
            .base
            .db()
            .query(
                "CREATE shop SET \
                 owner = $owner, \
                 name = $name, \
                 description = $description, \
                 latitude = $latitude, \
                 longitude = $longitude, \
                 rating = 0.0, \
                 is_active = true, \
                 approved = false, \
                 created_at = $created_at",
            )
            .bind(("owner", owner_rid))
            .bind(("name", name))
            .bind(("description", description))
            .bind(("latitude", latitude))
            .bind(("longitude", longitude))
            .bind(("created_at", now_rfc3339()))
            .await?
            .take(0)
            .map_err(|e| match RepoError::from(e) {
                RepoError::Duplicate(_) => {
                    RepoError::Duplicate("User already owns a shop".to_string())
                }
                other => other,
            })?;
        shops
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create shop".to_string()))
    }

    pub async fn update(&self, id: &str, data: ShopUpdate) -> RepoResult<Shop> {
        let rid = parse_record_id(SHOP_TABLE, id)?;
        let shops: Vec<Shop> = self
            .base
            .db()
            .query(
                "UPDATE shop SET \
                 name = IF $name != NONE THEN $name ELSE name END, \
                 description = IF $description != NONE THEN $description ELSE description END, \
                 latitude = IF $latitude != NONE THEN $latitude ELSE latitude END, \
                 longitude = IF $longitude != NONE THEN $longitude ELSE longitude END, \
                 is_active = IF $is_active != NONE THEN $is_active ELSE is_active END \
                 WHERE id = $id RETURN AFTER",
            )
            .bind(("id", rid))
            .bind(("name", data.name))
            .bind(("description", data.description))
            .bind(("latitude", data.latitude))
            .bind(("longitude", data.longitude))
            .bind(("is_active", data.is_active))
            .await?
            .take(0)?;
        shops
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Shop {id}")))
    }

    /// Toggle the approval mirror (set by the admin seller verdict)
    pub async fn set_approved(&self, id: &str, approved: bool) -> RepoResult<()> {
        let rid = parse_record_id(SHOP_TABLE, id)?;
        self.base
            .db()
            .query("UPDATE shop SET approved = $approved WHERE id = $id")
            .bind(("id", rid))
            .bind(("approved", approved))
            .await?
            .check()?;
        Ok(())
    }

    /// Overwrite the cached review mean
    pub async fn set_rating(&self, id: &str, rating: f64) -> RepoResult<()> {
        let rid = parse_record_id(SHOP_TABLE, id)?;
        self.base
            .db()
            .query("UPDATE shop SET rating = $rating WHERE id = $id")
            .bind(("id", rid))
            .bind(("rating", rating))
            .await?
            .check()?;
        Ok(())
    }

    /// Buyer-visible shops: active and approved, optional name search
    pub async fn search(&self, term: Option<String>, limit: i64, start: i64) -> RepoResult<Vec<Shop>> {
        let term = term.map(|t| t.to_lowercase());
        let shops: Vec<Shop> = self
            .base
            .db()
            .query(
                "SELECT * FROM shop \
                 WHERE is_active = true AND approved = true \
                 AND ($term = NONE OR string::contains(string::lowercase(name), $term)) \
                 ORDER BY rating DESC LIMIT $limit START $start",
            )
            .bind(("term", term))
            .bind(("limit", limit))
            .bind(("start", start))
            .await?
            .take(0)?;
        Ok(shops)
    }
}

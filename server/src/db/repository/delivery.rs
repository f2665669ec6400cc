//! Delivery repository

use super::{BaseRepository, RepoError, RepoResult, now_rfc3339, parse_record_id};
use crate::db::models::{Delivery, DeliveryStatus};
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

const DELIVERY_TABLE: &str = "delivery";
const ORDER_TABLE: &str = "order";
const USER_TABLE: &str = "user";

#[derive(Clone)]
pub struct DeliveryRepository {
    base: BaseRepository,
}

impl DeliveryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create the delivery record when its order becomes deliverable
    pub async fn create(&self, order_id: &RecordId) -> RepoResult<Delivery> {
        let deliveries: Vec<Delivery> = self
            .base
            .db()
            .query(
                "CREATE delivery SET \
                 order = $order, \
                 rider = NONE, \
                 status = 'PENDING', \
                 assigned_at = NONE, \
                 delivered_at = NONE, \
                 created_at = $created_at",
            )
            .bind(("order", order_id.clone()))
            .bind(("created_at", now_rfc3339()))
            .await?
            .take(0)
            .map_err(|e| match RepoError::from(e) {
                RepoError::Duplicate(_) => {
                    RepoError::Duplicate("Order already has a delivery".to_string())
                }
                other => other,
            })?;
        deliveries
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create delivery".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Delivery>> {
        let rid = parse_record_id(DELIVERY_TABLE, id)?;
        let delivery: Option<Delivery> = self.base.db().select(rid).await?;
        Ok(delivery)
    }

    pub async fn find_by_order(&self, order_id: &str) -> RepoResult<Option<Delivery>> {
        let order_rid = parse_record_id(ORDER_TABLE, order_id)?;
        let deliveries: Vec<Delivery> = self
            .base
            .db()
            .query("SELECT * FROM delivery WHERE order = $order")
            .bind(("order", order_rid))
            .await?
            .take(0)?;
        Ok(deliveries.into_iter().next())
    }

    /// Admin board: all deliveries, optionally by status
    pub async fn list(&self, status: Option<DeliveryStatus>) -> RepoResult<Vec<Delivery>> {
        let deliveries: Vec<Delivery> = self
            .base
            .db()
            .query(
                "SELECT * FROM delivery \
                 WHERE ($status = NONE OR status = $status) \
                 ORDER BY created_at DESC",
            )
            .bind(("status", status))
            .await?
            .take(0)?;
        Ok(deliveries)
    }

    pub async fn list_for_rider(&self, rider_id: &str) -> RepoResult<Vec<Delivery>> {
        let rider_rid = parse_record_id(USER_TABLE, rider_id)?;
        let deliveries: Vec<Delivery> = self
            .base
            .db()
            .query("SELECT * FROM delivery WHERE rider = $rider ORDER BY created_at DESC")
            .bind(("rider", rider_rid))
            .await?
            .take(0)?;
        Ok(deliveries)
    }

    /// Conditional assignment: only an unassigned delivery takes a rider.
    /// Returns None when the delivery was already assigned (raced).
    pub async fn assign(&self, delivery_id: &str, rider_id: &str) -> RepoResult<Option<Delivery>> {
        let rid = parse_record_id(DELIVERY_TABLE, delivery_id)?;
        let rider_rid = parse_record_id(USER_TABLE, rider_id)?;
        let deliveries: Vec<Delivery> = self
            .base
            .db()
            .query(
                "UPDATE delivery \
                 SET rider = $rider, status = 'ASSIGNED', assigned_at = $now \
                 WHERE id = $id AND rider = NONE AND status = 'PENDING' \
                 RETURN AFTER",
            )
            .bind(("id", rid))
            .bind(("rider", rider_rid))
            .bind(("now", now_rfc3339()))
            .await?
            .take(0)?;
        Ok(deliveries.into_iter().next())
    }

    /// Conditional status advance; records delivered_at on completion.
    /// Returns None when the delivery left `from` in the meantime.
    pub async fn transition(
        &self,
        delivery_id: &str,
        from: DeliveryStatus,
        to: DeliveryStatus,
    ) -> RepoResult<Option<Delivery>> {
        let rid = parse_record_id(DELIVERY_TABLE, delivery_id)?;
        let delivered_at = (to == DeliveryStatus::Delivered).then(now_rfc3339);

        let deliveries: Vec<Delivery> = self
            .base
            .db()
            .query(
                "UPDATE delivery \
                 SET status = $to, \
                     delivered_at = IF $delivered_at != NONE THEN $delivered_at ELSE delivered_at END \
                 WHERE id = $id AND status = $from RETURN AFTER",
            )
            .bind(("id", rid))
            .bind(("from", from))
            .bind(("to", to))
            .bind(("delivered_at", delivered_at))
            .await?
            .take(0)?;
        Ok(deliveries.into_iter().next())
    }
}

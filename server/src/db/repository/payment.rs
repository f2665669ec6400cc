//! Payment repository
//!
//! Escrow mutations are conditional on the current escrow status, so a
//! raced second release/refund matches zero rows instead of double-paying.

use super::{BaseRepository, RepoError, RepoResult, now_rfc3339, parse_record_id};
use crate::db::models::Payment;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

const PAYMENT_TABLE: &str = "payment";
const ORDER_TABLE: &str = "order";

#[derive(Clone)]
pub struct PaymentRepository {
    base: BaseRepository,
}

impl PaymentRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(
        &self,
        order_id: &RecordId,
        reference: String,
        amount: i64,
    ) -> RepoResult<Payment> {
        let payments: Vec<Payment> = self
            .base
            .db()
            .query(
                "CREATE payment SET \
                 order = $order, \
                 reference = $reference, \
                 amount = $amount, \
                 status = 'PENDING', \
                 escrow_status = 'HELD', \
                 released_at = NONE, \
                 created_at = $created_at",
            )
            .bind(("order", order_id.clone()))
            .bind(("reference", reference))
            .bind(("amount", amount))
            .bind(("created_at", now_rfc3339()))
            .await?
            .take(0)
            .map_err(|e| match RepoError::from(e) {
                RepoError::Duplicate(_) => {
                    RepoError::Duplicate("Order already has a payment".to_string())
                }
                other => other,
            })?;
        payments
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create payment".to_string()))
    }

    pub async fn find_by_order(&self, order_id: &str) -> RepoResult<Option<Payment>> {
        let order_rid = parse_record_id(ORDER_TABLE, order_id)?;
        let payments: Vec<Payment> = self
            .base
            .db()
            .query("SELECT * FROM payment WHERE order = $order")
            .bind(("order", order_rid))
            .await?
            .take(0)?;
        Ok(payments.into_iter().next())
    }

    pub async fn find_by_reference(&self, reference: &str) -> RepoResult<Option<Payment>> {
        let payments: Vec<Payment> = self
            .base
            .db()
            .query("SELECT * FROM payment WHERE reference = $reference")
            .bind(("reference", reference.to_string()))
            .await?
            .take(0)?;
        Ok(payments.into_iter().next())
    }

    /// Gateway confirmation: PENDING → COMPLETED. Returns None when the
    /// payment was not PENDING (duplicate webhook delivery).
    pub async fn mark_completed(&self, reference: &str) -> RepoResult<Option<Payment>> {
        let payments: Vec<Payment> = self
            .base
            .db()
            .query(
                "UPDATE payment SET status = 'COMPLETED' \
                 WHERE reference = $reference AND status = 'PENDING' RETURN AFTER",
            )
            .bind(("reference", reference.to_string()))
            .await?
            .take(0)?;
        Ok(payments.into_iter().next())
    }

    pub async fn mark_failed(&self, reference: &str) -> RepoResult<Option<Payment>> {
        let payments: Vec<Payment> = self
            .base
            .db()
            .query(
                "UPDATE payment SET status = 'FAILED' \
                 WHERE reference = $reference AND status = 'PENDING' RETURN AFTER",
            )
            .bind(("reference", reference.to_string()))
            .await?
            .take(0)?;
        Ok(payments.into_iter().next())
    }

    /// Escrow release: only a COMPLETED payment still HELD moves. Returns
    /// None when the precondition no longer holds (raced release).
    pub async fn release(&self, payment_id: &str) -> RepoResult<Option<Payment>> {
        let rid = parse_record_id(PAYMENT_TABLE, payment_id)?;
        let payments: Vec<Payment> = self
            .base
            .db()
            .query(
                "UPDATE payment \
                 SET status = 'RELEASED', escrow_status = 'RELEASED', released_at = $now \
                 WHERE id = $id AND status = 'COMPLETED' AND escrow_status = 'HELD' \
                 RETURN AFTER",
            )
            .bind(("id", rid))
            .bind(("now", now_rfc3339()))
            .await?
            .take(0)?;
        Ok(payments.into_iter().next())
    }

    /// Dispute refund: a HELD escrow moves to REFUNDED
    pub async fn refund(&self, payment_id: &str) -> RepoResult<Option<Payment>> {
        let rid = parse_record_id(PAYMENT_TABLE, payment_id)?;
        let payments: Vec<Payment> = self
            .base
            .db()
            .query(
                "UPDATE payment SET escrow_status = 'REFUNDED' \
                 WHERE id = $id AND escrow_status = 'HELD' RETURN AFTER",
            )
            .bind(("id", rid))
            .await?
            .take(0)?;
        Ok(payments.into_iter().next())
    }
}

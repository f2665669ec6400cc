//! Order repository
//!
//! Status mutations are conditional single statements (`WHERE status =
//! $from`), so two raced transitions cannot both succeed.

use super::{BaseRepository, RepoError, RepoResult, now_rfc3339, parse_record_id};
use crate::db::models::{Order, OrderItem, OrderStatus};
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

const ORDER_TABLE: &str = "order";
const USER_TABLE: &str = "user";
const SHOP_TABLE: &str = "shop";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let rid = parse_record_id(ORDER_TABLE, id)?;
        let order: Option<Order> = self.base.db().select(rid).await?;
        Ok(order)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        buyer_id: &str,
        shop_id: &RecordId,
        items: Vec<OrderItem>,
        total: i64,
        platform_fee: i64,
        delivery_fee: i64,
        dest_latitude: Option<f64>,
        dest_longitude: Option<f64>,
    ) -> RepoResult<Order> {
        let buyer_rid = parse_record_id(USER_TABLE, buyer_id)?;
        let now = now_rfc3339();

        // Buyer and shop are bound as record links. Items are a denormalized
        // checkout snapshot; their product/unit references stay in string
        // form and are never queried against.
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "CREATE order SET \
                 buyer = $buyer, \
                 shop = $shop, \
                 status = 'PENDING', \
                 items = $items, \
                 total = $total, \
                 platform_fee = $platform_fee, \
                 delivery_fee = $delivery_fee, \
                 dest_latitude = $dest_latitude, \
                 dest_longitude = $dest_longitude, \
                 created_at = $now, \
                 updated_at = $now",
            )
            .bind(("buyer", buyer_rid))
            .bind(("shop", shop_id.clone()))
            .bind(("items", items))
            .bind(("total", total))
            .bind(("platform_fee", platform_fee))
            .bind(("delivery_fee", delivery_fee))
            .bind(("dest_latitude", dest_latitude))
            .bind(("dest_longitude", dest_longitude))
            .bind(("now", now))
            .await?
            .take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Conditional status transition; returns None if the order was not in
    /// `from` anymore (raced or illegal), leaving it unchanged.
    pub async fn transition(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> RepoResult<Option<Order>> {
        let rid = parse_record_id(ORDER_TABLE, id)?;
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE order SET status = $to, updated_at = $now \
                 WHERE id = $id AND status = $from RETURN AFTER",
            )
            .bind(("id", rid))
            .bind(("from", from))
            .bind(("to", to))
            .bind(("now", now_rfc3339()))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    pub async fn list_for_buyer(&self, buyer_id: &str) -> RepoResult<Vec<Order>> {
        let buyer_rid = parse_record_id(USER_TABLE, buyer_id)?;
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE buyer = $buyer ORDER BY created_at DESC")
            .bind(("buyer", buyer_rid))
            .await?
            .take(0)?;
        Ok(orders)
    }

    pub async fn list_for_shop(
        &self,
        shop_id: &str,
        status: Option<OrderStatus>,
    ) -> RepoResult<Vec<Order>> {
        let shop_rid = parse_record_id(SHOP_TABLE, shop_id)?;
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT * FROM order \
                 WHERE shop = $shop AND ($status = NONE OR status = $status) \
                 ORDER BY created_at DESC",
            )
            .bind(("shop", shop_rid))
            .bind(("status", status))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Orders by status, for the admin stats board
    pub async fn count_by_status(&self) -> RepoResult<Vec<(OrderStatus, i64)>> {
        #[derive(serde::Deserialize)]
        struct Row {
            status: OrderStatus,
            total: i64,
        }

        let rows: Vec<Row> = self
            .base
            .db()
            .query("SELECT status, count() AS total FROM order GROUP BY status")
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(|r| (r.status, r.total)).collect())
    }

    /// Gross revenue and platform fees over delivered orders
    pub async fn delivered_totals(&self) -> RepoResult<(i64, i64)> {
        #[derive(serde::Deserialize)]
        struct Row {
            revenue: i64,
            fees: i64,
        }

        let rows: Vec<Row> = self
            .base
            .db()
            .query(
                "SELECT math::sum(total) AS revenue, math::sum(platform_fee) AS fees \
                 FROM order WHERE status = 'DELIVERED' GROUP ALL",
            )
            .await?
            .take(0)?;
        Ok(rows
            .into_iter()
            .next()
            .map(|r| (r.revenue, r.fees))
            .unwrap_or((0, 0)))
    }
}

//! Platform stats repository (admin dashboard)

use super::order::OrderRepository;
use super::user::count_table;
use super::{BaseRepository, RepoResult};
use crate::db::models::OrderStatus;
use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Debug, Serialize)]
pub struct OrderStatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Platform-wide counters and money totals
#[derive(Debug, Serialize)]
pub struct PlatformStats {
    pub users: i64,
    pub shops: i64,
    pub products: i64,
    pub orders: i64,
    pub orders_by_status: Vec<OrderStatusCount>,
    pub deliveries: i64,
    /// SELLER/RIDER applications awaiting review
    pub pending_applications: i64,
    /// Gross value of delivered orders, minor units
    pub delivered_revenue: i64,
    /// Platform fees collected over delivered orders, minor units
    pub platform_fees: i64,
    /// Payments still held in escrow
    pub escrow_held: i64,
}

#[derive(Clone)]
pub struct StatsRepository {
    base: BaseRepository,
}

impl StatsRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn platform(&self) -> RepoResult<PlatformStats> {
        let db = self.base.db();

        let users = count_table(db, "SELECT count() AS total FROM user GROUP ALL").await?;
        let shops = count_table(db, "SELECT count() AS total FROM shop GROUP ALL").await?;
        let products = count_table(db, "SELECT count() AS total FROM product GROUP ALL").await?;
        let orders = count_table(db, "SELECT count() AS total FROM order GROUP ALL").await?;
        let deliveries = count_table(db, "SELECT count() AS total FROM delivery GROUP ALL").await?;
        let pending_applications = count_table(
            db,
            "SELECT count() AS total FROM user_role WHERE status = 'PENDING' GROUP ALL",
        )
        .await?;
        let escrow_held = count_table(
            db,
            "SELECT count() AS total FROM payment \
             WHERE status = 'COMPLETED' AND escrow_status = 'HELD' GROUP ALL",
        )
        .await?;

        let order_repo = OrderRepository::new(db.clone());
        let orders_by_status = order_repo
            .count_by_status()
            .await?
            .into_iter()
            .map(|(status, count)| OrderStatusCount { status, count })
            .collect();
        let (delivered_revenue, platform_fees) = order_repo.delivered_totals().await?;

        Ok(PlatformStats {
            users,
            shops,
            products,
            orders,
            orders_by_status,
            deliveries,
            pending_applications,
            delivered_revenue,
            platform_fees,
            escrow_held,
        })
    }
}

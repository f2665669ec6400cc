//! Rating recomputation
//!
//! Shop ratings are cached on the shop row and recomputed from the full
//! review set after every accepted review; rider ratings are computed on
//! read and never cached.

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::repository::{ReviewRepository, ShopRepository};
use crate::utils::AppResult;

/// Recompute and store a shop's mean rating, rounded to one decimal
/// place. A shop with no reviews goes back to 0.
pub async fn recompute_shop_rating(db: &Surreal<Db>, shop_id: &str) -> AppResult<f64> {
    let reviews = ReviewRepository::new(db.clone());
    let mean = reviews.mean_for_shop(shop_id).await?.unwrap_or(0.0);
    let rounded = (mean * 10.0).round() / 10.0;

    ShopRepository::new(db.clone())
        .set_rating(shop_id, rounded)
        .await?;
    Ok(rounded)
}

#[cfg(test)]
mod tests {
    #[test]
    fn rounding_to_one_decimal() {
        let round = |m: f64| (m * 10.0).round() / 10.0;
        assert_eq!(round(11.0 / 3.0), 3.7);
        assert_eq!(round(4.0), 4.0);
        assert_eq!(round(4.25), 4.3);
    }
}

//! Product repository
//!
//! Catalog queries (filter/sort/pagination) plus product and pricing-unit
//! CRUD. Pricing units live in their own table so stock mutations are
//! per-row; see `stock.rs` for the ledgered adjustments.

use super::{BaseRepository, RepoError, RepoResult, now_rfc3339, parse_record_id};
use crate::db::models::{
    Category, PricingUnit, PricingUnitInput, Product, ProductCreate, ProductUpdate,
};
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

const PRODUCT_TABLE: &str = "product";
const UNIT_TABLE: &str = "pricing_unit";
const SHOP_TABLE: &str = "shop";

// =============================================================================
// Catalog query
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
    Rating,
}

impl CatalogSort {
    /// Parse a sort key from a query param; unknown values default silently
    pub fn parse(s: &str) -> Self {
        match s {
            "price_asc" => CatalogSort::PriceAsc,
            "price_desc" => CatalogSort::PriceDesc,
            "name" => CatalogSort::Name,
            "rating" => CatalogSort::Rating,
            _ => CatalogSort::Newest,
        }
    }

    fn order_clause(self) -> &'static str {
        match self {
            CatalogSort::Newest => "created_at DESC",
            CatalogSort::PriceAsc => "min_price ASC",
            CatalogSort::PriceDesc => "min_price DESC",
            CatalogSort::Name => "name ASC",
            CatalogSort::Rating => "shop_rating DESC",
        }
    }
}

/// Buyer-facing catalog filters. Pagination is page/limit based.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    pub category: Option<Category>,
    /// Case-insensitive substring match on name/description
    pub search: Option<String>,
    pub shop: Option<String>,
    /// Price range in minor units, matched against pricing units
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_rating: Option<f64>,
    pub sort: CatalogSort,
    pub page: i64,
    pub limit: i64,
}

/// A catalog page plus the unpaginated match count
#[derive(Debug)]
pub struct CatalogPage {
    pub products: Vec<Product>,
    pub total: i64,
}

// Visibility rule shared by the page and count queries: only available
// products of active, approved shops, with the optional filters applied.
const CATALOG_WHERE: &str = "WHERE is_available = true \
     AND shop.is_active = true AND shop.approved = true \
     AND ($category = NONE OR category = $category) \
     AND ($term = NONE \
          OR string::contains(string::lowercase(name), $term) \
          OR string::contains(string::lowercase(description), $term)) \
     AND ($shop = NONE OR shop = $shop) \
     AND ($min_rating = NONE OR shop.rating >= $min_rating) \
     AND (($min_price = NONE AND $max_price = NONE) \
          OR array::len((SELECT VALUE id FROM pricing_unit \
              WHERE product = $parent.id AND is_active = true \
              AND ($min_price = NONE OR price >= $min_price) \
              AND ($max_price = NONE OR price <= $max_price))) > 0)";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Buyer-facing catalog page
    pub async fn catalog(&self, query: CatalogQuery) -> RepoResult<CatalogPage> {
        let shop_rid = match &query.shop {
            Some(s) => Some(parse_record_id(SHOP_TABLE, s)?),
            None => None,
        };
        let term = query.search.as_ref().map(|t| t.to_lowercase());
        let limit = query.limit.clamp(1, 100);
        let start = (query.page.max(1) - 1) * limit;

        let page_query = format!(
            "SELECT *, \
             math::min((SELECT VALUE price FROM pricing_unit \
                        WHERE product = $parent.id AND is_active = true)) AS min_price, \
             shop.rating AS shop_rating \
             FROM product {CATALOG_WHERE} \
             ORDER BY {} LIMIT $limit START $start",
            query.sort.order_clause()
        );
        let count_query = format!("SELECT count() AS total FROM product {CATALOG_WHERE} GROUP ALL");

        let mut result = self
            .base
            .db()
            .query(page_query)
            .query(count_query)
            .bind(("category", query.category))
            .bind(("term", term))
            .bind(("shop", shop_rid))
            .bind(("min_rating", query.min_rating))
            .bind(("min_price", query.min_price))
            .bind(("max_price", query.max_price))
            .bind(("limit", limit))
            .bind(("start", start))
            .await?;

        let products: Vec<Product> = result.take(0)?;

        #[derive(serde::Deserialize)]
        struct Count {
            total: i64,
        }
        let counts: Vec<Count> = result.take(1)?;
        let total = counts.into_iter().next().map(|c| c.total).unwrap_or(0);

        Ok(CatalogPage { products, total })
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let rid = parse_record_id(PRODUCT_TABLE, id)?;
        let product: Option<Product> = self.base.db().select(rid).await?;
        Ok(product)
    }

    /// Seller view: all products of a shop, available or not
    pub async fn list_by_shop(&self, shop_id: &str) -> RepoResult<Vec<Product>> {
        let shop_rid = parse_record_id(SHOP_TABLE, shop_id)?;
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE shop = $shop ORDER BY created_at DESC")
            .bind(("shop", shop_rid))
            .await?
            .take(0)?;
        Ok(products)
    }

    pub async fn create(&self, shop_id: &str, data: ProductCreate) -> RepoResult<Product> {
        if data.pricing_units.is_empty() {
            return Err(RepoError::Validation(
                "pricing_units cannot be empty".into(),
            ));
        }

        let shop_rid = parse_record_id(SHOP_TABLE, shop_id)?;
        let products: Vec<Product> = self
            .base
            .db()
            .query(
                "CREATE product SET \
                 shop = $shop, \
                 name = $name, \
                 description = $description, \
                 category = $category, \
                 images = $images, \
                 is_available = $is_available, \
                 created_at = $created_at",
            )
            .bind(("shop", shop_rid))
            .bind(("name", data.name))
            .bind(("description", data.description.unwrap_or_default()))
            .bind(("category", data.category))
            .bind(("images", data.images.unwrap_or_default()))
            .bind(("is_available", data.is_available.unwrap_or(true)))
            .bind(("created_at", now_rfc3339()))
            .await?
            .take(0)?;
        let created = products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create product".to_string()))?;

        let product_id = created
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Created product has no id".to_string()))?;
        for unit in data.pricing_units {
            self.create_unit(&product_id, unit).await?;
        }

        Ok(created)
    }

    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<Product> {
        let rid = parse_record_id(PRODUCT_TABLE, id)?;
        let products: Vec<Product> = self
            .base
            .db()
            .query(
                "UPDATE product SET \
                 name = IF $name != NONE THEN $name ELSE name END, \
                 description = IF $description != NONE THEN $description ELSE description END, \
                 category = IF $category != NONE THEN $category ELSE category END, \
                 images = IF $images != NONE THEN $images ELSE images END, \
                 is_available = IF $is_available != NONE THEN $is_available ELSE is_available END \
                 WHERE id = $id RETURN AFTER",
            )
            .bind(("id", rid))
            .bind(("name", data.name))
            .bind(("description", data.description))
            .bind(("category", data.category))
            .bind(("images", data.images))
            .bind(("is_available", data.is_available))
            .await?
            .take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {id}")))
    }

    /// Delete a product and its pricing units
    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let rid = parse_record_id(PRODUCT_TABLE, id)?;
        self.base
            .db()
            .query("DELETE pricing_unit WHERE product = $id")
            .query("DELETE $id")
            .bind(("id", rid))
            .await?
            .check()?;
        Ok(())
    }

    // =========================================================================
    // Pricing units
    // =========================================================================

    pub async fn create_unit(
        &self,
        product_id: &RecordId,
        input: PricingUnitInput,
    ) -> RepoResult<PricingUnit> {
        if input.price < 0 {
            return Err(RepoError::Validation("price must not be negative".into()));
        }
        if input.stock.is_some_and(|s| s < 0) {
            return Err(RepoError::Validation("stock must not be negative".into()));
        }

        let units: Vec<PricingUnit> = self
            .base
            .db()
            .query(
                "CREATE pricing_unit SET \
                 product = $product, \
                 unit = $unit, \
                 price = $price, \
                 stock = $stock, \
                 low_stock_threshold = $threshold, \
                 is_active = true",
            )
            .bind(("product", product_id.clone()))
            .bind(("unit", input.unit))
            .bind(("price", input.price))
            .bind(("stock", input.stock))
            .bind(("threshold", input.low_stock_threshold.unwrap_or(5)))
            .await?
            .take(0)?;
        units
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create pricing unit".to_string()))
    }

    pub async fn find_unit(&self, unit_id: &str) -> RepoResult<Option<PricingUnit>> {
        let rid = parse_record_id(UNIT_TABLE, unit_id)?;
        let unit: Option<PricingUnit> = self.base.db().select(rid).await?;
        Ok(unit)
    }

    pub async fn find_units(&self, product_id: &str) -> RepoResult<Vec<PricingUnit>> {
        let rid = parse_record_id(PRODUCT_TABLE, product_id)?;
        let units: Vec<PricingUnit> = self
            .base
            .db()
            .query("SELECT * FROM pricing_unit WHERE product = $product ORDER BY price")
            .bind(("product", rid))
            .await?
            .take(0)?;
        Ok(units)
    }

    pub async fn update_unit(
        &self,
        unit_id: &str,
        price: Option<i64>,
        low_stock_threshold: Option<i64>,
        is_active: Option<bool>,
    ) -> RepoResult<PricingUnit> {
        if price.is_some_and(|p| p < 0) {
            return Err(RepoError::Validation("price must not be negative".into()));
        }

        let rid = parse_record_id(UNIT_TABLE, unit_id)?;
        let units: Vec<PricingUnit> = self
            .base
            .db()
            .query(
                "UPDATE pricing_unit SET \
                 price = IF $price != NONE THEN $price ELSE price END, \
                 low_stock_threshold = IF $threshold != NONE THEN $threshold ELSE low_stock_threshold END, \
                 is_active = IF $is_active != NONE THEN $is_active ELSE is_active END \
                 WHERE id = $id RETURN AFTER",
            )
            .bind(("id", rid))
            .bind(("price", price))
            .bind(("threshold", low_stock_threshold))
            .bind(("is_active", is_active))
            .await?
            .take(0)?;
        units
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Pricing unit {unit_id}")))
    }

    pub async fn delete_unit(&self, unit_id: &str) -> RepoResult<()> {
        let rid = parse_record_id(UNIT_TABLE, unit_id)?;
        let _: Option<PricingUnit> = self.base.db().delete(rid).await?;
        Ok(())
    }
}

//! Shared test fixtures: in-memory database and seeded marketplace data

// not every test binary uses every fixture
#![allow(dead_code)]

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use sokoni_server::db::DbService;
use sokoni_server::db::models::{
    ApprovalStatus, CheckoutItem, CheckoutPayload, PricingUnitInput, ProductCreate, Role, User,
};
use sokoni_server::db::repository::{
    ProductRepository, ShopRepository, UserRepository, UserRoleRepository,
};
use sokoni_server::services::checkout::{self, CheckoutResult};

pub const PLATFORM_FEE_BPS: i64 = 1000;
pub const DEFAULT_DELIVERY_FEE: i64 = 500;

pub async fn mem_db() -> Surreal<Db> {
    DbService::new_memory()
        .await
        .expect("in-memory database")
        .db
}

pub async fn create_user(db: &Surreal<Db>, name: &str, email: &str) -> String {
    let hash = User::hash_password("correct horse battery").expect("hash");
    let user = UserRepository::new(db.clone())
        .create(name.to_string(), email.to_string(), None, hash)
        .await
        .expect("create user");
    user.id.expect("user id").to_string()
}

/// Seller with an APPROVED role and an approved, active shop
pub async fn create_seller_with_shop(db: &Surreal<Db>, email: &str) -> (String, String) {
    let user_id = create_user(db, "Seller", email).await;

    let roles = UserRoleRepository::new(db.clone());
    let role = roles.create(&user_id, Role::Seller).await.expect("role");
    let role_id = role.id.expect("role id").to_string();
    roles.set_kyc_verified(&role_id, true).await.expect("kyc");
    roles
        .set_status(&role_id, ApprovalStatus::Approved)
        .await
        .expect("approve");

    let shops = ShopRepository::new(db.clone());
    let shop = shops
        .create(
            &user_id,
            "Mama Njeri Groceries".to_string(),
            "Fresh produce".to_string(),
            Some(-1.286389),
            Some(36.817223),
        )
        .await
        .expect("shop");
    let shop_id = shop.id.expect("shop id").to_string();
    shops.set_approved(&shop_id, true).await.expect("approve shop");

    (user_id, shop_id)
}

pub async fn create_rider(db: &Surreal<Db>, email: &str, status: ApprovalStatus) -> String {
    let user_id = create_user(db, "Rider", email).await;
    let roles = UserRoleRepository::new(db.clone());
    let role = roles.create(&user_id, Role::Rider).await.expect("role");
    if status != ApprovalStatus::Pending {
        roles
            .set_status(&role.id.expect("role id").to_string(), status)
            .await
            .expect("status");
    }
    user_id
}

/// One product with a single pricing unit; `stock` of None means untracked
pub async fn seed_product(
    db: &Surreal<Db>,
    shop_id: &str,
    stock: Option<i64>,
) -> (String, String) {
    let products = ProductRepository::new(db.clone());
    let product = products
        .create(
            shop_id,
            ProductCreate {
                name: "Maize Flour".to_string(),
                description: Some("Fine grade".to_string()),
                category: sokoni_server::db::models::Category::Grains,
                images: None,
                is_available: Some(true),
                pricing_units: vec![PricingUnitInput {
                    unit: "2kg".to_string(),
                    price: 1450,
                    stock,
                    low_stock_threshold: Some(5),
                }],
            },
        )
        .await
        .expect("product");
    let product_id = product.id.expect("product id").to_string();
    let unit_id = products
        .find_units(&product_id)
        .await
        .expect("units")
        .pop()
        .expect("one unit")
        .id
        .expect("unit id")
        .to_string();
    (product_id, unit_id)
}

pub async fn place_order(
    db: &Surreal<Db>,
    buyer_id: &str,
    shop_id: &str,
    unit_id: &str,
    quantity: i64,
) -> CheckoutResult {
    checkout::checkout(
        db,
        buyer_id,
        CheckoutPayload {
            shop: shop_id.to_string(),
            items: vec![CheckoutItem {
                pricing_unit: unit_id.to_string(),
                quantity,
            }],
            dest_latitude: Some(-1.2921),
            dest_longitude: Some(36.8219),
        },
        PLATFORM_FEE_BPS,
        DEFAULT_DELIVERY_FEE,
    )
    .await
    .expect("checkout")
}

//! Seller order management, reviews, wishlist and token flows

mod common;

use sokoni_server::db::models::{ApprovalStatus, OrderStatus, Role, TokenPurpose};
use sokoni_server::db::repository::{
    NotificationRepository, OrderRepository, ReviewRepository, ShopRepository, StatsRepository,
    StockRepository, TokenRepository, UserRepository, UserRoleRepository, WishlistRepository,
    parse_record_id,
};
use sokoni_server::services::{inventory, order_flow, rating};

#[tokio::test]
async fn created_account_keeps_its_credentials() {
    let db = common::mem_db().await;
    let user_id = common::create_user(&db, "Amina", "amina@sokoni.test").await;

    let user = UserRepository::new(db.clone())
        .find_by_email("amina@sokoni.test")
        .await
        .unwrap()
        .expect("created user");
    assert_eq!(user.id.as_ref().unwrap().to_string(), user_id);
    assert!(user.verify_password("correct horse battery").unwrap());
    assert!(!user.verify_password("wrong password").unwrap());
}

#[tokio::test]
async fn bulk_update_counts_updated_and_skipped() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;
    let (other_seller, other_shop) =
        common::create_seller_with_shop(&db, "other-seller@sokoni.test").await;
    let _ = other_seller;
    let (_product, unit_id) = common::seed_product(&db, &shop_id, Some(50)).await;
    let (_product2, other_unit) = common::seed_product(&db, &other_shop, Some(50)).await;
    let buyer_id = common::create_user(&db, "Buyer", "buyer@sokoni.test").await;

    // two orders for this shop, one for a different shop
    let first = common::place_order(&db, &buyer_id, &shop_id, &unit_id, 1).await;
    let second = common::place_order(&db, &buyer_id, &shop_id, &unit_id, 2).await;
    let foreign = common::place_order(&db, &buyer_id, &other_shop, &other_unit, 1).await;

    let first_id = first.order.id.unwrap().to_string();
    let second_id = second.order.id.unwrap().to_string();
    let foreign_id = foreign.order.id.unwrap().to_string();

    // cancel the second so its transition is illegal
    sokoni_server::services::checkout::cancel(&db, &buyer_id, &second_id)
        .await
        .unwrap();

    let shop_rid = parse_record_id("shop", &shop_id).unwrap();
    let result = order_flow::seller_bulk_update(
        &db,
        &shop_rid,
        &[
            first_id.clone(),
            second_id,
            foreign_id,
            "order:missing".to_string(),
        ],
        OrderStatus::Preparing,
    )
    .await
    .unwrap();

    assert_eq!(result.updated, 1);
    assert_eq!(result.skipped, 3);

    let order = OrderRepository::new(db.clone())
        .find_by_id(&first_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Preparing);

    // the moved order produced a buyer notification
    let unread = NotificationRepository::new(db.clone())
        .unread_count(&buyer_id)
        .await
        .unwrap();
    assert!(unread >= 1);
}

#[tokio::test]
async fn one_review_per_order_and_cached_shop_rating() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;
    let (_product, unit_id) = common::seed_product(&db, &shop_id, Some(50)).await;
    let buyer_id = common::create_user(&db, "Buyer", "buyer@sokoni.test").await;

    let first = common::place_order(&db, &buyer_id, &shop_id, &unit_id, 1).await;
    let second = common::place_order(&db, &buyer_id, &shop_id, &unit_id, 1).await;

    let reviews = ReviewRepository::new(db.clone());
    let shop_rid = parse_record_id("shop", &shop_id).unwrap();
    let buyer_rid = parse_record_id("user", &buyer_id).unwrap();

    let first_rid = first.order.id.unwrap();
    reviews
        .create(&first_rid, &shop_rid, &buyer_rid, 5, None)
        .await
        .unwrap();

    // same order again is a conflict
    let duplicate = reviews
        .create(&first_rid, &shop_rid, &buyer_rid, 3, None)
        .await;
    assert!(duplicate.is_err());

    reviews
        .create(
            &second.order.id.unwrap(),
            &shop_rid,
            &buyer_rid,
            2,
            Some("Late delivery".to_string()),
        )
        .await
        .unwrap();

    rating::recompute_shop_rating(&db, &shop_id).await.unwrap();
    let shop = ShopRepository::new(db.clone())
        .find_by_id(&shop_id)
        .await
        .unwrap()
        .unwrap();
    // mean of 5 and 2, one decimal place
    assert!((shop.rating - 3.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn shop_rating_resets_when_reviews_disappear() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;

    let shops = ShopRepository::new(db.clone());
    shops.set_rating(&shop_id, 4.0).await.unwrap();

    // no reviews exist, so a recompute goes back to zero
    let recomputed = rating::recompute_shop_rating(&db, &shop_id).await.unwrap();
    assert_eq!(recomputed, 0.0);

    let shop = shops.find_by_id(&shop_id).await.unwrap().unwrap();
    assert_eq!(shop.rating, 0.0);
}

#[tokio::test]
async fn platform_stats_count_order_buckets_and_pending_applications() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;
    let (_product, unit_id) = common::seed_product(&db, &shop_id, Some(50)).await;
    let buyer_id = common::create_user(&db, "Buyer", "buyer@sokoni.test").await;
    common::place_order(&db, &buyer_id, &shop_id, &unit_id, 1).await;

    // one rider still waiting on review; the seller is already approved
    common::create_rider(&db, "rider@sokoni.test", ApprovalStatus::Pending).await;

    let stats = StatsRepository::new(db.clone()).platform().await.unwrap();
    assert_eq!(stats.orders, 1);
    assert_eq!(stats.pending_applications, 1);

    let pending = stats
        .orders_by_status
        .iter()
        .find(|bucket| bucket.status == OrderStatus::Pending)
        .expect("pending bucket");
    assert_eq!(pending.count, 1);
    assert_eq!(stats.delivered_revenue, 0);
}

#[tokio::test]
async fn wishlist_is_deduplicated_per_user() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;
    let (product_id, _unit) = common::seed_product(&db, &shop_id, None).await;
    let buyer_id = common::create_user(&db, "Buyer", "buyer@sokoni.test").await;

    let wishlist = WishlistRepository::new(db.clone());
    wishlist.add(&buyer_id, &product_id).await.unwrap();
    assert!(wishlist.add(&buyer_id, &product_id).await.is_err());

    // a different user can wishlist the same product
    let other_id = common::create_user(&db, "Other", "other@sokoni.test").await;
    wishlist.add(&other_id, &product_id).await.unwrap();

    assert!(wishlist.remove(&buyer_id, &product_id).await.unwrap());
    assert!(!wishlist.remove(&buyer_id, &product_id).await.unwrap());
    assert!(wishlist.list_for_user(&buyer_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn issuing_a_token_burns_the_previous_one() {
    let db = common::mem_db().await;
    let user_id = common::create_user(&db, "User", "user@sokoni.test").await;

    let tokens = TokenRepository::new(db.clone());
    let expires = (chrono::Utc::now() + chrono::Duration::minutes(30)).to_rfc3339();

    tokens
        .issue(&user_id, TokenPurpose::PasswordReset, "hash-one".to_string(), expires.clone())
        .await
        .unwrap();
    let newest = tokens
        .issue(&user_id, TokenPurpose::PasswordReset, "hash-two".to_string(), expires)
        .await
        .unwrap();

    let live = tokens
        .find_live(&user_id, TokenPurpose::PasswordReset)
        .await
        .unwrap()
        .expect("live token");
    assert_eq!(live.token_hash, "hash-two");

    // consume once, then the raced second consume finds nothing
    let token_id = newest.id.unwrap().to_string();
    assert!(tokens.consume(&token_id).await.unwrap().is_some());
    assert!(tokens.consume(&token_id).await.unwrap().is_none());
    assert!(
        tokens
            .find_live(&user_id, TokenPurpose::PasswordReset)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn role_rows_are_unique_per_user_and_role() {
    let db = common::mem_db().await;
    let user_id = common::create_user(&db, "User", "user@sokoni.test").await;

    let roles = UserRoleRepository::new(db.clone());
    roles.create(&user_id, Role::Seller).await.unwrap();
    assert!(roles.create(&user_id, Role::Seller).await.is_err());
    // a different role is fine
    roles.create(&user_id, Role::Rider).await.unwrap();
}

#[tokio::test]
async fn manual_stock_set_tracks_and_adjusts_through_the_ledger() {
    let db = common::mem_db().await;
    let (_seller, shop_id) = common::create_seller_with_shop(&db, "seller@sokoni.test").await;
    let (_product, unit_id) = common::seed_product(&db, &shop_id, None).await;

    // setting an untracked unit puts it under tracking at that level
    let unit = inventory::set_stock(&db, &unit_id, 12, None).await.unwrap();
    assert_eq!(unit.stock, Some(12));

    // a second set becomes a delta against the current count
    let unit = inventory::set_stock(&db, &unit_id, 9, None).await.unwrap();
    assert_eq!(unit.stock, Some(9));

    let history = StockRepository::new(db.clone())
        .history(&unit_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    let tracked = history.iter().find(|c| c.delta == 12).expect("tracking row");
    assert_eq!(tracked.stock_after, Some(12));
    let adjusted = history.iter().find(|c| c.delta == -3).expect("delta row");
    assert_eq!(adjusted.stock_after, Some(9));
}

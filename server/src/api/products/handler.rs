//! Public product catalog handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::{Category, ProductFull};
use crate::db::repository::ProductRepository;
use crate::db::repository::product::{CatalogQuery, CatalogSort};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct CatalogParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub shop: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_rating: Option<f64>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub products: Vec<ProductFull>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// GET /api/products - browse the catalog
pub async fn catalog(
    State(state): State<ServerState>,
    Query(params): Query<CatalogParams>,
) -> AppResult<Json<CatalogResponse>> {
    let category = match &params.category {
        Some(c) => Some(
            Category::parse(c)
                .ok_or_else(|| AppError::validation(format!("Unknown category '{c}'")))?,
        ),
        None => None,
    };

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let repo = ProductRepository::new(state.db.clone());
    let result = repo
        .catalog(CatalogQuery {
            category,
            search: params.search,
            shop: params.shop,
            min_price: params.min_price,
            max_price: params.max_price,
            min_rating: params.min_rating,
            sort: params.sort.as_deref().map(CatalogSort::parse).unwrap_or_default(),
            page,
            limit,
        })
        .await?;

    let mut products = Vec::with_capacity(result.products.len());
    for product in result.products {
        let units = match &product.id {
            Some(id) => repo.find_units(&id.to_string()).await?,
            None => vec![],
        };
        products.push(ProductFull {
            product,
            pricing_units: units,
        });
    }

    Ok(Json(CatalogResponse {
        products,
        total: result.total,
        page,
        limit,
    }))
}

/// GET /api/products/:id - product with its pricing units
pub async fn get_full(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ProductFull>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id}")))?;
    let pricing_units = repo.find_units(&id).await?;

    Ok(Json(ProductFull {
        product,
        pricing_units,
    }))
}

//! CSV catalog import/export for sellers
//!
//! One row per pricing unit; consecutive rows sharing a product name are
//! grouped into one product on import. Image URLs are semicolon-joined
//! inside their cell. Import is row-validated: bad rows are reported and
//! skipped, good ones still land.

use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::info;

use crate::db::models::{Category, PricingUnitInput, ProductCreate};
use crate::db::repository::ProductRepository;
use crate::utils::{AppError, AppResult};

const HEADERS: [&str; 9] = [
    "Name",
    "Description",
    "Category",
    "Images",
    "Unit",
    "Price",
    "Stock",
    "LowStockThreshold",
    "IsAvailable",
];

#[derive(Debug, Serialize)]
pub struct ImportResult {
    pub products_created: usize,
    pub rows_imported: usize,
    pub errors: Vec<String>,
}

/// Export a shop's full catalog as CSV
pub async fn export(db: &Surreal<Db>, shop_id: &str) -> AppResult<String> {
    let products = ProductRepository::new(db.clone());
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(HEADERS)
        .map_err(|e| AppError::internal(format!("CSV write failed: {e}")))?;

    for product in products.list_by_shop(shop_id).await? {
        let product_id = match &product.id {
            Some(id) => id.to_string(),
            None => continue,
        };
        for unit in products.find_units(&product_id).await? {
            writer
                .write_record([
                    product.name.as_str(),
                    product.description.as_str(),
                    product.category.as_str(),
                    &product.images.join(";"),
                    unit.unit.as_str(),
                    &unit.price.to_string(),
                    &unit.stock.map(|s| s.to_string()).unwrap_or_default(),
                    &unit.low_stock_threshold.to_string(),
                    if product.is_available { "true" } else { "false" },
                ])
                .map_err(|e| AppError::internal(format!("CSV write failed: {e}")))?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::internal(format!("CSV write failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| AppError::internal(format!("CSV encoding failed: {e}")))
}

/// Parsed import row
struct Row {
    name: String,
    description: String,
    category: Category,
    images: Vec<String>,
    is_available: bool,
    unit: PricingUnitInput,
}

/// Import products from CSV into a shop. Consecutive rows with the same
/// product name become one product with several pricing units.
pub async fn import(db: &Surreal<Db>, shop_id: &str, data: &[u8]) -> AppResult<ImportResult> {
    let mut reader = csv::Reader::from_reader(data);

    {
        let headers = reader
            .headers()
            .map_err(|e| AppError::validation(format!("Invalid CSV: {e}")))?;
        if headers.iter().collect::<Vec<_>>() != HEADERS {
            return Err(AppError::validation(format!(
                "Expected headers: {}",
                HEADERS.join(",")
            )));
        }
    }

    let mut errors = Vec::new();
    let mut rows: Vec<Row> = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // header is line 1
        let line = index + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                errors.push(format!("line {line}: {e}"));
                continue;
            }
        };
        match parse_row(&record) {
            Ok(row) => rows.push(row),
            Err(e) => errors.push(format!("line {line}: {e}")),
        }
    }

    let products = ProductRepository::new(db.clone());
    let mut products_created = 0;
    let mut rows_imported = 0;

    let mut pending: Option<(Row, Vec<PricingUnitInput>)> = None;
    for row in rows {
        match &mut pending {
            Some((head, units)) if head.name == row.name => units.push(row.unit),
            _ => {
                if let Some(group) = pending.take() {
                    match create_group(&products, shop_id, group).await {
                        Ok(units) => {
                            products_created += 1;
                            rows_imported += units;
                        }
                        Err(e) => errors.push(e),
                    }
                }
                pending = Some((row, Vec::new()));
            }
        }
    }
    if let Some(group) = pending.take() {
        match create_group(&products, shop_id, group).await {
            Ok(units) => {
                products_created += 1;
                rows_imported += units;
            }
            Err(e) => errors.push(e),
        }
    }

    info!(
        target: "catalog",
        shop = %shop_id,
        products = products_created,
        errors = errors.len(),
        "Catalog import finished"
    );
    Ok(ImportResult {
        products_created,
        rows_imported,
        errors,
    })
}

async fn create_group(
    products: &ProductRepository,
    shop_id: &str,
    (head, mut extra_units): (Row, Vec<PricingUnitInput>),
) -> Result<usize, String> {
    let name = head.name.clone();
    let mut pricing_units = vec![head.unit];
    pricing_units.append(&mut extra_units);
    let count = pricing_units.len();

    products
        .create(
            shop_id,
            ProductCreate {
                name: head.name,
                description: Some(head.description),
                category: head.category,
                images: Some(head.images),
                is_available: Some(head.is_available),
                pricing_units,
            },
        )
        .await
        .map_err(|e| format!("product '{name}': {e}"))?;
    Ok(count)
}

fn parse_row(record: &csv::StringRecord) -> Result<Row, String> {
    let field = |i: usize| record.get(i).unwrap_or("").trim();

    let name = field(0).to_string();
    if name.is_empty() {
        return Err("Name is required".to_string());
    }

    let category = Category::parse(field(2))
        .ok_or_else(|| format!("Unknown category '{}'", field(2)))?;

    let images: Vec<String> = field(3)
        .split(';')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let unit_label = field(4).to_string();
    if unit_label.is_empty() {
        return Err("Unit is required".to_string());
    }

    let price: i64 = field(5)
        .parse()
        .map_err(|_| format!("Invalid price '{}'", field(5)))?;
    if price < 0 {
        return Err("Price must not be negative".to_string());
    }

    let stock = match field(6) {
        "" => None,
        s => Some(
            s.parse::<i64>()
                .map_err(|_| format!("Invalid stock '{s}'"))?,
        ),
    };
    if stock.is_some_and(|s| s < 0) {
        return Err("Stock must not be negative".to_string());
    }

    let low_stock_threshold = match field(7) {
        "" => None,
        s => Some(
            s.parse::<i64>()
                .map_err(|_| format!("Invalid low stock threshold '{s}'"))?,
        ),
    };

    let is_available = match field(8).to_lowercase().as_str() {
        "" | "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        other => return Err(format!("Invalid availability '{other}'")),
    };

    Ok(Row {
        name,
        description: field(1).to_string(),
        category,
        images,
        is_available,
        unit: PricingUnitInput {
            unit: unit_label,
            price,
            stock,
            low_stock_threshold,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_row() {
        let record = csv::StringRecord::from(vec![
            "Maize Flour",
            "Fine grade",
            "GRAINS",
            "http://a/1.jpg;http://a/2.jpg",
            "2kg",
            "1450",
            "30",
            "5",
            "true",
        ]);
        let row = parse_row(&record).unwrap();
        assert_eq!(row.name, "Maize Flour");
        assert_eq!(row.category, Category::Grains);
        assert_eq!(row.images.len(), 2);
        assert_eq!(row.unit.price, 1450);
        assert_eq!(row.unit.stock, Some(30));
    }

    #[test]
    fn empty_stock_means_untracked() {
        let record = csv::StringRecord::from(vec![
            "Milk", "", "DAIRY", "", "500ml", "60", "", "", "",
        ]);
        let row = parse_row(&record).unwrap();
        assert_eq!(row.unit.stock, None);
        assert!(row.is_available);
    }

    #[test]
    fn rejects_bad_category_and_price() {
        let bad_category = csv::StringRecord::from(vec![
            "X", "", "VEHICLES", "", "1pc", "100", "", "", "",
        ]);
        assert!(parse_row(&bad_category).is_err());

        let bad_price = csv::StringRecord::from(vec![
            "X", "", "OTHER", "", "1pc", "-5", "", "", "",
        ]);
        assert!(parse_row(&bad_price).is_err());
    }
}

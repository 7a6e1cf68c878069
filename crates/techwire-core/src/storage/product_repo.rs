use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Database;
use crate::content::{Availability, Currency, NewProduct, Product};
use crate::Result;

/// Repository for scraped product records
pub struct ProductRepository<'a> {
    db: &'a Database,
}

/// Outcome of a scrape-driven upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductUpsert {
    Inserted,
    Updated,
}

#[derive(FromRow)]
struct ProductRow {
    id: String,
    name: Option<String>,
    brand: Option<String>,
    price: Option<f64>,
    currency: String,
    description: Option<String>,
    image_url: Option<String>,
    specs: String,
    features: String,
    rating_value: Option<f64>,
    rating_count: Option<i64>,
    availability: String,
    source_url: String,
    categories: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            name: row.name,
            brand: row.brand,
            price: row.price,
            currency: Currency::parse(&row.currency),
            description: row.description,
            image_url: row.image_url,
            specs: serde_json::from_str(&row.specs).unwrap_or_default(),
            features: serde_json::from_str(&row.features).unwrap_or_default(),
            rating_value: row.rating_value,
            rating_count: row.rating_count,
            availability: Availability::parse(&row.availability),
            source_url: row.source_url,
            categories: serde_json::from_str(&row.categories).unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = r#"
    id, name, brand, price, currency, description, image_url, specs, features,
    rating_value, rating_count, availability, source_url, categories,
    created_at, updated_at
"#;

impl<'a> ProductRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Upsert a scraped product, deduplicating by source_url.
    ///
    /// A second scrape of the same URL updates non-identity fields in place;
    /// id and created_at are preserved.
    pub async fn upsert(&self, product: &NewProduct) -> Result<ProductUpsert> {
        let now = Utc::now();
        let specs = serde_json::to_string(&product.specs)?;
        let features = serde_json::to_string(&product.features)?;
        let categories = serde_json::to_string(&product.categories)?;

        // Try insert first; a source_url conflict means the product exists
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO products
            (id, name, brand, price, currency, description, image_url, specs,
             features, rating_value, rating_count, availability, source_url,
             categories, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&product.name)
        .bind(&product.brand)
        .bind(product.price)
        .bind(product.currency.code())
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(&specs)
        .bind(&features)
        .bind(product.rating_value)
        .bind(product.rating_count)
        .bind(product.availability.as_str())
        .bind(&product.source_url)
        .bind(&categories)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() > 0 {
            return Ok(ProductUpsert::Inserted);
        }

        sqlx::query(
            r#"
            UPDATE products
            SET name = COALESCE(?, name),
                brand = COALESCE(?, brand),
                price = COALESCE(?, price),
                currency = ?,
                description = COALESCE(?, description),
                image_url = COALESCE(?, image_url),
                specs = ?,
                features = ?,
                rating_value = COALESCE(?, rating_value),
                rating_count = COALESCE(?, rating_count),
                availability = ?,
                categories = ?,
                updated_at = ?
            WHERE source_url = ?
            "#,
        )
        .bind(&product.name)
        .bind(&product.brand)
        .bind(product.price)
        .bind(product.currency.code())
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(&specs)
        .bind(&features)
        .bind(product.rating_value)
        .bind(product.rating_count)
        .bind(product.availability.as_str())
        .bind(&categories)
        .bind(now)
        .bind(&product.source_url)
        .execute(self.db.pool())
        .await?;

        Ok(ProductUpsert::Updated)
    }

    /// Find a product by its source URL
    pub async fn find_by_source_url(&self, source_url: &str) -> Result<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE source_url = ?",
            PRODUCT_COLUMNS
        ))
        .bind(source_url)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Product::from))
    }

    /// List the most recently updated products
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products ORDER BY updated_at DESC LIMIT ?",
            PRODUCT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get total product count
    pub async fn count(&self) -> Result<u32> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0 as u32)
    }
}

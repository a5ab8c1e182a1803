use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pressroom_catalog::{OptionGroup, Product};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::{ProductRepository, StoreError, StoreResult};

const PRODUCT_COLUMNS: &str =
    "id, name, slug, description, base_price, quote_only, is_active, option_groups, created_at, updated_at";

pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    base_price: Decimal,
    quote_only: bool,
    is_active: bool,
    option_groups: Json<Vec<OptionGroup>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            base_price: row.base_price,
            quote_only: row.quote_only,
            is_active: row.is_active,
            option_groups: row.option_groups.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Unique violations on `slug` become `Conflict`.
fn map_write_error(e: sqlx::Error, slug: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("product slug '{}'", slug))
        }
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, slug, description, base_price, quote_only, is_active, option_groups, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.base_price)
        .bind(product.quote_only)
        .bind(product.is_active)
        .bind(Json(&product.option_groups))
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &product.slug))?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Product::from))
    }

    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {} FROM products WHERE slug = $1", PRODUCT_COLUMNS))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Product::from))
    }

    async fn list(&self, active_only: bool) -> StoreResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE ($1 = FALSE OR is_active) ORDER BY name",
            PRODUCT_COLUMNS
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn update(&self, product: &Product) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, slug = $3, description = $4, base_price = $5, quote_only = $6,
                is_active = $7, option_groups = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.base_price)
        .bind(product.quote_only)
        .bind(product.is_active)
        .bind(Json(&product.option_groups))
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &product.slug))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("product {}", product.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("product {}", id)));
        }
        Ok(())
    }
}

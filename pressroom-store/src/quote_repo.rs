use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pressroom_catalog::PriceBreakdown;
use pressroom_quote::{CustomerInfo, PriceMatchRequest, PriceMatchStatus, QuoteRequest, QuoteStatus};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::{PriceMatchRepository, QuoteFilter, QuoteRepository, StoreError, StoreResult};

pub struct PgQuoteRepository {
    pool: PgPool,
}

impl PgQuoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct QuoteRow {
    id: Uuid,
    reference: String,
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    customer_company: Option<String>,
    product_id: Option<Uuid>,
    product_name: Option<String>,
    project_description: String,
    quantity_text: Option<String>,
    deadline: Option<String>,
    attachment_urls: Json<Vec<String>>,
    include_vat: bool,
    quoted_price: Option<Decimal>,
    admin_notes: Option<String>,
    status: String,
    order_id: Option<Uuid>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<QuoteRow> for QuoteRequest {
    type Error = StoreError;

    fn try_from(row: QuoteRow) -> Result<Self, Self::Error> {
        Ok(QuoteRequest {
            id: row.id,
            reference: row.reference,
            customer: CustomerInfo {
                name: row.customer_name,
                email: row.customer_email,
                phone: row.customer_phone,
                company: row.customer_company,
            },
            product_id: row.product_id,
            product_name: row.product_name,
            project_description: row.project_description,
            quantity_text: row.quantity_text,
            deadline: row.deadline,
            attachment_urls: row.attachment_urls.0,
            include_vat: row.include_vat,
            quoted_price: row.quoted_price,
            admin_notes: row.admin_notes,
            status: row.status.parse::<QuoteStatus>().map_err(|e| StoreError::Decode(e.to_string()))?,
            order_id: row.order_id,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const QUOTE_COLUMNS: &str = "id, reference, customer_name, customer_email, customer_phone, customer_company, \
     product_id, product_name, project_description, quantity_text, deadline, attachment_urls, include_vat, \
     quoted_price, admin_notes, status, order_id, expires_at, created_at, updated_at";

#[async_trait]
impl QuoteRepository for PgQuoteRepository {
    async fn create(&self, quote: &QuoteRequest) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO quote_requests (id, reference, customer_name, customer_email, customer_phone, customer_company,
                                        product_id, product_name, project_description, quantity_text, deadline,
                                        attachment_urls, include_vat, quoted_price, admin_notes, status, order_id,
                                        expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(quote.id)
        .bind(&quote.reference)
        .bind(&quote.customer.name)
        .bind(&quote.customer.email)
        .bind(&quote.customer.phone)
        .bind(&quote.customer.company)
        .bind(quote.product_id)
        .bind(&quote.product_name)
        .bind(&quote.project_description)
        .bind(&quote.quantity_text)
        .bind(&quote.deadline)
        .bind(Json(&quote.attachment_urls))
        .bind(quote.include_vat)
        .bind(quote.quoted_price)
        .bind(&quote.admin_notes)
        .bind(quote.status.as_str())
        .bind(quote.order_id)
        .bind(quote.expires_at)
        .bind(quote.created_at)
        .bind(quote.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<QuoteRequest>> {
        let row: Option<QuoteRow> =
            sqlx::query_as(&format!("SELECT {} FROM quote_requests WHERE id = $1", QUOTE_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(QuoteRequest::try_from).transpose()
    }

    async fn list(&self, filter: &QuoteFilter) -> StoreResult<Vec<QuoteRequest>> {
        let rows: Vec<QuoteRow> = sqlx::query_as(&format!(
            "SELECT {} FROM quote_requests \
             WHERE ($1::TEXT IS NULL OR status = $1) \
               AND ($2::TEXT IS NULL OR LOWER(customer_email) = LOWER($2)) \
             ORDER BY created_at DESC",
            QUOTE_COLUMNS
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(&filter.customer_email)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(QuoteRequest::try_from).collect()
    }

    async fn update(&self, quote: &QuoteRequest) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE quote_requests
            SET quoted_price = $2, admin_notes = $3, status = $4, order_id = $5, expires_at = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(quote.id)
        .bind(quote.quoted_price)
        .bind(&quote.admin_notes)
        .bind(quote.status.as_str())
        .bind(quote.order_id)
        .bind(quote.expires_at)
        .bind(quote.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("quote {}", quote.id)));
        }
        Ok(())
    }

    async fn update_if_status(&self, quote: &QuoteRequest, expected: QuoteStatus) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE quote_requests
            SET quoted_price = $2, admin_notes = $3, status = $4, order_id = $5, expires_at = $6, updated_at = $7
            WHERE id = $1 AND status = $8
            "#,
        )
        .bind(quote.id)
        .bind(quote.quoted_price)
        .bind(&quote.admin_notes)
        .bind(quote.status.as_str())
        .bind(quote.order_id)
        .bind(quote.expires_at)
        .bind(quote.updated_at)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::StaleWrite(format!("quote {} is no longer {}", quote.id, expected.as_str())));
        }
        Ok(())
    }
}

pub struct PgPriceMatchRepository {
    pool: PgPool,
}

impl PgPriceMatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PriceMatchRow {
    id: Uuid,
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    customer_company: Option<String>,
    product_id: Option<Uuid>,
    product_name: String,
    competitor_name: String,
    competitor_url: Option<String>,
    competitor_price_text: String,
    competitor_price: Decimal,
    include_vat: bool,
    offered_price: Option<Json<PriceBreakdown>>,
    notes: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PriceMatchRow> for PriceMatchRequest {
    type Error = StoreError;

    fn try_from(row: PriceMatchRow) -> Result<Self, Self::Error> {
        Ok(PriceMatchRequest {
            id: row.id,
            customer: CustomerInfo {
                name: row.customer_name,
                email: row.customer_email,
                phone: row.customer_phone,
                company: row.customer_company,
            },
            product_id: row.product_id,
            product_name: row.product_name,
            competitor_name: row.competitor_name,
            competitor_url: row.competitor_url,
            competitor_price_text: row.competitor_price_text,
            competitor_price: row.competitor_price,
            include_vat: row.include_vat,
            offered_price: row.offered_price.map(|o| o.0),
            notes: row.notes,
            status: row
                .status
                .parse::<PriceMatchStatus>()
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PRICE_MATCH_COLUMNS: &str = "id, customer_name, customer_email, customer_phone, customer_company, product_id, \
     product_name, competitor_name, competitor_url, competitor_price_text, competitor_price, include_vat, \
     offered_price, notes, status, created_at, updated_at";

#[async_trait]
impl PriceMatchRepository for PgPriceMatchRepository {
    async fn create(&self, request: &PriceMatchRequest) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO price_match_requests (id, customer_name, customer_email, customer_phone, customer_company,
                                              product_id, product_name, competitor_name, competitor_url,
                                              competitor_price_text, competitor_price, include_vat, offered_price,
                                              notes, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(request.id)
        .bind(&request.customer.name)
        .bind(&request.customer.email)
        .bind(&request.customer.phone)
        .bind(&request.customer.company)
        .bind(request.product_id)
        .bind(&request.product_name)
        .bind(&request.competitor_name)
        .bind(&request.competitor_url)
        .bind(&request.competitor_price_text)
        .bind(request.competitor_price)
        .bind(request.include_vat)
        .bind(request.offered_price.as_ref().map(Json))
        .bind(&request.notes)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<PriceMatchRequest>> {
        let row: Option<PriceMatchRow> = sqlx::query_as(&format!(
            "SELECT {} FROM price_match_requests WHERE id = $1",
            PRICE_MATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PriceMatchRequest::try_from).transpose()
    }

    async fn list(&self, status: Option<PriceMatchStatus>) -> StoreResult<Vec<PriceMatchRequest>> {
        let rows: Vec<PriceMatchRow> = sqlx::query_as(&format!(
            "SELECT {} FROM price_match_requests WHERE ($1::TEXT IS NULL OR status = $1) ORDER BY created_at DESC",
            PRICE_MATCH_COLUMNS
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PriceMatchRequest::try_from).collect()
    }

    async fn update(&self, request: &PriceMatchRequest) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE price_match_requests
            SET offered_price = $2, notes = $3, status = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(request.id)
        .bind(request.offered_price.as_ref().map(Json))
        .bind(&request.notes)
        .bind(request.status.as_str())
        .bind(request.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("price match request {}", request.id)));
        }
        Ok(())
    }
}

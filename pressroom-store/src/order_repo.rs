use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pressroom_catalog::SelectedOption;
use pressroom_order::{Address, Order, OrderItem, OrderStatus, PaymentState};
use pressroom_quote::CustomerInfo;
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::repository::{OrderFilter, OrderRepository, StoreError, StoreResult};

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<OrderItem>>> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, product_id, product_name, options, quantity, unit_price, line_total
            FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, position
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            items.entry(order_id).or_default().push(row.try_into()?);
        }
        Ok(items)
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    customer_company: Option<String>,
    shipping_address: Option<Json<Address>>,
    subtotal: Decimal,
    tax: Decimal,
    total: Decimal,
    currency: String,
    include_vat: bool,
    status: String,
    payment_state: String,
    payment_reference: Option<String>,
    quote_id: Option<Uuid>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> StoreResult<Order> {
        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            customer: CustomerInfo {
                name: self.customer_name,
                email: self.customer_email,
                phone: self.customer_phone,
                company: self.customer_company,
            },
            shipping_address: self.shipping_address.map(|a| a.0),
            items,
            subtotal: self.subtotal,
            tax: self.tax,
            total: self.total,
            currency: self.currency,
            include_vat: self.include_vat,
            status: self.status.parse::<OrderStatus>().map_err(|e| StoreError::Decode(e.to_string()))?,
            payment_state: self
                .payment_state
                .parse::<PaymentState>()
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            payment_reference: self.payment_reference,
            quote_id: self.quote_id,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Option<Uuid>,
    product_name: String,
    options: Json<Vec<SelectedOption>>,
    quantity: i32,
    unit_price: Decimal,
    line_total: Decimal,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = StoreError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(OrderItem {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            options: row.options.0,
            quantity: u32::try_from(row.quantity)
                .map_err(|_| StoreError::Decode(format!("negative quantity on item {}", row.id)))?,
            unit_price: row.unit_price,
            line_total: row.line_total,
        })
    }
}

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_email, customer_phone, customer_company, \
     shipping_address, subtotal, tax, total, currency, include_vat, status, payment_state, payment_reference, \
     quote_id, notes, created_at, updated_at";

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create(&self, order: &Order) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, customer_name, customer_email, customer_phone, customer_company,
                                shipping_address, subtotal, tax, total, currency, include_vat, status, payment_state,
                                payment_reference, quote_id, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(&order.customer.name)
        .bind(&order.customer.email)
        .bind(&order.customer.phone)
        .bind(&order.customer.company)
        .bind(order.shipping_address.as_ref().map(Json))
        .bind(order.subtotal)
        .bind(order.tax)
        .bind(order.total)
        .bind(&order.currency)
        .bind(order.include_vat)
        .bind(order.status.as_str())
        .bind(order.payment_state.as_str())
        .bind(&order.payment_reference)
        .bind(order.quote_id)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            let quantity = i32::try_from(item.quantity)
                .map_err(|_| StoreError::Decode(format!("quantity {} out of range", item.quantity)))?;

            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, position, product_id, product_name, options, quantity, unit_price, line_total)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(item.id)
            .bind(order.id)
            .bind(position as i32)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(Json(&item.options))
            .bind(quantity)
            .bind(item.unit_price)
            .bind(item.line_total)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.load_items(&[row.id]).await?;
        let order_items = items.remove(&row.id).unwrap_or_default();
        row.into_order(order_items).map(Some)
    }

    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders \
             WHERE ($1::TEXT IS NULL OR status = $1) \
               AND ($2::TEXT IS NULL OR LOWER(customer_email) = LOWER($2)) \
             ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(&filter.customer_email)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut items = self.load_items(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_order(order_items)
            })
            .collect()
    }

    async fn update(&self, order: &Order) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET shipping_address = $2, status = $3, payment_state = $4, payment_reference = $5,
                notes = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(order.id)
        .bind(order.shipping_address.as_ref().map(Json))
        .bind(order.status.as_str())
        .bind(order.payment_state.as_str())
        .bind(&order.payment_reference)
        .bind(&order.notes)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("order {}", order.id)));
        }
        Ok(())
    }
}

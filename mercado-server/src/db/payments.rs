use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRow {
    pub id: i64,
    pub order_id: i64,
    pub stripe_id: String,
    pub amount: Decimal,
    pub status: String,
    pub vendor_id: i64,
    pub platform_fee: Decimal,
    pub created_at: i64,
}

pub struct NewPayment<'a> {
    pub order_id: i64,
    pub stripe_id: &'a str,
    pub amount: Decimal,
    pub vendor_id: i64,
    pub platform_fee: Decimal,
    pub now: i64,
}

pub async fn insert(pool: &PgPool, payment: &NewPayment<'_>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO payments (order_id, stripe_id, amount, status, vendor_id, platform_fee, created_at)
         VALUES ($1, $2, $3, 'pending', $4, $5, $6)
         RETURNING id",
    )
    .bind(payment.order_id)
    .bind(payment.stripe_id)
    .bind(payment.amount)
    .bind(payment.vendor_id)
    .bind(payment.platform_fee)
    .bind(payment.now)
    .fetch_one(pool)
    .await
}

/// Latest payment attempt for an order (refunds target this one)
pub async fn latest_for_order(
    pool: &PgPool,
    order_id: i64,
) -> Result<Option<PaymentRow>, sqlx::Error> {
    sqlx::query_as::<_, PaymentRow>(
        "SELECT id, order_id, stripe_id, amount, status, vendor_id, platform_fee, created_at
         FROM payments
         WHERE order_id = $1
         ORDER BY created_at DESC, id DESC
         LIMIT 1",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_for_order(pool: &PgPool, order_id: i64) -> Result<Vec<PaymentRow>, sqlx::Error> {
    sqlx::query_as::<_, PaymentRow>(
        "SELECT id, order_id, stripe_id, amount, status, vendor_id, platform_fee, created_at
         FROM payments
         WHERE order_id = $1
         ORDER BY created_at ASC, id ASC",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
}

pub async fn set_status(pool: &PgPool, id: i64, status: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE payments SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::payments::{self, PaymentRow};
use super::users::UserRow;
use super::vendors::{self, VendorRow};

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRow {
    pub id: i64,
    pub customer_id: i64,
    pub vendor_id: i64,
    pub total_price: Decimal,
    pub total_items: i32,
    pub status: String,
    pub shipping_status: String,
    pub shipping_address_id: i64,
    pub billing_address_id: i64,
    pub tracking_number: Option<String>,
    pub track_url: Option<String>,
    pub shipment_id: Option<i64>,
    pub label: Option<String>,
    pub carrier: Option<String>,
    pub service: Option<String>,
    pub total_shipping_price: Option<Decimal>,
    pub created_at: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub vendor_id: i64,
    pub quantity: i32,
    pub price: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// Product reference data read by the core (titles for checkout,
/// physical attributes for carrier packages)
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRow {
    pub id: i64,
    pub vendor_id: i64,
    pub title: String,
    pub description: String,
    pub pack_type: String,
    pub content: String,
    pub box_quantity: i32,
    pub weight: f64,
    pub weight_unit: String,
    pub length_unit: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

/// Address with resolved region names
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRow {
    pub id: i64,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub address: String,
    pub zip_code: String,
    pub city_name: Option<String>,
    pub state_code: Option<String>,
    pub country_code: Option<String>,
}

/// Line item joined with its product
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemWithProduct {
    #[serde(flatten)]
    pub item: OrderItemRow,
    pub product: ProductRow,
}

/// Full order context for detail/invoice/shipping assembly
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderContext {
    #[serde(flatten)]
    pub order: OrderRow,
    pub items: Vec<ItemWithProduct>,
    pub payments: Vec<PaymentRow>,
    pub customer: UserRow,
    pub billing_address: AddressRow,
    pub shipping_address: AddressRow,
    pub vendor: VendorRow,
}

/// Order summary for the list view (customer email joined in)
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummaryRow {
    pub id: i64,
    pub customer_id: i64,
    pub customer_email: String,
    pub vendor_id: i64,
    pub total_price: Decimal,
    pub total_items: i32,
    pub status: String,
    pub shipping_status: String,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub created_at: i64,
}

pub struct NewOrder {
    pub customer_id: i64,
    pub vendor_id: i64,
    pub total_price: Decimal,
    pub total_items: i32,
    pub shipping_address_id: i64,
    pub billing_address_id: i64,
    pub now: i64,
}

pub struct NewOrderItem {
    pub product_id: i64,
    pub vendor_id: i64,
    pub quantity: i32,
    pub price: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// Create the order and its line items in one transaction.
pub async fn create_with_items(
    pool: &PgPool,
    order: &NewOrder,
    items: &[NewOrderItem],
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let order_id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (customer_id, vendor_id, total_price, total_items,
                             status, shipping_status, shipping_address_id, billing_address_id,
                             created_at)
         VALUES ($1, $2, $3, $4, 'pending', 'pending', $5, $6, $7)
         RETURNING id",
    )
    .bind(order.customer_id)
    .bind(order.vendor_id)
    .bind(order.total_price)
    .bind(order.total_items)
    .bind(order.shipping_address_id)
    .bind(order.billing_address_id)
    .bind(order.now)
    .fetch_one(&mut *tx)
    .await?;

    for item in items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, vendor_id, quantity, price, discount, total)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.vendor_id)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.discount)
        .bind(item.total)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(order_id)
}

const ORDER_SELECT: &str = "SELECT id, customer_id, vendor_id, total_price, total_items, \
     status, shipping_status, shipping_address_id, billing_address_id, \
     tracking_number, track_url, shipment_id, label, carrier, service, \
     total_shipping_price, created_at FROM orders";

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// List filter shared by the page query and the total count
#[derive(Debug, Default)]
pub struct OrderFilter<'a> {
    /// Vendor scope; None means platform admin (all orders)
    pub vendor_id: Option<i64>,
    /// Case-insensitive substring match on customer email
    pub search: Option<&'a str>,
    pub order_status: Option<&'a str>,
    pub payment_status: Option<&'a str>,
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &OrderFilter<'a>) {
    if let Some(vendor_id) = filter.vendor_id {
        qb.push(" AND o.vendor_id = ").push_bind(vendor_id);
    }
    if let Some(search) = filter.search {
        qb.push(" AND u.email ILIKE ")
            .push_bind(format!("%{search}%"));
    }
    if let Some(status) = filter.order_status {
        qb.push(" AND o.status = ").push_bind(status);
    }
    if let Some(status) = filter.payment_status {
        qb.push(" AND EXISTS (SELECT 1 FROM payments p WHERE p.order_id = o.id AND p.status = ")
            .push_bind(status)
            .push(")");
    }
}

pub async fn list(
    pool: &PgPool,
    filter: &OrderFilter<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<OrderSummaryRow>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT o.id, o.customer_id, u.email AS customer_email, o.vendor_id,
                o.total_price, o.total_items, o.status, o.shipping_status,
                o.tracking_number, o.carrier, o.created_at
         FROM orders o
         JOIN users u ON u.id = o.customer_id
         WHERE 1=1",
    );
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    qb.build_query_as::<OrderSummaryRow>().fetch_all(pool).await
}

/// Total count under the same filter as [`list`]
pub async fn count(pool: &PgPool, filter: &OrderFilter<'_>) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*)
         FROM orders o
         JOIN users u ON u.id = o.customer_id
         WHERE 1=1",
    );
    push_filter(&mut qb, filter);

    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Conditional status transition (optimistic concurrency guard).
/// Returns false when the order's status was no longer `from`.
pub async fn set_status(
    pool: &PgPool,
    id: i64,
    from: &str,
    to: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
        .bind(to)
        .bind(id)
        .bind(from)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub struct ShipmentFields<'a> {
    pub tracking_number: &'a str,
    pub track_url: &'a str,
    pub shipment_id: i64,
    pub label: &'a str,
    pub carrier: &'a str,
    pub service: &'a str,
    pub total_shipping_price: Decimal,
}

/// Persist all shipment fields and flip `pending -> shipped` in one
/// conditional statement; all-or-nothing. Returns false when a
/// concurrent transition won.
pub async fn set_shipped(
    pool: &PgPool,
    id: i64,
    fields: &ShipmentFields<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders
         SET tracking_number = $1, track_url = $2, shipment_id = $3, label = $4,
             carrier = $5, service = $6, total_shipping_price = $7, status = 'shipped'
         WHERE id = $8 AND status = 'pending'",
    )
    .bind(fields.tracking_number)
    .bind(fields.track_url)
    .bind(fields.shipment_id)
    .bind(fields.label)
    .bind(fields.carrier)
    .bind(fields.service)
    .bind(fields.total_shipping_price)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

const ADDRESS_SELECT: &str = r#"
    SELECT a.id, a.receiver_name, a.receiver_phone, a.address, a.zip_code,
           ci.name AS city_name, s.iso_code AS state_code, co.iso_code AS country_code
    FROM addresses a
    LEFT JOIN cities ci ON ci.id = a.city_id
    LEFT JOIN states s ON s.id = a.state_id
    LEFT JOIN countries co ON co.id = a.country_id
"#;

async fn find_address(pool: &PgPool, id: i64) -> Result<Option<AddressRow>, sqlx::Error> {
    sqlx::query_as::<_, AddressRow>(&format!("{ADDRESS_SELECT} WHERE a.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

async fn items_with_products(
    pool: &PgPool,
    order_id: i64,
) -> Result<Vec<ItemWithProduct>, sqlx::Error> {
    let items = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, product_id, vendor_id, quantity, price, discount, total
         FROM order_items WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    let product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
    let products = sqlx::query_as::<_, ProductRow>(
        "SELECT id, vendor_id, title, description, pack_type, content, box_quantity,
                weight, weight_unit, length_unit, length, width, height
         FROM products WHERE id = ANY($1)",
    )
    .bind(&product_ids)
    .fetch_all(pool)
    .await?;

    let mut joined = Vec::with_capacity(items.len());
    for item in items {
        let product = products
            .iter()
            .find(|p| p.id == item.product_id)
            .cloned()
            .ok_or(sqlx::Error::RowNotFound)?;
        joined.push(ItemWithProduct { item, product });
    }
    Ok(joined)
}

/// Load the full order context (items+products, payments, customer,
/// addresses with region names, vendor). None if the order is absent.
pub async fn load_context(pool: &PgPool, id: i64) -> Result<Option<OrderContext>, sqlx::Error> {
    let Some(order) = find_by_id(pool, id).await? else {
        return Ok(None);
    };

    let items = items_with_products(pool, id).await?;
    let payments = payments::list_for_order(pool, id).await?;

    let customer = super::users::find_by_id(pool, order.customer_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    let billing_address = find_address(pool, order.billing_address_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    let shipping_address = find_address(pool, order.shipping_address_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    let vendor = vendors::find_by_id(pool, order.vendor_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    Ok(Some(OrderContext {
        order,
        items,
        payments,
        customer,
        billing_address,
        shipping_address,
        vendor,
    }))
}

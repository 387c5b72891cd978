//! Order lifecycle endpoints: creation, listing, shipping, cancellation
//!
//! Order creation is a small saga: ledger insert, then the gateway
//! payment intent, then the payment record. Each later step failing
//! leaves the earlier state intact and recoverable (the order stays
//! `pending`; an unrecorded intent is surfaced as an orphan, never
//! hidden). Cancellation reports a per-order outcome instead of
//! failing the whole batch.

use axum::extract::{Extension, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::order::OrderStatus;
use shared::util::now_millis;

use crate::auth::Identity;
use crate::db::{idempotency, orders, payments, users, vendors};
use crate::db::idempotency::ClaimOutcome;
use crate::db::orders::{NewOrder, NewOrderItem, OrderContext, OrderFilter, OrderSummaryRow};
use crate::envia::{PickupRequest, PickupSettings, PickupShipment, PickupWindow, RateQuote};
use crate::error::ApiResult;
use crate::invoice::{self, InvoiceDocument};
use crate::money;
use crate::shipping::{self, RATE_COMPARISON_CARRIERS};
use crate::state::AppState;
use crate::stripe::CheckoutLineItem;

const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_PAGE_SIZE: i64 = 10;
const FALLBACK_QUOTE_CARRIER: &str = "fedex";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItem {
    pub product_id: i64,
    pub vendor_id: i64,
    pub quantity: i32,
    pub price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    #[serde(default)]
    pub platform_fee: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<CreateOrderItem>,
    pub total_price: Decimal,
    pub total_items: i32,
    pub vendor_id: i64,
    pub shipping_address_id: i64,
    pub billing_address_id: i64,
    #[serde(default)]
    pub payment_details: Option<PaymentDetails>,
}

/// Request validation for order creation, separated so it is testable
/// without a running gateway.
fn validate_create_order(request: &CreateOrderRequest) -> Result<(), AppError> {
    if request.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    if request.total_price <= Decimal::ZERO {
        return Err(AppError::validation("totalPrice must be positive"));
    }
    if request.total_items <= 0 {
        return Err(AppError::validation("totalItems must be positive"));
    }
    for item in &request.items {
        if item.quantity <= 0 {
            return Err(AppError::validation("item quantity must be positive")
                .with_detail("productId", item.product_id));
        }
        if item.price < Decimal::ZERO || item.total < Decimal::ZERO || item.discount < Decimal::ZERO
        {
            return Err(AppError::validation("item amounts must not be negative")
                .with_detail("productId", item.product_id));
        }
    }

    let items_sum: Decimal = request.items.iter().map(|i| i.total).sum();
    if !money::reconciles(request.total_price, items_sum) {
        return Err(AppError::new(ErrorCode::OrderTotalMismatch)
            .with_detail("totalPrice", request.total_price.to_string())
            .with_detail("itemsSum", items_sum.to_string()));
    }
    Ok(())
}

fn idempotency_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

/// POST /orders/createorder
pub async fn create_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<serde_json::Value> {
    validate_create_order(&request)?;

    let now = now_millis();
    let key = idempotency_key(&headers);
    if let Some(key) = &key {
        match idempotency::claim(&state.pool, key, identity.user_id, now).await? {
            ClaimOutcome::Claimed => {}
            ClaimOutcome::Replay(response) => {
                return Ok(ApiResponse::success_with_message(
                    "Order created successfully",
                    response,
                ));
            }
            ClaimOutcome::InFlight => {
                return Err(AppError::new(ErrorCode::IdempotencyConflict).into());
            }
        }
    }

    let order = NewOrder {
        customer_id: identity.user_id,
        vendor_id: request.vendor_id,
        total_price: request.total_price,
        total_items: request.total_items,
        shipping_address_id: request.shipping_address_id,
        billing_address_id: request.billing_address_id,
        now,
    };
    let items: Vec<NewOrderItem> = request
        .items
        .iter()
        .map(|item| NewOrderItem {
            product_id: item.product_id,
            vendor_id: item.vendor_id,
            quantity: item.quantity,
            price: item.price,
            discount: item.discount,
            total: item.total,
        })
        .collect();

    let order_id = match orders::create_with_items(&state.pool, &order, &items).await {
        Ok(id) => id,
        Err(e) => {
            if let Some(key) = &key {
                let _ = idempotency::release(&state.pool, key).await;
            }
            return Err(e.into());
        }
    };

    let customer = users::find_by_id(&state.pool, identity.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let amount_minor = money::to_minor_units(request.total_price)
        .ok_or_else(|| AppError::validation("totalPrice is out of range"))?;

    // Deterministic gateway key: a timed-out intent call can be retried
    // without authorizing the customer twice.
    let intent_key = format!("order-{order_id}-intent");
    let intent = match state
        .stripe
        .create_payment_intent(
            amount_minor,
            &state.currency,
            customer.stripe_customer_id.as_deref(),
            order_id,
            &intent_key,
        )
        .await
    {
        Ok(intent) => intent,
        Err(e) => {
            // Order stays pending; the client may retry payment setup.
            if let Some(key) = &key {
                let _ = idempotency::release(&state.pool, key).await;
            }
            return Err(e.into());
        }
    };

    let platform_fee = request
        .payment_details
        .map(|d| d.platform_fee)
        .unwrap_or(Decimal::ZERO);
    let payment = payments::NewPayment {
        order_id,
        stripe_id: &intent.id,
        amount: request.total_price,
        vendor_id: request.vendor_id,
        platform_fee,
        now,
    };
    if let Err(e) = payments::insert(&state.pool, &payment).await {
        // The gateway authorized money we have no record of. Surface it
        // loudly; reconciliation needs the intent id.
        tracing::error!(
            order_id,
            intent_id = %intent.id,
            error = %e,
            "payment intent created but not recorded"
        );
        if let Some(key) = &key {
            let _ = idempotency::release(&state.pool, key).await;
        }
        return Err(AppError::new(ErrorCode::PaymentIntentOrphaned)
            .with_detail("orderId", order_id)
            .with_detail("intentId", intent.id.clone())
            .into());
    }

    let data = json!({
        "orderId": order_id,
        "clientSecret": intent.client_secret,
    });
    if let Some(key) = &key {
        idempotency::complete(&state.pool, key, &data).await?;
    }

    Ok(ApiResponse::success_with_message(
        "Order created successfully",
        data,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
    pub search: Option<String>,
    pub order_status: Option<String>,
    pub payment_status: Option<String>,
    #[serde(default)]
    pub page: i64,
    #[serde(default, alias = "rowsPerPage")]
    pub page_size: Option<i64>,
}

fn effective_page_size(requested: Option<i64>) -> i64 {
    requested
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListData {
    pub orders: Vec<OrderSummaryRow>,
    pub total_count: i64,
}

/// GET /orders/get_orders
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListOrdersQuery>,
) -> ApiResult<OrderListData> {
    // Admins see the whole marketplace; vendors only their own orders
    let vendor_id = if identity.role.is_admin() {
        None
    } else {
        let vendor = vendors::find_by_user_id(&state.pool, identity.user_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::VendorProfileRequired))?;
        Some(vendor.id)
    };

    let filter = OrderFilter {
        vendor_id,
        search: query.search.as_deref(),
        order_status: query.order_status.as_deref(),
        payment_status: query.payment_status.as_deref(),
    };
    let page_size = effective_page_size(query.page_size);
    let offset = query.page.max(0) * page_size;

    let orders = orders::list(&state.pool, &filter, page_size, offset).await?;
    let total_count = orders::count(&state.pool, &filter).await?;

    Ok(ApiResponse::success(OrderListData {
        orders,
        total_count,
    }))
}

#[derive(Debug, Deserialize)]
pub struct OrderIdQuery {
    pub id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailsData {
    #[serde(flatten)]
    pub order: OrderContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_data: Option<Vec<RateQuote>>,
}

/// GET /orders/get_order_details
///
/// The rate quote is best effort: a carrier outage degrades the detail
/// view, it never fails it.
pub async fn get_order_details(
    State(state): State<AppState>,
    Query(query): Query<OrderIdQuery>,
) -> ApiResult<OrderDetailsData> {
    let context = orders::load_context(&state.pool, query.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    let carrier = context
        .order
        .carrier
        .clone()
        .unwrap_or_else(|| FALLBACK_QUOTE_CARRIER.to_string());
    let request = shipping::shipment_request(
        shipping::vendor_origin(&context.vendor, None, &state.platform_country),
        shipping::address_destination(&context.shipping_address, &state.platform_country),
        shipping::packages_from_items(&context.items),
        &carrier,
    );
    let shipping_data = match state.envia.rate(&request).await {
        Ok(quotes) => Some(quotes),
        Err(e) => {
            tracing::warn!(order_id = query.id, error = %e, "rate quote unavailable");
            None
        }
    };

    Ok(ApiResponse::success(OrderDetailsData {
        order: context,
        shipping_data,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDataRequest {
    #[serde(alias = "order_id")]
    pub order_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingComparisonData {
    pub all_shipping_data: Vec<RateQuote>,
}

/// POST /orders/get_shiiping_data
///
/// Quotes every comparison carrier concurrently. Individual carrier
/// failures are logged and skipped; the comparison shows whoever
/// answered.
pub async fn get_shipping_data(
    State(state): State<AppState>,
    Json(request): Json<ShippingDataRequest>,
) -> ApiResult<ShippingComparisonData> {
    let context = orders::load_context(&state.pool, request.order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    let origin = shipping::vendor_origin(&context.vendor, None, &state.platform_country);
    let destination =
        shipping::address_destination(&context.shipping_address, &state.platform_country);
    let packages = shipping::packages_from_items(&context.items);

    let quotes = join_all(RATE_COMPARISON_CARRIERS.iter().map(|carrier| {
        let request = shipping::shipment_request(
            origin.clone(),
            destination.clone(),
            packages.clone(),
            carrier,
        );
        let envia = state.envia.clone();
        async move { (*carrier, envia.rate(&request).await) }
    }))
    .await;

    let mut all_shipping_data = Vec::new();
    for (carrier, result) in quotes {
        match result {
            Ok(quotes) => all_shipping_data.extend(quotes),
            Err(e) => {
                tracing::warn!(carrier, order_id = request.order_id, error = %e,
                    "carrier quote skipped");
            }
        }
    }

    Ok(ApiResponse::success(ShippingComparisonData {
        all_shipping_data,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrdersQuery {
    #[serde(alias = "orderIds")]
    pub order_ids: String,
}

fn parse_order_ids(raw: &str) -> Result<Vec<i64>, AppError> {
    let mut ids = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id = part
            .parse::<i64>()
            .map_err(|_| AppError::validation("orderIds must be a comma-separated list of ids"))?;
        ids.push(id);
    }
    if ids.is_empty() {
        return Err(AppError::validation("orderIds must not be empty"));
    }
    Ok(ids)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOutcome {
    pub order_id: i64,
    /// Final order status after this attempt
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// How a cancel request treats an order in a given status
#[derive(Debug, PartialEq, Eq)]
enum CancelPath {
    /// Conditionally flip the current status to `canceled`, then refund
    Cancel,
    /// Already canceled (a prior refund failed): retry the refund
    /// without a new transition
    RetryRefund,
    /// Terminal status; nothing to do
    Rejected,
}

fn cancel_path(status: OrderStatus) -> CancelPath {
    match status {
        OrderStatus::Canceled => CancelPath::RetryRefund,
        s if s.is_cancelable() => CancelPath::Cancel,
        _ => CancelPath::Rejected,
    }
}

async fn cancel_one(state: &AppState, order_id: i64) -> Result<CancelOutcome, sqlx::Error> {
    let Some(order) = orders::find_by_id(&state.pool, order_id).await? else {
        return Ok(CancelOutcome {
            order_id,
            status: "not_found".to_string(),
            refund_id: None,
            message: Some("Order not found".to_string()),
        });
    };

    let Some(status) = OrderStatus::from_db(&order.status) else {
        return Ok(CancelOutcome {
            order_id,
            status: order.status.clone(),
            refund_id: None,
            message: Some("Order has an unknown status".to_string()),
        });
    };
    match cancel_path(status) {
        CancelPath::Rejected => {
            return Ok(CancelOutcome {
                order_id,
                status: order.status.clone(),
                refund_id: None,
                message: Some(format!("Order is {} and cannot be canceled", order.status)),
            });
        }
        CancelPath::Cancel => {
            if !orders::set_status(&state.pool, order_id, status.as_db(), "canceled").await? {
                return Ok(CancelOutcome {
                    order_id,
                    status: "conflict".to_string(),
                    refund_id: None,
                    message: Some("Order status changed concurrently".to_string()),
                });
            }
        }
        CancelPath::RetryRefund => {}
    }

    let Some(payment) = payments::latest_for_order(&state.pool, order_id).await? else {
        return Ok(CancelOutcome {
            order_id,
            status: "canceled".to_string(),
            refund_id: None,
            message: Some("No payment recorded; nothing to refund".to_string()),
        });
    };

    if payment.status == "refunded" {
        // A prior attempt refunded the gateway but lost the final
        // transition; finish it without refunding twice.
        let status = if orders::set_status(&state.pool, order_id, "canceled", "refunded").await? {
            "refunded"
        } else {
            "conflict"
        };
        return Ok(CancelOutcome {
            order_id,
            status: status.to_string(),
            refund_id: None,
            message: Some("Payment was already refunded".to_string()),
        });
    }

    let refund = match state.stripe.create_refund(&payment.stripe_id).await {
        Ok(refund) => refund,
        Err(e) => {
            // Order stays canceled so the refund can be retried later
            tracing::warn!(order_id, payment_id = payment.id, error = %e, "refund failed");
            return Ok(CancelOutcome {
                order_id,
                status: "canceled".to_string(),
                refund_id: None,
                message: Some("Refund failed; order remains canceled for retry".to_string()),
            });
        }
    };

    payments::set_status(&state.pool, payment.id, "refunded").await?;
    // `refunded` is only reached through an actual gateway refund
    let status = if orders::set_status(&state.pool, order_id, "canceled", "refunded").await? {
        "refunded"
    } else {
        "conflict"
    };

    Ok(CancelOutcome {
        order_id,
        status: status.to_string(),
        refund_id: Some(refund.id),
        message: None,
    })
}

/// DELETE /orders/cancel_orders
///
/// Batch cancellation with per-order outcomes. The batch succeeds only
/// when every order ends up refunded.
pub async fn cancel_orders(
    State(state): State<AppState>,
    Query(query): Query<CancelOrdersQuery>,
) -> ApiResult<Vec<CancelOutcome>> {
    let ids = parse_order_ids(&query.order_ids)?;

    let mut outcomes = Vec::with_capacity(ids.len());
    for id in ids {
        outcomes.push(cancel_one(&state, id).await?);
    }

    let refunded = outcomes.iter().filter(|o| o.status == "refunded").count();
    if refunded == outcomes.len() {
        Ok(ApiResponse::success(outcomes))
    } else {
        let summary = format!("{refunded} of {} orders refunded", outcomes.len());
        Ok(ApiResponse::failure_with_data(summary, outcomes))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateShippingRequest {
    #[serde(alias = "order_id")]
    pub order_id: i64,
    #[serde(alias = "carriers")]
    pub carrier: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateShippingData {
    pub shipment: crate::envia::ShipmentData,
    pub order: orders::OrderRow,
}

/// POST /orders/generate_shipping
///
/// Generates a carrier label and records the tracking fields together
/// with the `pending -> shipped` transition in one conditional write.
/// Honors an optional `Idempotency-Key` header: a completed claim
/// replays the recorded response instead of generating a second label.
pub async fn generate_shipping(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
    Json(request): Json<GenerateShippingRequest>,
) -> ApiResult<serde_json::Value> {
    let key = idempotency_key(&headers);
    if let Some(key) = &key {
        match idempotency::claim(&state.pool, key, identity.user_id, now_millis()).await? {
            ClaimOutcome::Claimed => {}
            ClaimOutcome::Replay(response) => {
                return Ok(ApiResponse::success(response));
            }
            ClaimOutcome::InFlight => {
                return Err(AppError::new(ErrorCode::IdempotencyConflict).into());
            }
        }
    }

    match generate_shipping_inner(&state, &request).await {
        Ok(data) => {
            if let Some(key) = &key {
                idempotency::complete(&state.pool, key, &data).await?;
            }
            Ok(ApiResponse::success(data))
        }
        Err(e) => {
            if let Some(key) = &key {
                let _ = idempotency::release(&state.pool, key).await;
            }
            Err(e)
        }
    }
}

async fn generate_shipping_inner(
    state: &AppState,
    request: &GenerateShippingRequest,
) -> Result<serde_json::Value, crate::error::ServiceError> {
    let context = orders::load_context(&state.pool, request.order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    match OrderStatus::from_db(&context.order.status) {
        Some(OrderStatus::Pending) => {}
        Some(OrderStatus::Shipped) => {
            return Err(AppError::new(ErrorCode::OrderAlreadyShipped).into());
        }
        Some(OrderStatus::Canceled) | Some(OrderStatus::Refunded) => {
            return Err(AppError::new(ErrorCode::OrderAlreadyCanceled).into());
        }
        _ => {
            return Err(AppError::new(ErrorCode::OrderStatusConflict).into());
        }
    }

    // Geocode enrichment is best effort; stored region fields are the fallback
    let zipcode = match state
        .envia
        .lookup_zipcode(&state.platform_country, &context.vendor.postal_code)
        .await
    {
        Ok(results) => results.into_iter().next(),
        Err(e) => {
            tracing::warn!(postal_code = %context.vendor.postal_code, error = %e,
                "zipcode lookup failed, using stored region fields");
            None
        }
    };

    let shipment_request = shipping::shipment_request(
        shipping::vendor_origin(&context.vendor, zipcode.as_ref(), &state.platform_country),
        shipping::address_destination(&context.shipping_address, &state.platform_country),
        shipping::packages_from_items(&context.items),
        &request.carrier,
    );
    let shipment = state.envia.generate(&shipment_request).await?;

    let total_shipping_price =
        Decimal::from_f64_retain(shipment.total_price).unwrap_or(Decimal::ZERO);
    let fields = orders::ShipmentFields {
        tracking_number: &shipment.tracking_number,
        track_url: &shipment.track_url,
        shipment_id: shipment.shipment_id,
        label: &shipment.label,
        carrier: &shipment.carrier,
        service: &shipment.service,
        total_shipping_price,
    };
    if !orders::set_shipped(&state.pool, request.order_id, &fields).await? {
        // A label now exists that the order row does not reference.
        // Surface it so it can be voided or attached manually.
        tracing::error!(order_id = request.order_id,
            tracking_number = %shipment.tracking_number,
            "label generated but order was no longer pending");
        return Err(AppError::new(ErrorCode::OrderStatusConflict)
            .with_detail("trackingNumber", shipment.tracking_number.clone())
            .into());
    }

    let order = orders::find_by_id(&state.pool, request.order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    serde_json::to_value(GenerateShippingData { shipment, order })
        .map_err(|e| AppError::internal(format!("response serialization failed: {e}")).into())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePickupRequest {
    pub time_from: String,
    pub time_to: String,
    pub date: String,
    #[serde(default)]
    pub instructions: String,
    pub total_packages: i32,
    pub total_weight: f64,
    #[serde(default)]
    pub carrier: Option<String>,
}

/// POST /orders/shedule_pickup
pub async fn schedule_pickup(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<SchedulePickupRequest>,
) -> ApiResult<serde_json::Value> {
    let vendor = vendors::find_by_user_id(&state.pool, identity.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::VendorProfileRequired))?;

    let zipcode = match state
        .envia
        .lookup_zipcode(&state.platform_country, &vendor.postal_code)
        .await
    {
        Ok(results) => results.into_iter().next(),
        Err(e) => {
            tracing::warn!(postal_code = %vendor.postal_code, error = %e,
                "zipcode lookup failed, using stored region fields");
            None
        }
    };

    let pickup_request = PickupRequest {
        origin: shipping::pickup_origin(&vendor, zipcode.as_ref(), &state.platform_country),
        shipment: PickupShipment {
            carrier: request
                .carrier
                .unwrap_or_else(|| FALLBACK_QUOTE_CARRIER.to_string()),
            kind: 1,
            pickup: PickupWindow {
                time_from: request.time_from,
                time_to: request.time_to,
                date: request.date,
                instructions: request.instructions,
                total_packages: request.total_packages,
                total_weight: request.total_weight,
            },
        },
        settings: PickupSettings::default(),
    };

    let confirmation = state.envia.pickup(&pickup_request).await?;
    Ok(ApiResponse::success(confirmation))
}

/// GET /orders/get_all_carriers
pub async fn get_all_carriers(
    State(state): State<AppState>,
) -> ApiResult<serde_json::Value> {
    let carriers = state.envia.available_carriers(&state.platform_country).await?;
    Ok(ApiResponse::success(carriers))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    #[serde(alias = "order_id")]
    pub order_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionData {
    pub url: String,
}

/// POST /orders/create-checkout-session
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(request): Json<CheckoutSessionRequest>,
) -> ApiResult<CheckoutSessionData> {
    let context = orders::load_context(&state.pool, request.order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    let mut line_items = Vec::with_capacity(context.items.len());
    for entry in &context.items {
        let unit_amount = money::to_minor_units(entry.item.price)
            .ok_or_else(|| AppError::validation("item price is out of range"))?;
        line_items.push(CheckoutLineItem {
            name: entry.product.title.clone(),
            description: entry.product.description.clone(),
            unit_amount,
            quantity: entry.item.quantity,
        });
    }

    let success_url = format!(
        "{}/payment/success?session_id={{CHECKOUT_SESSION_ID}}",
        state.frontend_url
    );
    let cancel_url = format!("{}/payment/cancel", state.frontend_url);

    let url = state
        .stripe
        .create_checkout_session(
            &line_items,
            &state.currency,
            &success_url,
            &cancel_url,
            request.order_id,
        )
        .await?;

    Ok(ApiResponse::success(CheckoutSessionData { url }))
}

/// GET /orders/generate_invoice
pub async fn generate_invoice(
    State(state): State<AppState>,
    Query(query): Query<OrderIdQuery>,
) -> ApiResult<InvoiceDocument> {
    let context = orders::load_context(&state.pool, query.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    Ok(ApiResponse::success(invoice::build_invoice(&context)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn valid_request() -> CreateOrderRequest {
        CreateOrderRequest {
            items: vec![CreateOrderItem {
                product_id: 7,
                vendor_id: 1,
                quantity: 2,
                price: dec("150.00"),
                discount: dec("10.00"),
                total: dec("290.00"),
            }],
            total_price: dec("290.00"),
            total_items: 2,
            vendor_id: 1,
            shipping_address_id: 5,
            billing_address_id: 5,
            payment_details: None,
        }
    }

    #[test]
    fn test_validate_accepts_reconciled_order() {
        assert!(validate_create_order(&valid_request()).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_items() {
        let mut request = valid_request();
        request.items.clear();
        let err = validate_create_order(&request).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
    }

    #[test]
    fn test_validate_rejects_total_mismatch() {
        let mut request = valid_request();
        request.total_price = dec("300.00");
        let err = validate_create_order(&request).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderTotalMismatch);
    }

    #[test]
    fn test_validate_tolerates_one_cent_drift() {
        let mut request = valid_request();
        request.total_price = dec("290.01");
        assert!(validate_create_order(&request).is_ok());
    }

    #[test]
    fn test_validate_rejects_nonpositive_quantity() {
        let mut request = valid_request();
        request.items[0].quantity = 0;
        let err = validate_create_order(&request).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_validate_rejects_negative_total_price() {
        let mut request = valid_request();
        request.total_price = dec("-1.00");
        let err = validate_create_order(&request).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_page_size_default_and_cap() {
        assert_eq!(effective_page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(effective_page_size(Some(0)), DEFAULT_PAGE_SIZE);
        assert_eq!(effective_page_size(Some(25)), 25);
        assert_eq!(effective_page_size(Some(10_000)), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_cancel_path_fresh_orders_transition_first() {
        assert_eq!(cancel_path(OrderStatus::Pending), CancelPath::Cancel);
        assert_eq!(cancel_path(OrderStatus::Shipped), CancelPath::Cancel);
    }

    #[test]
    fn test_cancel_path_canceled_order_retries_refund() {
        // An order left at `canceled` by a failed refund must reach the
        // refund attempt again on the next cancel request.
        assert_eq!(
            cancel_path(OrderStatus::Canceled),
            CancelPath::RetryRefund
        );
    }

    #[test]
    fn test_cancel_path_terminal_orders_rejected() {
        assert_eq!(cancel_path(OrderStatus::Refunded), CancelPath::Rejected);
        assert_eq!(cancel_path(OrderStatus::Completed), CancelPath::Rejected);
    }

    #[test]
    fn test_parse_order_ids() {
        assert_eq!(parse_order_ids("1,2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_order_ids(" 4 , 5 ").unwrap(), vec![4, 5]);
        assert!(parse_order_ids("").is_err());
        assert!(parse_order_ids("1,abc").is_err());
    }

    #[test]
    fn test_list_query_accepts_rows_per_page_alias() {
        let query: ListOrdersQuery =
            serde_json::from_str(r#"{"page": 2, "rowsPerPage": 20}"#).unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, Some(20));
    }

    #[test]
    fn test_create_order_request_wire_shape() {
        let json = r#"{
            "items": [{"productId": 7, "vendorId": 1, "quantity": 2,
                       "price": 150.0, "total": 290.0}],
            "totalPrice": 290.0,
            "totalItems": 2,
            "vendorId": 1,
            "shippingAddressId": 5,
            "billingAddressId": 5,
            "paymentDetails": {"platformFee": 5.0}
        }"#;
        let request: CreateOrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.items[0].product_id, 7);
        assert_eq!(request.items[0].discount, Decimal::ZERO);
        assert_eq!(
            request.payment_details.unwrap().platform_fee,
            dec("5.0")
        );
    }

    #[test]
    fn test_generate_shipping_request_aliases() {
        let request: GenerateShippingRequest =
            serde_json::from_str(r#"{"order_id": 9, "carriers": "fedex"}"#).unwrap();
        assert_eq!(request.order_id, 9);
        assert_eq!(request.carrier, "fedex");

        let request: GenerateShippingRequest =
            serde_json::from_str(r#"{"orderId": 9, "carrier": "dhl"}"#).unwrap();
        assert_eq!(request.carrier, "dhl");
    }
}

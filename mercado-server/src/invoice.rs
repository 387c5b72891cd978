//! Invoice document assembly
//!
//! Produces a structured invoice from the full order context. The
//! document is plain data; rendering (HTML, PDF) is the frontend's
//! concern.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::orders::OrderContext;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceParty {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub product: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDocument {
    pub invoice_number: String,
    pub order_id: i64,
    pub issued_at: i64,
    pub customer: InvoiceParty,
    pub vendor: InvoiceParty,
    pub billing_address: String,
    pub shipping_address: String,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub grand_total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
}

fn format_address(address: &crate::db::orders::AddressRow) -> String {
    let mut parts = vec![address.address.clone()];
    if let Some(city) = &address.city_name {
        parts.push(city.clone());
    }
    if let Some(state) = &address.state_code {
        parts.push(state.clone());
    }
    parts.push(address.zip_code.clone());
    parts.join(", ")
}

/// Build the invoice for a loaded order.
///
/// Totals are recomputed from the line items; the shipping charge is
/// whatever the generated label cost (zero before shipment).
pub fn build_invoice(context: &OrderContext) -> InvoiceDocument {
    let subtotal: Decimal = context
        .items
        .iter()
        .map(|entry| entry.item.price * Decimal::from(entry.item.quantity))
        .sum();
    let discount: Decimal = context.items.iter().map(|entry| entry.item.discount).sum();
    let shipping = context.order.total_shipping_price.unwrap_or(Decimal::ZERO);

    let lines = context
        .items
        .iter()
        .map(|entry| InvoiceLine {
            product: entry.product.title.clone(),
            quantity: entry.item.quantity,
            unit_price: entry.item.price,
            discount: entry.item.discount,
            total: entry.item.total,
        })
        .collect();

    InvoiceDocument {
        invoice_number: format!("INV-{}", context.order.id),
        order_id: context.order.id,
        issued_at: context.order.created_at,
        customer: InvoiceParty {
            name: context.customer.name.clone(),
            email: context.customer.email.clone(),
            address: None,
        },
        vendor: InvoiceParty {
            name: context.vendor.vendor_full_name.clone(),
            email: context.vendor.email.clone(),
            address: Some(context.vendor.store_location.clone()),
        },
        billing_address: format_address(&context.billing_address),
        shipping_address: format_address(&context.shipping_address),
        lines,
        subtotal,
        discount,
        shipping,
        grand_total: subtotal - discount + shipping,
        payment_reference: context.payments.last().map(|p| p.stripe_id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::orders::{
        AddressRow, ItemWithProduct, OrderItemRow, OrderRow, ProductRow,
    };
    use crate::db::payments::PaymentRow;
    use crate::db::users::UserRow;
    use crate::db::vendors::VendorRow;

    fn sample_context() -> OrderContext {
        let address = AddressRow {
            id: 5,
            receiver_name: "Edwin Carrasco".to_string(),
            receiver_phone: "8129024699".to_string(),
            address: "Av. Juarez 100".to_string(),
            zip_code: "64000".to_string(),
            city_name: Some("Monterrey".to_string()),
            state_code: Some("NL".to_string()),
            country_code: Some("MX".to_string()),
        };
        OrderContext {
            order: OrderRow {
                id: 42,
                customer_id: 10,
                vendor_id: 1,
                total_price: Decimal::new(29000, 2),
                total_items: 2,
                status: "shipped".to_string(),
                shipping_status: "pending".to_string(),
                shipping_address_id: 5,
                billing_address_id: 5,
                tracking_number: Some("794644790132".to_string()),
                track_url: None,
                shipment_id: Some(123456),
                label: None,
                carrier: Some("fedex".to_string()),
                service: Some("ground".to_string()),
                total_shipping_price: Some(Decimal::new(18550, 2)),
                created_at: 1_756_000_000_000,
            },
            items: vec![ItemWithProduct {
                item: OrderItemRow {
                    id: 1,
                    order_id: 42,
                    product_id: 7,
                    vendor_id: 1,
                    quantity: 2,
                    price: Decimal::new(15000, 2),
                    discount: Decimal::new(1000, 2),
                    total: Decimal::new(29000, 2),
                },
                product: ProductRow {
                    id: 7,
                    vendor_id: 1,
                    title: "Talavera vase".to_string(),
                    description: "Hand painted".to_string(),
                    pack_type: "box".to_string(),
                    content: "artesania".to_string(),
                    box_quantity: 1,
                    weight: 1.0,
                    weight_unit: "KG".to_string(),
                    length_unit: "CM".to_string(),
                    length: 20.0,
                    width: 20.0,
                    height: 15.0,
                },
            }],
            payments: vec![PaymentRow {
                id: 3,
                order_id: 42,
                stripe_id: "pi_123".to_string(),
                amount: Decimal::new(29000, 2),
                status: "paid".to_string(),
                vendor_id: 1,
                platform_fee: Decimal::ZERO,
                created_at: 1_756_000_000_000,
            }],
            customer: UserRow {
                id: 10,
                email: "edwin@example.com".to_string(),
                name: "Edwin Carrasco".to_string(),
                role: "customer".to_string(),
                stripe_customer_id: None,
            },
            billing_address: address.clone(),
            shipping_address: address,
            vendor: VendorRow {
                id: 1,
                user_id: 20,
                store_name: "Artesanias MX".to_string(),
                vendor_full_name: "Maria Lopez".to_string(),
                email: "maria@example.com".to_string(),
                whatsapp_number: "8181818111".to_string(),
                postal_code: "64600".to_string(),
                store_location: "Belisario Dominguez".to_string(),
                city_name: Some("Monterrey".to_string()),
                state_code: Some("NL".to_string()),
                stripe_account_id: None,
            },
        }
    }

    #[test]
    fn test_invoice_number_and_totals() {
        let invoice = build_invoice(&sample_context());
        assert_eq!(invoice.invoice_number, "INV-42");
        assert_eq!(invoice.subtotal, Decimal::new(30000, 2));
        assert_eq!(invoice.discount, Decimal::new(1000, 2));
        assert_eq!(invoice.shipping, Decimal::new(18550, 2));
        assert_eq!(invoice.grand_total, Decimal::new(47550, 2));
    }

    #[test]
    fn test_invoice_address_formatting() {
        let invoice = build_invoice(&sample_context());
        assert_eq!(invoice.shipping_address, "Av. Juarez 100, Monterrey, NL, 64000");
    }

    #[test]
    fn test_invoice_payment_reference() {
        let invoice = build_invoice(&sample_context());
        assert_eq!(invoice.payment_reference.as_deref(), Some("pi_123"));
    }

    #[test]
    fn test_invoice_without_shipping_price() {
        let mut context = sample_context();
        context.order.total_shipping_price = None;
        context.payments.clear();
        let invoice = build_invoice(&context);
        assert_eq!(invoice.shipping, Decimal::ZERO);
        assert_eq!(invoice.grand_total, Decimal::new(29000, 2));
        assert!(invoice.payment_reference.is_none());
    }
}

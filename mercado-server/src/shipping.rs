//! Assembly of carrier requests from stored order data
//!
//! Bridges the ledger rows (vendor profile, addresses, line items with
//! products) to the carrier wire shapes in [`crate::envia`]. Postal
//! code enrichment is optional: when the geocode lookup fails the
//! builders fall back to the stored region fields so a label can still
//! be produced.

use crate::db::orders::{AddressRow, ItemWithProduct};
use crate::db::vendors::VendorRow;
use crate::envia::{
    Package, PackageDimensions, Party, PickupOrigin, RateSettings, ShipmentRequest, ShipmentSpec,
    ZipcodeInfo,
};

/// Carriers quoted side by side for the rate comparison view
pub const RATE_COMPARISON_CARRIERS: [&str; 8] = [
    "mensajerosUrbanos",
    "tresGuerras",
    "almex",
    "noventa9Minutos",
    "paquetexpress",
    "redpack",
    "dhl",
    "fedex",
];

const DEFAULT_DISTRICT: &str = "Centro";

/// One package per line item, sized from the product's physical attributes
pub fn packages_from_items(items: &[ItemWithProduct]) -> Vec<Package> {
    items
        .iter()
        .map(|entry| Package {
            kind: entry.product.pack_type.clone(),
            content: entry.product.content.clone(),
            amount: entry.item.quantity,
            name: entry.product.title.clone(),
            declared_value: 0.0,
            length_unit: entry.product.length_unit.clone(),
            weight_unit: entry.product.weight_unit.clone(),
            weight: entry.product.weight,
            dimensions: PackageDimensions {
                length: entry.product.length,
                width: entry.product.width,
                height: entry.product.height,
            },
        })
        .collect()
}

fn enriched_district(zipcode: Option<&ZipcodeInfo>) -> String {
    zipcode
        .and_then(|z| z.suburbs.first().cloned())
        .unwrap_or_else(|| DEFAULT_DISTRICT.to_string())
}

fn enriched_city(zipcode: Option<&ZipcodeInfo>, stored: Option<&str>) -> String {
    zipcode
        .map(|z| z.locality.clone())
        .filter(|c| !c.is_empty())
        .or_else(|| stored.map(str::to_string))
        .unwrap_or_default()
}

fn enriched_state(zipcode: Option<&ZipcodeInfo>, stored: Option<&str>) -> String {
    zipcode
        .map(|z| z.state.code.two_digit.clone())
        .filter(|s| !s.is_empty())
        .or_else(|| stored.map(str::to_string))
        .unwrap_or_default()
}

/// Shipment origin from the vendor's store profile, optionally enriched
/// with geocoded suburb/locality/state data.
pub fn vendor_origin(
    vendor: &VendorRow,
    zipcode: Option<&ZipcodeInfo>,
    country: &str,
) -> Party {
    Party {
        number: "123".to_string(),
        postal_code: vendor.postal_code.clone(),
        company: "Envia".to_string(),
        name: vendor.vendor_full_name.clone(),
        email: Some(vendor.email.clone()),
        phone: vendor.whatsapp_number.clone(),
        country: country.to_string(),
        phone_code: country.to_string(),
        street: vendor.store_location.clone(),
        district: enriched_district(zipcode),
        city: enriched_city(zipcode, vendor.city_name.as_deref()),
        state: enriched_state(zipcode, vendor.state_code.as_deref()),
    }
}

/// Shipment destination from the customer's shipping address
pub fn address_destination(address: &AddressRow, country: &str) -> Party {
    Party {
        number: "2470".to_string(),
        postal_code: address.zip_code.clone(),
        company: "Test".to_string(),
        name: address.receiver_name.clone(),
        email: None,
        phone: address.receiver_phone.clone(),
        country: country.to_string(),
        phone_code: country.to_string(),
        street: address.address.clone(),
        district: DEFAULT_DISTRICT.to_string(),
        city: address.city_name.clone().unwrap_or_default(),
        state: address.state_code.clone().unwrap_or_default(),
    }
}

/// Full rate/generate request body for one carrier
pub fn shipment_request(
    origin: Party,
    destination: Party,
    packages: Vec<Package>,
    carrier: &str,
) -> ShipmentRequest {
    ShipmentRequest {
        origin,
        destination,
        packages,
        settings: RateSettings::default(),
        shipment: ShipmentSpec::ground(carrier),
    }
}

/// Pickup origin: the vendor's store, enriched the same way as
/// [`vendor_origin`].
pub fn pickup_origin(
    vendor: &VendorRow,
    zipcode: Option<&ZipcodeInfo>,
    country: &str,
) -> PickupOrigin {
    PickupOrigin {
        name: vendor.vendor_full_name.clone(),
        company: vendor.store_name.clone(),
        email: vendor.email.clone(),
        phone: vendor.whatsapp_number.clone(),
        street: vendor.store_location.clone(),
        number: "1400".to_string(),
        district: enriched_district(zipcode),
        city: enriched_city(zipcode, vendor.city_name.as_deref()),
        state: enriched_state(zipcode, vendor.state_code.as_deref()),
        country: country.to_string(),
        postal_code: vendor.postal_code.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::orders::{OrderItemRow, ProductRow};
    use crate::envia::{StateCode, ZipcodeState};
    use rust_decimal::Decimal;

    fn sample_vendor() -> VendorRow {
        VendorRow {
            id: 1,
            user_id: 10,
            store_name: "Artesanias MX".to_string(),
            vendor_full_name: "Maria Lopez".to_string(),
            email: "maria@example.com".to_string(),
            whatsapp_number: "8181818111".to_string(),
            postal_code: "64600".to_string(),
            store_location: "Belisario Dominguez".to_string(),
            city_name: Some("Monterrey".to_string()),
            state_code: Some("NLE".to_string()),
            stripe_account_id: None,
        }
    }

    fn sample_zipcode() -> ZipcodeInfo {
        ZipcodeInfo {
            zip_code: "64600".to_string(),
            locality: "Monterrey".to_string(),
            suburbs: vec!["Obispado".to_string(), "Centro".to_string()],
            state: ZipcodeState {
                code: StateCode {
                    two_digit: "NL".to_string(),
                },
            },
        }
    }

    fn sample_item(quantity: i32, weight: f64) -> ItemWithProduct {
        ItemWithProduct {
            item: OrderItemRow {
                id: 1,
                order_id: 1,
                product_id: 7,
                vendor_id: 1,
                quantity,
                price: Decimal::new(15000, 2),
                discount: Decimal::ZERO,
                total: Decimal::new(15000, 2) * Decimal::from(quantity),
            },
            product: ProductRow {
                id: 7,
                vendor_id: 1,
                title: "Talavera vase".to_string(),
                description: "Hand painted".to_string(),
                pack_type: "box".to_string(),
                content: "artesania".to_string(),
                box_quantity: 1,
                weight,
                weight_unit: "KG".to_string(),
                length_unit: "CM".to_string(),
                length: 20.0,
                width: 20.0,
                height: 15.0,
            },
        }
    }

    #[test]
    fn test_packages_mirror_product_attributes() {
        let packages = packages_from_items(&[sample_item(3, 1.5)]);
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].kind, "box");
        assert_eq!(packages[0].amount, 3);
        assert!((packages[0].weight - 1.5).abs() < f64::EPSILON);
        assert!((packages[0].dimensions.height - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vendor_origin_prefers_geocoded_fields() {
        let zipcode = sample_zipcode();
        let origin = vendor_origin(&sample_vendor(), Some(&zipcode), "MX");
        assert_eq!(origin.district, "Obispado");
        assert_eq!(origin.city, "Monterrey");
        assert_eq!(origin.state, "NL");
        assert_eq!(origin.postal_code, "64600");
    }

    #[test]
    fn test_vendor_origin_falls_back_to_stored_fields() {
        let origin = vendor_origin(&sample_vendor(), None, "MX");
        assert_eq!(origin.district, "Centro");
        assert_eq!(origin.city, "Monterrey");
        assert_eq!(origin.state, "NLE");
    }

    #[test]
    fn test_destination_from_address_row() {
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
        let destination = address_destination(&address, "MX");
        assert_eq!(destination.name, "Edwin Carrasco");
        assert_eq!(destination.postal_code, "64000");
        assert!(destination.email.is_none());
    }

    #[test]
    fn test_shipment_request_uses_ground_service() {
        let vendor = sample_vendor();
        let address = AddressRow {
            id: 5,
            receiver_name: "Edwin".to_string(),
            receiver_phone: "81".to_string(),
            address: "x".to_string(),
            zip_code: "64000".to_string(),
            city_name: None,
            state_code: None,
            country_code: None,
        };
        let request = shipment_request(
            vendor_origin(&vendor, None, "MX"),
            address_destination(&address, "MX"),
            packages_from_items(&[sample_item(1, 1.0)]),
            "fedex",
        );
        assert_eq!(request.shipment.carrier, "fedex");
        assert_eq!(request.shipment.service, "ground");
        assert_eq!(request.settings.currency, "MXN");
    }

    #[test]
    fn test_pickup_origin_uses_store_name_as_company() {
        let origin = pickup_origin(&sample_vendor(), None, "MX");
        assert_eq!(origin.company, "Artesanias MX");
        assert_eq!(origin.number, "1400");
    }
}

//! Envia shipping integration (rates, labels, pickups, geocoding)
//!
//! Envia splits its API across three hosts: the shipping host
//! (rate/generate/pickup), the queries host (carrier catalog) and the
//! geocoding host (postal code lookup). All three are configurable so
//! tests can point at a local stub.
//!
//! Carrier errors come back as bare string codes in the response body;
//! known codes are mapped to our error codes, the carrier's HTTP status
//! is mirrored to the caller.

use std::time::Duration;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Shipping carrier adapter: explicit client built once at startup
#[derive(Clone)]
pub struct EnviaClient {
    http: reqwest::Client,
    api_key: String,
    ship_base: String,
    queries_base: String,
    geocode_base: String,
}

/// One side of a shipment (origin or destination)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub number: String,
    pub postal_code: String,
    pub company: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone: String,
    pub country: String,
    // Envia expects this one key in snake case
    #[serde(rename = "phone_code")]
    pub phone_code: String,
    pub street: String,
    pub district: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageDimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

/// Physical package derived from an order line item
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub amount: i32,
    pub name: String,
    pub declared_value: f64,
    pub length_unit: String,
    pub weight_unit: String,
    pub weight: f64,
    pub dimensions: PackageDimensions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSettings {
    pub currency: String,
    pub print_format: String,
    pub print_size: String,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            currency: "MXN".to_string(),
            print_format: "PDF".to_string(),
            print_size: "PAPER_7X4.75".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShipmentSpec {
    pub carrier: String,
    pub service: String,
    pub reverse_pickup: i32,
    #[serde(rename = "type")]
    pub kind: i32,
}

impl ShipmentSpec {
    /// Standard ground shipment for a carrier
    pub fn ground(carrier: &str) -> Self {
        Self {
            carrier: carrier.to_string(),
            service: "ground".to_string(),
            reverse_pickup: 0,
            kind: 1,
        }
    }
}

/// Request body shared by the rate and generate endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentRequest {
    pub origin: Party,
    pub destination: Party,
    pub packages: Vec<Package>,
    pub settings: RateSettings,
    pub shipment: ShipmentSpec,
}

/// A single rate quote from the carrier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateQuote {
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_estimate: Option<String>,
}

/// Generated label data: everything recorded on the order row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentData {
    pub tracking_number: String,
    pub track_url: String,
    pub shipment_id: i64,
    pub label: String,
    pub carrier: String,
    pub service: String,
    pub total_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct Envelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// Geocoding result for a postal code
#[derive(Debug, Clone, Deserialize)]
pub struct ZipcodeInfo {
    pub zip_code: String,
    #[serde(default)]
    pub locality: String,
    #[serde(default)]
    pub suburbs: Vec<String>,
    #[serde(default)]
    pub state: ZipcodeState,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZipcodeState {
    #[serde(default)]
    pub code: StateCode,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateCode {
    #[serde(default, rename = "2digit")]
    pub two_digit: String,
}

/// Pickup origin: looser shape than [`Party`], no phone_code
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupOrigin {
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub number: String,
    pub district: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupWindow {
    pub time_from: String,
    pub time_to: String,
    pub date: String,
    #[serde(default)]
    pub instructions: String,
    pub total_packages: i32,
    pub total_weight: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupShipment {
    pub carrier: String,
    #[serde(rename = "type")]
    pub kind: i32,
    pub pickup: PickupWindow,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupSettings {
    pub currency: String,
    pub label_format: String,
}

impl Default for PickupSettings {
    fn default() -> Self {
        Self {
            currency: "MXN".to_string(),
            label_format: "pdf".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupRequest {
    pub origin: PickupOrigin,
    pub shipment: PickupShipment,
    pub settings: PickupSettings,
}

#[derive(Debug, Clone, Deserialize)]
struct CarrierErrorBody {
    #[serde(default)]
    error: String,
}

/// Map a carrier error string to our error code and message.
///
/// Known codes get a translated message; unknown non-empty strings pass
/// through under the fallback code so the caller sees what the carrier
/// said.
pub(crate) fn map_carrier_error(raw: &str, fallback: ErrorCode) -> AppError {
    match raw {
        "PICKUPDATE.TOO.FAR - GENERIC.ERROR" => AppError::new(ErrorCode::PickupDateTooFar),
        "" => AppError::new(fallback),
        other => AppError::with_message(fallback, other),
    }
}

impl EnviaClient {
    pub fn new(api_key: &str, ship_base: &str, queries_base: &str, geocode_base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            ship_base: ship_base.trim_end_matches('/').to_string(),
            queries_base: queries_base.trim_end_matches('/').to_string(),
            geocode_base: geocode_base.trim_end_matches('/').to_string(),
        }
    }

    /// Handle a carrier response: non-2xx bodies carry an `error` string
    /// and the carrier's HTTP status is mirrored to our caller.
    async fn read_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        fallback: ErrorCode,
    ) -> Result<T, AppError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(error = %e, "carrier response read failed");
            AppError::new(ErrorCode::NetworkError)
        })?;

        if !status.is_success() {
            tracing::error!(%status, body = %body, "carrier returned an error");
            let raw = serde_json::from_str::<CarrierErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_default();
            let app_status =
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            return Err(map_carrier_error(&raw, fallback).with_status(app_status));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "carrier response missing expected fields");
            AppError::new(fallback)
        })
    }

    async fn post_ship<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
        fallback: ErrorCode,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .post(format!("{}{path}", self.ship_base))
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, path, "carrier request failed");
                AppError::new(ErrorCode::NetworkError)
            })?;

        Self::read_response(response, fallback).await
    }

    /// Quote shipping rates for a prepared shipment request
    pub async fn rate(&self, request: &ShipmentRequest) -> Result<Vec<RateQuote>, AppError> {
        let envelope: Envelope<RateQuote> = self
            .post_ship("/ship/rate/", request, ErrorCode::RateUnavailable)
            .await?;
        Ok(envelope.data)
    }

    /// Generate a shipping label; the first entry is the usable label
    pub async fn generate(&self, request: &ShipmentRequest) -> Result<ShipmentData, AppError> {
        let envelope: Envelope<ShipmentData> = self
            .post_ship("/ship/generate/", request, ErrorCode::ShipmentFailed)
            .await?;
        envelope
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AppError::new(ErrorCode::ShipmentFailed))
    }

    /// Schedule a carrier pickup; the carrier's confirmation payload is
    /// passed through to the caller.
    pub async fn pickup(&self, request: &PickupRequest) -> Result<serde_json::Value, AppError> {
        self.post_ship("/ship/pickup/", request, ErrorCode::PickupFailed)
            .await
    }

    /// Catalog of carriers available in a country
    pub async fn available_carriers(&self, country: &str) -> Result<serde_json::Value, AppError> {
        let response = self
            .http
            .get(format!("{}/available-carrier/{country}/0", self.queries_base))
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "carrier catalog request failed");
                AppError::new(ErrorCode::NetworkError)
            })?;

        let envelope: Envelope<serde_json::Value> =
            Self::read_response(response, ErrorCode::CarrierError).await?;
        Ok(serde_json::Value::Array(envelope.data))
    }

    /// Resolve a postal code to locality, suburbs and state code
    pub async fn lookup_zipcode(
        &self,
        country: &str,
        postal_code: &str,
    ) -> Result<Vec<ZipcodeInfo>, AppError> {
        let response = self
            .http
            .get(format!("{}/zipcode/{country}/{postal_code}", self.geocode_base))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "zipcode lookup failed");
                AppError::new(ErrorCode::NetworkError)
            })?;

        Self::read_response(response, ErrorCode::ZipcodeNotFound).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_wire_shape() {
        let party = Party {
            number: "123".to_string(),
            postal_code: "64600".to_string(),
            company: "Envia".to_string(),
            name: "Test Vendor".to_string(),
            email: Some("vendor@example.com".to_string()),
            phone: "8181818111".to_string(),
            country: "MX".to_string(),
            phone_code: "MX".to_string(),
            street: "Belisario Dominguez".to_string(),
            district: "Centro".to_string(),
            city: "Monterrey".to_string(),
            state: "NL".to_string(),
        };
        let json = serde_json::to_value(&party).unwrap();
        assert_eq!(json["postalCode"], "64600");
        assert_eq!(json["phone_code"], "MX");
        assert!(json.get("phoneCode").is_none());
    }

    #[test]
    fn test_party_omits_missing_email() {
        let party = Party {
            number: "2470".to_string(),
            postal_code: "64600".to_string(),
            company: "Test".to_string(),
            name: "Receiver".to_string(),
            email: None,
            phone: "8129024699".to_string(),
            country: "MX".to_string(),
            phone_code: "MX".to_string(),
            street: "Belisario Dominguez".to_string(),
            district: "Centro".to_string(),
            city: "Monterrey".to_string(),
            state: "NL".to_string(),
        };
        let json = serde_json::to_value(&party).unwrap();
        assert!(json.get("email").is_none());
    }

    #[test]
    fn test_package_uses_type_key() {
        let package = Package {
            kind: "box".to_string(),
            content: "artesania".to_string(),
            amount: 1,
            name: "paquete mediano".to_string(),
            declared_value: 0.0,
            length_unit: "CM".to_string(),
            weight_unit: "KG".to_string(),
            weight: 1.0,
            dimensions: PackageDimensions {
                length: 20.0,
                width: 20.0,
                height: 15.0,
            },
        };
        let json = serde_json::to_value(&package).unwrap();
        assert_eq!(json["type"], "box");
        assert_eq!(json["declaredValue"], 0.0);
        assert_eq!(json["dimensions"]["height"], 15.0);
    }

    #[test]
    fn test_shipment_spec_wire_shape() {
        let json = serde_json::to_value(ShipmentSpec::ground("fedex")).unwrap();
        assert_eq!(json["carrier"], "fedex");
        assert_eq!(json["service"], "ground");
        assert_eq!(json["reverse_pickup"], 0);
        assert_eq!(json["type"], 1);
    }

    #[test]
    fn test_rate_settings_defaults() {
        let json = serde_json::to_value(RateSettings::default()).unwrap();
        assert_eq!(json["currency"], "MXN");
        assert_eq!(json["printFormat"], "PDF");
        assert_eq!(json["printSize"], "PAPER_7X4.75");
    }

    #[test]
    fn test_shipment_data_parse() {
        let json = r#"{
            "trackingNumber": "794644790132",
            "trackUrl": "https://envia.com/track/794644790132",
            "shipmentId": 123456,
            "label": "https://envia.com/label/123456.pdf",
            "carrier": "fedex",
            "service": "ground",
            "totalPrice": 185.5
        }"#;
        let data: ShipmentData = serde_json::from_str(json).unwrap();
        assert_eq!(data.shipment_id, 123456);
        assert_eq!(data.carrier, "fedex");
        assert!((data.total_price - 185.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zipcode_parse_with_2digit_state() {
        let json = r#"[{
            "zip_code": "64600",
            "locality": "Monterrey",
            "suburbs": ["Centro", "Obispado"],
            "state": {"code": {"2digit": "NL", "3digit": "NLE"}}
        }]"#;
        let info: Vec<ZipcodeInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(info[0].locality, "Monterrey");
        assert_eq!(info[0].suburbs[0], "Centro");
        assert_eq!(info[0].state.code.two_digit, "NL");
    }

    #[test]
    fn test_zipcode_parse_tolerates_missing_fields() {
        let info: Vec<ZipcodeInfo> = serde_json::from_str(r#"[{"zip_code": "64600"}]"#).unwrap();
        assert!(info[0].suburbs.is_empty());
        assert_eq!(info[0].state.code.two_digit, "");
    }

    #[test]
    fn test_pickup_request_wire_shape() {
        let request = PickupRequest {
            origin: PickupOrigin {
                name: "Vendor".to_string(),
                company: "Store".to_string(),
                email: "vendor@example.com".to_string(),
                phone: "8181818111".to_string(),
                street: "Belisario Dominguez".to_string(),
                number: "1400".to_string(),
                district: "Centro".to_string(),
                city: "Monterrey".to_string(),
                state: "NL".to_string(),
                country: "MX".to_string(),
                postal_code: "64600".to_string(),
            },
            shipment: PickupShipment {
                carrier: "fedex".to_string(),
                kind: 1,
                pickup: PickupWindow {
                    time_from: "09:00".to_string(),
                    time_to: "18:00".to_string(),
                    date: "2026-09-01".to_string(),
                    instructions: "ring the bell".to_string(),
                    total_packages: 2,
                    total_weight: 3.5,
                },
            },
            settings: PickupSettings::default(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["shipment"]["type"], 1);
        assert_eq!(json["shipment"]["pickup"]["timeFrom"], "09:00");
        assert_eq!(json["shipment"]["pickup"]["totalPackages"], 2);
        assert_eq!(json["settings"]["labelFormat"], "pdf");
        assert_eq!(json["origin"]["postalCode"], "64600");
    }

    #[test]
    fn test_map_carrier_error_pickup_date() {
        let err = map_carrier_error(
            "PICKUPDATE.TOO.FAR - GENERIC.ERROR",
            ErrorCode::PickupFailed,
        );
        assert_eq!(err.code, ErrorCode::PickupDateTooFar);
        assert_eq!(err.message, "Pickup date issues. Try diffrent dates.");
    }

    #[test]
    fn test_map_carrier_error_passes_unknown_text_through() {
        let err = map_carrier_error("SOMETHING.ELSE", ErrorCode::ShipmentFailed);
        assert_eq!(err.code, ErrorCode::ShipmentFailed);
        assert_eq!(err.message, "SOMETHING.ELSE");
    }

    #[test]
    fn test_map_carrier_error_empty_uses_default_message() {
        let err = map_carrier_error("", ErrorCode::RateUnavailable);
        assert_eq!(err.code, ErrorCode::RateUnavailable);
        assert_eq!(err.message, ErrorCode::RateUnavailable.message());
    }
}

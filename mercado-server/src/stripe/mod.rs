//! Stripe integration via REST API (no SDK dependency)
//!
//! All amounts crossing this boundary are integer minor units; the
//! conversion lives in `crate::money`. Requests are form-encoded with
//! basic auth on the secret key, per Stripe's API conventions.

use std::time::Duration;

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Payment gateway adapter: explicit client built once at startup
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

/// Payment intent: id plus the client secret the frontend confirms with
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Refund {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Customer {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CheckoutSession {
    url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Account {
    id: String,
    #[serde(default)]
    charges_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct AccountLink {
    url: String,
}

/// Line item for a hosted checkout session
#[derive(Debug, Clone)]
pub struct CheckoutLineItem {
    pub name: String,
    pub description: String,
    /// Unit amount in minor units
    pub unit_amount: i64,
    pub quantity: i32,
}

/// Pick the refund parameter for a gateway reference: payment intent ids
/// start with `pi_`, everything else is treated as a charge id.
pub(crate) fn refund_param(gateway_ref: &str) -> &'static str {
    if gateway_ref.starts_with("pi_") {
        "payment_intent"
    } else {
        "charge"
    }
}

impl StripeClient {
    pub fn new(secret_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
        idempotency_key: Option<&str>,
    ) -> Result<T, AppError> {
        let mut request = self
            .http
            .post(format!("{}{path}", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .timeout(REQUEST_TIMEOUT)
            .form(params);

        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, path, "Stripe request failed");
            AppError::new(ErrorCode::PaymentFailed)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(error = %e, path, "Stripe response read failed");
            AppError::new(ErrorCode::PaymentFailed)
        })?;

        if !status.is_success() {
            // Raw payloads go to the log, never to the caller
            tracing::error!(%status, path, body = %body, "Stripe returned an error");
            return Err(AppError::new(ErrorCode::PaymentFailed));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, path, "Stripe response missing expected fields");
            AppError::new(ErrorCode::PaymentFailed)
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, path, "Stripe request failed");
                AppError::new(ErrorCode::PaymentFailed)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(error = %e, path, "Stripe response read failed");
            AppError::new(ErrorCode::PaymentFailed)
        })?;

        if !status.is_success() {
            tracing::error!(%status, path, body = %body, "Stripe returned an error");
            return Err(AppError::new(ErrorCode::PaymentFailed));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, path, "Stripe response missing expected fields");
            AppError::new(ErrorCode::PaymentFailed)
        })
    }

    /// Create a Stripe Customer for a platform user
    pub async fn create_customer(
        &self,
        email: &str,
        name: &str,
        user_id: i64,
    ) -> Result<String, AppError> {
        let params = vec![
            ("email".to_string(), email.to_string()),
            ("name".to_string(), name.to_string()),
            ("metadata[userId]".to_string(), user_id.to_string()),
        ];
        let customer: Customer = self.post_form("/v1/customers", &params, None).await?;
        Ok(customer.id)
    }

    /// Create a payment intent for an order.
    ///
    /// `idempotency_key` is deterministic per order so a timed-out call
    /// can be retried without double-charging.
    pub async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        customer: Option<&str>,
        order_id: i64,
        idempotency_key: &str,
    ) -> Result<PaymentIntent, AppError> {
        let mut params = vec![
            ("amount".to_string(), amount_minor.to_string()),
            ("currency".to_string(), currency.to_string()),
            ("metadata[orderId]".to_string(), order_id.to_string()),
        ];
        if let Some(customer) = customer {
            params.push(("customer".to_string(), customer.to_string()));
        }
        self.post_form("/v1/payment_intents", &params, Some(idempotency_key))
            .await
    }

    /// Create a refund against a charge or payment intent reference
    pub async fn create_refund(&self, gateway_ref: &str) -> Result<Refund, AppError> {
        let params = vec![(refund_param(gateway_ref).to_string(), gateway_ref.to_string())];
        self.post_form("/v1/refunds", &params, None).await
    }

    /// Create a hosted Checkout Session (payment mode) and return its URL
    pub async fn create_checkout_session(
        &self,
        line_items: &[CheckoutLineItem],
        currency: &str,
        success_url: &str,
        cancel_url: &str,
        order_id: i64,
    ) -> Result<String, AppError> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("success_url".to_string(), success_url.to_string()),
            ("cancel_url".to_string(), cancel_url.to_string()),
            ("metadata[orderId]".to_string(), order_id.to_string()),
        ];
        for (i, item) in line_items.iter().enumerate() {
            params.push((
                format!("line_items[{i}][price_data][currency]"),
                currency.to_string(),
            ));
            params.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                item.name.clone(),
            ));
            params.push((
                format!("line_items[{i}][price_data][product_data][description]"),
                item.description.clone(),
            ));
            params.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                item.unit_amount.to_string(),
            ));
            params.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        }

        let session: CheckoutSession = self
            .post_form("/v1/checkout/sessions", &params, None)
            .await?;
        Ok(session.url)
    }

    /// Create a connected merchant account (express) for a vendor
    pub async fn create_connected_account(
        &self,
        email: &str,
        country: &str,
    ) -> Result<String, AppError> {
        let params = vec![
            ("type".to_string(), "express".to_string()),
            ("email".to_string(), email.to_string()),
            ("country".to_string(), country.to_string()),
        ];
        let account: Account = self.post_form("/v1/accounts", &params, None).await?;
        Ok(account.id)
    }

    /// Create an account-onboarding link for a connected account
    pub async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<String, AppError> {
        let params = vec![
            ("account".to_string(), account_id.to_string()),
            ("refresh_url".to_string(), refresh_url.to_string()),
            ("return_url".to_string(), return_url.to_string()),
            ("type".to_string(), "account_onboarding".to_string()),
        ];
        let link: AccountLink = self.post_form("/v1/account_links", &params, None).await?;
        Ok(link.url)
    }

    /// Whether a connected account can accept charges
    pub async fn charges_enabled(&self, account_id: &str) -> Result<bool, AppError> {
        let account: Account = self.get(&format!("/v1/accounts/{account_id}")).await?;
        Ok(account.charges_enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refund_param_selection() {
        assert_eq!(refund_param("pi_3MtwBwLkdIwHu7ix28a3tqPa"), "payment_intent");
        assert_eq!(refund_param("ch_3MtwBwLkdIwHu7ix05b1kLrQ"), "charge");
    }

    #[test]
    fn test_payment_intent_parse() {
        let json = r#"{
            "id": "pi_3MtwBwLkdIwHu7ix28a3tqPa",
            "object": "payment_intent",
            "amount": 5000,
            "client_secret": "pi_3MtwBwLkdIwHu7ix28a3tqPa_secret_YrKJUKribcBjcG8HVhfZluoGH",
            "currency": "usd",
            "status": "requires_payment_method"
        }"#;
        let intent: PaymentIntent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.id, "pi_3MtwBwLkdIwHu7ix28a3tqPa");
        assert!(intent.client_secret.starts_with("pi_"));
    }

    #[test]
    fn test_refund_parse() {
        let json = r#"{"id": "re_1Nispe2eZvKYlo2Cd31jOCgZ", "object": "refund", "status": "succeeded"}"#;
        let refund: Refund = serde_json::from_str(json).unwrap();
        assert_eq!(refund.status, "succeeded");
    }

    #[test]
    fn test_account_parse_defaults_charges_disabled() {
        let json = r#"{"id": "acct_1032D82eZvKYlo2C"}"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert!(!account.charges_enabled);
    }
}

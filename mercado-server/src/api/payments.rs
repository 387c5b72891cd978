//! Gateway account endpoints: customer setup and vendor onboarding

use axum::extract::{Extension, State};
use serde::Serialize;
use shared::error::{ApiResponse, AppError, ErrorCode};

use crate::auth::Identity;
use crate::db::{users, vendors};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerData {
    pub customer_id: String,
}

/// POST /payments/setup-customer
///
/// Idempotent: an existing gateway customer is reused, never recreated.
pub async fn setup_customer(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<CustomerData> {
    let user = users::find_by_id(&state.pool, identity.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    if let Some(customer_id) = user.stripe_customer_id {
        return Ok(ApiResponse::success(CustomerData { customer_id }));
    }

    let customer_id = state
        .stripe
        .create_customer(&user.email, &user.name, user.id)
        .await
        .map_err(|e| AppError::with_message(ErrorCode::PaymentSetupFailed, e.message))?;
    users::set_stripe_customer(&state.pool, user.id, &customer_id).await?;

    Ok(ApiResponse::success(CustomerData { customer_id }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingLinkData {
    pub url: String,
}

/// POST /payments/onboarding-link
///
/// Creates (or reuses) the vendor's connected account and returns a
/// fresh onboarding link. Links expire, so one is minted per call.
pub async fn onboarding_link(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<OnboardingLinkData> {
    let vendor = vendors::find_by_user_id(&state.pool, identity.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::VendorProfileRequired))?;

    let account_id = match &vendor.stripe_account_id {
        Some(id) => id.clone(),
        None => {
            let account_id = state
                .stripe
                .create_connected_account(&vendor.email, &state.platform_country)
                .await
                .map_err(|e| AppError::with_message(ErrorCode::PaymentSetupFailed, e.message))?;
            vendors::set_stripe_account(&state.pool, vendor.id, &account_id).await?;
            account_id
        }
    };

    let refresh_url = format!("{}/vendor/onboarding/refresh", state.frontend_url);
    let return_url = format!("{}/vendor/onboarding/complete", state.frontend_url);
    let url = state
        .stripe
        .create_account_link(&account_id, &refresh_url, &return_url)
        .await?;

    Ok(ApiResponse::success(OnboardingLinkData { url }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargesEnabledData {
    pub charges_enabled: bool,
}

/// GET /payments/charges-enabled
pub async fn charges_enabled(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<ChargesEnabledData> {
    let vendor = vendors::find_by_user_id(&state.pool, identity.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::VendorProfileRequired))?;

    let account_id = vendor
        .stripe_account_id
        .ok_or_else(|| AppError::new(ErrorCode::VendorAccountMissing))?;

    let charges_enabled = state.stripe.charges_enabled(&account_id).await?;
    Ok(ApiResponse::success(ChargesEnabledData { charges_enabled }))
}

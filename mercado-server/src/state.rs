//! Application state for mercado-server

use sqlx::PgPool;

use crate::config::Config;
use crate::envia::EnviaClient;
use crate::stripe::StripeClient;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
///
/// Built once at startup from [`Config`] and cloned into each handler.
/// The adapters hold no mutable state; substituting them in tests only
/// requires a different base URL.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool (the ledger store)
    pub pool: PgPool,
    /// Payment gateway adapter
    pub stripe: StripeClient,
    /// Shipping carrier adapter
    pub envia: EnviaClient,
    /// JWT secret for bearer authentication
    pub jwt_secret: String,
    /// Frontend base URL for redirect/onboarding links
    pub frontend_url: String,
    /// Charge currency (lowercase ISO 4217)
    pub currency: String,
    /// Country code for carrier queries and connected accounts
    pub platform_country: String,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            stripe: StripeClient::new(&config.stripe_secret_key, &config.stripe_api_base),
            envia: EnviaClient::new(
                &config.envia_api_key,
                &config.envia_ship_base,
                &config.envia_queries_base,
                &config.envia_geocode_base,
            ),
            jwt_secret: config.jwt_secret.clone(),
            frontend_url: config.frontend_url.clone(),
            currency: config.currency.clone(),
            platform_country: config.platform_country.clone(),
        })
    }
}

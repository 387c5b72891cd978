//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for bearer authentication
    pub jwt_secret: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe API base URL (overridable for tests)
    pub stripe_api_base: String,
    /// Envia API key
    pub envia_api_key: String,
    /// Envia shipping API base URL (rate/generate/pickup)
    pub envia_ship_base: String,
    /// Envia queries API base URL (available carriers)
    pub envia_queries_base: String,
    /// Envia geocoding API base URL (zipcode lookup)
    pub envia_geocode_base: String,
    /// Frontend base URL for checkout redirect/onboarding links
    pub frontend_url: String,
    /// Charge currency (ISO 4217, lowercase)
    pub currency: String,
    /// Country code for carrier queries and connected accounts
    pub platform_country: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            stripe_secret_key: Self::require_secret("STRIPE_SECRET_KEY", &environment)?,
            stripe_api_base: std::env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".into()),
            envia_api_key: Self::require_secret("ENVIA_API_KEY", &environment)?,
            envia_ship_base: std::env::var("ENVIA_SHIP_BASE")
                .unwrap_or_else(|_| "https://api-test.envia.com".into()),
            envia_queries_base: std::env::var("ENVIA_QUERIES_BASE")
                .unwrap_or_else(|_| "https://queries-test.envia.com".into()),
            envia_geocode_base: std::env::var("ENVIA_GEOCODE_BASE")
                .unwrap_or_else(|_| "https://geocodes.envia.com".into()),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "usd".into()),
            platform_country: std::env::var("PLATFORM_COUNTRY").unwrap_or_else(|_| "MX".into()),
            environment,
        })
    }
}

use serde::Serialize;
use sqlx::PgPool;

/// Vendor profile with resolved region names (shipment origin data)
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorRow {
    pub id: i64,
    pub user_id: i64,
    pub store_name: String,
    pub vendor_full_name: String,
    pub email: String,
    pub whatsapp_number: String,
    pub postal_code: String,
    pub store_location: String,
    pub city_name: Option<String>,
    pub state_code: Option<String>,
    #[serde(skip_serializing)]
    pub stripe_account_id: Option<String>,
}

const VENDOR_SELECT: &str = r#"
    SELECT v.id, v.user_id, v.store_name, v.vendor_full_name, v.email,
           v.whatsapp_number, v.postal_code, v.store_location,
           ci.name AS city_name, s.iso_code AS state_code,
           v.stripe_account_id
    FROM vendor_profiles v
    LEFT JOIN cities ci ON ci.id = v.city_id
    LEFT JOIN states s ON s.id = v.state_id
"#;

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<VendorRow>, sqlx::Error> {
    sqlx::query_as::<_, VendorRow>(&format!("{VENDOR_SELECT} WHERE v.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_user_id(pool: &PgPool, user_id: i64) -> Result<Option<VendorRow>, sqlx::Error> {
    sqlx::query_as::<_, VendorRow>(&format!("{VENDOR_SELECT} WHERE v.user_id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn set_stripe_account(
    pool: &PgPool,
    vendor_id: i64,
    account_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE vendor_profiles SET stripe_account_id = $1 WHERE id = $2")
        .bind(account_id)
        .bind(vendor_id)
        .execute(pool)
        .await?;
    Ok(())
}

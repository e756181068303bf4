use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Shipping policy values, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ShippingConfig {
    pub free_shipping_threshold: Decimal,
    pub standard_cost: Decimal,
    pub express_cost: Decimal,
}

/// Federated login collaborator (authorization-code exchange + userinfo).
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub token_url: String,
    pub userinfo_url: String,
}

/// Marketing/email platform credentials. All optional; the marketing routes
/// report a configuration error when used without them.
#[derive(Debug, Clone)]
pub struct MarketingConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub newsletter_list_id: Option<String>,
    pub welcome_coupon: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub commerce_domain: String,
    pub commerce_access_token: String,
    pub commerce_api_version: String,
    pub cart_data_dir: PathBuf,
    pub shipping: ShippingConfig,
    pub marketing: MarketingConfig,
    pub oauth: Option<OAuthConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let commerce_domain = env::var("COMMERCE_STORE_DOMAIN")?;
        let commerce_access_token = env::var("COMMERCE_STOREFRONT_ACCESS_TOKEN")?;
        let commerce_api_version =
            env::var("COMMERCE_API_VERSION").unwrap_or_else(|_| "2024-10".to_string());

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let cart_data_dir = env::var("CART_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/carts"));

        let shipping = ShippingConfig {
            free_shipping_threshold: decimal_env("FREE_SHIPPING_THRESHOLD", Decimal::new(99, 0)),
            standard_cost: decimal_env("SHIPPING_STANDARD_COST", Decimal::new(9, 0)),
            express_cost: decimal_env("SHIPPING_EXPRESS_COST", Decimal::new(1495, 2)),
        };

        let marketing = MarketingConfig {
            api_base: env::var("MARKETING_API_BASE")
                .unwrap_or_else(|_| "https://a.klaviyo.com".to_string()),
            api_key: env::var("MARKETING_PRIVATE_KEY").ok(),
            newsletter_list_id: env::var("NEWSLETTER_LIST_ID").ok(),
            welcome_coupon: env::var("NEWSLETTER_WELCOME_COUPON").ok(),
        };

        let oauth = match (
            env::var("GOOGLE_CLIENT_ID"),
            env::var("GOOGLE_CLIENT_SECRET"),
            env::var("OAUTH_REDIRECT_URI"),
        ) {
            (Ok(client_id), Ok(client_secret), Ok(redirect_uri)) => Some(OAuthConfig {
                client_id,
                client_secret,
                redirect_uri,
                token_url: env::var("OAUTH_TOKEN_URL")
                    .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string()),
                userinfo_url: env::var("OAUTH_USERINFO_URL").unwrap_or_else(|_| {
                    "https://www.googleapis.com/oauth2/v3/userinfo".to_string()
                }),
            }),
            _ => None,
        };

        Ok(Self {
            host,
            port,
            commerce_domain,
            commerce_access_token,
            commerce_api_version,
            cart_data_dir,
            shipping,
            marketing,
            oauth,
        })
    }
}

fn decimal_env(key: &str, default: Decimal) -> Decimal {
    env::var(key)
        .ok()
        .and_then(|v| Decimal::from_str(v.trim()).ok())
        .unwrap_or(default)
}

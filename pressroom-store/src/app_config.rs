use pressroom_catalog::PricingConfig;
use pressroom_quote::MAX_VALIDITY_DAYS;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub email: EmailConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub vat_rate: f64,
    pub price_match_discount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_quote_validity_days")]
    pub quote_validity_days: i64,
}

fn default_currency() -> String {
    "GBP".to_string()
}

fn default_quote_validity_days() -> i64 {
    30
}

impl BusinessRules {
    /// Rates as exact decimals for the pricing engine.
    /// Rejects an out-of-range `quote_validity_days` as well.
    pub fn pricing_config(&self) -> Result<PricingConfig, config::ConfigError> {
        if !(1..=MAX_VALIDITY_DAYS).contains(&self.quote_validity_days) {
            return Err(config::ConfigError::Message(format!(
                "quote_validity_days must be in [1, {}], got {}",
                MAX_VALIDITY_DAYS, self.quote_validity_days
            )));
        }

        Ok(PricingConfig {
            vat_rate: rate("vat_rate", self.vat_rate)?,
            price_match_discount: rate("price_match_discount", self.price_match_discount)?,
            currency: self.currency.clone(),
        })
    }
}

fn rate(key: &str, value: f64) -> Result<Decimal, config::ConfigError> {
    let parsed = Decimal::from_str(&value.to_string())
        .map_err(|e| config::ConfigError::Message(format!("{}: {}", key, e)))?;
    if parsed < Decimal::ZERO || parsed >= Decimal::ONE {
        return Err(config::ConfigError::Message(format!("{} must be in [0, 1), got {}", key, value)));
    }
    Ok(parsed)
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    /// Exchanged for an admin token at `/v1/auth/admin`
    pub admin_api_key: String,
    #[serde(default)]
    pub admin_permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Where the storefront lives; checkout redirects come back here.
    pub public_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Mock,
    Stripe,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    pub provider: PaymentProvider,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default = "default_payments_api_base")]
    pub api_base: String,
}

fn default_payments_api_base() -> String {
    "https://api.stripe.com".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    Log,
    Http,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub provider: EmailProvider,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    pub from_address: String,
    /// Inbox that receives new quote and price-match submissions
    pub shop_address: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. PRESSROOM__DATABASE__URL
            .add_source(config::Environment::with_prefix("PRESSROOM").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_TOML: &str = include_str!("../../config/default.toml");

    fn from_toml(toml: &str) -> Result<Config, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_default_config_parses() {
        let config = from_toml(DEFAULT_TOML).unwrap();
        assert_eq!(config.payments.provider, PaymentProvider::Mock);
        assert_eq!(config.email.provider, EmailProvider::Log);
        assert_eq!(config.business_rules.quote_validity_days, 30);

        let pricing = config.business_rules.pricing_config().unwrap();
        assert_eq!(pricing.vat_rate, Decimal::new(20, 2));
        assert_eq!(pricing.price_match_discount, Decimal::new(5, 2));
        assert_eq!(pricing.currency, "GBP");
    }

    #[test]
    fn test_rates_out_of_range() {
        let rules = BusinessRules {
            vat_rate: 1.5,
            price_match_discount: 0.05,
            currency: "GBP".to_string(),
            quote_validity_days: 30,
        };
        assert!(rules.pricing_config().is_err());
    }

    #[test]
    fn test_quote_validity_out_of_range() {
        let mut rules = BusinessRules {
            vat_rate: 0.2,
            price_match_discount: 0.05,
            currency: "GBP".to_string(),
            quote_validity_days: 0,
        };
        assert!(rules.pricing_config().is_err());

        rules.quote_validity_days = i64::MAX;
        assert!(rules.pricing_config().is_err());

        rules.quote_validity_days = MAX_VALIDITY_DAYS;
        assert!(rules.pricing_config().is_ok());
    }
}

use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::{info, warn};

use crate::app_config::{BusinessRules, DatabaseConfig};

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay rules stored in the `business_rules` table on top of the configured ones.
    pub async fn fetch_business_rules(&self, defaults: BusinessRules) -> Result<BusinessRules, sqlx::Error> {
        let rows: Vec<(String, Value)> = sqlx::query_as("SELECT rule_key, rule_value FROM business_rules")
            .fetch_all(&self.pool)
            .await?;

        Ok(apply_rule_overrides(defaults, rows))
    }
}

/// Rows look like `("vat_rate", {"value": 0.2})`. Unknown keys and values of the
/// wrong type are skipped.
pub fn apply_rule_overrides(defaults: BusinessRules, rows: Vec<(String, Value)>) -> BusinessRules {
    let mut rules = defaults;

    for (key, rule_value) in rows {
        let Some(v) = rule_value.get("value") else {
            warn!(rule = %key, "Business rule without a value, ignored");
            continue;
        };

        match key.as_str() {
            "vat_rate" => {
                if let Some(f) = v.as_f64() {
                    rules.vat_rate = f;
                }
            }
            "price_match_discount" => {
                if let Some(f) = v.as_f64() {
                    rules.price_match_discount = f;
                }
            }
            "currency" => {
                if let Some(s) = v.as_str() {
                    rules.currency = s.to_string();
                }
            }
            "quote_validity_days" => {
                if let Some(d) = v.as_i64() {
                    rules.quote_validity_days = d;
                }
            }
            _ => {}
        }
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> BusinessRules {
        BusinessRules {
            vat_rate: 0.2,
            price_match_discount: 0.05,
            currency: "GBP".to_string(),
            quote_validity_days: 30,
        }
    }

    #[test]
    fn test_overrides_apply() {
        let rules = apply_rule_overrides(
            defaults(),
            vec![
                ("price_match_discount".to_string(), json!({"value": 0.1})),
                ("quote_validity_days".to_string(), json!({"value": 14})),
                ("unknown".to_string(), json!({"value": true})),
            ],
        );
        assert_eq!(rules.price_match_discount, 0.1);
        assert_eq!(rules.quote_validity_days, 14);
        assert_eq!(rules.vat_rate, 0.2);
    }

    #[test]
    fn test_malformed_overrides_are_ignored() {
        let rules = apply_rule_overrides(
            defaults(),
            vec![
                ("vat_rate".to_string(), json!({"value": "twenty"})),
                ("currency".to_string(), json!("EUR")),
            ],
        );
        assert_eq!(rules.vat_rate, 0.2);
        assert_eq!(rules.currency, "GBP");
    }
}

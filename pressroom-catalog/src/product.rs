use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::pricing::max_amount;

/// A single option inside a configuration group, e.g. "Gloss" in "Finish".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionChoice {
    pub name: String,
    /// Added to the base price per unit. May be negative.
    pub price_modifier: Decimal,
    /// Display label for what the modifier is charged per ("per sheet", "per 100").
    #[serde(default)]
    pub unit: Option<String>,
}

/// An ordered set of mutually exclusive choices, e.g. "Paper stock".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionGroup {
    pub name: String,
    pub choices: Vec<OptionChoice>,
}

/// Customer pick: which choice was taken in which group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selection {
    pub group: String,
    pub choice: String,
}

/// A selection resolved against the catalog, carrying the modifier it was priced at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedOption {
    pub group: String,
    pub choice: String,
    pub price_modifier: Decimal,
    pub unit: Option<String>,
}

/// Catalog entry for a print product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    /// Priced by hand through a quote request instead of the configurator.
    pub quote_only: bool,
    pub is_active: bool,
    pub option_groups: Vec<OptionGroup>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: impl Into<String>, base_price: Decimal) -> Result<Self, ProductError> {
        let name = name.into();
        let now = Utc::now();
        let product = Self {
            id: Uuid::new_v4(),
            slug: slugify(&name),
            name,
            description: None,
            base_price,
            quote_only: false,
            is_active: true,
            option_groups: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    pub fn with_group(mut self, group: OptionGroup) -> Self {
        self.option_groups.push(group);
        self
    }

    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::Invalid("name is required".to_string()));
        }
        if self.slug.is_empty() {
            return Err(ProductError::Invalid("slug is required".to_string()));
        }
        if self.base_price < Decimal::ZERO {
            return Err(ProductError::Invalid("base price must not be negative".to_string()));
        }
        if self.base_price > max_amount() {
            return Err(ProductError::Invalid(format!("base price must not exceed {}", max_amount())));
        }

        let mut group_names = HashSet::new();
        for group in &self.option_groups {
            if group.name.trim().is_empty() {
                return Err(ProductError::Invalid("option group name is required".to_string()));
            }
            if !group_names.insert(group.name.as_str()) {
                return Err(ProductError::Invalid(format!("duplicate option group '{}'", group.name)));
            }
            if group.choices.is_empty() {
                return Err(ProductError::Invalid(format!("option group '{}' has no choices", group.name)));
            }
            let mut choice_names = HashSet::new();
            for choice in &group.choices {
                if choice.price_modifier.abs() > max_amount() {
                    return Err(ProductError::Invalid(format!(
                        "price modifier of '{}' in group '{}' is out of range",
                        choice.name, group.name
                    )));
                }
                if !choice_names.insert(choice.name.as_str()) {
                    return Err(ProductError::Invalid(format!(
                        "duplicate choice '{}' in group '{}'",
                        choice.name, group.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Match customer selections against the product's groups.
    ///
    /// Every group needs exactly one selection. The result follows the
    /// product's group order, not the order the selections arrived in.
    pub fn resolve_selections(&self, selections: &[Selection]) -> Result<Vec<SelectedOption>, ProductError> {
        let mut seen = HashSet::new();
        for selection in selections {
            if !self.option_groups.iter().any(|g| g.name == selection.group) {
                return Err(ProductError::UnknownGroup(selection.group.clone()));
            }
            if !seen.insert(selection.group.as_str()) {
                return Err(ProductError::DuplicateSelection(selection.group.clone()));
            }
        }

        self.option_groups
            .iter()
            .map(|group| {
                let selection = selections
                    .iter()
                    .find(|s| s.group == group.name)
                    .ok_or_else(|| ProductError::MissingSelection(group.name.clone()))?;

                let choice = group
                    .choices
                    .iter()
                    .find(|c| c.name == selection.choice)
                    .ok_or_else(|| ProductError::UnknownChoice {
                        group: group.name.clone(),
                        choice: selection.choice.clone(),
                    })?;

                Ok(SelectedOption {
                    group: group.name.clone(),
                    choice: choice.name.clone(),
                    price_modifier: choice.price_modifier,
                    unit: choice.unit.clone(),
                })
            })
            .collect()
    }

    /// First choice in every group; what the configurator shows before the customer touches it.
    pub fn default_selections(&self) -> Vec<Selection> {
        self.option_groups
            .iter()
            .filter_map(|group| {
                group.choices.first().map(|choice| Selection {
                    group: group.name.clone(),
                    choice: choice.name.clone(),
                })
            })
            .collect()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// URL-safe slug: lowercase alphanumerics separated by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Product-related errors
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Invalid product: {0}")]
    Invalid(String),

    #[error("Unknown option group: {0}")]
    UnknownGroup(String),

    #[error("Unknown choice '{choice}' in option group '{group}'")]
    UnknownChoice { group: String, choice: String },

    #[error("Option group selected more than once: {0}")]
    DuplicateSelection(String),

    #[error("No choice selected for option group: {0}")]
    MissingSelection(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flyers() -> Product {
        Product::new("A5 Flyers", Decimal::new(2500, 2))
            .unwrap()
            .with_group(OptionGroup {
                name: "Paper".to_string(),
                choices: vec![
                    OptionChoice { name: "130gsm Silk".to_string(), price_modifier: Decimal::ZERO, unit: None },
                    OptionChoice {
                        name: "350gsm Card".to_string(),
                        price_modifier: Decimal::new(1200, 2),
                        unit: Some("per 100".to_string()),
                    },
                ],
            })
            .with_group(OptionGroup {
                name: "Sides".to_string(),
                choices: vec![
                    OptionChoice { name: "Single".to_string(), price_modifier: Decimal::ZERO, unit: None },
                    OptionChoice { name: "Double".to_string(), price_modifier: Decimal::new(500, 2), unit: None },
                ],
            })
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("A5 Flyers"), "a5-flyers");
        assert_eq!(slugify("  Business Cards (Premium)!  "), "business-cards-premium");
        assert_eq!(slugify("Posters -- A2/A1"), "posters-a2-a1");
    }

    #[test]
    fn test_new_rejects_negative_base_price() {
        let result = Product::new("Stickers", Decimal::new(-1, 0));
        assert!(matches!(result, Err(ProductError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_amounts_above_limit() {
        assert!(Product::new("Billboard", max_amount()).is_ok());
        let result = Product::new("Billboard", Decimal::new(10_000_000_000, 0));
        assert!(matches!(result, Err(ProductError::Invalid(_))));

        let mut product = flyers();
        product.option_groups[1].choices[1].price_modifier = Decimal::MIN;
        assert!(matches!(product.validate(), Err(ProductError::Invalid(_))));
    }

    #[test]
    fn test_resolve_selections_follows_group_order() {
        let product = flyers();
        let selections = vec![
            Selection { group: "Sides".to_string(), choice: "Double".to_string() },
            Selection { group: "Paper".to_string(), choice: "350gsm Card".to_string() },
        ];

        let resolved = product.resolve_selections(&selections).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].group, "Paper");
        assert_eq!(resolved[0].price_modifier, Decimal::new(1200, 2));
        assert_eq!(resolved[0].unit.as_deref(), Some("per 100"));
        assert_eq!(resolved[1].choice, "Double");
    }

    #[test]
    fn test_resolve_selections_errors() {
        let product = flyers();

        let unknown_group = vec![Selection { group: "Lamination".to_string(), choice: "Matt".to_string() }];
        assert!(matches!(product.resolve_selections(&unknown_group), Err(ProductError::UnknownGroup(_))));

        let unknown_choice = vec![
            Selection { group: "Paper".to_string(), choice: "Vellum".to_string() },
            Selection { group: "Sides".to_string(), choice: "Single".to_string() },
        ];
        assert!(matches!(product.resolve_selections(&unknown_choice), Err(ProductError::UnknownChoice { .. })));

        let duplicate = vec![
            Selection { group: "Paper".to_string(), choice: "130gsm Silk".to_string() },
            Selection { group: "Paper".to_string(), choice: "350gsm Card".to_string() },
        ];
        assert!(matches!(product.resolve_selections(&duplicate), Err(ProductError::DuplicateSelection(_))));

        let missing = vec![Selection { group: "Paper".to_string(), choice: "130gsm Silk".to_string() }];
        assert!(matches!(product.resolve_selections(&missing), Err(ProductError::MissingSelection(g)) if g == "Sides"));
    }

    #[test]
    fn test_default_selections_resolve() {
        let product = flyers();
        let defaults = product.default_selections();
        assert_eq!(defaults.len(), 2);
        assert!(product.resolve_selections(&defaults).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_group() {
        let product = Product::new("Banners", Decimal::new(40, 0))
            .unwrap()
            .with_group(OptionGroup { name: "Size".to_string(), choices: vec![] });
        assert!(product.validate().is_err());
    }
}

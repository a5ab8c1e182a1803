pub mod product;
pub mod pricing;

pub use product::{slugify, OptionChoice, OptionGroup, Product, ProductError, SelectedOption, Selection};
pub use pricing::{
    max_amount, parse_competitor_price, parse_quantity, round_money, PriceBreakdown, PricingConfig, PricingEngine, PricingError,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::QuoteError;

/// Contact details a customer leaves on a quote or price-match form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl CustomerInfo {
    pub fn validate(&self) -> Result<(), QuoteError> {
        if self.name.trim().is_empty() {
            return Err(QuoteError::Validation("customer name is required".to_string()));
        }
        if !is_plausible_email(&self.email) {
            return Err(QuoteError::Validation(format!("invalid email address '{}'", self.email)));
        }
        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    }
}

/// Quote request status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Pending,
    Approved,
    Rejected,
    ConvertedToOrder,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Approved => "approved",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::ConvertedToOrder => "converted_to_order",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(QuoteStatus::Pending),
            "approved" => Ok(QuoteStatus::Approved),
            "rejected" => Ok(QuoteStatus::Rejected),
            "converted_to_order" => Ok(QuoteStatus::ConvertedToOrder),
            other => Err(QuoteError::Validation(format!("unknown quote status '{}'", other))),
        }
    }
}

/// Price match request status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceMatchStatus {
    Pending,
    Approved,
    Rejected,
    Contacted,
}

impl PriceMatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceMatchStatus::Pending => "pending",
            PriceMatchStatus::Approved => "approved",
            PriceMatchStatus::Rejected => "rejected",
            PriceMatchStatus::Contacted => "contacted",
        }
    }
}

impl fmt::Display for PriceMatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceMatchStatus {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PriceMatchStatus::Pending),
            "approved" => Ok(PriceMatchStatus::Approved),
            "rejected" => Ok(PriceMatchStatus::Rejected),
            "contacted" => Ok(PriceMatchStatus::Contacted),
            other => Err(QuoteError::Validation(format!("unknown price match status '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(name: &str, email: &str) -> CustomerInfo {
        CustomerInfo { name: name.to_string(), email: email.to_string(), phone: None, company: None }
    }

    #[test]
    fn test_customer_validation() {
        assert!(customer("Ada", "ada@example.com").validate().is_ok());
        assert!(customer("", "ada@example.com").validate().is_err());
        assert!(customer("Ada", "ada.example.com").validate().is_err());
        assert!(customer("Ada", "@example.com").validate().is_err());
        assert!(customer("Ada", "ada@").validate().is_err());
        assert!(customer("Ada", "a@b@c").validate().is_err());
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(QuoteStatus::ConvertedToOrder.as_str(), "converted_to_order");
        assert_eq!("approved".parse::<QuoteStatus>().unwrap(), QuoteStatus::Approved);
        assert!("APPROVED".parse::<QuoteStatus>().is_err());

        let json = serde_json::to_string(&PriceMatchStatus::Contacted).unwrap();
        assert_eq!(json, "\"contacted\"");
        assert_eq!(json.trim_matches('"').parse::<PriceMatchStatus>().unwrap(), PriceMatchStatus::Contacted);
    }
}

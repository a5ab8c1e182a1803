use async_trait::async_trait;
use pressroom_core::notify::{Notifier, NotifyError};
use pressroom_shared::StoreEvent;
use serde::Serialize;

/// Plain-text message ready to hand to the email API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Sends store events as plain-text emails through a JSON email API.
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_address: String,
    shop_address: String,
}

impl HttpMailer {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from_address: impl Into<String>,
        shop_address: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            from_address: from_address.into(),
            shop_address: shop_address.into(),
        }
    }

    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), NotifyError> {
        let body = OutgoingEmail {
            from: &self.from_address,
            to,
            subject: &email.subject,
            text: &email.text,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status: status.as_u16(), body });
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn notify(&self, event: &StoreEvent) -> Result<(), NotifyError> {
        let email = render(event);
        self.send(event.customer_email().expose(), &email).await?;

        if event.needs_shop_attention() {
            let internal = RenderedEmail {
                subject: format!("[shop] {}", email.subject),
                text: email.text.clone(),
            };
            self.send(&self.shop_address, &internal).await?;
        }

        tracing::debug!(kind = event.kind(), "Notification sent");
        Ok(())
    }
}

pub fn render(event: &StoreEvent) -> RenderedEmail {
    match event {
        StoreEvent::QuoteSubmitted(e) => RenderedEmail {
            subject: format!("We've received your quote request {}", e.reference),
            text: format!(
                "Hi {},\n\nThanks for your quote request ({}). We'll review your project and get back to you with a price.\n\nYour project:\n{}\n",
                e.customer_name, e.reference, e.project_description
            ),
        },
        StoreEvent::QuoteApproved(e) => {
            let vat = if e.include_vat { " + VAT" } else { "" };
            let validity = e
                .expires_at
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
                .map(|at| format!(" This price is valid until {}.", at.format("%d %B %Y")))
                .unwrap_or_default();
            RenderedEmail {
                subject: format!("Your quote {} is ready", e.reference),
                text: format!(
                    "Good news: we can do your job for £{}{}.{}\n\nReply to this email or visit your account to go ahead.\n",
                    e.quoted_price, vat, validity
                ),
            }
        }
        StoreEvent::QuoteRejected(e) => RenderedEmail {
            subject: format!("About your quote request {}", e.reference),
            text: match &e.reason {
                Some(reason) => format!("Unfortunately we can't take on this job.\n\n{}\n", reason),
                None => "Unfortunately we can't take on this job.\n".to_string(),
            },
        },
        StoreEvent::OrderPlaced(e) => RenderedEmail {
            subject: format!("Order {} received", e.order_number),
            text: format!(
                "We've received order {} for {} {}. We'll start printing once payment clears.\n",
                e.order_number, e.total, e.currency
            ),
        },
        StoreEvent::OrderPaid(e) => RenderedEmail {
            subject: format!("Payment received for order {}", e.order_number),
            text: format!(
                "Thank you. We've received {} {} for order {} and your job is now in the queue.\n",
                e.total, e.currency, e.order_number
            ),
        },
        StoreEvent::OrderCancelled(e) => RenderedEmail {
            subject: format!("Order {} cancelled", e.order_number),
            text: format!("Order {} has been cancelled: {}\n", e.order_number, e.reason),
        },
        StoreEvent::PriceMatchSubmitted(e) => RenderedEmail {
            subject: format!("Price match request for {}", e.product_name),
            text: format!(
                "We've received your price match request for {} against a competitor price of £{}. We'll be in touch shortly.\n",
                e.product_name, e.competitor_price
            ),
        },
        StoreEvent::PriceMatchResolved(e) => RenderedEmail {
            subject: format!("Your price match request for {}", e.product_name),
            text: match (e.outcome.as_str(), e.offered_total) {
                ("approved", Some(total)) => {
                    format!("We'll beat that price. We can do {} for £{}.\n", e.product_name, total)
                }
                ("contacted", _) => format!("We've been in touch about your price match for {}.\n", e.product_name),
                _ => format!("Sorry, we can't match that price for {} this time.\n", e.product_name),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressroom_shared::models::events::{PriceMatchResolvedEvent, QuoteApprovedEvent, QuoteSubmittedEvent};
    use pressroom_shared::Masked;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn test_render_quote_submitted() {
        let event = StoreEvent::QuoteSubmitted(QuoteSubmittedEvent {
            quote_id: Uuid::new_v4(),
            reference: "Q-ABCDEF12".to_string(),
            customer_name: "Grace".to_string(),
            customer_email: Masked::from("grace@example.com"),
            project_description: "Trade show banners".to_string(),
            timestamp: 0,
        });

        let email = render(&event);
        assert!(email.subject.contains("Q-ABCDEF12"));
        assert!(email.text.starts_with("Hi Grace"));
        assert!(email.text.contains("Trade show banners"));
    }

    #[test]
    fn test_render_quote_approved_mentions_vat_and_expiry() {
        let event = StoreEvent::QuoteApproved(QuoteApprovedEvent {
            quote_id: Uuid::new_v4(),
            reference: "Q-1".to_string(),
            customer_email: Masked::from("a@b.co"),
            quoted_price: Decimal::new(45000, 2),
            include_vat: true,
            expires_at: Some(1_767_225_600),
            timestamp: 0,
        });

        let email = render(&event);
        assert!(email.text.contains("£450.00 + VAT"));
        assert!(email.text.contains("2026"));
    }

    #[test]
    fn test_render_price_match_outcomes() {
        let base = PriceMatchResolvedEvent {
            request_id: Uuid::new_v4(),
            product_name: "Posters".to_string(),
            customer_email: Masked::from("a@b.co"),
            outcome: "approved".to_string(),
            offered_total: Some(Decimal::new(9500, 2)),
            timestamp: 0,
        };
        let approved = render(&StoreEvent::PriceMatchResolved(base.clone()));
        assert!(approved.text.contains("£95.00"));

        let rejected = render(&StoreEvent::PriceMatchResolved(PriceMatchResolvedEvent {
            outcome: "rejected".to_string(),
            offered_total: None,
            ..base
        }));
        assert!(rejected.text.starts_with("Sorry"));
    }
}

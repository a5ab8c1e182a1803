use pressroom_core::PaymentStatus;
use rust_decimal::Decimal;

use crate::models::{Order, OrderStatus, PaymentState};
use crate::OrderError;

/// Allowed status moves. Paid and Cancelled are terminal.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    matches!(
        (from, to),
        (OrderStatus::Pending, OrderStatus::Paid)
            | (OrderStatus::QuotePriced, OrderStatus::Paid)
            | (OrderStatus::Pending, OrderStatus::Cancelled)
            | (OrderStatus::QuotePriced, OrderStatus::Cancelled)
    )
}

impl Order {
    fn transition(&mut self, to: OrderStatus) -> Result<(), OrderError> {
        if !can_transition(self.status, to) {
            return Err(OrderError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.touch();
        Ok(())
    }

    /// Still waiting for money and there is money to take.
    pub fn is_payable(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::QuotePriced)
            && self.payment_state != PaymentState::Paid
            && self.total > Decimal::ZERO
    }

    /// Remember which checkout session is paying for this order.
    pub fn attach_payment(&mut self, reference: impl Into<String>) -> Result<(), OrderError> {
        if !matches!(self.status, OrderStatus::Pending | OrderStatus::QuotePriced) {
            return Err(OrderError::NotPayable(self.order_number.clone()));
        }
        self.payment_reference = Some(reference.into());
        self.payment_state = PaymentState::Unpaid;
        self.touch();
        Ok(())
    }

    pub fn mark_paid(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Paid)?;
        self.payment_state = PaymentState::Paid;
        Ok(())
    }

    pub fn mark_payment_failed(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Cancelled)?;
        self.payment_state = PaymentState::Failed;
        Ok(())
    }

    pub fn cancel(&mut self, reason: Option<String>) -> Result<(), OrderError> {
        self.transition(OrderStatus::Cancelled)?;
        if reason.is_some() {
            self.notes = reason;
        }
        Ok(())
    }

    /// Fold a gateway status into the order.
    ///
    /// Returns whether anything changed, so replayed notifications are no-ops.
    pub fn apply_payment_status(&mut self, status: PaymentStatus) -> Result<bool, OrderError> {
        let current = self.status;
        match current {
            OrderStatus::Paid | OrderStatus::Cancelled => Ok(false),
            _ if status.is_settled() => self.mark_paid().map(|_| true),
            _ if status.is_terminal_failure() => self.mark_payment_failed().map(|_| true),
            _ => Ok(false),
        }
    }

    /// `apply_payment_status` for a status reported on a specific checkout session.
    ///
    /// Failures from a session the order has since replaced are ignored; a settled
    /// payment counts from any of the order's sessions and becomes the reference.
    pub fn apply_session_status(&mut self, session_id: &str, status: PaymentStatus) -> Result<bool, OrderError> {
        let is_current = self.payment_reference.as_deref() == Some(session_id);
        if !is_current && !status.is_settled() {
            return Ok(false);
        }

        let changed = self.apply_payment_status(status)?;
        if changed && !is_current {
            self.payment_reference = Some(session_id.to_string());
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::priced_order;

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;
        let all = [Pending, QuotePriced, Paid, Cancelled];
        for from in all {
            for to in all {
                let expected = matches!(from, Pending | QuotePriced) && matches!(to, Paid | Cancelled);
                assert_eq!(can_transition(from, to), expected, "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_pay_then_cannot_cancel() {
        let mut order = priced_order();
        assert!(order.is_payable());

        order.attach_payment("cs_test_1").unwrap();
        order.mark_paid().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_state, PaymentState::Paid);
        assert!(!order.is_payable());

        assert!(matches!(order.cancel(None), Err(OrderError::InvalidTransition { .. })));
        assert!(matches!(order.attach_payment("cs_test_2"), Err(OrderError::NotPayable(_))));
    }

    #[test]
    fn test_payment_failure_cancels() {
        let mut order = priced_order();
        order.mark_payment_failed().unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.payment_state, PaymentState::Failed);
        assert!(order.mark_paid().is_err());
    }

    #[test]
    fn test_cancel_keeps_reason() {
        let mut order = priced_order();
        order.cancel(Some("Customer changed their mind".to_string())).unwrap();
        assert_eq!(order.notes.as_deref(), Some("Customer changed their mind"));
    }

    #[test]
    fn test_apply_payment_status_is_idempotent() {
        let mut order = priced_order();
        assert!(!order.apply_payment_status(PaymentStatus::Open).unwrap());
        assert!(!order.apply_payment_status(PaymentStatus::Processing).unwrap());
        assert!(order.apply_payment_status(PaymentStatus::Complete).unwrap());
        assert!(!order.apply_payment_status(PaymentStatus::Complete).unwrap());
        // a late expiry must not undo a payment
        assert!(!order.apply_payment_status(PaymentStatus::Expired).unwrap());
        assert_eq!(order.status, OrderStatus::Paid);
    }

    #[test]
    fn test_zero_total_is_not_payable() {
        let mut order = priced_order();
        order.total = Decimal::ZERO;
        assert!(!order.is_payable());
    }

    #[test]
    fn test_stale_session_failure_is_ignored() {
        let mut order = priced_order();
        order.attach_payment("cs_first").unwrap();
        order.attach_payment("cs_second").unwrap();

        assert!(!order.apply_session_status("cs_first", PaymentStatus::Expired).unwrap());
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_state, PaymentState::Unpaid);

        assert!(order.apply_session_status("cs_second", PaymentStatus::Complete).unwrap());
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_reference.as_deref(), Some("cs_second"));
    }

    #[test]
    fn test_payment_on_replaced_session_still_counts() {
        let mut order = priced_order();
        order.attach_payment("cs_first").unwrap();
        order.attach_payment("cs_second").unwrap();

        assert!(order.apply_session_status("cs_first", PaymentStatus::Complete).unwrap());
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_reference.as_deref(), Some("cs_first"));

        // the abandoned session expiring afterwards changes nothing
        assert!(!order.apply_session_status("cs_second", PaymentStatus::Expired).unwrap());
        assert_eq!(order.status, OrderStatus::Paid);
    }

    #[test]
    fn test_current_session_failure_cancels() {
        let mut order = priced_order();
        order.attach_payment("cs_only").unwrap();

        assert!(order.apply_session_status("cs_only", PaymentStatus::Failed).unwrap());
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.payment_state, PaymentState::Failed);
    }
}

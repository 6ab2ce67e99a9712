//! Delivery reporting for invitation emails

use crate::{EmailError, EmailReceipt, Invitation};

/// Receives the outcome of each invitation delivery attempt, exactly once per attempt
pub trait DeliveryObserver: Send + Sync {
    fn delivery_succeeded(&self, _invitation: &Invitation, _receipt: &EmailReceipt) {}

    fn delivery_failed(&self, invitation: &Invitation, error: &EmailError);
}

/// Reports outcomes through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDeliveryObserver;

impl DeliveryObserver for TracingDeliveryObserver {
    fn delivery_succeeded(&self, invitation: &Invitation, receipt: &EmailReceipt) {
        tracing::info!(
            recipient = %invitation.email,
            role = %invitation.role,
            provider = %receipt.provider,
            message_id = %receipt.message_id,
            "Invitation email sent"
        );
    }

    fn delivery_failed(&self, invitation: &Invitation, error: &EmailError) {
        tracing::error!(
            recipient = %invitation.email,
            role = %invitation.role,
            error = %error,
            "Error sending invitation email"
        );
    }
}

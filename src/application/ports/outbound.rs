//! Outbound ports: collaborators the reservation engine calls out to
//!
//! Persistence is reached through
//! [`RepositoryProvider`](crate::domain::RepositoryProvider); the two ports
//! here cover notification dispatch and payment lookup.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::events::Event;
use crate::domain::DomainResult;

#[derive(Debug, Error)]
#[error("Notification dispatch failed: {0}")]
pub struct NotifyError(pub String);

/// Fire-and-forget notification dispatch (confirmation, cancellation and
/// reminder mails). Called after the booking is persisted; a returned
/// error is logged and never rolls back the booking.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: Event) -> Result<(), NotifyError>;
}

pub type SharedNotifier = Arc<dyn Notifier>;

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Read side of the payment collaborator. Refund execution itself happens
/// outside the engine from the amount the engine computes.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Whether a completed (captured) payment exists for the booking
    async fn has_completed_payment(&self, booking_id: Uuid) -> DomainResult<bool>;
}

pub type SharedPaymentGateway = Arc<dyn PaymentGateway>;

//! Application ports (hexagonal architecture boundaries)
//!
//! Outbound contracts for the notification and payment collaborators.

pub mod outbound;

pub use outbound::{
    Notifier, NotifyError, NullNotifier, PaymentGateway, SharedNotifier, SharedPaymentGateway,
};

pub mod booking;
pub mod events;
pub mod ports;

// Re-export key types for convenience
pub use booking::{
    AvailabilityReport, CancellationOutcome, CreateReservation, PriceRequest, PricingPolicy,
    ReservationService, UpdateReservation,
};
pub use events::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use ports::{
    Notifier, NotifyError, NullNotifier, PaymentGateway, SharedNotifier, SharedPaymentGateway,
};

//! Domain events
//!
//! Facts about bookings that the notification collaborator consumes.
//! The EventBus implementation lives in `application::events`.

pub mod types;

pub use types::{
    BookingCancelledEvent, BookingCreatedEvent, BookingStatusChangedEvent, BookingUpdatedEvent,
    Event, EventMessage,
};

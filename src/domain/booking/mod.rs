//! Booking aggregate
//!
//! Contains the Booking entity, its lifecycle state machine, and the
//! repository interface.

pub mod model;
pub mod repository;
pub mod status;

pub use model::{intervals_overlap, Booking, NewBooking, PricingBreakdown};
pub use repository::{BookingFilter, BookingRepository};
pub use status::{ensure_transition, BookingStatus};

//! In-memory storage implementations

mod memory;

pub use memory::{
    InMemoryBookingRepository, InMemoryCouponRepository, InMemoryPaymentGateway,
    InMemoryRepositoryProvider, InMemoryVehicleRepository,
};

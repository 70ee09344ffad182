//! # Fleet Booking
//!
//! Vehicle reservation engine: availability checking, pricing with taxes,
//! fees and coupons, lead-time cancellation fees and the booking lifecycle.
//!
//! ## Architecture
//!
//! - **domain**: entities, status machine, events and repository contracts
//! - **application**: reservation use cases and outbound ports
//! - **infrastructure**: SeaORM persistence and in-memory stores
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: errors, clock, keyed locks and shutdown plumbing

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::{create_event_bus, EventBus, ReservationService, SharedEventBus};
pub use infrastructure::{
    init_database, DatabaseConfig, InMemoryPaymentGateway, InMemoryRepositoryProvider,
    SeaOrmRepositoryProvider,
};
pub use interfaces::create_api_router;

//! Database entities module

pub mod booking;
pub mod coupon;
pub mod vehicle;

pub use booking::Entity as Booking;
pub use coupon::Entity as Coupon;
pub use vehicle::Entity as Vehicle;

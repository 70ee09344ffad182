//! Coupon aggregate (read and usage-increment only)

pub mod model;
pub mod repository;

pub use model::{Coupon, DiscountType};
pub use repository::CouponRepository;

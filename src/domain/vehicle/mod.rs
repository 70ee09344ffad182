//! Vehicle aggregate (owned by the fleet catalogue; read-mostly here)

pub mod model;
pub mod repository;

pub use model::{Vehicle, VehicleStatus};
pub use repository::VehicleRepository;

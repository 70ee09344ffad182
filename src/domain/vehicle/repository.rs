//! Vehicle repository interface

use async_trait::async_trait;
use uuid::Uuid;

use super::model::{Vehicle, VehicleStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Vehicle>>;

    /// Insert or replace a vehicle (catalogue import, test seeding)
    async fn save(&self, vehicle: Vehicle) -> DomainResult<()>;

    async fn update_status(&self, id: Uuid, status: VehicleStatus) -> DomainResult<()>;
}

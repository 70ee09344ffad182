//! SeaORM implementation of VehicleRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    UpdateResult,
};
use tracing::debug;
use uuid::Uuid;

use super::mapping::{db_err, from_cents, opt_to_cents, parse_enum, parse_uuid, to_cents};
use crate::domain::{DomainError, DomainResult, Vehicle, VehicleRepository, VehicleStatus};
use crate::infrastructure::database::entities::vehicle;

pub struct SeaOrmVehicleRepository {
    db: DatabaseConnection,
}

impl SeaOrmVehicleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub(super) fn model_to_domain(m: vehicle::Model) -> DomainResult<Vehicle> {
    Ok(Vehicle {
        id: parse_uuid("vehicle id", &m.id)?,
        name: m.name,
        price_per_day: from_cents(m.price_per_day),
        price_per_hour: m.price_per_hour.map(from_cents),
        status: parse_enum("vehicle status", &m.status)?,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn domain_to_active(v: &Vehicle) -> DomainResult<vehicle::ActiveModel> {
    Ok(vehicle::ActiveModel {
        id: Set(v.id.to_string()),
        name: Set(v.name.clone()),
        price_per_day: Set(to_cents(v.price_per_day)?),
        price_per_hour: Set(opt_to_cents(v.price_per_hour)?),
        status: Set(v.status.as_str().to_string()),
        created_at: Set(v.created_at),
        updated_at: Set(v.updated_at),
    })
}

#[async_trait]
impl VehicleRepository for SeaOrmVehicleRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Vehicle>> {
        vehicle::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn save(&self, v: Vehicle) -> DomainResult<()> {
        debug!(vehicle_id = %v.id, "Saving vehicle");

        let exists = vehicle::Entity::find_by_id(v.id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .is_some();

        let model = domain_to_active(&v)?;
        if exists {
            model.update(&self.db).await.map_err(db_err)?;
        } else {
            model.insert(&self.db).await.map_err(db_err)?;
        }
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: VehicleStatus) -> DomainResult<()> {
        let result: UpdateResult = vehicle::Entity::update_many()
            .col_expr(vehicle::Column::Status, Expr::value(status.as_str()))
            .col_expr(vehicle::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(vehicle::Column::Id.eq(id.to_string()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Vehicle", id));
        }
        debug!(vehicle_id = %id, status = %status, "Vehicle status updated");
        Ok(())
    }
}

//! SeaORM implementation of CouponRepository

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::debug;
use uuid::Uuid;

use super::mapping::{db_err, from_cents, opt_to_cents, parse_enum, parse_uuid, to_cents};
use crate::domain::{Coupon, CouponRepository, DomainResult};
use crate::infrastructure::database::entities::coupon;

pub struct SeaOrmCouponRepository {
    db: DatabaseConnection,
}

impl SeaOrmCouponRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: coupon::Model) -> DomainResult<Coupon> {
    Ok(Coupon {
        id: parse_uuid("coupon id", &m.id)?,
        code: m.code,
        discount_type: parse_enum("discount type", &m.discount_type)?,
        discount_value: from_cents(m.discount_value),
        max_discount: m.max_discount.map(from_cents),
        min_amount: m.min_amount.map(from_cents),
        valid_from: m.valid_from,
        valid_until: m.valid_until,
        usage_limit: m.usage_limit,
        used_count: m.used_count,
        is_active: m.is_active,
    })
}

fn domain_to_active(c: &Coupon) -> DomainResult<coupon::ActiveModel> {
    Ok(coupon::ActiveModel {
        id: Set(c.id.to_string()),
        code: Set(c.code.clone()),
        discount_type: Set(c.discount_type.as_str().to_string()),
        discount_value: Set(to_cents(c.discount_value)?),
        max_discount: Set(opt_to_cents(c.max_discount)?),
        min_amount: Set(opt_to_cents(c.min_amount)?),
        valid_from: Set(c.valid_from),
        valid_until: Set(c.valid_until),
        usage_limit: Set(c.usage_limit),
        used_count: Set(c.used_count),
        is_active: Set(c.is_active),
    })
}

#[async_trait]
impl CouponRepository for SeaOrmCouponRepository {
    async fn find_by_code(&self, code: &str) -> DomainResult<Option<Coupon>> {
        coupon::Entity::find()
            .filter(coupon::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Coupon>> {
        coupon::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn save(&self, c: Coupon) -> DomainResult<()> {
        debug!(coupon_id = %c.id, code = %c.code, "Saving coupon");

        let exists = coupon::Entity::find_by_id(c.id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .is_some();

        let model = domain_to_active(&c)?;
        if exists {
            model.update(&self.db).await.map_err(db_err)?;
        } else {
            model.insert(&self.db).await.map_err(db_err)?;
        }
        Ok(())
    }
}

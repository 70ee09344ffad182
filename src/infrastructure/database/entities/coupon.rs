//! Coupon entity
//!
//! `discount_value`, `max_discount` and `min_amount` are scaled by 100:
//! a fixed 12.50 discount is 1250, a 15% discount is 1500.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub code: String,

    /// percentage or fixed
    pub discount_type: String,

    pub discount_value: i64,

    #[sea_orm(nullable)]
    pub max_discount: Option<i64>,

    #[sea_orm(nullable)]
    pub min_amount: Option<i64>,

    pub valid_from: DateTimeUtc,
    pub valid_until: DateTimeUtc,

    #[sea_orm(nullable)]
    pub usage_limit: Option<i32>,

    pub used_count: i32,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

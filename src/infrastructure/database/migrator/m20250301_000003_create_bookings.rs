//! Create bookings table
//!
//! Indexed for the availability query: holding bookings of one vehicle.

use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_vehicles::Vehicles;
use super::m20250301_000002_create_coupons::Coupons;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::VehicleId).string().not_null())
                    .col(ColumnDef::new(Bookings::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Bookings::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::StartTime).string())
                    .col(ColumnDef::new(Bookings::EndTime).string())
                    .col(ColumnDef::new(Bookings::PickupLocation).string().not_null())
                    .col(ColumnDef::new(Bookings::DropoffLocation).string())
                    .col(ColumnDef::new(Bookings::PricePerDay).big_integer().not_null())
                    .col(ColumnDef::new(Bookings::PricePerHour).big_integer())
                    .col(
                        ColumnDef::new(Bookings::TotalDays)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bookings::TotalHours)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Bookings::Subtotal).big_integer().not_null())
                    .col(ColumnDef::new(Bookings::Taxes).big_integer().not_null())
                    .col(ColumnDef::new(Bookings::Fees).big_integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::Discount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bookings::CouponDiscount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Bookings::TotalAmount).big_integer().not_null())
                    .col(ColumnDef::new(Bookings::CouponId).string())
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Bookings::CancellationReason).string())
                    .col(ColumnDef::new(Bookings::CancellationFee).big_integer())
                    .col(ColumnDef::new(Bookings::Notes).text())
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_vehicle")
                            .from(Bookings::Table, Bookings::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_coupon")
                            .from(Bookings::Table, Bookings::CouponId)
                            .to(Coupons::Table, Coupons::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_vehicle_status")
                    .table(Bookings::Table)
                    .col(Bookings::VehicleId)
                    .col(Bookings::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_user")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_window")
                    .table(Bookings::Table)
                    .col(Bookings::StartDate)
                    .col(Bookings::EndDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Bookings {
    Table,
    Id,
    VehicleId,
    UserId,
    StartDate,
    EndDate,
    StartTime,
    EndTime,
    PickupLocation,
    DropoffLocation,
    PricePerDay,
    PricePerHour,
    TotalDays,
    TotalHours,
    Subtotal,
    Taxes,
    Fees,
    Discount,
    CouponDiscount,
    TotalAmount,
    CouponId,
    Status,
    CancellationReason,
    CancellationFee,
    Notes,
    CreatedAt,
    UpdatedAt,
}

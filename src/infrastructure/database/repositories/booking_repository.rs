//! SeaORM implementation of BookingRepository
//!
//! Compound writes run in one database transaction. Reservation inserts
//! lock the vehicle row, re-count overlapping holding bookings and bump the
//! coupon counter with a guarded `UPDATE`, so two writers racing past the
//! service-level checks still cannot double-book or overspend a coupon.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, UpdateResult,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::mapping::{
    db_err, format_time, from_cents, opt_to_cents, parse_enum, parse_time, parse_uuid, to_cents,
};
use crate::domain::{
    Booking, BookingFilter, BookingRepository, DomainError, DomainResult, VehicleStatus,
};
use crate::infrastructure::database::entities::{booking, coupon, vehicle};

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: booking::Model) -> DomainResult<Booking> {
    Ok(Booking {
        id: parse_uuid("booking id", &m.id)?,
        vehicle_id: parse_uuid("vehicle id", &m.vehicle_id)?,
        user_id: parse_uuid("user id", &m.user_id)?,
        start_date: m.start_date,
        end_date: m.end_date,
        start_time: parse_time("start_time", m.start_time)?,
        end_time: parse_time("end_time", m.end_time)?,
        pickup_location: m.pickup_location,
        dropoff_location: m.dropoff_location,
        price_per_day: from_cents(m.price_per_day),
        price_per_hour: m.price_per_hour.map(from_cents),
        total_days: m.total_days,
        total_hours: m.total_hours,
        subtotal: from_cents(m.subtotal),
        taxes: from_cents(m.taxes),
        fees: from_cents(m.fees),
        discount: from_cents(m.discount),
        coupon_discount: from_cents(m.coupon_discount),
        total_amount: from_cents(m.total_amount),
        coupon_id: m
            .coupon_id
            .as_deref()
            .map(|raw| parse_uuid("coupon id", raw))
            .transpose()?,
        status: parse_enum("booking status", &m.status)?,
        cancellation_reason: m.cancellation_reason,
        cancellation_fee: m.cancellation_fee.map(from_cents),
        notes: m.notes,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn domain_to_active(b: &Booking) -> DomainResult<booking::ActiveModel> {
    Ok(booking::ActiveModel {
        id: Set(b.id.to_string()),
        vehicle_id: Set(b.vehicle_id.to_string()),
        user_id: Set(b.user_id.to_string()),
        start_date: Set(b.start_date),
        end_date: Set(b.end_date),
        start_time: Set(format_time(b.start_time)),
        end_time: Set(format_time(b.end_time)),
        pickup_location: Set(b.pickup_location.clone()),
        dropoff_location: Set(b.dropoff_location.clone()),
        price_per_day: Set(to_cents(b.price_per_day)?),
        price_per_hour: Set(opt_to_cents(b.price_per_hour)?),
        total_days: Set(b.total_days),
        total_hours: Set(b.total_hours),
        subtotal: Set(to_cents(b.subtotal)?),
        taxes: Set(to_cents(b.taxes)?),
        fees: Set(to_cents(b.fees)?),
        discount: Set(to_cents(b.discount)?),
        coupon_discount: Set(to_cents(b.coupon_discount)?),
        total_amount: Set(to_cents(b.total_amount)?),
        coupon_id: Set(b.coupon_id.map(|id| id.to_string())),
        status: Set(b.status.as_str().to_string()),
        cancellation_reason: Set(b.cancellation_reason.clone()),
        cancellation_fee: Set(opt_to_cents(b.cancellation_fee)?),
        notes: Set(b.notes.clone()),
        created_at: Set(b.created_at),
        updated_at: Set(b.updated_at),
    })
}

fn filter_condition(filter: &BookingFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(vehicle_id) = filter.vehicle_id {
        condition = condition.add(booking::Column::VehicleId.eq(vehicle_id.to_string()));
    }
    if let Some(user_id) = filter.user_id {
        condition = condition.add(booking::Column::UserId.eq(user_id.to_string()));
    }
    if !filter.statuses.is_empty() {
        let statuses: Vec<&str> = filter.statuses.iter().map(|s| s.as_str()).collect();
        condition = condition.add(booking::Column::Status.is_in(statuses));
    }
    if let Some((start, end)) = filter.overlapping {
        // half-open: existing.start < end && existing.end > start
        condition = condition
            .add(booking::Column::StartDate.lt(end))
            .add(booking::Column::EndDate.gt(start));
    }
    if let Some(id) = filter.exclude_id {
        condition = condition.add(booking::Column::Id.ne(id.to_string()));
    }
    condition
}

/// Count holding bookings on the same vehicle overlapping `b`, other than `b`.
async fn count_overlapping<C>(conn: &C, b: &Booking) -> DomainResult<u64>
where
    C: ConnectionTrait,
{
    let filter = BookingFilter::for_vehicle(b.vehicle_id)
        .holding()
        .overlapping(b.start_date, b.end_date)
        .excluding(Some(b.id));
    booking::Entity::find()
        .filter(filter_condition(&filter))
        .count(conn)
        .await
        .map_err(db_err)
}

async fn set_vehicle_status<C>(conn: &C, id: Uuid, status: VehicleStatus) -> DomainResult<()>
where
    C: ConnectionTrait,
{
    let result: UpdateResult = vehicle::Entity::update_many()
        .col_expr(vehicle::Column::Status, Expr::value(status.as_str()))
        .col_expr(vehicle::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(vehicle::Column::Id.eq(id.to_string()))
        .exec(conn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        return Err(DomainError::not_found("Vehicle", id));
    }
    Ok(())
}

fn overlap_conflict(b: &Booking) -> DomainError {
    DomainError::Conflict(format!(
        "Vehicle {} is already booked for the selected dates",
        b.vehicle_id
    ))
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>> {
        booking::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find(&self, filter: &BookingFilter) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(filter_condition(filter))
            .order_by_asc(booking::Column::StartDate)
            .order_by_asc(booking::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn insert_reservation(&self, b: &Booking) -> DomainResult<()> {
        debug!(booking_id = %b.id, vehicle_id = %b.vehicle_id, "Inserting reservation");

        // Dropping `txn` without commit rolls everything back.
        let txn = self.db.begin().await.map_err(db_err)?;

        // Lock the vehicle row for the rest of the transaction
        vehicle::Entity::find_by_id(b.vehicle_id.to_string())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Vehicle", b.vehicle_id))?;

        if count_overlapping(&txn, b).await? > 0 {
            warn!(booking_id = %b.id, vehicle_id = %b.vehicle_id, "Overlap detected in transaction");
            return Err(overlap_conflict(b));
        }

        domain_to_active(b)?.insert(&txn).await.map_err(db_err)?;
        set_vehicle_status(&txn, b.vehicle_id, VehicleStatus::Rented).await?;

        if let Some(coupon_id) = b.coupon_id {
            let result: UpdateResult = coupon::Entity::update_many()
                .col_expr(
                    coupon::Column::UsedCount,
                    Expr::col(coupon::Column::UsedCount).add(1),
                )
                .filter(coupon::Column::Id.eq(coupon_id.to_string()))
                .filter(
                    Condition::any()
                        .add(coupon::Column::UsageLimit.is_null())
                        .add(
                            Expr::col(coupon::Column::UsedCount)
                                .lt(Expr::col(coupon::Column::UsageLimit)),
                        ),
                )
                .exec(&txn)
                .await
                .map_err(db_err)?;

            if result.rows_affected == 0 {
                return Err(DomainError::Conflict(format!(
                    "Coupon {} is no longer available",
                    coupon_id
                )));
            }
        }

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, b: &Booking) -> DomainResult<()> {
        debug!(booking_id = %b.id, "Updating booking");

        let txn = self.db.begin().await.map_err(db_err)?;

        let existing = booking::Entity::find_by_id(b.id.to_string())
            .one(&txn)
            .await
            .map_err(db_err)?;
        if existing.is_none() {
            return Err(DomainError::not_found("Booking", b.id));
        }

        if b.status.holds_vehicle() && count_overlapping(&txn, b).await? > 0 {
            return Err(overlap_conflict(b));
        }

        domain_to_active(b)?.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn save_transition(
        &self,
        b: &Booking,
        vehicle_status: Option<VehicleStatus>,
    ) -> DomainResult<()> {
        debug!(
            booking_id = %b.id,
            status = %b.status,
            vehicle_status = ?vehicle_status,
            "Saving status transition"
        );

        let txn = self.db.begin().await.map_err(db_err)?;

        let result: UpdateResult = booking::Entity::update_many()
            .col_expr(booking::Column::Status, Expr::value(b.status.as_str()))
            .col_expr(
                booking::Column::CancellationReason,
                Expr::value(b.cancellation_reason.clone()),
            )
            .col_expr(
                booking::Column::CancellationFee,
                Expr::value(opt_to_cents(b.cancellation_fee)?),
            )
            .col_expr(booking::Column::UpdatedAt, Expr::value(b.updated_at))
            .filter(booking::Column::Id.eq(b.id.to_string()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Booking", b.id));
        }

        if let Some(status) = vehicle_status {
            set_vehicle_status(&txn, b.vehicle_id, status).await?;
        }

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }
}

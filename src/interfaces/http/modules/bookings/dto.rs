//! Booking DTOs

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::application::booking::{
    AvailabilityReport, CancellationOutcome, CreateReservation, PriceRequest, UpdateReservation,
};
use crate::domain::{Booking, BookingFilter, BookingStatus, DomainError, DomainResult, PricingBreakdown};

/// Parse "HH:MM" or "HH:MM:SS".
fn parse_clock(field: &str, raw: Option<&str>) -> DomainResult<Option<NaiveTime>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map(Some)
        .map_err(|_| DomainError::InvalidInput(format!("{} must be HH:MM or HH:MM:SS", field)))
}

fn format_clock(time: Option<NaiveTime>) -> Option<String> {
    time.map(|t| t.format("%H:%M").to_string())
}

/// Request to reserve a vehicle
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,
    /// Rental start (RFC 3339)
    pub start_date: DateTime<Utc>,
    /// Rental end, exclusive (RFC 3339)
    pub end_date: DateTime<Utc>,
    /// Pickup time of day for hourly rentals
    #[schema(example = "09:00")]
    pub start_time: Option<String>,
    /// Return time of day for hourly rentals
    #[schema(example = "17:30")]
    pub end_time: Option<String>,
    /// Charge per started hour instead of per day
    #[serde(default)]
    pub hourly: bool,
    #[validate(length(min = 1, max = 255))]
    pub pickup_location: String,
    /// Defaults to the pickup location
    #[validate(length(max = 255))]
    pub dropoff_location: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub coupon_code: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl CreateBookingRequest {
    pub fn into_command(self) -> DomainResult<CreateReservation> {
        Ok(CreateReservation {
            vehicle_id: self.vehicle_id,
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: parse_clock("start_time", self.start_time.as_deref())?,
            end_time: parse_clock("end_time", self.end_time.as_deref())?,
            hourly: self.hourly,
            pickup_location: self.pickup_location,
            dropoff_location: self.dropoff_location,
            coupon_code: self.coupon_code,
            notes: self.notes,
        })
    }
}

/// Partial edit of a pending booking; omitted fields stay unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBookingRequest {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[schema(example = "09:00")]
    pub start_time: Option<String>,
    #[schema(example = "17:30")]
    pub end_time: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub pickup_location: Option<String>,
    #[validate(length(max = 255))]
    pub dropoff_location: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl UpdateBookingRequest {
    pub fn into_command(self) -> DomainResult<UpdateReservation> {
        Ok(UpdateReservation {
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: parse_clock("start_time", self.start_time.as_deref())?,
            end_time: parse_clock("end_time", self.end_time.as_deref())?,
            pickup_location: self.pickup_location,
            dropoff_location: self.dropoff_location,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CancelBookingRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    /// Ask for a refund of the completed payment, less the cancellation fee
    #[serde(default)]
    pub refund_requested: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangeStatusRequest {
    /// Target status, e.g. CONFIRMED, ACTIVE, COMPLETED, REJECTED
    #[schema(example = "CONFIRMED")]
    #[validate(length(min = 1))]
    pub status: String,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

impl ChangeStatusRequest {
    pub fn target(&self) -> DomainResult<BookingStatus> {
        self.status.trim().parse()
    }
}

/// Quote a prospective rental without reserving it
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PriceQuoteRequest {
    pub vehicle_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[schema(example = "09:00")]
    pub start_time: Option<String>,
    #[schema(example = "17:30")]
    pub end_time: Option<String>,
    #[serde(default)]
    pub hourly: bool,
    #[validate(length(min = 1, max = 64))]
    pub coupon_code: Option<String>,
}

impl PriceQuoteRequest {
    pub fn into_request(self) -> DomainResult<PriceRequest> {
        Ok(PriceRequest {
            vehicle_id: self.vehicle_id,
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: parse_clock("start_time", self.start_time.as_deref())?,
            end_time: parse_clock("end_time", self.end_time.as_deref())?,
            hourly: self.hourly,
            coupon_code: self.coupon_code,
        })
    }
}

/// Booking list filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBookingsQuery {
    pub vehicle_id: Option<Uuid>,
    /// Ignored for customers, who only see their own bookings
    pub user_id: Option<Uuid>,
    /// Comma-separated statuses, e.g. `PENDING,CONFIRMED`
    pub status: Option<String>,
    /// Window start; requires `to`
    pub from: Option<DateTime<Utc>>,
    /// Window end, exclusive; requires `from`
    pub to: Option<DateTime<Utc>>,
}

impl ListBookingsQuery {
    pub fn into_filter(self) -> DomainResult<BookingFilter> {
        let mut filter = BookingFilter {
            vehicle_id: self.vehicle_id,
            user_id: self.user_id,
            ..BookingFilter::default()
        };

        if let Some(raw) = self.status.as_deref() {
            let statuses = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<BookingStatus>)
                .collect::<DomainResult<Vec<_>>>()?;
            filter = filter.with_statuses(statuses);
        }

        match (self.from, self.to) {
            (Some(from), Some(to)) if to > from => filter = filter.overlapping(from, to),
            (Some(_), Some(_)) => {
                return Err(DomainError::InvalidInput("`to` must be after `from`".to_string()))
            }
            (None, None) => {}
            _ => {
                return Err(DomainError::InvalidInput(
                    "`from` and `to` must be given together".to_string(),
                ))
            }
        }

        Ok(filter)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    pub vehicle_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Booking to ignore, e.g. the one being rescheduled
    pub exclude_booking_id: Option<Uuid>,
}

/// Booking details in API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDto {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub user_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub pickup_location: String,
    pub dropoff_location: Option<String>,
    pub price_per_day: Decimal,
    pub price_per_hour: Option<Decimal>,
    pub total_days: i64,
    pub total_hours: i64,
    pub subtotal: Decimal,
    pub taxes: Decimal,
    pub fees: Decimal,
    pub discount: Decimal,
    pub coupon_discount: Decimal,
    pub total_amount: Decimal,
    pub coupon_id: Option<Uuid>,
    #[schema(example = "PENDING")]
    pub status: String,
    pub cancellation_reason: Option<String>,
    pub cancellation_fee: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingDto {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            vehicle_id: b.vehicle_id,
            user_id: b.user_id,
            start_date: b.start_date,
            end_date: b.end_date,
            start_time: format_clock(b.start_time),
            end_time: format_clock(b.end_time),
            pickup_location: b.pickup_location,
            dropoff_location: b.dropoff_location,
            price_per_day: b.price_per_day,
            price_per_hour: b.price_per_hour,
            total_days: b.total_days,
            total_hours: b.total_hours,
            subtotal: b.subtotal,
            taxes: b.taxes,
            fees: b.fees,
            discount: b.discount,
            coupon_discount: b.coupon_discount,
            total_amount: b.total_amount,
            coupon_id: b.coupon_id,
            status: b.status.as_str().to_string(),
            cancellation_reason: b.cancellation_reason,
            cancellation_fee: b.cancellation_fee,
            notes: b.notes,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PriceQuoteDto {
    pub base_price: Decimal,
    pub total_days: i64,
    pub total_hours: Option<i64>,
    pub subtotal: Decimal,
    pub taxes: Decimal,
    pub fees: Decimal,
    pub discount: Decimal,
    pub coupon_discount: Option<Decimal>,
    pub coupon_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub price_per_day: Decimal,
    pub price_per_hour: Option<Decimal>,
}

impl From<PricingBreakdown> for PriceQuoteDto {
    fn from(p: PricingBreakdown) -> Self {
        Self {
            base_price: p.base_price,
            total_days: p.total_days,
            total_hours: p.total_hours,
            subtotal: p.subtotal,
            taxes: p.taxes,
            fees: p.fees,
            discount: p.discount,
            coupon_discount: p.coupon_discount,
            coupon_id: p.coupon_id,
            total_amount: p.total_amount,
            price_per_day: p.price_per_day,
            price_per_hour: p.price_per_hour,
        }
    }
}

/// An existing booking blocking the requested window
#[derive(Debug, Serialize, ToSchema)]
pub struct ConflictDto {
    pub booking_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityDto {
    pub vehicle_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub available: bool,
    pub conflicts: Vec<ConflictDto>,
}

impl AvailabilityDto {
    pub fn new(query: &AvailabilityQuery, report: AvailabilityReport) -> Self {
        Self {
            vehicle_id: query.vehicle_id,
            start_date: query.start_date,
            end_date: query.end_date,
            available: report.available,
            conflicts: report
                .conflicts
                .into_iter()
                .map(|b| ConflictDto {
                    booking_id: b.id,
                    start_date: b.start_date,
                    end_date: b.end_date,
                    status: b.status.as_str().to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancellationDto {
    pub booking: BookingDto,
    pub cancellation_fee: Decimal,
    /// Present when a refund was requested and a completed payment exists
    pub refund_amount: Option<Decimal>,
}

impl From<CancellationOutcome> for CancellationDto {
    fn from(outcome: CancellationOutcome) -> Self {
        Self {
            booking: outcome.booking.into(),
            cancellation_fee: outcome.cancellation_fee,
            refund_amount: outcome.refund_amount,
        }
    }
}

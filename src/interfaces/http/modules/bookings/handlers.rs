//! Booking HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::application::booking::ReservationService;
use crate::interfaces::http::common::{
    domain_error, ApiError, ApiResponse, ApiResult, Caller, ValidatedJson,
};

use super::dto::*;

/// Application state for booking handlers.
#[derive(Clone)]
pub struct BookingAppState {
    pub service: Arc<ReservationService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("user_id" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created as PENDING", body = ApiResponse<BookingDto>),
        (status = 400, description = "Invalid dates, times or coupon"),
        (status = 404, description = "Vehicle not found"),
        (status = 409, description = "Vehicle already booked or not available"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_booking(
    State(state): State<BookingAppState>,
    Caller(principal): Caller,
    ValidatedJson(request): ValidatedJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingDto>>), ApiError<BookingDto>> {
    let command = request.into_command().map_err(domain_error)?;
    let booking = state
        .service
        .create(command, &principal)
        .await
        .map_err(domain_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(booking.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("user_id" = [])),
    params(ListBookingsQuery),
    responses(
        (status = 200, description = "Matching bookings", body = ApiResponse<Vec<BookingDto>>),
        (status = 400, description = "Invalid filter")
    )
)]
pub async fn list_bookings(
    State(state): State<BookingAppState>,
    Caller(principal): Caller,
    Query(query): Query<ListBookingsQuery>,
) -> ApiResult<Vec<BookingDto>> {
    let filter = query.into_filter().map_err(domain_error)?;
    let bookings = state
        .service
        .list(filter, &principal)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        bookings.into_iter().map(BookingDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    security(("user_id" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking details", body = ApiResponse<BookingDto>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<BookingAppState>,
    Caller(principal): Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<BookingDto> {
    let booking = state
        .service
        .get(id, &principal)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(booking.into())))
}

#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    security(("user_id" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Updated booking", body = ApiResponse<BookingDto>),
        (status = 400, description = "Invalid dates or times"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking no longer editable, or new window overlaps another booking")
    )
)]
pub async fn update_booking(
    State(state): State<BookingAppState>,
    Caller(principal): Caller,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateBookingRequest>,
) -> ApiResult<BookingDto> {
    let patch = request.into_command().map_err(domain_error)?;
    let booking = state
        .service
        .update(id, patch, &principal)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(booking.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    tag = "Bookings",
    security(("user_id" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = CancelBookingRequest,
    responses(
        (status = 200, description = "Cancelled booking with fee and refund", body = ApiResponse<CancellationDto>),
        (status = 400, description = "Booking already started"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Status does not allow cancellation")
    )
)]
pub async fn cancel_booking(
    State(state): State<BookingAppState>,
    Caller(principal): Caller,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CancelBookingRequest>,
) -> ApiResult<CancellationDto> {
    let outcome = state
        .service
        .cancel(id, request.reason, request.refund_requested, &principal)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(outcome.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}/status",
    tag = "Bookings",
    security(("user_id" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Booking in its new status", body = ApiResponse<BookingDto>),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Role may not set this status"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Transition not allowed from the current status")
    )
)]
pub async fn change_booking_status(
    State(state): State<BookingAppState>,
    Caller(principal): Caller,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<ChangeStatusRequest>,
) -> ApiResult<BookingDto> {
    let target = request.target().map_err(domain_error)?;
    let booking = state
        .service
        .change_status(id, target, request.reason, &principal)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(booking.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/availability",
    tag = "Availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Availability with conflicting bookings", body = ApiResponse<AvailabilityDto>),
        (status = 400, description = "End is not after start"),
        (status = 404, description = "Vehicle not found")
    )
)]
pub async fn check_availability(
    State(state): State<BookingAppState>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<AvailabilityDto> {
    let report = state
        .service
        .check_availability(
            query.vehicle_id,
            query.start_date,
            query.end_date,
            query.exclude_booking_id,
        )
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(AvailabilityDto::new(&query, report))))
}

#[utoipa::path(
    post,
    path = "/api/v1/pricing/quote",
    tag = "Pricing",
    request_body = PriceQuoteRequest,
    responses(
        (status = 200, description = "Price breakdown", body = ApiResponse<PriceQuoteDto>),
        (status = 400, description = "Invalid window or coupon"),
        (status = 404, description = "Vehicle not found")
    )
)]
pub async fn quote_price(
    State(state): State<BookingAppState>,
    ValidatedJson(request): ValidatedJson<PriceQuoteRequest>,
) -> ApiResult<PriceQuoteDto> {
    let request = request.into_request().map_err(domain_error)?;
    let breakdown = state
        .service
        .calculate_price(request)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(breakdown.into())))
}

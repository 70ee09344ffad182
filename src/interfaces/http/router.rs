//! API Router with Swagger UI

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::booking::ReservationService;

use super::common::ApiResponse;
use super::modules::bookings::{self, handlers as booking_handlers, BookingAppState};
use super::modules::health::{self, HealthState};

/// Identity headers forwarded by the gateway
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-User-Id",
                    "Caller UUID; pair with X-User-Role (admin, agent, customer)",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        booking_handlers::create_booking,
        booking_handlers::list_bookings,
        booking_handlers::get_booking,
        booking_handlers::update_booking,
        booking_handlers::cancel_booking,
        booking_handlers::change_booking_status,
        booking_handlers::check_availability,
        booking_handlers::quote_price,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::ComponentHealth,
            bookings::CreateBookingRequest,
            bookings::UpdateBookingRequest,
            bookings::CancelBookingRequest,
            bookings::ChangeStatusRequest,
            bookings::PriceQuoteRequest,
            bookings::BookingDto,
            bookings::PriceQuoteDto,
            bookings::AvailabilityDto,
            bookings::ConflictDto,
            bookings::CancellationDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Bookings", description = "Vehicle reservations and their lifecycle"),
        (name = "Availability", description = "Vehicle availability for a time window"),
        (name = "Pricing", description = "Price quotes with taxes, fees and coupons"),
    ),
    info(
        title = "Fleet Booking API",
        version = "1.0.0",
        description = "Vehicle reservation engine: availability, pricing, coupons and booking lifecycle"
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(service: Arc<ReservationService>, db: DatabaseConnection) -> Router {
    let booking_routes = Router::new()
        .route(
            "/bookings",
            post(booking_handlers::create_booking).get(booking_handlers::list_bookings),
        )
        .route(
            "/bookings/{id}",
            get(booking_handlers::get_booking).patch(booking_handlers::update_booking),
        )
        .route("/bookings/{id}/cancel", post(booking_handlers::cancel_booking))
        .route(
            "/bookings/{id}/status",
            put(booking_handlers::change_booking_status),
        )
        .route("/availability", get(booking_handlers::check_availability))
        .route("/pricing/quote", post(booking_handlers::quote_price))
        .with_state(BookingAppState { service });

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(HealthState::new(db));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .nest("/api/v1", booking_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

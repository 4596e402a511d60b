//! # iotid-server
//!
//! HTTP surface of the device identity service: an internal admin router
//! for organizations and devices, and a public router for device
//! enrollment. Each is served on its own listener.

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod state;

use axum::{
    middleware::{from_extractor_with_state, from_fn},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use extractors::AdminAuth;
use state::AppState;

/// Internal admin router: organizations and devices
pub fn create_admin_router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        // Organizations
        .route("/v1/organization", post(api::organizations::create_organization))
        .route("/v1/organizations", get(api::organizations::list_organizations))
        .route(
            "/v1/organization/:org_ref",
            get(api::organizations::get_organization),
        )
        // Devices
        .route("/v1/device", post(api::devices::create_device))
        .route("/v1/device/:device_id", delete(api::devices::delete_device))
        .route("/v1/devices/:org_ref", get(api::devices::list_devices))
        .route(
            "/v1/devices/:org_ref/:device_ref",
            get(api::devices::get_device).put(api::devices::update_device),
        )
        .route_layer(from_extractor_with_state::<AdminAuth, _>(Arc::clone(&state)));

    with_common_layers(admin, state)
}

/// Public enrollment router
pub fn create_enroll_router(state: Arc<AppState>) -> Router {
    let enroll = Router::new().route("/v1/device/enroll", post(api::enroll::enroll_device));

    with_common_layers(enroll, state)
}

fn with_common_layers(router: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    router
        // Health checks
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

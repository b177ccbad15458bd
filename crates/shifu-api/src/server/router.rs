//! deviceShifu router configuration.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::{ShifuState, basic, devices};

/// Create the router exposing a deviceShifu.
///
/// Fixed routes are matched before the instruction catch-all, so an
/// instruction named `health` or `status` is shadowed.
pub fn create_router(state: ShifuState) -> Router {
    Router::new()
        .route("/health", get(basic::health_handler))
        .route("/ready", get(basic::readiness_handler))
        .route("/status", get(devices::status_handler))
        .route(
            "/:instruction",
            get(devices::get_instruction_handler).post(devices::post_instruction_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

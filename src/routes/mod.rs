use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{booking, img, payment_available};
use crate::middleware::auth::{auth_middleware, require_admin};
use crate::middleware::rate_limit::{create_global_governor, log_request};
use crate::AppState;

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.upload_max_bytes + MULTIPART_OVERHEAD_BYTES);

    // Customer-facing routes: the booking workflow and file retrieval
    let public_routes = Router::new()
        .route("/api/bookings", post(booking::create_booking))
        .route("/api/bookings/create-payment", post(booking::create_payment))
        .route("/api/bookings/confirm-payment", post(booking::confirm_payment))
        .route("/api/payment-available/active", get(payment_available::list_active))
        .route("/api/img", get(img::get_file))
        .route(
            "/api/upload",
            post(img::upload_document).layer(upload_limit.clone()),
        );

    // Signed-in routes; handlers check ownership themselves
    let account_routes = Router::new()
        .route("/api/bookings/{id}", get(booking::get_booking))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // CMS routes (requires auth + admin role)
    let admin_routes = Router::new()
        .route("/api/bookings", get(booking::list_bookings))
        .route(
            "/api/payment-available",
            get(payment_available::list_payment_available)
                .post(payment_available::create_payment_available)
                .put(payment_available::update_payment_available)
                .delete(payment_available::delete_payment_available),
        )
        .route(
            "/api/img",
            post(img::upload_image)
                .delete(img::delete_file)
                .layer(upload_limit),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Same paths, different methods: merge combines the method routers
    Router::new()
        .merge(public_routes)
        .merge(account_routes)
        .merge(admin_routes)
        .with_state(state)
}

/// Tracing, CORS, per-IP rate limiting and the access log. These need the
/// peer address, so the router must be served with connect info. The access
/// log is outermost so requests the governor rejects are logged too.
pub fn with_edge_layers(router: Router) -> Router {
    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(create_global_governor())
        .layer(middleware::from_fn(log_request))
}

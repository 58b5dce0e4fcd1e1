mod admin;
mod auth;
mod course;
mod video;

use crate::middlewares::device_gate::device_gate;
use crate::middlewares::negotiate::negotiate;
use crate::middlewares::require_admin::require_admin;
use crate::middlewares::trace_id::{TraceId, TraceIdLayer};
use crate::state::AppState;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use std::time::Duration;
use tracing::Span;

pub fn build(state: AppState) -> Router {
    let static_files_service = tower_http::services::ServeDir::new(std::path::Path::new("public"))
        .append_index_html_on_directories(true)
        .fallback(tower_http::services::ServeFile::new("public/index.html"));
    // ======== member ========
    let member = Router::new()
        .route("/courses", get(course::catalog))
        .route("/courses/{id}", get(course::detail))
        .route("/videos/{id}/watch", get(video::watch))
        .route("/videos/{id}/stream", get(video::stream))
        .layer(middleware::from_fn_with_state(state.clone(), device_gate));
    // ======== admin ========
    let admin = Router::new()
        .route("/dashboard", get(admin::dashboard::show))
        .route("/users", get(admin::users::list))
        .route("/users", post(admin::users::create))
        .route("/users/{id}", get(admin::users::detail))
        .route("/users/{id}", put(admin::users::update))
        .route("/users/{id}", delete(admin::users::remove))
        .route("/users/{id}/devices", delete(admin::users::remove_devices))
        .route(
            "/users/{id}/devices/{device_id}",
            delete(admin::users::remove_device),
        )
        .route("/access", get(admin::access::list))
        .route("/users/{id}/access", post(admin::access::grant))
        .route(
            "/users/{id}/access/{course_id}",
            delete(admin::access::revoke),
        )
        .route("/courses", get(admin::courses::list))
        .route("/courses", post(admin::courses::create))
        .route("/courses/{id}", get(admin::courses::detail))
        .route("/courses/{id}", put(admin::courses::update))
        .route("/courses/{id}", delete(admin::courses::remove))
        .route(
            "/courses/{id}/videos/upload-url",
            post(admin::videos::upload_url),
        )
        .route("/courses/{id}/videos", post(admin::videos::create))
        .route("/courses/{id}/videos/reorder", post(admin::videos::reorder))
        .route("/videos/{id}", get(admin::videos::detail))
        .route("/videos/{id}", put(admin::videos::update))
        .route("/videos/{id}", delete(admin::videos::remove))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));
    Router::new()
        .route("/api/health", get(|| async { axum::http::StatusCode::OK }))
        .route(
            "/api/version",
            get(|| async { format!("lectern_{}", env!("CARGO_PKG_VERSION")) }),
        )
        // ======== auth ========
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // ======== member / admin surfaces ========
        .nest("/my", member)
        .nest("/admin", admin)
        .fallback_service(static_files_service)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let trace_id = request.extensions().get::<TraceId>().unwrap();
                    tracing::debug_span!(
                        "request",
                        trace_id = %trace_id,
                    )
                })
                .on_request(|req: &Request<Body>, _span: &Span| {
                    tracing::trace!(
                        method = %req.method(),
                        uri = %req.uri(),
                        version = %format!("{:?}", req.version()),
                        "started processing request"
                    );
                })
                .on_response(|res: &Response, latency: Duration, _span: &Span| {
                    tracing::trace!(
                        status = ?res.status(),
                        latency = %format!("{}ms", latency.as_millis()),
                        "finished processing request"
                    );
                }),
        )
        .layer(middleware::from_fn(negotiate))
        .layer(TraceIdLayer::new())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .expose_headers(tower_http::cors::Any)
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                ]),
        )
        .with_state(state)
}

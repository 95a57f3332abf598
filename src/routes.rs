// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{delete, get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    channel,
    handlers::{admin, quiz, student},
    state::AppState,
    utils::jwt::admin_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (student, quiz, admin, real-time).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool, Config, Channel Registry).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let student_routes = Router::new()
        .route("/login", post(student::login))
        .route("/status/{student_id}", get(student::status));

    let quiz_routes = Router::new()
        .route("/active", get(quiz::active_quiz))
        .route("/submit", post(quiz::submit));

    let admin_routes = Router::new()
        .route("/login", post(admin::login))
        // Protected admin routes
        .merge(
            Router::new()
                .route("/violations", get(admin::list_violations))
                .route("/violations/resolve", post(admin::resolve_violation))
                .route("/violations/{id}", delete(admin::delete_violation))
                .route("/students", get(admin::list_students))
                .route("/students/batch", post(admin::batch_create_students))
                .route("/students/{id}", delete(admin::delete_student))
                .route("/results", get(admin::list_results))
                .route("/results/{id}", delete(admin::delete_result))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    admin_middleware,
                )),
        );

    // Admin observer socket sits behind the same JWT check.
    let admin_ws = Router::new()
        .route("/ws/admin", get(channel::admin_socket))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ));

    Router::new()
        .nest("/api/student", student_routes)
        .nest("/api/quiz", quiz_routes)
        .nest("/api/admin", admin_routes)
        .route("/ws/student", get(channel::student_socket))
        .merge(admin_ws)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    handlers::{admin, auth, exams, feedback, history},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, student_middleware},
};

/// Assembles the main application router.
///
/// * `/api/auth`: login (public) and the current session.
/// * `/api/exams`: the catalog, for any signed-in user.
/// * `/api/admin`: users and exam editing, admin only.
/// * `/api/student`: downloads, feedback and history, student only.
/// * `/storage/{bucket}`: stored PDFs, served from disk.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let authenticated = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new().route("/login", post(auth::login)).merge(
        Router::new()
            .route("/me", get(auth::me))
            .layer(authenticated.clone()),
    );

    let exam_routes = Router::new()
        .route("/", get(exams::list_exams))
        .route("/years", get(exams::list_years))
        .route("/{id}", get(exams::get_exam))
        .layer(authenticated.clone());

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route("/exams", post(admin::create_exam))
        .route(
            "/exams/{id}",
            put(admin::update_exam).delete(admin::delete_exam),
        )
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(authenticated.clone());

    let student_routes = Router::new()
        .route("/exams/{id}/download", post(history::download_exam))
        .route("/history", get(history::get_history))
        .route(
            "/feedback",
            get(feedback::list_my_feedback).post(feedback::submit_feedback),
        )
        .layer(middleware::from_fn(student_middleware))
        .layer(authenticated);

    let storage_path = format!("/storage/{}", state.config.storage_bucket);
    let files = ServeDir::new(state.config.bucket_dir());

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/exams", exam_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/student", student_routes)
        .nest_service(&storage_path, files)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

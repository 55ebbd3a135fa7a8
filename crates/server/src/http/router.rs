use super::handlers::{auth, comments, file_manager, files, health};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

const METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins == "*" {
        return CorsLayer::new()
            .allow_methods(METHODS)
            .allow_origin(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
        CorsLayer::new()
            .allow_methods(METHODS)
            .allow_origin(Any)
            .allow_headers(Any)
    } else {
        tracing::info!("CORS enabled for origins: {:?}", origins);
        CorsLayer::new()
            .allow_methods(METHODS)
            .allow_origin(origins)
            .allow_headers(Any)
    }
}

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    let routes = Router::new()
        .route(
            "/files",
            get(files::list_files)
                .post(files::create_folder)
                .put(files::update_files)
                .delete(files::delete_folder),
        )
        .route(
            "/file-manager",
            get(file_manager::list_children)
                .post(file_manager::add_child)
                .put(file_manager::update_child)
                .delete(file_manager::delete_child),
        )
        .route(
            "/comments",
            get(comments::list_comments)
                .post(comments::post_comment)
                .put(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route("/auth", post(auth::login))
        .route("/auth/password", put(auth::change_password));

    // Same handlers under /api for clients built against the serverless paths.
    Router::new()
        .route("/health", get(health::health))
        .nest("/api", routes.clone())
        .merge(routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

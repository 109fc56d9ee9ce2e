use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod testing;

pub use state::AppState;

/// Full application router
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security.cors_origins);

    Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/register", post(auth::register_post))
        .route("/login", post(auth::login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use axum::routing::delete;
    use handlers::protected::{auth, books};

    Router::new()
        .route("/change-password", patch(auth::change_password_patch))
        .route("/changePassword", patch(auth::change_password_patch))
        .route("/c/books", get(books::search_books).post(books::create_book))
        .route("/c/books/cursor", get(books::page_by_cursor))
        .route("/c/books/offset", get(books::page_by_offset))
        .route("/c/books/year", get(books::by_year))
        .route("/c/books/rating", get(books::by_rating_count))
        .route("/c/books/title", delete(books::delete_by_title))
        .route(
            "/c/books/:isbn13",
            get(books::get_by_isbn)
                .patch(books::patch_ratings)
                .delete(books::delete_by_isbn),
        )
        .route_layer(from_fn_with_state(state, middleware::jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-access-token"),
        ])
}

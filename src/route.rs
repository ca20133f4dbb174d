//! Route definitions for the SkillSwap API
//!
//! This module maps every HTTP route to its handler and decides which
//! routes sit behind the bearer-token middleware.

use axum::routing::{delete, get, post, put};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;

use crate::database::AppState;
use crate::handler::{auth, course, root, swap};
use crate::middleware::require_auth;

/// Creates and configures the application router
///
/// # Route Definitions
///
/// Public:
/// - `GET /` - Greeting
/// - `POST /api/auth/register`, `POST /api/auth/login`
/// - `GET /api/courses`, `GET /api/courses/{id}`
///
/// Everything else under `/api` requires `Authorization: Bearer <token>`.
///
/// # Example Usage
///
/// ```no_run
/// # use skillswap::config::AppConfig;
/// # use skillswap::database::{init_db, AppState};
/// # use skillswap::route::create_app;
/// # let db = init_db("skillswap.db").unwrap();
/// let state = AppState::new(db, AppConfig::new("secret"));
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    // Layered before the public routes so only these are guarded
    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/profile", put(auth::update_profile))
        .route("/auth/change-role", put(auth::change_role))
        .route("/auth/spotlight", delete(auth::clear_spotlight))
        .route("/courses/create", post(course::create_course))
        .route("/courses/my-courses", get(course::my_courses))
        .route("/courses/{id}/videos", post(course::add_video))
        .route("/courses/{id}/enroll", post(course::enroll))
        .route("/courses/{id}/reviews", post(course::add_review))
        .route("/swaps", get(swap::list_swaps).post(swap::create_swap))
        .route("/swaps/{id}", get(swap::get_swap))
        .route("/swaps/{id}/status", put(swap::update_swap_status))
        .route("/swaps/{id}/sessions", post(swap::record_session))
        .route("/swaps/{id}/meeting-links", post(swap::add_meeting_link))
        .route("/swaps/{id}/messages", post(swap::post_message))
        .route("/swaps/{id}/rating", post(swap::rate_swap))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api_routes = protected
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/courses", get(course::list_courses))
        .route("/courses/{id}", get(course::get_course));

    Router::new()
        .route("/", get(root))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

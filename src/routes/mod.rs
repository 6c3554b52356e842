pub mod comments;
pub mod follows;
pub mod groups;
pub mod pagination;
pub mod posts;
pub mod users;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full API, ready to serve.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(posts::router())
        .merge(comments::router())
        .merge(groups::router())
        .merge(users::router())
        .merge(follows::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

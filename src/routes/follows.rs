use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::follows;
use crate::error::AppResult;
use crate::extractors::{ApiJson, MaybeUser};
use crate::permissions::{require_user, IsAuthenticated};
use crate::serializers::{FollowInput, FollowOut};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

impl SearchParams {
    /// Terms split on whitespace and commas; empty when not searching.
    pub fn terms(&self) -> Vec<String> {
        self.search
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/follow/", get(list_follows).post(create_follow))
}

async fn list_follows(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<FollowOut>>> {
    let user = require_user(&IsAuthenticated, &method, user)?;
    let conn = state.db.get()?;

    let rows = follows::list_follows(&conn, user.id, &params.terms())?;
    Ok(Json(rows.into_iter().map(FollowOut::from).collect()))
}

async fn create_follow(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
    body: ApiJson,
) -> AppResult<impl IntoResponse> {
    let user = require_user(&IsAuthenticated, &method, user)?;
    let input: FollowInput = body.parse().await?;
    let conn = state.db.get()?;

    let following_id = input.validate(&conn, &user)?;
    let follow = follows::insert_follow(&conn, user.id, following_id)?;
    tracing::info!("{} now follows {}", follow.user, follow.following);

    Ok((StatusCode::CREATED, Json(FollowOut::from(follow))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(search: Option<&str>) -> Vec<String> {
        SearchParams {
            search: search.map(String::from),
        }
        .terms()
    }

    #[test]
    fn no_search_means_no_terms() {
        assert!(terms(None).is_empty());
        assert!(terms(Some("  , ")).is_empty());
    }

    #[test]
    fn search_splits_on_spaces_and_commas() {
        assert_eq!(terms(Some("bob, alice  carol")), ["bob", "alice", "carol"]);
    }
}

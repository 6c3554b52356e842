use axum::extract::State;
use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};

use crate::db::groups;
use crate::error::{AppError, AppResult};
use crate::extractors::{ApiPath, MaybeUser};
use crate::permissions::{check_permission, IsAuthorOrReadOnly};
use crate::serializers::GroupOut;
use crate::state::AppState;

/// Groups are managed out of band; the API only reads them.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups/", get(list_groups))
        .route("/groups/{id}/", get(retrieve_group))
}

async fn list_groups(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
) -> AppResult<Json<Vec<GroupOut>>> {
    check_permission(&IsAuthorOrReadOnly, &method, user.as_ref())?;
    let conn = state.db.get()?;
    let rows = groups::list_groups(&conn)?;
    Ok(Json(rows.into_iter().map(GroupOut::from).collect()))
}

async fn retrieve_group(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<GroupOut>> {
    check_permission(&IsAuthorOrReadOnly, &method, user.as_ref())?;
    let conn = state.db.get()?;
    let group = groups::get_group(&conn, id)?.ok_or(AppError::NotFound)?;
    Ok(Json(group.into()))
}

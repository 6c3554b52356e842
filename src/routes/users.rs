use axum::extract::State;
use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};

use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::extractors::{ApiPath, MaybeUser};
use crate::permissions::{check_permission, AllowAny};
use crate::serializers::UserOut;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/", get(list_users))
        .route("/users/{id}/", get(retrieve_user))
}

async fn list_users(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
) -> AppResult<Json<Vec<UserOut>>> {
    check_permission(&AllowAny, &method, user.as_ref())?;
    let conn = state.db.get()?;

    let out = users::list_users(&conn)?
        .into_iter()
        .map(|u| -> AppResult<UserOut> {
            let posts = users::post_ids_for(&conn, u.id)?;
            Ok(UserOut::new(u, posts))
        })
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(out))
}

async fn retrieve_user(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<UserOut>> {
    check_permission(&AllowAny, &method, user.as_ref())?;
    let conn = state.db.get()?;

    let found = users::get_user(&conn, id)?.ok_or(AppError::NotFound)?;
    let posts = users::post_ids_for(&conn, found.id)?;
    Ok(Json(UserOut::new(found, posts)))
}

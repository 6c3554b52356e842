use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use rusqlite::Connection;

use crate::db::models::Comment;
use crate::db::{comments, posts};
use crate::error::{AppError, AppResult};
use crate::extractors::{ApiJson, ApiPath, MaybeUser};
use crate::permissions::{
    check_object_permission, check_permission, require_user, IsAuthorOrReadOnly,
};
use crate::serializers::{CommentInput, CommentOut, Mode};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/posts/{post_id}/comments/",
            get(list_comments).post(create_comment),
        )
        .route(
            "/posts/{post_id}/comments/{id}/",
            get(retrieve_comment)
                .put(update_comment)
                .patch(partial_update_comment)
                .delete(destroy_comment),
        )
}

/// Every comment route lives under a post that must exist.
fn ensure_post(conn: &Connection, post_id: i64) -> AppResult<()> {
    if posts::post_exists(conn, post_id)? {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

fn load_comment(conn: &Connection, post_id: i64, id: i64) -> AppResult<Comment> {
    ensure_post(conn, post_id)?;
    comments::get_comment(conn, post_id, id)?.ok_or(AppError::NotFound)
}

async fn list_comments(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
    ApiPath(post_id): ApiPath<i64>,
) -> AppResult<Json<Vec<CommentOut>>> {
    check_permission(&IsAuthorOrReadOnly, &method, user.as_ref())?;
    let conn = state.db.get()?;
    ensure_post(&conn, post_id)?;

    let rows = comments::list_comments(&conn, post_id)?;
    Ok(Json(rows.into_iter().map(CommentOut::from).collect()))
}

async fn create_comment(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
    ApiPath(post_id): ApiPath<i64>,
    body: ApiJson,
) -> AppResult<impl IntoResponse> {
    let user = require_user(&IsAuthorOrReadOnly, &method, user)?;
    let conn = state.db.get()?;
    ensure_post(&conn, post_id)?;

    let input: CommentInput = body.parse().await?;
    let text = input.validate(Mode::Full)?.unwrap_or_default();
    let id = comments::insert_comment(&conn, post_id, user.id, &text, Utc::now())?;
    tracing::info!("Comment {} on post {} created by {}", id, post_id, user.username);

    let comment = load_comment(&conn, post_id, id)?;
    Ok((StatusCode::CREATED, Json(CommentOut::from(comment))))
}

async fn retrieve_comment(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
    ApiPath((post_id, id)): ApiPath<(i64, i64)>,
) -> AppResult<Json<CommentOut>> {
    check_permission(&IsAuthorOrReadOnly, &method, user.as_ref())?;
    let conn = state.db.get()?;
    let comment = load_comment(&conn, post_id, id)?;
    check_object_permission(&IsAuthorOrReadOnly, &method, user.as_ref(), &comment)?;
    Ok(Json(comment.into()))
}

async fn update_comment(
    state: State<AppState>,
    method: Method,
    user: MaybeUser,
    ids: ApiPath<(i64, i64)>,
    body: ApiJson,
) -> AppResult<Json<CommentOut>> {
    save_comment(state, method, user, ids, body, Mode::Full).await
}

async fn partial_update_comment(
    state: State<AppState>,
    method: Method,
    user: MaybeUser,
    ids: ApiPath<(i64, i64)>,
    body: ApiJson,
) -> AppResult<Json<CommentOut>> {
    save_comment(state, method, user, ids, body, Mode::Partial).await
}

async fn save_comment(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
    ApiPath((post_id, id)): ApiPath<(i64, i64)>,
    body: ApiJson,
    mode: Mode,
) -> AppResult<Json<CommentOut>> {
    let user = require_user(&IsAuthorOrReadOnly, &method, user)?;
    let conn = state.db.get()?;

    let comment = load_comment(&conn, post_id, id)?;
    check_object_permission(&IsAuthorOrReadOnly, &method, Some(&user), &comment)?;

    let input: CommentInput = body.parse().await?;
    if let Some(text) = input.validate(mode)? {
        comments::update_comment(&conn, id, &text)?;
        tracing::info!("Comment {} updated by {}", id, user.username);
    }

    Ok(Json(load_comment(&conn, post_id, id)?.into()))
}

async fn destroy_comment(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
    ApiPath((post_id, id)): ApiPath<(i64, i64)>,
) -> AppResult<StatusCode> {
    let user = require_user(&IsAuthorOrReadOnly, &method, user)?;
    let conn = state.db.get()?;

    let comment = load_comment(&conn, post_id, id)?;
    check_object_permission(&IsAuthorOrReadOnly, &method, Some(&user), &comment)?;

    comments::delete_comment(&conn, id)?;
    tracing::info!("Comment {} deleted by {}", id, user.username);
    Ok(StatusCode::NO_CONTENT)
}

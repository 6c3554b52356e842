use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::db::models::Post;
use crate::db::posts;
use crate::error::{AppError, AppResult};
use crate::extractors::{ApiJson, ApiPath, MaybeUser};
use crate::permissions::{
    check_object_permission, check_permission, require_user, IsAuthorOrReadOnly,
};
use crate::routes::pagination::{base_url, Listing, Page, PageParams};
use crate::serializers::{Mode, PostInput, PostOut};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/", get(list_posts).post(create_post))
        .route(
            "/posts/{id}/",
            get(retrieve_post)
                .put(update_post)
                .patch(partial_update_post)
                .delete(destroy_post),
        )
}

fn load_post(conn: &rusqlite::Connection, id: i64) -> AppResult<Post> {
    posts::get_post(conn, id)?.ok_or(AppError::NotFound)
}

async fn list_posts(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
    Query(params): Query<PageParams>,
    headers: HeaderMap,
    uri: Uri,
) -> AppResult<Json<Listing<PostOut>>> {
    check_permission(&IsAuthorOrReadOnly, &method, user.as_ref())?;
    let conn = state.db.get()?;

    let listing = match params.window(state.config.api.max_limit) {
        None => {
            let rows = posts::list_posts(&conn, None, 0)?;
            Listing::All(rows.into_iter().map(PostOut::from).collect())
        }
        Some(window) => {
            let count = posts::count_posts(&conn)?;
            let rows = posts::list_posts(&conn, Some(window.limit), window.offset)?;
            let results: Vec<PostOut> = rows.into_iter().map(PostOut::from).collect();
            Listing::Paged(Page::new(results, count, window, &base_url(&headers, &uri)))
        }
    };
    Ok(Json(listing))
}

async fn create_post(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
    body: ApiJson,
) -> AppResult<impl IntoResponse> {
    let user = require_user(&IsAuthorOrReadOnly, &method, user)?;
    let input: PostInput = body.parse().await?;
    let conn = state.db.get()?;

    let fields = input.validate(&conn, Mode::Full)?;
    let text = fields.text.unwrap_or_default();
    let id = posts::insert_post(&conn, user.id, &text, fields.group.flatten(), Utc::now())?;
    tracing::info!("Post {} created by {}", id, user.username);

    let post = load_post(&conn, id)?;
    Ok((StatusCode::CREATED, Json(PostOut::from(post))))
}

async fn retrieve_post(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<PostOut>> {
    check_permission(&IsAuthorOrReadOnly, &method, user.as_ref())?;
    let conn = state.db.get()?;
    let post = load_post(&conn, id)?;
    check_object_permission(&IsAuthorOrReadOnly, &method, user.as_ref(), &post)?;
    Ok(Json(post.into()))
}

async fn update_post(
    state: State<AppState>,
    method: Method,
    user: MaybeUser,
    id: ApiPath<i64>,
    body: ApiJson,
) -> AppResult<Json<PostOut>> {
    save_post(state, method, user, id, body, Mode::Full).await
}

async fn partial_update_post(
    state: State<AppState>,
    method: Method,
    user: MaybeUser,
    id: ApiPath<i64>,
    body: ApiJson,
) -> AppResult<Json<PostOut>> {
    save_post(state, method, user, id, body, Mode::Partial).await
}

async fn save_post(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
    ApiPath(id): ApiPath<i64>,
    body: ApiJson,
    mode: Mode,
) -> AppResult<Json<PostOut>> {
    let user = require_user(&IsAuthorOrReadOnly, &method, user)?;
    let conn = state.db.get()?;

    let post = load_post(&conn, id)?;
    check_object_permission(&IsAuthorOrReadOnly, &method, Some(&user), &post)?;

    let input: PostInput = body.parse().await?;
    let update = input.validate(&conn, mode)?;
    posts::update_post(&conn, id, &update)?;
    tracing::info!("Post {} updated by {}", id, user.username);

    Ok(Json(load_post(&conn, id)?.into()))
}

async fn destroy_post(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(user): MaybeUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    let user = require_user(&IsAuthorOrReadOnly, &method, user)?;
    let conn = state.db.get()?;

    let post = load_post(&conn, id)?;
    check_object_permission(&IsAuthorOrReadOnly, &method, Some(&user), &post)?;

    posts::delete_post(&conn, id)?;
    tracing::info!("Post {} deleted by {}", id, user.username);
    Ok(StatusCode::NO_CONTENT)
}

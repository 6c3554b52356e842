use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::auth::{credentials, tokens, Credentials};
use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Represents the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Optional user extractor: `None` for anonymous callers. A bad token is
/// still rejected with 401 rather than silently downgraded.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = match credentials(parts) {
            Credentials::Anonymous => return Ok(MaybeUser(None)),
            Credentials::Malformed => return Err(AppError::InvalidToken),
            Credentials::Key(key) => key,
        };

        let conn = state.db.get()?;
        let user = tokens::user_for_token(&conn, key)?.ok_or(AppError::InvalidToken)?;
        Ok(MaybeUser(Some(user.into())))
    }
}

/// JSON request body, parsed on demand.
///
/// Extraction never fails: handlers check permissions first and only then
/// call [`ApiJson::parse`], so an anonymous or unauthorized write is refused
/// with 401/403 whatever its body looks like. Parse failures are reported as
/// a 400 with a `detail` message instead of axum's plain-text rejection.
pub struct ApiJson(Request);

impl<S> FromRequest<S> for ApiJson
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ApiJson(req))
    }
}

impl ApiJson {
    pub async fn parse<T: DeserializeOwned>(self) -> AppResult<T> {
        Json::<T>::from_request(self.0, &())
            .await
            .map(|Json(value)| value)
            .map_err(json_rejection)
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

/// Path extractor where an unparsable id is simply a missing record.
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ApiPath(value))
            .map_err(|_| AppError::NotFound)
    }
}

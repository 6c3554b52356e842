//! Per-request authorization checks.
//!
//! A permission answers two questions: may this caller use the endpoint at
//! all, and may they act on this particular record. A refusal becomes 401
//! for anonymous callers and 403 for authenticated ones.

use axum::http::Method;

use crate::db::models::Owned;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;

pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

pub trait Permission {
    fn has_permission(&self, method: &Method, user: Option<&CurrentUser>) -> bool;

    fn has_object_permission(
        &self,
        _method: &Method,
        _user: Option<&CurrentUser>,
        _record: &dyn Owned,
    ) -> bool {
        true
    }
}

/// Everyone, for every verb.
pub struct AllowAny;

impl Permission for AllowAny {
    fn has_permission(&self, _method: &Method, _user: Option<&CurrentUser>) -> bool {
        true
    }
}

/// Any authenticated caller.
pub struct IsAuthenticated;

impl Permission for IsAuthenticated {
    fn has_permission(&self, _method: &Method, user: Option<&CurrentUser>) -> bool {
        user.is_some()
    }
}

/// Reads for everyone; writes only by an authenticated caller, and changes
/// to an existing record only by its author.
pub struct IsAuthorOrReadOnly;

impl Permission for IsAuthorOrReadOnly {
    fn has_permission(&self, method: &Method, user: Option<&CurrentUser>) -> bool {
        is_safe_method(method) || user.is_some()
    }

    fn has_object_permission(
        &self,
        method: &Method,
        user: Option<&CurrentUser>,
        record: &dyn Owned,
    ) -> bool {
        is_safe_method(method) || user.is_some_and(|u| u.id == record.owner_id())
    }
}

fn denied(user: Option<&CurrentUser>) -> AppError {
    match user {
        None => AppError::Unauthorized,
        Some(_) => AppError::Forbidden,
    }
}

pub fn check_permission(
    permission: &impl Permission,
    method: &Method,
    user: Option<&CurrentUser>,
) -> AppResult<()> {
    if permission.has_permission(method, user) {
        Ok(())
    } else {
        Err(denied(user))
    }
}

pub fn check_object_permission(
    permission: &impl Permission,
    method: &Method,
    user: Option<&CurrentUser>,
    record: &dyn Owned,
) -> AppResult<()> {
    if permission.has_object_permission(method, user, record) {
        Ok(())
    } else {
        Err(denied(user))
    }
}

/// `check_permission` for handlers that go on to act as the caller.
pub fn require_user(
    permission: &impl Permission,
    method: &Method,
    user: Option<CurrentUser>,
) -> AppResult<CurrentUser> {
    check_permission(permission, method, user.as_ref())?;
    user.ok_or(AppError::Unauthorized)
}

pub mod tokens;

use axum::http::header;
use axum::http::request::Parts;

/// Schemes accepted in the `Authorization` header.
const SCHEMES: &[&str] = &["Bearer", "Token"];

/// What the `Authorization` header carries, if anything we understand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials<'a> {
    /// No header, or a scheme this server does not handle.
    Anonymous,
    /// One of our schemes followed by a key.
    Key(&'a str),
    /// One of our schemes with a missing or malformed key.
    Malformed,
}

pub fn credentials(parts: &Parts) -> Credentials<'_> {
    let Some(value) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return Credentials::Anonymous;
    };

    let mut split = value.split_whitespace();
    let scheme = split.next().unwrap_or_default();
    if !SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return Credentials::Anonymous;
    }

    match (split.next(), split.next()) {
        (Some(key), None) => Credentials::Key(key),
        _ => Credentials::Malformed,
    }
}

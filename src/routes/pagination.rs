use axum::http::{header, HeaderMap, Uri};
use serde::{Deserialize, Serialize};

/// `?limit=&offset=` as sent by the client. Kept as strings so that junk
/// values fall back to defaults instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: i64,
    pub offset: i64,
}

impl PageParams {
    /// The requested slice, or `None` when the client asked for no paging.
    pub fn window(&self, max_limit: Option<i64>) -> Option<Window> {
        let limit = self
            .limit
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|&v| v > 0)?;
        let limit = match max_limit {
            Some(max) if max > 0 => limit.min(max),
            _ => limit,
        };
        let offset = self
            .offset
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|&v| v >= 0)
            .unwrap_or(0);
        Some(Window { limit, offset })
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Builds the page and its neighbour links. Links carry only `limit` and
    /// `offset`; any other query parameters on the request are not repeated.
    pub fn new(results: Vec<T>, count: i64, window: Window, base: &str) -> Self {
        let Window { limit, offset } = window;
        let end = offset.saturating_add(limit);

        let next = (end < count).then(|| format!("{base}?limit={limit}&offset={end}"));
        let previous = (offset > 0).then(|| {
            if offset.saturating_sub(limit) <= 0 {
                format!("{base}?limit={limit}")
            } else {
                format!("{base}?limit={limit}&offset={}", offset - limit)
            }
        });

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Either every row, or one page of rows when a limit was requested.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Listing<T> {
    All(Vec<T>),
    Paged(Page<T>),
}

/// Base for page links: absolute when the request named a host.
pub fn base_url(headers: &HeaderMap, uri: &Uri) -> String {
    let path = uri.path();
    match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{host}{path}"),
        None => path.to_string(),
    }
}

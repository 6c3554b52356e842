use chrono::{DateTime, Utc};
use rusqlite::Row;

/// A record whose author decides who may change it.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
}

impl User {
    pub(crate) const COLUMNS: &'static str = "u.id, u.username";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    pub(crate) const COLUMNS: &'static str = "g.id, g.title, g.slug, g.description";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            slug: row.get(2)?,
            description: row.get(3)?,
        })
    }
}

/// A post joined with its author's username.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub author: String,
    pub group_id: Option<i64>,
}

impl Post {
    pub(crate) const COLUMNS: &'static str =
        "p.id, p.text, p.pub_date, p.author_id, u.username, p.group_id";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            pub_date: row.get(2)?,
            author_id: row.get(3)?,
            author: row.get(4)?,
            group_id: row.get(5)?,
        })
    }
}

impl Owned for Post {
    fn owner_id(&self) -> i64 {
        self.author_id
    }
}

/// A comment joined with its author's username.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author: String,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl Comment {
    pub(crate) const COLUMNS: &'static str =
        "c.id, c.post_id, c.author_id, u.username, c.text, c.created";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            post_id: row.get(1)?,
            author_id: row.get(2)?,
            author: row.get(3)?,
            text: row.get(4)?,
            created: row.get(5)?,
        })
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> i64 {
        self.author_id
    }
}

/// A follow edge with both usernames resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub user: String,
    pub following_id: i64,
    pub following: String,
}

impl Follow {
    pub(crate) const COLUMNS: &'static str =
        "f.id, f.user_id, fu.username, f.following_id, ft.username";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            user: row.get(2)?,
            following_id: row.get(3)?,
            following: row.get(4)?,
        })
    }
}

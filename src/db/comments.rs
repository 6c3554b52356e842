use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Comment;
use crate::error::AppResult;

pub fn insert_comment(
    conn: &Connection,
    post_id: i64,
    author_id: i64,
    text: &str,
    created: DateTime<Utc>,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO comments (post_id, author_id, text, created) VALUES (?1, ?2, ?3, ?4)",
        params![post_id, author_id, text, created],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Looks up a comment only within the given post.
pub fn get_comment(conn: &Connection, post_id: i64, id: i64) -> AppResult<Option<Comment>> {
    let sql = format!(
        "SELECT {} FROM comments c JOIN users u ON u.id = c.author_id
         WHERE c.id = ?1 AND c.post_id = ?2",
        Comment::COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![id, post_id], Comment::from_row)
        .optional()?)
}

/// Comments on a post, newest first.
pub fn list_comments(conn: &Connection, post_id: i64) -> AppResult<Vec<Comment>> {
    let sql = format!(
        "SELECT {} FROM comments c JOIN users u ON u.id = c.author_id
         WHERE c.post_id = ?1
         ORDER BY c.created DESC, c.id DESC",
        Comment::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let comments = stmt
        .query_map(params![post_id], Comment::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

pub fn update_comment(conn: &Connection, id: i64, text: &str) -> AppResult<()> {
    conn.execute(
        "UPDATE comments SET text = ?2 WHERE id = ?1",
        params![id, text],
    )?;
    Ok(())
}

pub fn delete_comment(conn: &Connection, id: i64) -> AppResult<bool> {
    let rows = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

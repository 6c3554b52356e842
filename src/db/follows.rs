use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::db::models::Follow;
use crate::error::{unique_violation, AppError, AppResult};

pub const SELF_FOLLOW: &str = "self-follow forbidden";
pub const DUPLICATE_FOLLOW: &str = "The fields user, following must make a unique set.";

const SELECT: &str = "FROM follows f
     JOIN users fu ON fu.id = f.user_id
     JOIN users ft ON ft.id = f.following_id";

pub fn follow_exists(conn: &Connection, user_id: i64, following_id: i64) -> AppResult<bool> {
    Ok(conn.query_row(
        "SELECT COUNT(*) > 0 FROM follows WHERE user_id = ?1 AND following_id = ?2",
        params![user_id, following_id],
        |row| row.get(0),
    )?)
}

/// Records that `user_id` follows `following_id`.
pub fn insert_follow(conn: &Connection, user_id: i64, following_id: i64) -> AppResult<Follow> {
    if user_id == following_id {
        return Err(AppError::non_field(SELF_FOLLOW));
    }

    conn.execute(
        "INSERT INTO follows (user_id, following_id) VALUES (?1, ?2)",
        params![user_id, following_id],
    )
    .map_err(|e| unique_violation(e, crate::error::NON_FIELD_ERRORS, DUPLICATE_FOLLOW))?;

    let id = conn.last_insert_rowid();
    let sql = format!("SELECT {} {} WHERE f.id = ?1", Follow::COLUMNS, SELECT);
    conn.query_row(&sql, params![id], Follow::from_row)
        .optional()?
        .ok_or(AppError::NotFound)
}

/// Follows where `user_id` is the follower. Each search term must appear,
/// case-insensitively, in either username.
pub fn list_follows(conn: &Connection, user_id: i64, terms: &[String]) -> AppResult<Vec<Follow>> {
    let mut sql = format!("SELECT {} {} WHERE f.user_id = ?", Follow::COLUMNS, SELECT);
    let mut args: Vec<rusqlite::types::Value> = vec![user_id.into()];

    for term in terms {
        sql.push_str(
            " AND (instr(lower(fu.username), lower(?)) > 0
                OR instr(lower(ft.username), lower(?)) > 0)",
        );
        args.push(term.clone().into());
        args.push(term.clone().into());
    }
    sql.push_str(" ORDER BY f.id");

    let mut stmt = conn.prepare(&sql)?;
    let follows = stmt
        .query_map(params_from_iter(args), Follow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(follows)
}

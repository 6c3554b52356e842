use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::User;
use crate::error::AppResult;

/// Return the user's API key, creating one if they have none yet.
pub fn issue_token(conn: &Connection, user_id: i64) -> AppResult<String> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT key FROM auth_tokens WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(key) = existing {
        return Ok(key);
    }

    let key = generate_token();
    conn.execute(
        "INSERT INTO auth_tokens (key, user_id) VALUES (?1, ?2)",
        params![key, user_id],
    )?;
    Ok(key)
}

/// Delete the user's API key, if any.
pub fn revoke_token(conn: &Connection, user_id: i64) -> AppResult<bool> {
    let rows = conn.execute(
        "DELETE FROM auth_tokens WHERE user_id = ?1",
        params![user_id],
    )?;
    Ok(rows > 0)
}

/// Resolve an API key to its owner.
pub fn user_for_token(conn: &Connection, key: &str) -> AppResult<Option<User>> {
    let sql = format!(
        "SELECT {} FROM auth_tokens t JOIN users u ON u.id = t.user_id WHERE t.key = ?1",
        User::COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![key], User::from_row)
        .optional()?)
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

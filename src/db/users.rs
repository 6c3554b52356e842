use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::User;
use crate::error::{unique_violation, AppError, AppResult};

const MAX_USERNAME_LEN: usize = 150;

fn validate_username(username: &str) -> AppResult<()> {
    if username.is_empty() {
        return Err(AppError::field("username", "This field may not be blank."));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::field(
            "username",
            format!("Ensure this field has no more than {MAX_USERNAME_LEN} characters."),
        ));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(AppError::field(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

pub fn create_user(conn: &Connection, username: &str) -> AppResult<User> {
    validate_username(username)?;

    conn.execute("INSERT INTO users (username) VALUES (?1)", params![username])
        .map_err(|e| {
            unique_violation(e, "username", "A user with that username already exists.")
        })?;

    let id = conn.last_insert_rowid();
    tracing::info!("User {} created: {}", id, username);
    Ok(User {
        id,
        username: username.to_string(),
    })
}

pub fn get_user(conn: &Connection, id: i64) -> AppResult<Option<User>> {
    let sql = format!("SELECT {} FROM users u WHERE u.id = ?1", User::COLUMNS);
    Ok(conn
        .query_row(&sql, params![id], User::from_row)
        .optional()?)
}

pub fn find_by_username(conn: &Connection, username: &str) -> AppResult<Option<User>> {
    let sql = format!("SELECT {} FROM users u WHERE u.username = ?1", User::COLUMNS);
    Ok(conn
        .query_row(&sql, params![username], User::from_row)
        .optional()?)
}

pub fn list_users(conn: &Connection) -> AppResult<Vec<User>> {
    let sql = format!("SELECT {} FROM users u ORDER BY u.id", User::COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let users = stmt
        .query_map([], User::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Ids of the posts authored by `user_id`, oldest first.
pub fn post_ids_for(conn: &Connection, user_id: i64) -> AppResult<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM posts WHERE author_id = ?1 ORDER BY id")?;
    let ids = stmt
        .query_map(params![user_id], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

/// Deletes the user along with their posts, comments, follows and token.
pub fn delete_user(conn: &Connection, id: i64) -> AppResult<bool> {
    let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    if rows > 0 {
        tracing::info!("User {} deleted", id);
    }
    Ok(rows > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::test_pool;

    #[test]
    fn create_and_lookup_user() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();

        let alice = create_user(&conn, "alice").unwrap();
        assert_eq!(get_user(&conn, alice.id).unwrap(), Some(alice.clone()));
        assert_eq!(find_by_username(&conn, "alice").unwrap(), Some(alice));
        assert_eq!(find_by_username(&conn, "nobody").unwrap(), None);
    }

    #[test]
    fn duplicate_username_is_a_validation_error() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();

        create_user(&conn, "alice").unwrap();
        match create_user(&conn, "alice") {
            Err(AppError::Validation(errors)) => assert!(errors.get("username").is_some()),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_usernames() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();

        assert!(create_user(&conn, "").is_err());
        assert!(create_user(&conn, "has space").is_err());
        assert!(create_user(&conn, &"x".repeat(151)).is_err());
        assert!(create_user(&conn, "ok.name+tag@host-1_x").is_ok());
    }

    #[test]
    fn users_list_in_id_order() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();

        create_user(&conn, "zed").unwrap();
        create_user(&conn, "amy").unwrap();
        let names: Vec<_> = list_users(&conn)
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, ["zed", "amy"]);
    }
}

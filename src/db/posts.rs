use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Post;
use crate::error::AppResult;

/// Changes to apply to a post. `None` leaves the column untouched;
/// `group: Some(None)` clears the group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostUpdate {
    pub text: Option<String>,
    pub group: Option<Option<i64>>,
}

pub fn insert_post(
    conn: &Connection,
    author_id: i64,
    text: &str,
    group_id: Option<i64>,
    pub_date: DateTime<Utc>,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO posts (text, pub_date, author_id, group_id) VALUES (?1, ?2, ?3, ?4)",
        params![text, pub_date, author_id, group_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_post(conn: &Connection, id: i64) -> AppResult<Option<Post>> {
    let sql = format!(
        "SELECT {} FROM posts p JOIN users u ON u.id = p.author_id WHERE p.id = ?1",
        Post::COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![id], Post::from_row)
        .optional()?)
}

pub fn post_exists(conn: &Connection, id: i64) -> AppResult<bool> {
    Ok(conn.query_row(
        "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?)
}

/// Posts in id order. `limit: None` returns everything from `offset` on.
pub fn list_posts(conn: &Connection, limit: Option<i64>, offset: i64) -> AppResult<Vec<Post>> {
    let sql = format!(
        "SELECT {} FROM posts p JOIN users u ON u.id = p.author_id
         ORDER BY p.id
         LIMIT ?1 OFFSET ?2",
        Post::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    // SQLite treats a negative LIMIT as "no limit".
    let posts = stmt
        .query_map(params![limit.unwrap_or(-1), offset], Post::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn count_posts(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?)
}

pub fn update_post(conn: &Connection, id: i64, update: &PostUpdate) -> AppResult<()> {
    let (set_group, group_id) = match update.group {
        Some(group_id) => (true, group_id),
        None => (false, None),
    };
    conn.execute(
        "UPDATE posts SET
            text = COALESCE(?2, text),
            group_id = CASE WHEN ?3 THEN ?4 ELSE group_id END
         WHERE id = ?1",
        params![id, update.text, set_group, group_id],
    )?;
    Ok(())
}

/// Deletes the post and, through the foreign key, its comments.
pub fn delete_post(conn: &Connection, id: i64) -> AppResult<bool> {
    let rows = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::groups::{create_group, delete_group, NewGroup};
    use crate::db::tests::test_pool;
    use crate::db::users::{create_user, delete_user};

    #[test]
    fn insert_and_fetch_post_with_author_username() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();
        let alice = create_user(&conn, "alice").unwrap();

        let now = Utc::now();
        let id = insert_post(&conn, alice.id, "hello", None, now).unwrap();
        let post = get_post(&conn, id).unwrap().unwrap();

        assert_eq!(post.text, "hello");
        assert_eq!(post.author, "alice");
        assert_eq!(post.author_id, alice.id);
        assert_eq!(post.group_id, None);
        assert_eq!(post.pub_date, now);
    }

    #[test]
    fn list_respects_limit_and_offset() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();
        let alice = create_user(&conn, "alice").unwrap();
        for i in 0..5 {
            insert_post(&conn, alice.id, &format!("post {i}"), None, Utc::now()).unwrap();
        }

        assert_eq!(count_posts(&conn).unwrap(), 5);
        assert_eq!(list_posts(&conn, None, 0).unwrap().len(), 5);

        let page = list_posts(&conn, Some(2), 3).unwrap();
        let texts: Vec<_> = page.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["post 3", "post 4"]);
    }

    #[test]
    fn update_changes_only_given_fields() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();
        let alice = create_user(&conn, "alice").unwrap();
        let cats = create_group(
            &conn,
            &NewGroup {
                title: "Cats",
                slug: "cats",
                description: "",
            },
        )
        .unwrap();
        let id = insert_post(&conn, alice.id, "hello", Some(cats.id), Utc::now()).unwrap();
        let before = get_post(&conn, id).unwrap().unwrap();

        update_post(
            &conn,
            id,
            &PostUpdate {
                text: Some("edited".into()),
                group: None,
            },
        )
        .unwrap();
        let post = get_post(&conn, id).unwrap().unwrap();
        assert_eq!(post.text, "edited");
        assert_eq!(post.group_id, Some(cats.id));
        assert_eq!(post.pub_date, before.pub_date);

        update_post(
            &conn,
            id,
            &PostUpdate {
                text: None,
                group: Some(None),
            },
        )
        .unwrap();
        let post = get_post(&conn, id).unwrap().unwrap();
        assert_eq!(post.text, "edited");
        assert_eq!(post.group_id, None);
    }

    #[test]
    fn deleting_group_nulls_posts() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();
        let alice = create_user(&conn, "alice").unwrap();
        let cats = create_group(
            &conn,
            &NewGroup {
                title: "Cats",
                slug: "cats",
                description: "",
            },
        )
        .unwrap();
        for _ in 0..3 {
            insert_post(&conn, alice.id, "meow", Some(cats.id), Utc::now()).unwrap();
        }

        assert!(delete_group(&conn, cats.id).unwrap());

        let posts = list_posts(&conn, None, 0).unwrap();
        assert_eq!(posts.len(), 3);
        assert!(posts.iter().all(|p| p.group_id.is_none()));
    }

    #[test]
    fn deleting_author_removes_posts() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();
        let alice = create_user(&conn, "alice").unwrap();
        let bob = create_user(&conn, "bob").unwrap();
        insert_post(&conn, alice.id, "a", None, Utc::now()).unwrap();
        insert_post(&conn, bob.id, "b", None, Utc::now()).unwrap();

        delete_user(&conn, alice.id).unwrap();

        let posts = list_posts(&conn, None, 0).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].author, "bob");
    }
}

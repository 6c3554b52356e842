use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Group;
use crate::error::{unique_violation, AppResult, FieldErrors};

const MAX_TITLE_LEN: usize = 200;
const MAX_SLUG_LEN: usize = 50;

#[derive(Debug, Clone)]
pub struct NewGroup<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub description: &'a str,
}

impl NewGroup<'_> {
    fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();

        if self.title.trim().is_empty() {
            errors.add("title", "This field may not be blank.");
        } else if self.title.chars().count() > MAX_TITLE_LEN {
            errors.add(
                "title",
                format!("Ensure this field has no more than {MAX_TITLE_LEN} characters."),
            );
        }

        let slug_char = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
        if self.slug.is_empty() {
            errors.add("slug", "This field may not be blank.");
        } else if self.slug.len() > MAX_SLUG_LEN {
            errors.add(
                "slug",
                format!("Ensure this field has no more than {MAX_SLUG_LEN} characters."),
            );
        } else if !self.slug.chars().all(slug_char) {
            errors.add(
                "slug",
                "Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens.",
            );
        }

        errors.into_result()
    }
}

pub fn create_group(conn: &Connection, group: &NewGroup<'_>) -> AppResult<Group> {
    group.validate()?;

    conn.execute(
        "INSERT INTO post_groups (title, slug, description) VALUES (?1, ?2, ?3)",
        params![group.title, group.slug, group.description],
    )
    .map_err(|e| unique_violation(e, "slug", "group with this slug already exists."))?;

    let id = conn.last_insert_rowid();
    tracing::info!("Group {} created: {}", id, group.slug);
    Ok(Group {
        id,
        title: group.title.to_string(),
        slug: group.slug.to_string(),
        description: group.description.to_string(),
    })
}

pub fn get_group(conn: &Connection, id: i64) -> AppResult<Option<Group>> {
    let sql = format!("SELECT {} FROM post_groups g WHERE g.id = ?1", Group::COLUMNS);
    Ok(conn
        .query_row(&sql, params![id], Group::from_row)
        .optional()?)
}

pub fn group_exists(conn: &Connection, id: i64) -> AppResult<bool> {
    Ok(conn.query_row(
        "SELECT COUNT(*) > 0 FROM post_groups WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?)
}

pub fn list_groups(conn: &Connection) -> AppResult<Vec<Group>> {
    let sql = format!("SELECT {} FROM post_groups g ORDER BY g.id", Group::COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let groups = stmt
        .query_map([], Group::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(groups)
}

/// Deletes the group; its posts survive with no group.
pub fn delete_group(conn: &Connection, id: i64) -> AppResult<bool> {
    let rows = conn.execute("DELETE FROM post_groups WHERE id = ?1", params![id])?;
    if rows > 0 {
        tracing::info!("Group {} deleted", id);
    }
    Ok(rows > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::test_pool;
    use crate::error::AppError;

    fn group<'a>(slug: &'a str) -> NewGroup<'a> {
        NewGroup {
            title: "Cats",
            slug,
            description: "",
        }
    }

    #[test]
    fn create_and_fetch_group() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();

        let cats = create_group(&conn, &group("cats")).unwrap();
        assert!(group_exists(&conn, cats.id).unwrap());
        assert_eq!(get_group(&conn, cats.id).unwrap(), Some(cats));
        assert!(!group_exists(&conn, 404).unwrap());
    }

    #[test]
    fn slug_must_be_unique() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();

        create_group(&conn, &group("cats")).unwrap();
        match create_group(&conn, &group("cats")) {
            Err(AppError::Validation(errors)) => assert!(errors.get("slug").is_some()),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(list_groups(&conn).unwrap().len(), 1);
    }

    #[test]
    fn rejects_bad_slug_and_title() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();

        assert!(create_group(&conn, &group("not a slug")).is_err());
        assert!(create_group(&conn, &group("")).is_err());

        let long_title = "t".repeat(201);
        let err = create_group(
            &conn,
            &NewGroup {
                title: &long_title,
                slug: "ok",
                description: "",
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref e) if e.get("title").is_some()));
    }
}

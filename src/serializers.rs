//! Wire representations of the records and validation of write payloads.
//!
//! Related records are rendered by a human-readable key where the API
//! calls for it: authors and follow endpoints by username, groups and
//! posts by id. Read-only fields (`id`, `author`, `pub_date`, `post`,
//! `created`) are simply absent from the write payloads, so any value a
//! client sends for them is ignored.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Deserializer, Serialize};

use crate::db::models::{Comment, Follow, Group, Post, User};
use crate::db::posts::PostUpdate;
use crate::db::{follows, groups, users};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::extractors::CurrentUser;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

// --- Output ---

#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: i64,
    pub username: String,
    pub posts: Vec<i64>,
}

impl UserOut {
    pub fn new(user: User, posts: Vec<i64>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            posts,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostOut {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub group: Option<i64>,
    pub pub_date: DateTime<Utc>,
}

impl From<Post> for PostOut {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            text: post.text,
            author: post.author,
            group: post.group_id,
            pub_date: post.pub_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentOut {
    pub id: i64,
    pub author: String,
    pub post: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl From<Comment> for CommentOut {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            author: comment.author,
            post: comment.post_id,
            text: comment.text,
            created: comment.created,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupOut {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<Group> for GroupOut {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FollowOut {
    pub user: String,
    pub following: String,
}

impl From<Follow> for FollowOut {
    fn from(follow: Follow) -> Self {
        Self {
            user: follow.user,
            following: follow.following,
        }
    }
}

// --- Input ---

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn nullable<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// How much of a payload must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Create and PUT: required fields must be present.
    Full,
    /// PATCH: every field is optional.
    Partial,
}

fn check_text(errors: &mut FieldErrors, text: Option<&str>, mode: Mode) {
    match text {
        None if mode == Mode::Full => errors.add("text", REQUIRED),
        Some(text) if text.trim().is_empty() => errors.add("text", BLANK),
        _ => {}
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PostInput {
    pub text: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub group: Option<Option<i64>>,
}

impl PostInput {
    pub fn validate(self, conn: &Connection, mode: Mode) -> AppResult<PostUpdate> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, self.text.as_deref(), mode);

        if let Some(Some(group_id)) = self.group {
            if !groups::group_exists(conn, group_id)? {
                errors.add(
                    "group",
                    format!("Invalid pk \"{group_id}\" - object does not exist."),
                );
            }
        }

        errors.into_result()?;
        Ok(PostUpdate {
            text: self.text,
            group: self.group,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentInput {
    pub text: Option<String>,
}

impl CommentInput {
    /// The new comment text, if one was supplied.
    pub fn validate(self, mode: Mode) -> AppResult<Option<String>> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, self.text.as_deref(), mode);
        errors.into_result()?;
        Ok(self.text)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FollowInput {
    pub user: Option<String>,
    pub following: Option<String>,
}

impl FollowInput {
    /// Resolves the payload for `acting` and returns the id of the user to
    /// follow. The follower is always the acting user.
    pub fn validate(self, conn: &Connection, acting: &CurrentUser) -> AppResult<i64> {
        let mut errors = FieldErrors::new();

        // A supplied `user` must still name someone, even though it is
        // replaced by the acting user.
        if let Some(name) = self.user.as_deref() {
            resolve_username(conn, &mut errors, "user", name)?;
        }

        let following = match self.following.as_deref() {
            None => {
                errors.add("following", REQUIRED);
                None
            }
            Some(name) => resolve_username(conn, &mut errors, "following", name)?,
        };

        errors.into_result()?;
        let following = following.ok_or(AppError::NotFound)?;

        if follows::follow_exists(conn, acting.id, following.id)? {
            return Err(AppError::non_field(follows::DUPLICATE_FOLLOW));
        }
        if following.id == acting.id {
            return Err(AppError::non_field(follows::SELF_FOLLOW));
        }
        Ok(following.id)
    }
}

fn resolve_username(
    conn: &Connection,
    errors: &mut FieldErrors,
    field: &str,
    name: &str,
) -> AppResult<Option<User>> {
    let user = users::find_by_username(conn, name)?;
    if user.is_none() {
        errors.add(field, format!("Object with username={name} does not exist."));
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::groups::{create_group, NewGroup};
    use crate::db::tests::test_pool;
    use crate::db::users::create_user;
    use crate::error::NON_FIELD_ERRORS;
    use serde_json::json;

    fn errors_of<T: std::fmt::Debug>(result: AppResult<T>) -> FieldErrors {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn post_output_renders_author_username() {
        let post = Post {
            id: 7,
            text: "hello".into(),
            pub_date: Utc::now(),
            author_id: 1,
            author: "alice".into(),
            group_id: None,
        };
        let json = serde_json::to_value(PostOut::from(post)).unwrap();
        assert_eq!(json["author"], "alice");
        assert_eq!(json["group"], serde_json::Value::Null);
        assert_eq!(json["id"], 7);
        assert!(json.get("author_id").is_none());
    }

    #[test]
    fn post_input_ignores_read_only_fields() {
        let input: PostInput = serde_json::from_value(json!({
            "text": "hi",
            "author": "mallory",
            "pub_date": "2000-01-01T00:00:00Z",
            "id": 99
        }))
        .unwrap();
        assert_eq!(input.text.as_deref(), Some("hi"));
        assert_eq!(input.group, None);
    }

    #[test]
    fn post_input_tells_null_group_from_missing() {
        let input: PostInput = serde_json::from_value(json!({ "group": null })).unwrap();
        assert_eq!(input.group, Some(None));
        let input: PostInput = serde_json::from_value(json!({ "group": 3 })).unwrap();
        assert_eq!(input.group, Some(Some(3)));
    }

    #[test]
    fn post_text_required_unless_partial() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();

        let errors = errors_of(PostInput::default().validate(&conn, Mode::Full));
        assert_eq!(errors.get("text").unwrap(), [REQUIRED]);

        let update = PostInput::default().validate(&conn, Mode::Partial).unwrap();
        assert_eq!(update, PostUpdate::default());

        let blank = PostInput {
            text: Some("   ".into()),
            group: None,
        };
        let errors = errors_of(blank.validate(&conn, Mode::Partial));
        assert_eq!(errors.get("text").unwrap(), [BLANK]);
    }

    #[test]
    fn post_group_must_exist() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();
        let cats = create_group(
            &conn,
            &NewGroup {
                title: "Cats",
                slug: "cats",
                description: "",
            },
        )
        .unwrap();

        let ok = PostInput {
            text: Some("meow".into()),
            group: Some(Some(cats.id)),
        };
        assert_eq!(ok.validate(&conn, Mode::Full).unwrap().group, Some(Some(cats.id)));

        let missing = PostInput {
            text: Some("meow".into()),
            group: Some(Some(404)),
        };
        let errors = errors_of(missing.validate(&conn, Mode::Full));
        assert_eq!(
            errors.get("group").unwrap(),
            ["Invalid pk \"404\" - object does not exist."]
        );
    }

    #[test]
    fn comment_text_rules() {
        assert!(CommentInput::default().validate(Mode::Full).is_err());
        assert_eq!(CommentInput::default().validate(Mode::Partial).unwrap(), None);
        let input = CommentInput {
            text: Some("nice".into()),
        };
        assert_eq!(input.validate(Mode::Full).unwrap().as_deref(), Some("nice"));
    }

    #[test]
    fn follow_requires_known_following() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();
        let alice: CurrentUser = create_user(&conn, "alice").unwrap().into();

        let errors = errors_of(FollowInput::default().validate(&conn, &alice));
        assert_eq!(errors.get("following").unwrap(), [REQUIRED]);

        let ghost = FollowInput {
            user: None,
            following: Some("ghost".into()),
        };
        let errors = errors_of(ghost.validate(&conn, &alice));
        assert_eq!(
            errors.get("following").unwrap(),
            ["Object with username=ghost does not exist."]
        );
    }

    #[test]
    fn follow_rejects_self_and_duplicates() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();
        let alice: CurrentUser = create_user(&conn, "alice").unwrap().into();
        let bob = create_user(&conn, "bob").unwrap();

        let own = FollowInput {
            user: None,
            following: Some("alice".into()),
        };
        let errors = errors_of(own.validate(&conn, &alice));
        assert_eq!(errors.get(NON_FIELD_ERRORS).unwrap(), [follows::SELF_FOLLOW]);

        let to_bob = || FollowInput {
            user: Some("bob".into()),
            following: Some("bob".into()),
        };
        // `user` is replaced by the acting user, so this is alice -> bob.
        assert_eq!(to_bob().validate(&conn, &alice).unwrap(), bob.id);

        follows::insert_follow(&conn, alice.id, bob.id).unwrap();
        let errors = errors_of(to_bob().validate(&conn, &alice));
        assert_eq!(
            errors.get(NON_FIELD_ERRORS).unwrap(),
            [follows::DUPLICATE_FOLLOW]
        );
    }
}

//! Storage types for the record store abstraction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Returns the current UTC time truncated to microseconds.
///
/// All backends stamp records through this function so timestamps survive a
/// round trip through PostgreSQL `timestamptz` and the list cache unchanged.
#[must_use]
pub fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    let micros = now.nanosecond() / 1_000 * 1_000;
    now.replace_nanosecond(micros).unwrap_or(now)
}

/// Error returned when an identifier string is not a valid UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier: {0}")]
pub struct IdParseError(pub String);

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| IdParseError(s.to_string()))
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_newtype!(
    /// Identity of a todo item, assigned by the store at creation.
    TodoId
);

uuid_newtype!(
    /// Identity of the user owning a set of todo items.
    OwnerId
);

/// A todo item as stored in the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Item identity, immutable.
    pub id: TodoId,
    /// Owning user, immutable after creation.
    pub owner_id: OwnerId,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    /// Free-text tag set at creation.
    pub context: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TodoItem {
    /// Builds a freshly created item: new id, not completed,
    /// `created_at == updated_at == now`.
    #[must_use]
    pub fn create(new: NewTodo, now: OffsetDateTime) -> Self {
        Self {
            id: TodoId::new(),
            owner_id: new.owner_id,
            title: new.title,
            description: new.description,
            is_completed: false,
            context: new.context,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the provided fields of `patch` and refreshes `updated_at`.
    pub fn apply_patch(&mut self, patch: &TodoPatch, now: OffsetDateTime) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        self.updated_at = now;
    }

    /// Flips `is_completed` and refreshes `updated_at`. Returns the new value.
    pub fn toggle(&mut self, now: OffsetDateTime) -> bool {
        self.is_completed = !self.is_completed;
        self.updated_at = now;
        self.is_completed
    }
}

/// Input for [`TodoStore::insert`](crate::TodoStore::insert).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub owner_id: OwnerId,
    pub title: String,
    pub description: String,
    pub context: String,
}

/// Mutable fields for an update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TodoPatch {
    /// Returns `true` if the patch carries no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: OwnerId,
    pub username: String,
    pub email: String,
    /// PHC-formatted password hash.
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

/// Input for [`UserStore::create`](crate::UserStore::create).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(owner: OwnerId) -> TodoItem {
        TodoItem::create(
            NewTodo {
                owner_id: owner,
                title: "a".into(),
                description: String::new(),
                context: "home".into(),
            },
            now_utc(),
        )
    }

    #[test]
    fn test_create_sets_equal_timestamps() {
        let item = sample(OwnerId::new());
        assert_eq!(item.created_at, item.updated_at);
        assert!(!item.is_completed);
    }

    #[test]
    fn test_patch_only_touches_provided_fields() {
        let mut item = sample(OwnerId::new());
        let patch = TodoPatch {
            title: None,
            description: Some("details".into()),
        };
        item.apply_patch(&patch, now_utc());
        assert_eq!(item.title, "a");
        assert_eq!(item.description, "details");
    }

    #[test]
    fn test_toggle_twice_restores_value() {
        let mut item = sample(OwnerId::new());
        assert!(item.toggle(now_utc()));
        assert!(!item.toggle(now_utc()));
    }

    #[test]
    fn test_id_parsing() {
        let id = TodoId::new();
        assert_eq!(id.to_string().parse::<TodoId>().unwrap(), id);
        assert!("not-a-uuid".parse::<TodoId>().is_err());
    }

    #[test]
    fn test_json_field_names() {
        let item = sample(OwnerId::new());
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("ownerId").is_some());
        assert!(json.get("isCompleted").is_some());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["id"], item.id.to_string());
    }

    #[test]
    fn test_now_is_microsecond_precision() {
        assert_eq!(now_utc().nanosecond() % 1_000, 0);
    }
}

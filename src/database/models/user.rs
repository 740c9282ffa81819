use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Stored user row. Holds the password hash, so it is never serialized;
/// responses go through [`UserProfile`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user: everything except the credential
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            phone: user.phone,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Fields needed to create a user; `password` is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

impl NewUser {
    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            username: self.username,
            email: self.email,
            phone: self.phone,
            password: self.password,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Allow-listed partial update. The admin flag is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Already hashed
    pub password: Option<String>,
}

impl UserChanges {
    /// Apply the changes in place; returns whether any stored value changed
    pub fn apply(&self, user: &mut User, now: DateTime<Utc>) -> bool {
        let mut modified = false;
        modified |= replace_if_changed(&mut user.username, &self.username);
        modified |= replace_if_changed(&mut user.email, &self.email);
        modified |= replace_if_changed(&mut user.phone, &self.phone);
        modified |= replace_if_changed(&mut user.password, &self.password);
        if modified {
            user.updated_at = now;
        }
        modified
    }
}

fn replace_if_changed(slot: &mut String, value: &Option<String>) -> bool {
    match value {
        Some(v) if v != slot => {
            *slot = v.clone();
            true
        }
        _ => false,
    }
}

/// Result of an update, mirroring the matched/modified counts clients expect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateOutcome {
    pub fn unmatched() -> Self {
        Self { acknowledged: true, matched_count: 0, modified_count: 0 }
    }

    pub fn matched(modified: bool) -> Self {
        Self {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(modified),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        NewUser {
            username: "ada".into(),
            email: "ada@example.com".into(),
            phone: "5551234567".into(),
            password: "hash".into(),
        }
        .into_user(Utc::now())
    }

    #[test]
    fn new_users_are_never_admin() {
        assert!(!sample().is_admin);
    }

    #[test]
    fn apply_reports_only_real_changes() {
        let mut user = sample();
        let same = UserChanges { phone: Some("5551234567".into()), ..Default::default() };
        assert!(!same.apply(&mut user, Utc::now()));

        let changed = UserChanges { phone: Some("9999999999".into()), ..Default::default() };
        assert!(changed.apply(&mut user, Utc::now()));
        assert_eq!(user.phone, "9999999999");
        assert_eq!(user.username, "ada");
    }

    #[test]
    fn profile_hides_password() {
        let value = serde_json::to_value(UserProfile::from(sample())).unwrap();
        assert!(value.get("password").is_none());
        assert!(value.get("_id").is_some());
        assert_eq!(value["isAdmin"], false);
    }
}

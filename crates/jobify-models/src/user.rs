//! User accounts.

use serde::{Deserialize, Serialize};

use crate::job::DEFAULT_LOCATION;

/// Last name stored when registration omits one.
pub const DEFAULT_LAST_NAME: &str = "lastName";

/// Public view of a user, safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub last_name: String,
    pub location: String,
}

/// A user as stored, including the password hash.
///
/// Deliberately not `Serialize`: the hash must never reach a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// Fields required to create a user. The password is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub last_name: String,
    pub location: String,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        email: impl AsRef<str>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: normalize_email(email.as_ref()),
            password_hash: password_hash.into(),
            last_name: DEFAULT_LAST_NAME.to_string(),
            location: DEFAULT_LOCATION.to_string(),
        }
    }

    pub fn with_last_name(mut self, last_name: Option<String>) -> Self {
        if let Some(last_name) = last_name.filter(|s| !s.is_empty()) {
            self.last_name = last_name;
        }
        self
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        if let Some(location) = location.filter(|s| !s.is_empty()) {
            self.location = location;
        }
        self
    }
}

/// Replacement profile for an existing user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub last_name: String,
    pub location: String,
}

impl ProfileUpdate {
    pub fn apply_to(&self, user: &mut User) {
        user.name = self.name.clone();
        user.email = normalize_email(&self.email);
        user.last_name = self.last_name.clone();
        user.location = self.location.clone();
    }
}

/// Emails are compared case-insensitively and stored lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = NewUser::new("Ada", "  Ada@Example.COM ", "hash");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.last_name, DEFAULT_LAST_NAME);
        assert_eq!(user.location, DEFAULT_LOCATION);

        let user = user
            .with_last_name(Some("Lovelace".into()))
            .with_location(Some(String::new()));
        assert_eq!(user.last_name, "Lovelace");
        assert_eq!(user.location, DEFAULT_LOCATION);
    }

    #[test]
    fn test_user_serializes_without_password() {
        let user = User {
            id: "abc".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            last_name: "Lovelace".into(),
            location: "London".into(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["lastName"], "Lovelace");
        assert!(value.get("password").is_none());
        assert!(value.get("passwordHash").is_none());
    }
}

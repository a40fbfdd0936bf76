//! Request contracts for user management.

use serde::Deserialize;

use crate::auth::crypto;
use crate::models::Role;
use crate::validation::{flexible_bool, non_blank, ValidationErrors};

/// `POST /api/users` and the teacher create view
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub document: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Validated input of a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub document: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: Role,
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<NewUser, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let username = self.username.trim().to_string();
        let document = self.document.trim().to_string();
        let full_name = non_blank(self.full_name);

        errors.length("username", &username, 3, 50);
        errors.length("document", &document, 1, 20);
        errors.optional_length("full_name", full_name.as_deref(), 0, 100);
        if let Err(err) = crypto::validate_password(&self.password) {
            errors.add("password", password_reason(err));
        }

        let role = match non_blank(self.role) {
            None => {
                errors.add("role", "is required");
                None
            }
            Some(raw) => match raw.parse::<Role>() {
                Ok(role) => Some(role),
                Err(reason) => {
                    errors.add("role", reason);
                    None
                }
            },
        };

        match role {
            Some(role) if errors.is_empty() => Ok(NewUser {
                username,
                document,
                password: self.password,
                full_name,
                role,
            }),
            _ => Err(errors),
        }
    }
}

/// `PATCH /api/users/:id` and the teacher edit view; absent fields are kept
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_active: Option<bool>,
}

/// Validated partial update of a user
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub document: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    /// Whether the patch touches fields only an administrator may change
    pub fn changes_privileges(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<UserPatch, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let username = self.username.map(|v| v.trim().to_string());
        let document = self.document.map(|v| v.trim().to_string());
        // An empty password field on an edit form means "keep the current one"
        let password = self.password.filter(|p| !p.is_empty());
        let full_name = non_blank(self.full_name);

        errors.optional_length("username", username.as_deref(), 3, 50);
        errors.optional_length("document", document.as_deref(), 1, 20);
        errors.optional_length("full_name", full_name.as_deref(), 0, 100);
        if let Some(password) = &password {
            if let Err(err) = crypto::validate_password(password) {
                errors.add("password", password_reason(err));
            }
        }

        let role = match non_blank(self.role) {
            None => None,
            Some(raw) => match raw.parse::<Role>() {
                Ok(role) => Some(role),
                Err(reason) => {
                    errors.add("role", reason);
                    None
                }
            },
        };

        errors.into_result()?;

        Ok(UserPatch {
            username,
            document,
            password,
            full_name,
            role,
            is_active: self.is_active,
        })
    }
}

fn password_reason(err: crate::auth::AuthError) -> String {
    match err {
        crate::auth::AuthError::WeakPassword(reason) => reason,
        other => other.to_string(),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    #[serde(default)]
    pub role: Option<String>,
}

impl UserListQuery {
    pub fn validate(self) -> Result<Option<Role>, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let role = match non_blank(self.role) {
            None => None,
            Some(raw) => match raw.parse::<Role>() {
                Ok(role) => Some(role),
                Err(reason) => {
                    errors.add("role", reason);
                    None
                }
            },
        };
        errors.into_result()?;
        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateUserRequest {
        CreateUserRequest {
            username: "jperez".into(),
            document: "1001".into(),
            password: "secret1".into(),
            full_name: Some("Juan Pérez".into()),
            role: Some("student".into()),
        }
    }

    #[test]
    fn test_valid_create_request() {
        let user = valid_request().validate().unwrap();
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.full_name.as_deref(), Some("Juan Pérez"));
    }

    #[test]
    fn test_create_collects_every_failure() {
        let request = CreateUserRequest {
            username: "jp".into(),
            document: "".into(),
            password: "123".into(),
            full_name: None,
            role: Some("janitor".into()),
        };
        let errors = request.validate().unwrap_err();
        for field in ["username", "document", "password", "role"] {
            assert!(errors.has(field), "expected error on {}", field);
        }
    }

    #[test]
    fn test_create_requires_role() {
        let mut request = valid_request();
        request.role = None;
        assert!(request.validate().unwrap_err().has("role"));
    }

    #[test]
    fn test_update_ignores_empty_password() {
        let patch = UpdateUserRequest {
            password: Some(String::new()),
            full_name: Some("  ".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert!(patch.password.is_none());
        assert!(patch.full_name.is_none());
        assert!(!patch.changes_privileges());
    }

    #[test]
    fn test_update_role_is_privileged() {
        let patch = UpdateUserRequest {
            role: Some("ADMIN".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert!(patch.changes_privileges());
    }
}

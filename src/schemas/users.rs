use super::{Validate, changed_text, required, required_text};
use crate::types::{Role, ValidationErrors};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

pub const NAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 150;
pub const PASSWORD_MIN: usize = 8;

/// Registration payload.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Defaults to `patient`
    pub role: Option<Role>,
    /// Required when `role` is `patient`
    pub dob: Option<NaiveDate>,
}

/// A validated registration. `password` is still plaintext here.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub dob: Option<NaiveDate>,
}

impl Validate for CreateUserRequest {
    type Valid = NewUser;

    fn validate(self) -> Result<NewUser, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required_text(&mut errors, "name", self.name, NAME_MAX);
        let email = required_text(&mut errors, "email", self.email, EMAIL_MAX)
            .and_then(|email| check_email(&mut errors, email));
        let password = required(&mut errors, "password", self.password)
            .and_then(|password| check_password(&mut errors, password));
        let role = self.role.unwrap_or_default();

        check_dob(&mut errors, self.dob);
        if role == Role::Patient && self.dob.is_none() {
            errors.add("dob", "Date of birth is required for patients.");
        }

        match (name, email, password) {
            (Some(name), Some(email), Some(password)) if errors.is_empty() => Ok(NewUser {
                name,
                email,
                password,
                role,
                dob: self.dob,
            }),
            _ => Err(errors),
        }
    }
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub dob: Option<NaiveDate>,
    pub password: Option<String>,
}

/// Validated profile changes.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub dob: Option<NaiveDate>,
    /// New plaintext password
    pub password: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.dob.is_none() && self.password.is_none()
    }
}

impl Validate for UpdateUserRequest {
    type Valid = UserChanges;

    fn validate(self) -> Result<UserChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let changes = UserChanges {
            name: changed_text(&mut errors, "name", self.name, NAME_MAX),
            email: changed_text(&mut errors, "email", self.email, EMAIL_MAX)
                .and_then(|email| check_email(&mut errors, email)),
            dob: self.dob,
            password: self
                .password
                .and_then(|password| check_password(&mut errors, password)),
        };
        check_dob(&mut errors, self.dob);

        errors.into_result().map(|_| changes)
    }
}

/// Query string for `GET /users`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    /// Only return users with this role
    pub role: Option<Role>,
}

fn check_email(errors: &mut ValidationErrors, email: String) -> Option<String> {
    let email = email.to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
                && !domain.contains('@')
        }
        None => false,
    };

    if valid {
        Some(email)
    } else {
        errors.add("email", "Not a valid email address.");
        None
    }
}

fn check_password(errors: &mut ValidationErrors, password: String) -> Option<String> {
    if password.chars().count() < PASSWORD_MIN {
        errors.add(
            "password",
            format!("Must be at least {} characters.", PASSWORD_MIN),
        );
        None
    } else {
        Some(password)
    }
}

fn check_dob(errors: &mut ValidationErrors, dob: Option<NaiveDate>) {
    if let Some(dob) = dob
        && dob > Utc::now().date_naive()
    {
        errors.add("dob", "Date of birth cannot be in the future.");
    }
}

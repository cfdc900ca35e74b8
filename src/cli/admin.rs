//! `create-admin` command.
//!
//! Administrators cannot self-register over HTTP; this is the only way to
//! create one.

use crate::{
    auth::password::hash_password,
    db::{self, Database, users},
    models::User,
    schemas::{CreateUserRequest, Validate},
    types::{Result, Role},
};

/// Validate and store a new administrator account.
pub async fn create_admin(database: &Database, name: String, email: String, password: String) -> Result<User> {
    let new_user = CreateUserRequest {
        name: Some(name),
        email: Some(email),
        password: Some(password),
        role: Some(Role::Admin),
        dob: None,
    }
    .validate()?;

    let password_hash = hash_password(&new_user.password)?;

    let tx = database.begin().await?;
    let outcome = users::insert(&tx, &new_user, &password_hash).await;
    let user = db::finish(tx, outcome).await?;

    tracing::info!(user_id = user.id, "created administrator");
    Ok(user)
}

//! Login form ruleset

use validator::Validate;

use crate::models::LoginRequest;

#[derive(Debug, Clone, Validate)]
pub struct LoginForm {
    #[validate(length(min = 3, message = "The username must be at least 3 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "The password must be at least 6 characters"))]
    pub password: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl From<&LoginForm> for LoginRequest {
    fn from(form: &LoginForm) -> Self {
        Self {
            username: form.username.clone(),
            password: form.password.clone(),
        }
    }
}

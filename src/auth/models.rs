//! Authentication Models
//! Mission: Define user, token, and API data structures

use serde::{Deserialize, Serialize};

/// User account as stored in the credential store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub roles: Option<String>,
    pub created_at: String,
}

impl User {
    /// Split the free-text roles column into individual authority names.
    pub fn authorities(&self) -> Vec<String> {
        self.roles
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (username)
    pub iat: usize,  // issued-at timestamp
    pub exp: usize,  // expiration timestamp
}

/// Caller identity resolved by the auth gateway, carried in request extensions.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub username: String,
    pub authorities: Vec<String>,
}

impl AuthContext {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            authorities: user.authorities(),
        }
    }
}

/// Registration request body - POST /auth/addNewUser
///
/// All fields optional at the deserialization layer so that missing values
/// surface as validation messages instead of a bare 422.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub pass_word: Option<String>,
    pub roles: Option<String>,
}

/// Password special characters accepted by the complexity rule.
const PASSWORD_SPECIALS: &[char] = &['@', '#', '$', '%', '^', '&', '+', '='];

impl NewUser {
    /// Check every field constraint and collect human-readable violations.
    ///
    /// Empty result means the candidate is acceptable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        match self.user_name.as_deref().map(str::trim) {
            None | Some("") => errors.push("Username is required".to_string()),
            Some(name) if name.len() < 3 || name.len() > 20 => {
                errors.push("Username should be between 3 and 20 characters".to_string())
            }
            Some(_) => {}
        }

        if self
            .first_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .is_empty()
        {
            errors.push("First name is required".to_string());
        }

        if self
            .last_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .is_empty()
        {
            errors.push("Last name is required".to_string());
        }

        if let Some(email) = self.email.as_deref().map(str::trim) {
            if !email.is_empty() && !plausible_email(email) {
                errors.push("Email should be valid".to_string());
            }
        }

        match self.pass_word.as_deref() {
            None | Some("") => errors.push("Password is required".to_string()),
            Some(password) => {
                if password.len() < 8 {
                    errors.push("Password should be at least 8 characters long".to_string());
                }
                let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
                let has_digit = password.chars().any(|c| c.is_ascii_digit());
                let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(&c));
                if !(has_upper && has_digit && has_special) {
                    errors.push(
                        "Password should have at least one uppercase letter, one number, \
                         and one special character"
                            .to_string(),
                    );
                }
            }
        }

        errors
    }
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain.
fn plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.len() < 3 {
        return false;
    }
    if email.chars().any(char::is_whitespace) || domain.contains('@') {
        return false;
    }
    match domain.split_once('.') {
        Some((host, rest)) => !host.is_empty() && !rest.is_empty() && !rest.ends_with('.'),
        None => false,
    }
}

/// Registration outcome - mirrors the established API shape
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub status: String,
    pub user_id: Option<i64>,
}

/// Credential check request body - POST /auth/generateToken
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub user_name: String,
    pub pass_word: String,
}

/// User summary returned by listing and query endpoints (no password)
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub roles: Option<String>,
}

impl UserSummary {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            user_name: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
        }
    }
}

/// Optional equality/substring predicates - POST /auth/queryUsers
///
/// Unset predicates match all rows. `user_id` is an exact match; the string
/// fields are substring matches.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub user_name: Option<String>,
}

/// Pagination parameters (`?page=0&size=10`), page index is 0-based.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(0)
    }

    pub fn size(&self) -> u32 {
        self.size.unwrap_or(10).clamp(1, 100)
    }
}

/// One page of results with Spring-style bookkeeping fields
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, params: PageParams, total_elements: u64) -> Self {
        let size = params.size();
        let total_pages = ((total_elements + size as u64 - 1) / size as u64) as u32;
        Self {
            content,
            page: params.page(),
            size,
            total_elements,
            total_pages,
        }
    }
}

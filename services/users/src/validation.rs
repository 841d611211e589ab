//! Input validation utilities

use common::jwt::Role;
use regex::Regex;
use std::sync::OnceLock;

use crate::models::{RegisterRequest, UpdateProfileRequest};

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    let username = username.trim();

    if username.len() < 3 || username.len() > 30 {
        return Err("Username must be between 3 and 30 characters".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters, numbers and underscores".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();

    if email.is_empty() || email.len() > 254 {
        return Err("Please enter a valid email".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Please enter a valid email".to_string());
    }

    Ok(())
}

/// Trim and lower-case an email so lookups are case-insensitive
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err("Password must contain at least one letter".to_string());
    }

    Ok(())
}

/// Validate contact number
pub fn validate_contact(contact: &str) -> Result<(), String> {
    static CONTACT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = CONTACT_REGEX
        .get_or_init(|| Regex::new(r"^\+?[\d\s-]+$").expect("Failed to compile contact regex"));

    if !regex.is_match(contact.trim()) {
        return Err("Please enter a valid contact number".to_string());
    }

    Ok(())
}

/// Parse an optional role, defaulting to `BOOKING_USER`
pub fn parse_role(role: Option<&str>) -> Result<Role, String> {
    match role {
        None => Ok(Role::default()),
        Some(role) => role
            .parse()
            .map_err(|_| "Invalid role specified".to_string()),
    }
}

/// Validate a profile picture URL
pub fn validate_profile_picture(url: &str) -> Result<(), String> {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = URL_REGEX.get_or_init(|| {
        Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("Failed to compile URL regex")
    });

    if !regex.is_match(url) {
        return Err("Please provide a valid URL for the profile picture".to_string());
    }

    Ok(())
}

/// Validate a registration request, returning the parsed role
pub fn validate_registration(request: &RegisterRequest) -> Result<Role, String> {
    validate_username(&request.username)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;
    validate_contact(&request.contact)?;
    parse_role(request.role.as_deref())
}

/// Validate the optional fields of a profile update
pub fn validate_profile_update(request: &UpdateProfileRequest) -> Result<(), String> {
    if let Some(username) = &request.username {
        validate_username(username)?;
    }
    if let Some(contact) = &request.contact {
        validate_contact(contact)?;
    }
    if let Some(picture) = &request.profile_picture {
        validate_profile_picture(picture)?;
    }
    Ok(())
}

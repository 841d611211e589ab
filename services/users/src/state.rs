//! Application state shared across handlers

use common::jwt::JwtService;
use serde::Deserialize;

use crate::{rate_limiter::LoginLimiter, repositories::UserRepository};

/// Users service settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
}

impl Settings {
    pub const DEFAULTS: &'static [(&'static str, &'static str)] =
        &[("host", "0.0.0.0"), ("port", "5000")];
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub login_limiter: LoginLimiter,
}

//! Application state shared across handlers

use serde::Deserialize;
use std::sync::Arc;

use crate::{auth::Authenticator, service::BookingService};

/// Bookings service settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub venue_service_url: String,
    pub user_service_url: String,
}

impl Settings {
    pub const DEFAULTS: &'static [(&'static str, &'static str)] = &[
        ("host", "0.0.0.0"),
        ("port", "3003"),
        ("venue_service_url", "http://localhost:3001"),
        ("user_service_url", "http://localhost:5000"),
    ];
}

/// Application state shared across handlers
pub struct AppState<S, D> {
    pub service: Arc<BookingService<S, D>>,
    pub authenticator: Authenticator,
}

impl<S, D> Clone for AppState<S, D> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            authenticator: self.authenticator.clone(),
        }
    }
}

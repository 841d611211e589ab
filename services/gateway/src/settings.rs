//! Gateway settings

use serde::Deserialize;

/// Gateway settings, overridable through environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Built single-page frontend
    pub frontend_dir: String,
    /// Start the three backend services as child processes
    pub spawn_services: bool,
    pub users_port: u16,
    pub venues_port: u16,
    pub bookings_port: u16,
    pub users_bin: Option<String>,
    pub venues_bin: Option<String>,
    pub bookings_bin: Option<String>,
    /// Largest request body forwarded upstream
    pub max_body_bytes: usize,
}

impl Settings {
    pub const DEFAULTS: &'static [(&'static str, &'static str)] = &[
        ("host", "0.0.0.0"),
        ("port", "10000"),
        ("frontend_dir", "frontend/dist"),
        ("spawn_services", "true"),
        ("users_port", "5000"),
        ("venues_port", "3001"),
        ("bookings_port", "3003"),
        ("max_body_bytes", "16777216"),
    ];

    fn local(port: u16) -> String {
        format!("http://127.0.0.1:{port}")
    }

    pub fn users_url(&self) -> String {
        Self::local(self.users_port)
    }

    pub fn venues_url(&self) -> String {
        Self::local(self.venues_port)
    }

    pub fn bookings_url(&self) -> String {
        Self::local(self.bookings_port)
    }
}

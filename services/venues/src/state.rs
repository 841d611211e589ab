//! Application state shared across handlers

use serde::Deserialize;

use crate::{repositories::VenueRepository, uploads::ImageStore};

/// Venues service settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Directory holding uploaded venue images
    pub upload_dir: String,
    pub max_upload_bytes: usize,
}

impl Settings {
    pub const DEFAULTS: &'static [(&'static str, &'static str)] = &[
        ("host", "0.0.0.0"),
        ("port", "3001"),
        ("upload_dir", "uploads"),
        ("max_upload_bytes", "10485760"),
    ];
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub venue_repository: VenueRepository,
    pub image_store: ImageStore,
}

//! Venue lookups against the venues service

use reqwest::{Client, StatusCode, Url};
use std::future::Future;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::{OwnerVenues, RemoteVenue};

/// Venue lookup errors
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Invalid venue service URL: {0}")]
    InvalidUrl(String),

    #[error("Venue service returned {0}")]
    Status(StatusCode),

    #[error("Venue service request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Read access to venues owned by another service
pub trait VenueDirectory: Send + Sync {
    /// Venue by id; `None` when the venues service answers 404
    fn fetch_venue(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<RemoteVenue>, DirectoryError>> + Send;

    /// Venues whose owner contact equals `contact`
    fn venues_by_owner(
        &self,
        contact: &str,
    ) -> impl Future<Output = Result<Vec<RemoteVenue>, DirectoryError>> + Send;
}

/// HTTP client for the venues service
#[derive(Clone)]
pub struct HttpVenueDirectory {
    client: Client,
    base_url: Url,
}

impl HttpVenueDirectory {
    pub fn new(client: Client, base_url: &str) -> Result<Self, DirectoryError> {
        let base_url =
            Url::parse(base_url).map_err(|e| DirectoryError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(DirectoryError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    /// Base URL with percent-encoded path segments appended
    fn endpoint(&self, segments: &[&str]) -> Result<Url, DirectoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DirectoryError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl VenueDirectory for HttpVenueDirectory {
    fn fetch_venue(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<RemoteVenue>, DirectoryError>> + Send {
        let client = self.client.clone();
        let url = self.endpoint(&["api", "venues", &id.to_string()]);

        async move {
            let url = url?;
            debug!("Fetching venue from {}", url);

            let response = client.get(url).send().await?;
            match response.status() {
                StatusCode::NOT_FOUND => Ok(None),
                status if status.is_success() => Ok(Some(response.json().await?)),
                status => Err(DirectoryError::Status(status)),
            }
        }
    }

    fn venues_by_owner(
        &self,
        contact: &str,
    ) -> impl Future<Output = Result<Vec<RemoteVenue>, DirectoryError>> + Send {
        let client = self.client.clone();
        let url = self.endpoint(&["api", "venues", "owner", contact]);

        async move {
            let url = url?;
            debug!("Fetching owner venues from {}", url);

            let response = client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(DirectoryError::Status(status));
            }

            let listing: OwnerVenues = response.json().await?;
            Ok(listing.venues)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_contact() {
        let directory = HttpVenueDirectory::new(Client::new(), "http://localhost:3001").unwrap();

        let url = directory
            .endpoint(&["api", "venues", "owner", "+91 98765/43210"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3001/api/venues/owner/+91%2098765%2F43210"
        );
    }

    #[test]
    fn test_endpoint_with_trailing_slash() {
        let directory = HttpVenueDirectory::new(Client::new(), "http://venues:3001/").unwrap();

        let id = Uuid::nil();
        let url = directory.endpoint(&["api", "venues", &id.to_string()]).unwrap();
        assert_eq!(
            url.as_str(),
            format!("http://venues:3001/api/venues/{id}")
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(HttpVenueDirectory::new(Client::new(), "not a url").is_err());
        assert!(HttpVenueDirectory::new(Client::new(), "mailto:owner@example.com").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let directory = HttpVenueDirectory::new(Client::new(), "http://127.0.0.1:1").unwrap();
        assert!(directory.fetch_venue(Uuid::new_v4()).await.is_err());
    }
}

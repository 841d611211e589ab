//! Bearer token authentication
//!
//! The users service is asked first so the caller's contact is known. When
//! it cannot answer, the token is checked locally with the shared secret.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::{error::ApiError, jwt::JwtService};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{AuthUser, RemoteProfile};

/// Timeout of the profile lookup against the users service
pub const PROFILE_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves bearer tokens into callers
#[derive(Clone)]
pub struct Authenticator {
    client: Client,
    profile_url: Url,
    jwt_service: JwtService,
}

impl Authenticator {
    pub fn new(client: Client, user_service_url: &str, jwt_service: JwtService) -> anyhow::Result<Self> {
        let mut profile_url = Url::parse(user_service_url)?;
        profile_url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("User service URL cannot be a base: {}", user_service_url))?
            .pop_if_empty()
            .extend(["api", "auth", "profile"]);
        Ok(Self {
            client,
            profile_url,
            jwt_service,
        })
    }

    async fn remote_profile(&self, token: &str) -> Result<AuthUser, reqwest::Error> {
        let profile: RemoteProfile = self
            .client
            .get(self.profile_url.clone())
            .bearer_auth(token)
            .timeout(PROFILE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(profile.into())
    }

    /// Caller behind a token, or `None` when neither check accepts it
    pub async fn authenticate(&self, token: &str) -> Option<AuthUser> {
        match self.remote_profile(token).await {
            Ok(user) => {
                debug!("Users service vouched for {}", user.id);
                Some(user)
            }
            Err(e) => {
                warn!(
                    "User service unavailable, falling back to local verification: {}",
                    e
                );
                let claims = self.jwt_service.validate(token).ok()?;
                Some(AuthUser {
                    id: claims.sub,
                    username: None,
                    email: None,
                    contact: None,
                    role: claims.role,
                })
            }
        }
    }
}

/// Require a bearer token and attach the [`AuthUser`]
pub async fn auth_middleware(
    State(authenticator): State<Authenticator>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(ApiError::Unauthorized(
            "Access denied. No token provided.".to_string(),
        ));
    };

    let user = authenticator
        .authenticate(bearer.token())
        .await
        .ok_or_else(|| ApiError::Unauthorized("Invalid token.".to_string()))?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

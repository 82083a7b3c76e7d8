//! Authentication against the OSCAR cluster
//!
//! OSCAR accepts either HTTP basic credentials or an OIDC bearer token.
//! EGI deployments hand out long-lived refresh tokens, which are exchanged
//! here for a short-lived access token before the first API call.

use dtflood_core::domain::credentials::Credentials;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info};

use crate::error::{ClientError, Result};

/// EGI Check-in token endpoint
pub const DEFAULT_TOKEN_URL: &str =
    "https://aai-demo.egi.eu/auth/realms/egi/protocol/openid-connect/token";

const TOKEN_CLIENT_ID: &str = "token-portal";

const TOKEN_SCOPE: &str = "openid email profile voperson_id voperson_external_affiliation entitlements eduperson_entitlement";

/// Credentials attached to outgoing OSCAR requests
#[derive(Clone, Default)]
pub enum Auth {
    #[default]
    None,
    Basic {
        user: String,
        password: String,
    },
    Bearer(String),
}

impl Auth {
    pub fn basic(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// Adds the matching `Authorization` header to a request
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::None => request,
            Auth::Basic { user, password } => request.basic_auth(user, Some(password)),
            Auth::Bearer(token) => request.bearer_auth(token),
        }
    }

    /// Turns user-supplied credentials into request credentials
    ///
    /// A refresh token costs one round trip to `token_url`.
    pub async fn from_credentials(
        client: &Client,
        credentials: &Credentials,
        token_url: &str,
    ) -> Result<Self> {
        info!("Using {} credentials", credentials.kind());

        match credentials {
            Credentials::Basic { user, password } => Ok(Auth::basic(user, password)),
            Credentials::Token(token) => Ok(Auth::bearer(token)),
            Credentials::RefreshToken(refresh) => {
                let token = exchange_refresh_token(client, token_url, refresh).await?;
                Ok(Auth::Bearer(token))
            }
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::None => f.write_str("None"),
            Auth::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("password", &"***")
                .finish(),
            Auth::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Exchanges an OIDC refresh token for an access token
pub async fn exchange_refresh_token(
    client: &Client,
    token_url: &str,
    refresh_token: &str,
) -> Result<String> {
    info!("Fetching access token using refresh token");

    let params = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", TOKEN_CLIENT_ID),
        ("scope", TOKEN_SCOPE),
    ];

    let response = client.post(token_url).form(&params).send().await?;
    let status = response.status();
    debug!("Token endpoint answered {}", status);

    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Invalid token response: {}", e)))?;

    match body.access_token {
        Some(token) if status.is_success() && !token.is_empty() => Ok(token),
        _ => Err(ClientError::Unauthorized(
            body.error_description
                .unwrap_or_else(|| format!("token endpoint returned {}", status)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_exchange_refresh_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "r-123".into()),
                Matcher::UrlEncoded("client_id".into(), "token-portal".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token": "a-456", "token_type": "Bearer"}"#)
            .create_async()
            .await;

        let url = format!("{}/token", server.url());
        let token = exchange_refresh_token(&Client::new(), &url, "r-123")
            .await
            .unwrap();

        assert_eq!(token, "a-456");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exchange_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error": "invalid_grant", "error_description": "Token is not active"}"#)
            .create_async()
            .await;

        let url = format!("{}/token", server.url());
        let err = exchange_refresh_token(&Client::new(), &url, "stale")
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("Token is not active"));
    }

    #[tokio::test]
    async fn test_from_credentials_without_exchange() {
        let client = Client::new();
        let auth = Auth::from_credentials(&client, &Credentials::Token("t".into()), "http://unused")
            .await
            .unwrap();
        assert!(matches!(auth, Auth::Bearer(ref t) if t == "t"));

        let creds = Credentials::Basic {
            user: "u".into(),
            password: "p".into(),
        };
        let auth = Auth::from_credentials(&client, &creds, "http://unused")
            .await
            .unwrap();
        assert!(matches!(auth, Auth::Basic { .. }));
    }

    #[test]
    fn test_debug_redacts() {
        let printed = format!("{:?}", Auth::bearer("secret-token"));
        assert!(!printed.contains("secret-token"));
    }
}

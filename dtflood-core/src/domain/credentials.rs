//! Credentials for the remote execution service

use std::fmt;

/// Ways a caller can authenticate against the OSCAR cluster
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// HTTP basic authentication
    Basic { user: String, password: String },
    /// OIDC access token, sent as a bearer token
    Token(String),
    /// OIDC refresh token, exchanged for an access token before use
    RefreshToken(String),
}

impl Credentials {
    /// Picks credentials from optional CLI inputs
    ///
    /// Precedence follows the order user/password, token, refresh token.
    /// Returns `None` when nothing usable was supplied.
    pub fn from_parts(
        user: Option<String>,
        password: Option<String>,
        token: Option<String>,
        refresh_token: Option<String>,
    ) -> Option<Self> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());

        if let (Some(user), Some(password)) = (non_empty(user), non_empty(password)) {
            return Some(Self::Basic { user, password });
        }

        if let Some(token) = non_empty(token) {
            return Some(Self::Token(token));
        }

        non_empty(refresh_token).map(Self::RefreshToken)
    }

    /// Short label for logging which credential kind is in use
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::Basic { .. } => "user/password",
            Credentials::Token(_) => "token",
            Credentials::RefreshToken(_) => "refresh token",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("password", &"***")
                .finish(),
            Credentials::Token(_) => f.write_str("Token(***)"),
            Credentials::RefreshToken(_) => f.write_str("RefreshToken(***)"),
        }
    }
}

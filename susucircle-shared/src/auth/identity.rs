/// Identity Provider adapters
///
/// SusuCircle does not store or verify credentials. Authentication is
/// delegated to an external Identity Provider which, given an opaque
/// bearer credential, yields a stable external handle plus basic profile
/// claims. This module defines that contract as an injected capability:
/// components receive an `Arc<dyn IdentityProvider>`, never a process-wide
/// client singleton.
///
/// # Providers
///
/// - [`JwtIdentityProvider`]: validates a provider-signed JWT locally
///   (HS256 shared secret) and reads the claims
/// - [`RemoteIdentityProvider`]: forwards the credential to the provider's
///   userinfo endpoint over HTTPS
/// - [`StaticIdentityProvider`]: in-memory token table for tests
///
/// # Failure semantics
///
/// A bad credential is `IdentityError::InvalidCredential`. A provider
/// outage is logged and surfaced as `IdentityError::Unavailable`; it must
/// never crash the calling operation.
///
/// # Example
///
/// ```no_run
/// use susucircle_shared::auth::identity::{IdentityProvider, JwtIdentityProvider};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = JwtIdentityProvider::new("shared-secret", Some("https://id.example.com"));
/// let identity = provider.resolve("eyJhbGciOi...").await?;
/// println!("external handle: {}", identity.external_id);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// The identity a provider resolves a credential to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalIdentity {
    /// The provider's stable handle for the account
    pub external_id: String,

    /// Email address asserted by the provider
    pub email: String,

    /// Display name, if the provider has one
    pub full_name: Option<String>,

    /// Phone number, if the provider has one
    pub phone: Option<String>,
}

/// Error type for identity resolution
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The credential is malformed, expired, or rejected by the provider
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// The provider could not be reached or answered abnormally
    ///
    /// Callers surface this as an explicit authentication-unavailable
    /// condition rather than a generic failure.
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Resolves an opaque bearer credential to a stable external identity
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider name, for logs
    fn name(&self) -> &str;

    /// Resolves the credential or explains why it cannot be
    async fn resolve(&self, credential: &str) -> Result<ExternalIdentity, IdentityError>;
}

/// Claims a provider-issued JWT is expected to carry
#[derive(Debug, Deserialize)]
struct ProviderClaims {
    /// Subject: the provider's stable account handle
    sub: String,

    /// Email claim
    email: String,

    /// Optional display-name claim
    name: Option<String>,

    /// Optional phone claim
    phone: Option<String>,
}

/// Identity provider that validates provider-signed JWTs locally
///
/// Suitable when the provider shares an HS256 secret (the hosted-auth
/// pattern: the provider issues the token, this service only verifies and
/// reads it).
pub struct JwtIdentityProvider {
    secret: String,
    issuer: Option<String>,
}

impl JwtIdentityProvider {
    /// Creates a JWT-validating provider
    ///
    /// When `issuer` is set, tokens from any other issuer are rejected.
    pub fn new(secret: impl Into<String>, issuer: Option<impl Into<String>>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.map(Into::into),
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    fn name(&self) -> &str {
        "jwt"
    }

    async fn resolve(&self, credential: &str) -> Result<ExternalIdentity, IdentityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
        }

        let token_data = decode::<ProviderClaims>(
            credential,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|err| IdentityError::InvalidCredential(err.to_string()))?;

        let claims = token_data.claims;
        Ok(ExternalIdentity {
            external_id: claims.sub,
            email: claims.email,
            full_name: claims.name,
            phone: claims.phone,
        })
    }
}

/// Userinfo response shape
///
/// Field names follow the OpenID Connect userinfo response; `id` is
/// accepted as an alias for providers that use it instead of `sub`.
#[derive(Debug, Deserialize)]
struct UserinfoResponse {
    #[serde(alias = "id")]
    sub: String,
    email: String,
    #[serde(alias = "full_name")]
    name: Option<String>,
    #[serde(alias = "phone_number")]
    phone: Option<String>,
}

/// Identity provider that asks the remote userinfo endpoint
///
/// Every resolution is a network round-trip; transport failures degrade to
/// [`IdentityError::Unavailable`].
pub struct RemoteIdentityProvider {
    client: reqwest::Client,
    userinfo_url: String,
}

impl RemoteIdentityProvider {
    /// Creates a remote provider against the given userinfo endpoint
    pub fn new(userinfo_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            userinfo_url: userinfo_url.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    fn name(&self) -> &str {
        "remote"
    }

    async fn resolve(&self, credential: &str) -> Result<ExternalIdentity, IdentityError> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|err| {
                warn!(provider = self.name(), error = %err, "Identity provider unreachable");
                IdentityError::Unavailable(err.to_string())
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(IdentityError::InvalidCredential(format!(
                "provider rejected credential ({})",
                status
            )));
        }
        if !status.is_success() {
            warn!(provider = self.name(), %status, "Identity provider returned abnormal status");
            return Err(IdentityError::Unavailable(format!(
                "unexpected status {}",
                status
            )));
        }

        let userinfo: UserinfoResponse = response.json().await.map_err(|err| {
            warn!(provider = self.name(), error = %err, "Malformed userinfo response");
            IdentityError::Unavailable(err.to_string())
        })?;

        Ok(ExternalIdentity {
            external_id: userinfo.sub,
            email: userinfo.email,
            full_name: userinfo.name,
            phone: userinfo.phone,
        })
    }
}

/// In-memory provider mapping fixed tokens to identities
///
/// Used by tests and local development; resolution never touches the
/// network.
#[derive(Default)]
pub struct StaticIdentityProvider {
    identities: HashMap<String, ExternalIdentity>,
}

impl StaticIdentityProvider {
    /// Creates an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token → identity mapping
    pub fn insert(mut self, token: impl Into<String>, identity: ExternalIdentity) -> Self {
        self.identities.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn resolve(&self, credential: &str) -> Result<ExternalIdentity, IdentityError> {
        self.identities
            .get(credential)
            .cloned()
            .ok_or_else(|| IdentityError::InvalidCredential("unknown token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(handle: &str) -> ExternalIdentity {
        ExternalIdentity {
            external_id: handle.to_string(),
            email: format!("{handle}@example.com"),
            full_name: Some("Test User".to_string()),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_static_provider_resolves_known_token() {
        let provider = StaticIdentityProvider::new().insert("token-1", identity("idp|1"));

        let resolved = provider.resolve("token-1").await.unwrap();
        assert_eq!(resolved.external_id, "idp|1");
        assert_eq!(resolved.email, "idp|1@example.com");
    }

    #[tokio::test]
    async fn test_static_provider_rejects_unknown_token() {
        let provider = StaticIdentityProvider::new();

        let err = provider.resolve("nope").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_jwt_provider_rejects_garbage() {
        let provider = JwtIdentityProvider::new("secret", None::<String>);

        let err = provider.resolve("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_jwt_provider_round_trip() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        #[derive(Serialize)]
        struct TestClaims {
            sub: String,
            email: String,
            name: Option<String>,
            phone: Option<String>,
            iss: String,
            exp: i64,
        }

        let claims = TestClaims {
            sub: "idp|42".to_string(),
            email: "abena@example.com".to_string(),
            name: Some("Abena Osei".to_string()),
            phone: Some("+233244000000".to_string()),
            iss: "https://id.example.com".to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let provider = JwtIdentityProvider::new("secret", Some("https://id.example.com"));
        let resolved = provider.resolve(&token).await.unwrap();

        assert_eq!(resolved.external_id, "idp|42");
        assert_eq!(resolved.full_name.as_deref(), Some("Abena Osei"));

        // wrong issuer must not resolve
        let strict = JwtIdentityProvider::new("secret", Some("https://other.example.com"));
        assert!(strict.resolve(&token).await.is_err());
    }
}

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    config::AppConfig,
    error::AuthError,
    models::{Credential, Identity},
};

// 1. IdentityProvider Contract
/// IdentityProvider
///
/// Abstract contract for the external identity service. The Session Store only talks to
/// this trait, which lets tests swap the Supabase client for `MockIdentityProvider`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Runs the interactive sign-in and yields a credential, or a classified failure.
    async fn sign_in_interactive(&self) -> Result<Credential, AuthError>;

    /// Ends the session at the provider. `token` is the current bearer token, if any.
    async fn sign_out_remote(&self, token: Option<&str>) -> Result<(), AuthError>;

    /// Resolves a credential that already exists (e.g. a persisted token) without
    /// user interaction. `Ok(None)` means nobody is signed in.
    async fn current_credential(&self) -> Result<Option<Credential>, AuthError>;
}

/// IdentityState
///
/// The shared handle type for the provider.
pub type IdentityState = Arc<dyn IdentityProvider>;

// 2. The Real Implementation (Supabase Auth)
/// PasswordLogin
///
/// Email/password pair collected by the interactive prompt.
#[derive(Clone)]
pub struct PasswordLogin {
    pub email: String,
    pub password: String,
}

/// SupabaseIdentityProvider
///
/// Identity provider backed by the Supabase Auth REST API (`/auth/v1`).
#[derive(Clone)]
pub struct SupabaseIdentityProvider {
    client: reqwest::Client,
    auth_url: String,
    api_key: String,
    login: Option<PasswordLogin>,
    stored_token: Option<String>,
}

#[derive(Deserialize)]
struct SupabaseTokenResponse {
    access_token: String,
    user: SupabaseUser,
}

#[derive(Deserialize)]
struct SupabaseUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: SupabaseUserMetadata,
}

#[derive(Deserialize, Default)]
struct SupabaseUserMetadata {
    full_name: Option<String>,
    name: Option<String>,
}

impl SupabaseUser {
    /// Prefers the provider profile name, then the local part of the email, then the uid.
    fn into_identity(self) -> Identity {
        let display_name = self
            .user_metadata
            .full_name
            .or(self.user_metadata.name)
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| self.id.clone());

        Identity { display_name, uid: self.id }
    }
}

impl SupabaseIdentityProvider {
    /// Builds the HTTP client. Fails if the client cannot be set up with the configured
    /// timeout.
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            auth_url: config.auth_url.trim_end_matches('/').to_string(),
            api_key: config.auth_api_key.clone(),
            login: None,
            stored_token: None,
        })
    }

    /// Supplies the email/password pair used by `sign_in_interactive`.
    pub fn with_password(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.login = Some(PasswordLogin { email: email.into(), password: password.into() });
        self
    }

    /// Supplies a previously issued access token used by `current_credential`.
    pub fn with_stored_token(mut self, token: impl Into<String>) -> Self {
        self.stored_token = Some(token.into());
        self
    }
}

fn transport_error(e: reqwest::Error) -> AuthError {
    AuthError::NetworkFailure(e.to_string())
}

#[async_trait]
impl IdentityProvider for SupabaseIdentityProvider {
    async fn sign_in_interactive(&self) -> Result<Credential, AuthError> {
        // Without a collected login there is nothing to submit: treat it as a dismissed prompt.
        let login = self.login.as_ref().ok_or(AuthError::PopupClosed)?;

        let url = format!("{}/auth/v1/token?grant_type=password", self.auth_url);
        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": login.email, "password": login.password }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "identity provider refused sign-in");
            return Err(AuthError::ProviderRejected(format!("{}: {}", status, body)));
        }

        let token_response = response
            .json::<SupabaseTokenResponse>()
            .await
            .map_err(|e| AuthError::ProviderRejected(e.to_string()))?;

        Ok(Credential {
            token: token_response.access_token,
            identity: token_response.user.into_identity(),
        })
    }

    async fn sign_out_remote(&self, token: Option<&str>) -> Result<(), AuthError> {
        let Some(token) = token else {
            return Ok(());
        };

        let response = self
            .client
            .post(format!("{}/auth/v1/logout", self.auth_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AuthError::ProviderRejected(response.status().to_string()))
        }
    }

    async fn current_credential(&self) -> Result<Option<Credential>, AuthError> {
        let Some(token) = self.stored_token.as_deref() else {
            return Ok(None);
        };

        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.auth_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        // An expired or revoked token simply means "not signed in".
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AuthError::ProviderRejected(response.status().to_string()));
        }

        let user = response
            .json::<SupabaseUser>()
            .await
            .map_err(|e| AuthError::ProviderRejected(e.to_string()))?;

        Ok(Some(Credential { token: token.to_string(), identity: user.into_identity() }))
    }
}

// 3. The Mock Implementation (For Tests)
/// MockIdentityProvider
///
/// Scripted provider for unit and integration tests. Every call is counted so tests can
/// assert how often the provider was contacted.
#[derive(Default)]
pub struct MockIdentityProvider {
    /// Returned by `sign_in_interactive` and, when `restorable`, by `current_credential`.
    pub credential: Option<Credential>,
    /// When set, `sign_in_interactive` fails with this error.
    pub sign_in_error: Option<AuthError>,
    /// When set, `sign_out_remote` fails with this error.
    pub sign_out_error: Option<AuthError>,
    pub restorable: bool,
    pub sign_in_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
}

impl MockIdentityProvider {
    pub fn signing_in_as(token: &str, display_name: &str) -> Self {
        Self {
            credential: Some(Credential {
                token: token.to_string(),
                identity: Identity {
                    display_name: display_name.to_string(),
                    uid: format!("uid-{}", display_name),
                },
            }),
            ..Self::default()
        }
    }

    pub fn failing(error: AuthError) -> Self {
        Self { sign_in_error: Some(error), ..Self::default() }
    }

    /// Makes the scripted credential available to `current_credential` too.
    pub fn restorable(mut self) -> Self {
        self.restorable = true;
        self
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_in_interactive(&self) -> Result<Credential, AuthError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.sign_in_error {
            return Err(err.clone());
        }
        self.credential.clone().ok_or(AuthError::PopupClosed)
    }

    async fn sign_out_remote(&self, _token: Option<&str>) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        match &self.sign_out_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn current_credential(&self) -> Result<Option<Credential>, AuthError> {
        if self.restorable {
            Ok(self.credential.clone())
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_profile_name_then_email() {
        let user: SupabaseUser = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "email": "hanako@example.com",
            "user_metadata": { "full_name": "Hanako" }
        }))
        .unwrap();
        assert_eq!(user.into_identity().display_name, "Hanako");

        let user: SupabaseUser = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "email": "hanako@example.com"
        }))
        .unwrap();
        assert_eq!(user.into_identity().display_name, "hanako");

        let user: SupabaseUser =
            serde_json::from_value(serde_json::json!({ "id": "abc" })).unwrap();
        assert_eq!(user.into_identity().display_name, "abc");
    }

    #[tokio::test]
    async fn supabase_without_login_behaves_like_closed_popup() {
        let provider = SupabaseIdentityProvider::new(&AppConfig::default()).unwrap();
        assert_eq!(provider.sign_in_interactive().await, Err(AuthError::PopupClosed));
        assert_eq!(provider.current_credential().await, Ok(None));
        assert_eq!(provider.sign_out_remote(None).await, Ok(()));
    }
}

//! The managed identity credential.

use std::path::PathBuf;

use chrono::Utc;
use reqwest::header::WWW_AUTHENTICATE;
use reqwest::StatusCode;

use crate::arc;
use crate::config::CredentialOptions;
use crate::env::EnvSnapshot;
use crate::error::{truncate_str, CredentialError, Result, MAX_ERROR_BODY_CHARS};
use crate::identity::ManagedIdentityId;
use crate::request::{build_token_request, TokenRequest};
use crate::response::{parse_token_response, AccessToken};
use crate::source::{select_source, IdentitySource, SelectedSource};

/// A credential that acquires Azure Active Directory access tokens through
/// the managed identity endpoint of the current hosting environment.
///
/// The identity source is detected once, at construction, from environment
/// variables. Token acquisition then always goes through that source.
///
/// ```no_run
/// # async fn demo() -> rs_azure_msi::Result<()> {
/// use rs_azure_msi::ManagedIdentityCredential;
///
/// let credential = ManagedIdentityCredential::new()?;
/// let token = credential
///     .get_token(&["https://management.azure.com/.default"])
///     .await?;
/// println!("expires at {}", token.expires_on);
/// # Ok(())
/// # }
/// ```
pub struct ManagedIdentityCredential {
    http: reqwest::Client,
    selected: SelectedSource,
    identity: ManagedIdentityId,
    arc_key_directory: PathBuf,
}

impl ManagedIdentityCredential {
    /// Creates a credential for the system-assigned identity, detecting the
    /// source from the process environment.
    pub fn new() -> Result<Self> {
        Self::with_options(CredentialOptions::default())
    }

    /// Creates a credential with explicit options, detecting the source from
    /// the process environment.
    pub fn with_options(options: CredentialOptions) -> Result<Self> {
        Self::with_env_snapshot(&EnvSnapshot::from_process(), options)
    }

    /// Creates a credential against an explicit environment snapshot. This
    /// is the seam tests use to exercise source detection without mutating
    /// process-global state.
    pub fn with_env_snapshot(
        snapshot: &EnvSnapshot,
        options: CredentialOptions,
    ) -> Result<Self> {
        let selected = select_source(snapshot, &options.identity, options.diagnostics.as_ref())?;
        let arc_key_directory = options
            .arc_key_directory
            .clone()
            .unwrap_or_else(|| arc::default_key_directory(&snapshot.program_data));

        let mut builder = reqwest::Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .pool_idle_timeout(options.pool_idle_timeout)
            .pool_max_idle_per_host(options.pool_max_idle_per_host);
        if let Some(keepalive) = options.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }
        let http = builder
            .build()
            .map_err(|e| CredentialError::Configuration(e.to_string()))?;

        Ok(Self {
            http,
            selected,
            identity: options.identity,
            arc_key_directory,
        })
    }

    /// The identity source this credential was created with.
    pub fn source(&self) -> IdentitySource {
        self.selected.source
    }

    /// Stable name of this credential type, for diagnostics.
    pub fn credential_name(&self) -> &'static str {
        "ManagedIdentityCredential"
    }

    /// Acquires an access token for the given scopes.
    ///
    /// Only the first scope is used; a trailing `/.default` suffix is
    /// stripped to form the managed identity resource.
    pub async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        let request = build_token_request(&self.selected, &self.identity, scopes);
        match self.selected.source {
            IdentitySource::AzureArc => self.get_token_arc(request).await,
            _ => self.execute(request, None).await,
        }
    }

    /// Azure Arc's two-leg exchange: an unauthenticated probe must come back
    /// 401 with a challenge naming a local key file, whose contents then
    /// authorize the real request. The key rotates, so nothing is cached
    /// between calls.
    async fn get_token_arc(&self, request: TokenRequest) -> Result<AccessToken> {
        let probe = self.send(&request, None).await?;
        if probe.status() != StatusCode::UNAUTHORIZED {
            return Err(CredentialError::Challenge(format!(
                "expected a 401 challenge from the Azure Arc endpoint, got {}",
                probe.status().as_u16()
            )));
        }
        let challenge = probe
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok());
        let key_path = arc::parse_challenge(challenge)?;
        let secret = arc::read_key_file(&key_path, &self.arc_key_directory)?;
        self.execute(request, Some(format!("Basic {secret}"))).await
    }

    async fn execute(
        &self,
        request: TokenRequest,
        authorization: Option<String>,
    ) -> Result<AccessToken> {
        let response = self.send(&request, authorization).await?;
        let status = response.status();
        let body = response.text().await?;
        let received_at = Utc::now();
        if !status.is_success() {
            return Err(CredentialError::Http {
                status: status.as_u16(),
                body: truncate_str(&body, MAX_ERROR_BODY_CHARS).to_owned(),
            });
        }
        parse_token_response(&body, received_at)
    }

    async fn send(
        &self,
        request: &TokenRequest,
        authorization: Option<String>,
    ) -> Result<reqwest::Response> {
        let mut builder = self.http.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(authorization) = authorization {
            builder = builder.header("Authorization", authorization);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }
        Ok(builder.send().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use std::sync::Arc as StdArc;

    #[test]
    fn construction_freezes_the_source() {
        let snapshot = EnvSnapshot::from_pairs([
            ("IDENTITY_ENDPOINT", "https://visualstudio.com/"),
            ("IDENTITY_HEADER", "CLIENTSECRET2"),
        ]);
        let credential =
            ManagedIdentityCredential::with_env_snapshot(&snapshot, CredentialOptions::new())
                .unwrap();
        assert_eq!(credential.source(), IdentitySource::AppServiceV2019);
        assert_eq!(credential.credential_name(), "ManagedIdentityCredential");
    }

    #[test]
    fn construction_fails_on_invalid_endpoint() {
        let snapshot = EnvSnapshot::from_pairs([
            ("IDENTITY_ENDPOINT", "https://visualstudio.com:INVALID/"),
            ("IDENTITY_HEADER", "CLIENTSECRET2"),
        ]);
        let sink = StdArc::new(MemorySink::new());
        let options = CredentialOptions::new().with_diagnostics(sink.clone());
        let result = ManagedIdentityCredential::with_env_snapshot(&snapshot, options);
        assert!(matches!(result, Err(CredentialError::Configuration(_))));
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn construction_fails_for_user_assigned_cloud_shell() {
        let snapshot = EnvSnapshot::from_pairs([("MSI_ENDPOINT", "https://microsoft.com/")]);
        let options = CredentialOptions::new()
            .with_identity(ManagedIdentityId::from_client_id("abc").unwrap());
        let result = ManagedIdentityCredential::with_env_snapshot(&snapshot, options);
        assert!(matches!(result, Err(CredentialError::SourceMismatch(_))));
    }
}

//! Blocking variant of the credential, gated behind the `blocking` feature.
//!
//! Same source detection, request layouts, and Azure Arc exchange as the
//! async credential, driven by `reqwest::blocking`.

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

/// Blocking counterpart of [`crate::ManagedIdentityCredential`].
pub struct ManagedIdentityCredential {
    http: reqwest::blocking::Client,
    selected: SelectedSource,
    identity: ManagedIdentityId,
    arc_key_directory: PathBuf,
}

impl ManagedIdentityCredential {
    pub fn new() -> Result<Self> {
        Self::with_options(CredentialOptions::default())
    }

    pub fn with_options(options: CredentialOptions) -> Result<Self> {
        Self::with_env_snapshot(&EnvSnapshot::from_process(), options)
    }

    pub fn with_env_snapshot(
        snapshot: &EnvSnapshot,
        options: CredentialOptions,
    ) -> Result<Self> {
        let selected = select_source(snapshot, &options.identity, options.diagnostics.as_ref())?;
        let arc_key_directory = options
            .arc_key_directory
            .clone()
            .unwrap_or_else(|| arc::default_key_directory(&snapshot.program_data));

        let mut builder = reqwest::blocking::Client::builder()
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

    pub fn source(&self) -> IdentitySource {
        self.selected.source
    }

    /// Acquires an access token for the given scopes.
    pub fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        let request = build_token_request(&self.selected, &self.identity, scopes);
        match self.selected.source {
            IdentitySource::AzureArc => self.get_token_arc(request),
            _ => self.execute(request, None),
        }
    }

    fn get_token_arc(&self, request: TokenRequest) -> Result<AccessToken> {
        let probe = self.send(&request, None)?;
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
        self.execute(request, Some(format!("Basic {secret}")))
    }

    fn execute(
        &self,
        request: TokenRequest,
        authorization: Option<String>,
    ) -> Result<AccessToken> {
        let response = self.send(&request, authorization)?;
        let status = response.status();
        let body = response.text()?;
        let received_at = Utc::now();
        if !status.is_success() {
            return Err(CredentialError::Http {
                status: status.as_u16(),
                body: truncate_str(&body, MAX_ERROR_BODY_CHARS).to_owned(),
            });
        }
        parse_token_response(&body, received_at)
    }

    fn send(
        &self,
        request: &TokenRequest,
        authorization: Option<String>,
    ) -> Result<reqwest::blocking::Response> {
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
        Ok(builder.send()?)
    }
}

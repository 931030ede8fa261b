//! Identity source detection.
//!
//! The five hosting environments are probed in a fixed priority order, each
//! guarded by the presence or absence of specific environment variables. The
//! first matching rule wins and the choice is frozen for the credential's
//! lifetime. Every rejected rule and the final match produce one diagnostic
//! event each; the transcript is part of the credential's contract.

use url::Url;

use crate::diagnostics::{DiagnosticsSink, Level};
use crate::env::{self, is_set, EnvSnapshot};
use crate::error::{CredentialError, Result};
use crate::identity::ManagedIdentityId;

/// Token URL of the Azure Instance Metadata Service.
pub(crate) const IMDS_TOKEN_URL: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

/// The hosting environment a credential acquires tokens from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    AppServiceV2019,
    AppServiceV2017,
    CloudShell,
    AzureArc,
    Imds,
}

impl IdentitySource {
    /// Display name used in diagnostic messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::AppServiceV2019 => "App Service 2019",
            Self::AppServiceV2017 => "App Service 2017",
            Self::CloudShell => "Cloud Shell",
            Self::AzureArc => "Azure Arc",
            Self::Imds => "Azure Instance Metadata Service",
        }
    }
}

/// The outcome of source selection: the frozen source plus the endpoint and
/// per-request secret derived from the environment snapshot.
#[derive(Debug, Clone)]
pub(crate) struct SelectedSource {
    pub source: IdentitySource,
    /// Validated, normalized base URL for token requests.
    pub endpoint: String,
    /// `IDENTITY_HEADER` or `MSI_SECRET` for the App Service sources;
    /// empty for the others.
    pub secret: String,
}

/// Evaluation order of the detection rules. Overlapping environments are
/// resolved purely by this order.
const PRIORITY: [IdentitySource; 5] = [
    IdentitySource::AppServiceV2019,
    IdentitySource::AppServiceV2017,
    IdentitySource::CloudShell,
    IdentitySource::AzureArc,
    IdentitySource::Imds,
];

fn rule_matches(source: IdentitySource, snapshot: &EnvSnapshot) -> bool {
    match source {
        IdentitySource::AppServiceV2019 => {
            is_set(&snapshot.identity_endpoint) && is_set(&snapshot.identity_header)
        }
        IdentitySource::AppServiceV2017 => {
            is_set(&snapshot.msi_endpoint) && is_set(&snapshot.msi_secret)
        }
        IdentitySource::CloudShell => is_set(&snapshot.msi_endpoint),
        IdentitySource::AzureArc => {
            is_set(&snapshot.identity_endpoint) && is_set(&snapshot.imds_endpoint)
        }
        IdentitySource::Imds => true,
    }
}

/// Picks exactly one identity source for the given environment snapshot.
///
/// Emits one Verbose event per rejected rule and one Informational event for
/// the match. A malformed endpoint URL on the matched source fails selection
/// with a Warning event; it never falls through to the next rule.
pub(crate) fn select_source(
    snapshot: &EnvSnapshot,
    identity: &ManagedIdentityId,
    sink: &dyn DiagnosticsSink,
) -> Result<SelectedSource> {
    for source in PRIORITY {
        if !rule_matches(source, snapshot) {
            sink.log(
                Level::Verbose,
                &format!(
                    "ManagedIdentityCredential: Environment is not set up for the credential \
                     to be created with {} source.",
                    source.display_name()
                ),
            );
            continue;
        }
        return build_selection(source, snapshot, identity, sink);
    }
    unreachable!("the IMDS rule matches unconditionally")
}

fn build_selection(
    source: IdentitySource,
    snapshot: &EnvSnapshot,
    identity: &ManagedIdentityId,
    sink: &dyn DiagnosticsSink,
) -> Result<SelectedSource> {
    let (endpoint_var, endpoint_value, secret) = match source {
        IdentitySource::AppServiceV2019 => (
            env::IDENTITY_ENDPOINT,
            snapshot.identity_endpoint.as_str(),
            snapshot.identity_header.clone(),
        ),
        IdentitySource::AppServiceV2017 => (
            env::MSI_ENDPOINT,
            snapshot.msi_endpoint.as_str(),
            snapshot.msi_secret.clone(),
        ),
        IdentitySource::CloudShell => {
            (env::MSI_ENDPOINT, snapshot.msi_endpoint.as_str(), String::new())
        }
        IdentitySource::AzureArc => (
            env::IDENTITY_ENDPOINT,
            snapshot.identity_endpoint.as_str(),
            String::new(),
        ),
        IdentitySource::Imds => ("", IMDS_TOKEN_URL, String::new()),
    };

    let endpoint = match source {
        // The IMDS address is a constant; nothing to validate.
        IdentitySource::Imds => IMDS_TOKEN_URL.to_owned(),
        _ => match validate_endpoint(endpoint_value) {
            Some(endpoint) => endpoint,
            None => {
                let message = format!(
                    "The environment variable '{endpoint_var}' contains an invalid URL."
                );
                sink.log(
                    Level::Warning,
                    &format!(
                        "ManagedIdentityCredential with {} source: Failed to create: {message}",
                        source.display_name()
                    ),
                );
                return Err(CredentialError::Configuration(message));
            }
        },
    };

    if matches!(source, IdentitySource::CloudShell | IdentitySource::AzureArc)
        && !identity.is_system_assigned()
    {
        return Err(CredentialError::SourceMismatch(format!(
            "{} source supports the system-assigned managed identity only",
            source.display_name()
        )));
    }

    let mut message = format!(
        "ManagedIdentityCredential will be created with {} source",
        source.display_name()
    );
    match (identity.kind_name(), identity.id()) {
        (Some(kind), Some(id)) => message.push_str(&format!(" and {kind} '{id}'.")),
        _ => message.push('.'),
    }
    if source == IdentitySource::Imds {
        message.push_str(
            "\nSuccessful creation does not guarantee further successful token retrieval.",
        );
    }
    sink.log(Level::Informational, &message);

    Ok(SelectedSource {
        source,
        endpoint,
        secret,
    })
}

/// Validates an endpoint URL and normalizes it to
/// `scheme://host[:port][path]` with any trailing slash removed.
///
/// Rejects values that do not parse, lack a host, or carry an unparseable /
/// out-of-range port (the `url` crate bounds ports to u16).
fn validate_endpoint(value: &str) -> Option<String> {
    let url = Url::parse(value).ok()?;
    let host = url.host_str()?;
    let mut endpoint = format!("{}://{host}", url.scheme());
    if let Some(port) = url.port() {
        endpoint.push_str(&format!(":{port}"));
    }
    endpoint.push_str(url.path().trim_end_matches('/'));
    Some(endpoint)
}

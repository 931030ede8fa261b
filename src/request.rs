//! Per-source token request construction.
//!
//! Each identity source speaks a slightly different dialect of the same
//! protocol: different API versions, different qualifier parameter names,
//! different auth headers, and one POST instead of GET. All of that is
//! resolved here into a plain [`TokenRequest`] the transport layer can send
//! without knowing which source it serves.

use reqwest::Method;

use crate::identity::ManagedIdentityId;
use crate::source::{IdentitySource, SelectedSource};

/// A fully assembled token request. Building one is deterministic: the same
/// inputs always yield the same method, URL, headers, and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TokenRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

/// Builds the token request for the selected source.
///
/// Query parameters are always emitted in the order api-version, identity
/// qualifier, resource. Qualifier values go on the wire verbatim; the
/// resource value is percent-encoded.
pub(crate) fn build_token_request(
    selected: &SelectedSource,
    identity: &ManagedIdentityId,
    scopes: &[&str],
) -> TokenRequest {
    let resource = scopes.first().map(|scope| scope_to_resource(scope));

    let mut query = String::new();
    let mut push_param = |name: &str, value: &str| {
        query.push(if query.is_empty() { '?' } else { '&' });
        query.push_str(name);
        query.push('=');
        query.push_str(value);
    };

    match selected.source {
        IdentitySource::AppServiceV2019 => {
            push_param("api-version", "2019-08-01");
            if let Some(id) = identity.id() {
                let name = match identity {
                    ManagedIdentityId::ClientId(_) => "client_id",
                    ManagedIdentityId::ObjectId(_) => "principal_id",
                    ManagedIdentityId::ResourceId(_) => "mi_res_id",
                    ManagedIdentityId::SystemAssigned => unreachable!(),
                };
                push_param(name, id);
            }
            if let Some(resource) = &resource {
                push_param("resource", &percent_encode(resource));
            }
            TokenRequest {
                method: Method::GET,
                url: format!("{}{query}", selected.endpoint),
                headers: vec![("X-IDENTITY-HEADER", selected.secret.clone())],
                body: String::new(),
            }
        }
        IdentitySource::AppServiceV2017 => {
            push_param("api-version", "2017-09-01");
            if let Some(id) = identity.id() {
                let name = match identity {
                    ManagedIdentityId::ClientId(_) => "clientid",
                    ManagedIdentityId::ObjectId(_) => "principal_id",
                    ManagedIdentityId::ResourceId(_) => "mi_res_id",
                    ManagedIdentityId::SystemAssigned => unreachable!(),
                };
                push_param(name, id);
            }
            if let Some(resource) = &resource {
                push_param("resource", &percent_encode(resource));
            }
            TokenRequest {
                method: Method::GET,
                url: format!("{}{query}", selected.endpoint),
                headers: vec![("secret", selected.secret.clone())],
                body: String::new(),
            }
        }
        IdentitySource::CloudShell => {
            // System-assigned only; the identity never reaches this arm
            // user-assigned.
            let body = match &resource {
                Some(resource) => format!("resource={}", percent_encode(resource)),
                None => String::new(),
            };
            TokenRequest {
                method: Method::POST,
                url: selected.endpoint.clone(),
                headers: vec![
                    ("Metadata", "true".to_owned()),
                    ("Content-Type", "application/x-www-form-urlencoded".to_owned()),
                ],
                body,
            }
        }
        IdentitySource::AzureArc => {
            push_param("api-version", "2019-11-01");
            if let Some(resource) = &resource {
                push_param("resource", &percent_encode(resource));
            }
            TokenRequest {
                method: Method::GET,
                url: format!("{}{query}", selected.endpoint),
                headers: vec![("Metadata", "true".to_owned())],
                body: String::new(),
            }
        }
        IdentitySource::Imds => {
            push_param("api-version", "2018-02-01");
            if let Some(id) = identity.id() {
                let name = match identity {
                    ManagedIdentityId::ClientId(_) => "client_id",
                    ManagedIdentityId::ObjectId(_) => "object_id",
                    ManagedIdentityId::ResourceId(_) => "msi_res_id",
                    ManagedIdentityId::SystemAssigned => unreachable!(),
                };
                push_param(name, id);
            }
            if let Some(resource) = &resource {
                push_param("resource", &percent_encode(resource));
            }
            TokenRequest {
                method: Method::GET,
                url: format!("{}{query}", selected.endpoint),
                headers: vec![("Metadata", "true".to_owned())],
                body: String::new(),
            }
        }
    }
}

/// Converts an OAuth scope to a managed-identity resource by stripping a
/// trailing `/.default` suffix, if present.
pub(crate) fn scope_to_resource(scope: &str) -> String {
    scope
        .strip_suffix("/.default")
        .unwrap_or(scope)
        .to_owned()
}

/// RFC 3986 percent-encoding: unreserved characters pass through, everything
/// else becomes an uppercase %XX triplet per UTF-8 byte.
pub(crate) fn percent_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

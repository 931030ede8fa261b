//! Credential construction options.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::diagnostics::{DiagnosticsSink, TracingSink};
use crate::identity::ManagedIdentityId;

/// Options for constructing a [`ManagedIdentityCredential`].
///
/// [`ManagedIdentityCredential`]: crate::ManagedIdentityCredential
#[derive(Clone)]
pub struct CredentialOptions {
    pub(crate) identity: ManagedIdentityId,
    pub(crate) timeout: Duration,
    pub(crate) connect_timeout: Duration,
    pub(crate) pool_idle_timeout: Duration,
    pub(crate) pool_max_idle_per_host: usize,
    pub(crate) tcp_keepalive: Option<Duration>,
    pub(crate) diagnostics: Arc<dyn DiagnosticsSink>,
    pub(crate) arc_key_directory: Option<PathBuf>,
}

impl Default for CredentialOptions {
    fn default() -> Self {
        Self {
            identity: ManagedIdentityId::default(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 8,
            tcp_keepalive: Some(Duration::from_secs(60)),
            diagnostics: Arc::new(TracingSink),
            arc_key_directory: None,
        }
    }
}

impl CredentialOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the managed identity to authenticate as.
    pub fn with_identity(mut self, identity: ManagedIdentityId) -> Self {
        self.identity = identity;
        self
    }

    /// Sets the overall request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Sets the sink that receives source-selection diagnostics.
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Overrides the directory Azure Arc key files must live in.
    #[doc(hidden)]
    pub fn with_arc_key_directory(mut self, dir: PathBuf) -> Self {
        self.arc_key_directory = Some(dir);
        self
    }
}

impl fmt::Debug for CredentialOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialOptions")
            .field("identity", &self.identity)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("tcp_keepalive", &self.tcp_keepalive)
            .field("arc_key_directory", &self.arc_key_directory)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = CredentialOptions::new();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.connect_timeout, Duration::from_secs(10));
        assert_eq!(options.pool_max_idle_per_host, 8);
        assert!(options.identity.is_system_assigned());
        assert!(options.arc_key_directory.is_none());
    }

    #[test]
    fn builders_overwrite_defaults() {
        let options = CredentialOptions::new()
            .with_identity(ManagedIdentityId::from_client_id("abc").unwrap())
            .with_timeout(Duration::from_secs(5))
            .with_connect_timeout(Duration::from_secs(2))
            .with_arc_key_directory(PathBuf::from("/tmp/keys"));
        assert!(!options.identity.is_system_assigned());
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.connect_timeout, Duration::from_secs(2));
        assert_eq!(options.arc_key_directory, Some(PathBuf::from("/tmp/keys")));
    }
}

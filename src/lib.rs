//! Azure managed identity token acquisition.
//!
//! Detects which managed identity endpoint the current hosting environment
//! exposes (App Service, Cloud Shell, Azure Arc, or the Azure Instance
//! Metadata Service), freezes that choice, and acquires access tokens from
//! it over HTTP.
//!
//! ```no_run
//! # async fn demo() -> rs_azure_msi::Result<()> {
//! use rs_azure_msi::{CredentialOptions, ManagedIdentityCredential, ManagedIdentityId};
//!
//! // System-assigned identity, source detected from the environment.
//! let credential = ManagedIdentityCredential::new()?;
//! let token = credential
//!     .get_token(&["https://management.azure.com/.default"])
//!     .await?;
//!
//! // User-assigned identity by client id.
//! let options = CredentialOptions::new()
//!     .with_identity(ManagedIdentityId::from_client_id("<client id>")?);
//! let credential = ManagedIdentityCredential::with_options(options)?;
//! # let _ = (credential, token);
//! # Ok(())
//! # }
//! ```

mod arc;
#[cfg(feature = "blocking")]
pub mod blocking;
pub mod config;
pub mod credential;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod identity;
mod request;
pub mod response;
mod source;

pub use config::CredentialOptions;
pub use credential::ManagedIdentityCredential;
pub use diagnostics::{DiagnosticsSink, Level, MemorySink, TracingSink};
pub use env::EnvSnapshot;
pub use error::{CredentialError, Result};
pub use identity::ManagedIdentityId;
pub use response::AccessToken;
pub use source::IdentitySource;

// The credential is shared across tasks; keep it thread-safe.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ManagedIdentityCredential>();
    assert_send_sync::<CredentialError>();
    assert_send_sync::<AccessToken>();
};

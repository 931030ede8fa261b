use std::env;

pub(crate) const MSI_ENDPOINT: &str = "MSI_ENDPOINT";
pub(crate) const MSI_SECRET: &str = "MSI_SECRET";
pub(crate) const IDENTITY_ENDPOINT: &str = "IDENTITY_ENDPOINT";
pub(crate) const IDENTITY_HEADER: &str = "IDENTITY_HEADER";
pub(crate) const IMDS_ENDPOINT: &str = "IMDS_ENDPOINT";
pub(crate) const IDENTITY_SERVER_THUMBPRINT: &str = "IDENTITY_SERVER_THUMBPRINT";
pub(crate) const PROGRAM_DATA: &str = "ProgramData";

/// A one-shot snapshot of the environment variables that drive identity
/// source selection.
///
/// Taken once per credential construction; a variable set to the empty
/// string is treated the same as an unset variable.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    pub(crate) msi_endpoint: String,
    pub(crate) msi_secret: String,
    pub(crate) identity_endpoint: String,
    pub(crate) identity_header: String,
    pub(crate) imds_endpoint: String,
    /// Accepted for parity with the hosting environments that set it;
    /// no selection rule consumes it.
    pub(crate) identity_server_thumbprint: String,
    /// Windows only: root for the Azure Arc key directory.
    pub(crate) program_data: String,
}

impl EnvSnapshot {
    /// Captures the recognized variables from the process environment.
    pub fn from_process() -> Self {
        Self {
            msi_endpoint: env::var(MSI_ENDPOINT).unwrap_or_default(),
            msi_secret: env::var(MSI_SECRET).unwrap_or_default(),
            identity_endpoint: env::var(IDENTITY_ENDPOINT).unwrap_or_default(),
            identity_header: env::var(IDENTITY_HEADER).unwrap_or_default(),
            imds_endpoint: env::var(IMDS_ENDPOINT).unwrap_or_default(),
            identity_server_thumbprint: env::var(IDENTITY_SERVER_THUMBPRINT).unwrap_or_default(),
            program_data: env::var(PROGRAM_DATA).unwrap_or_default(),
        }
    }

    /// Builds a snapshot from explicit (name, value) pairs.
    ///
    /// Unrecognized names are ignored; names not mentioned stay unset.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut snapshot = Self::default();
        for (name, value) in pairs {
            match name {
                MSI_ENDPOINT => snapshot.msi_endpoint = value.to_owned(),
                MSI_SECRET => snapshot.msi_secret = value.to_owned(),
                IDENTITY_ENDPOINT => snapshot.identity_endpoint = value.to_owned(),
                IDENTITY_HEADER => snapshot.identity_header = value.to_owned(),
                IMDS_ENDPOINT => snapshot.imds_endpoint = value.to_owned(),
                IDENTITY_SERVER_THUMBPRINT => {
                    snapshot.identity_server_thumbprint = value.to_owned()
                }
                PROGRAM_DATA => snapshot.program_data = value.to_owned(),
                _ => {}
            }
        }
        snapshot
    }
}

/// A variable counts as set only when it holds a non-empty value.
pub(crate) fn is_set(value: &str) -> bool {
    !value.is_empty()
}

use crate::error::{CredentialError, Result};

/// The managed identity a credential authenticates as.
///
/// The default is the system-assigned identity of the hosting resource.
/// User-assigned identities are referenced by client ID, object (principal)
/// ID, or full Azure resource ID; the referencing string must be non-empty,
/// enforced by the factory constructors. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ManagedIdentityId {
    #[default]
    SystemAssigned,
    ClientId(String),
    ObjectId(String),
    ResourceId(String),
}

impl ManagedIdentityId {
    /// The system-assigned identity of the hosting Azure resource.
    pub fn system_assigned() -> Self {
        Self::SystemAssigned
    }

    /// A user-assigned identity referenced by its client ID.
    pub fn from_client_id(client_id: impl Into<String>) -> Result<Self> {
        Self::user_assigned(Self::ClientId, client_id.into(), "client ID")
    }

    /// A user-assigned identity referenced by its object (principal) ID.
    pub fn from_object_id(object_id: impl Into<String>) -> Result<Self> {
        Self::user_assigned(Self::ObjectId, object_id.into(), "object ID")
    }

    /// A user-assigned identity referenced by its Azure resource ID.
    pub fn from_resource_id(resource_id: impl Into<String>) -> Result<Self> {
        Self::user_assigned(Self::ResourceId, resource_id.into(), "resource ID")
    }

    fn user_assigned(variant: fn(String) -> Self, id: String, what: &str) -> Result<Self> {
        if id.is_empty() {
            return Err(CredentialError::Configuration(format!(
                "a user-assigned managed identity {what} must not be empty"
            )));
        }
        Ok(variant(id))
    }

    /// Returns the referencing id, or `None` for the system-assigned identity.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::SystemAssigned => None,
            Self::ClientId(id) | Self::ObjectId(id) | Self::ResourceId(id) => Some(id),
        }
    }

    pub fn is_system_assigned(&self) -> bool {
        matches!(self, Self::SystemAssigned)
    }

    /// Human-readable kind used in diagnostic messages.
    pub(crate) fn kind_name(&self) -> Option<&'static str> {
        match self {
            Self::SystemAssigned => None,
            Self::ClientId(_) => Some("Client ID"),
            Self::ObjectId(_) => Some("Object ID"),
            Self::ResourceId(_) => Some("Resource ID"),
        }
    }
}

use thiserror::Error;

/// Error type shared by the device model, the permission policy and the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BleError {
    /// The connected device's attribute tree has no characteristic with this UUID.
    #[error("Characteristic {uuid} was not found!")]
    CharacteristicNotFound { uuid: String },

    /// The platform stack has never seen this device, or has forgotten it.
    #[error("device {identifier} was not found")]
    DeviceNotFound { identifier: String },

    #[error("{0}")]
    Generic(String),

    /// No permission policy covers this API level.
    #[error("no permission policy defined for API level {0}")]
    UnmappedApiLevel(i32),
}

impl BleError {
    pub fn characteristic_not_found(uuid: impl Into<String>) -> Self {
        BleError::CharacteristicNotFound { uuid: uuid.into() }
    }

    pub fn device_not_found(identifier: impl Into<String>) -> Self {
        BleError::DeviceNotFound {
            identifier: identifier.into(),
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        BleError::Generic(message.into())
    }

    /// The UUID or device identifier that failed to resolve, as given by the caller.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            BleError::CharacteristicNotFound { uuid } => Some(uuid),
            BleError::DeviceNotFound { identifier } => Some(identifier),
            BleError::Generic(_) | BleError::UnmappedApiLevel(_) => None,
        }
    }
}

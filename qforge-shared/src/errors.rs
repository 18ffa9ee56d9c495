//! Error taxonomy for machine compilation.
//!
//! Every failure aborts compilation of the machine being built. Nothing here
//! is transient, so there is no retry classification; callers wrap the error
//! with the machine name via [`QforgeError::for_machine`] and surface it.

use thiserror::Error;

/// Result alias used throughout qforge.
pub type QforgeResult<T> = Result<T, QforgeError>;

#[derive(Debug, Error)]
pub enum QforgeError {
    /// Invalid or inconsistent configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// A name refers to something the system or machine does not define.
    #[error("{referencer} uses an unspecified {kind}: {reference}")]
    UnresolvedReference {
        kind: &'static str,
        referencer: String,
        reference: String,
    },

    /// A controller or the root complex has no room left.
    #[error("{resource} is full: limit of {limit} reached with {count} attached")]
    Capacity {
        resource: String,
        limit: usize,
        count: usize,
    },

    /// A single-downstream port already has a device connected.
    #[error("port {port} is already occupied by a downstream device")]
    Occupied { port: String },

    /// Two entries in a uniqueness-checked registry share a name.
    #[error("{registry} already contains an entry named \"{name}\"")]
    DuplicateName { registry: &'static str, name: String },

    /// A storage pool declares a type with no attachment handler.
    #[error("storage pool \"{pool}\" has storage type \"{kind}\" which has no handler defined")]
    UnsupportedType { pool: String, kind: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Any of the above, annotated with the machine being compiled.
    #[error("machine {machine}: {source}")]
    Machine {
        machine: String,
        #[source]
        source: Box<QforgeError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QforgeError {
    /// Wrap this error with the name of the machine being compiled.
    ///
    /// An error that already carries a machine name is returned unchanged.
    pub fn for_machine(self, machine: impl Into<String>) -> Self {
        match self {
            err @ QforgeError::Machine { .. } => err,
            err => QforgeError::Machine {
                machine: machine.into(),
                source: Box::new(err),
            },
        }
    }

    /// The error with any machine annotation stripped.
    pub fn root(&self) -> &QforgeError {
        match self {
            QforgeError::Machine { source, .. } => source.root(),
            err => err,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self.root(),
            QforgeError::Config(_) | QforgeError::UnresolvedReference { .. }
        )
    }

    pub fn is_capacity(&self) -> bool {
        matches!(self.root(), QforgeError::Capacity { .. })
    }

    pub fn is_occupied(&self) -> bool {
        matches!(self.root(), QforgeError::Occupied { .. })
    }

    pub fn is_duplicate_name(&self) -> bool {
        matches!(self.root(), QforgeError::DuplicateName { .. })
    }

    pub fn is_unsupported_type(&self) -> bool {
        matches!(self.root(), QforgeError::UnsupportedType { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_reference_names_both_sides() {
        let err = QforgeError::UnresolvedReference {
            kind: "network",
            referencer: "connection lan".to_string(),
            reference: "br0".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("connection lan"));
        assert!(msg.contains("br0"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_for_machine_wraps_once() {
        let err = QforgeError::Occupied {
            port: "pcie.1.0".to_string(),
        }
        .for_machine("alpha")
        .for_machine("beta");

        let msg = err.to_string();
        assert!(msg.starts_with("machine alpha:"));
        assert!(!msg.contains("beta"));
        assert!(err.is_occupied());
    }

    #[test]
    fn test_capacity_message_names_limit_and_count() {
        let err = QforgeError::Capacity {
            resource: "SCSI controller scsi.0".to_string(),
            limit: 28,
            count: 28,
        };
        assert!(err.to_string().contains("limit of 28"));
        assert!(err.is_capacity());
        assert!(!err.is_configuration());
    }
}

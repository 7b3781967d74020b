// Fault classes for slate construction and transport
//
// Decode failures are deliberately opaque: an attacker probing an
// encrypted envelope must not learn which sub-check rejected it. The
// true cause is logged at debug level where the failure is detected.

use thiserror::Error;

/// Which external collaborator a failed operation was talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    /// The node RPC client
    Node,
    /// The signing device (or software signer)
    Signer,
    /// The cryptographic primitives library
    Crypto,
}

impl std::fmt::Display for Collaborator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collaborator::Node => write!(f, "node"),
            Collaborator::Signer => write!(f, "signer"),
            Collaborator::Crypto => write!(f, "crypto"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input: wire decode, bit decode, or envelope checksum
    /// failure. Carries no detail on purpose.
    #[error("invalid data")]
    InvalidData,

    /// Protocol violation: a structural invariant failed (sort order,
    /// cut-through, weight, version mismatch, response/request
    /// inequality, kernel sum, payment proof). Never silently fixed up.
    #[error("unsupported slate")]
    UnsupportedSlate,

    /// Configuration fault: a network identifier outside the supported
    /// set.
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    /// A collaborator failed. The only class where retrying the same
    /// request may succeed.
    #[error("{collaborator} failure during {operation}")]
    Collaborator {
        collaborator: Collaborator,
        operation: &'static str,
    },
}

impl Error {
    /// Shorthand for a collaborator fault.
    pub fn collaborator(collaborator: Collaborator, operation: &'static str) -> Self {
        Error::Collaborator {
            collaborator,
            operation,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_data_is_opaque() {
        assert_eq!(Error::InvalidData.to_string(), "invalid data");
    }

    #[test]
    fn test_collaborator_context() {
        let err = Error::collaborator(Collaborator::Signer, "get_signature");
        assert_eq!(err.to_string(), "signer failure during get_signature");
    }
}

use std::path::PathBuf;

use thiserror::Error;

/// Coarse failure class of a [`ZkError`].
///
/// Callers pick a response from the kind alone, never from the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied something malformed. Recoverable, reported back.
    Input,
    /// Key material or relation unusable. Fatal at startup.
    Configuration,
    /// Prover, verifier or serialization broke while serving a request.
    Internal,
}

#[derive(Error, Debug)]
pub enum ZkError {
    #[error("invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    #[error("key is {actual} bytes, at most {max} are accepted")]
    KeyTooLarge { max: usize, actual: usize },

    #[error("witness construction failed: {0}")]
    Witness(String),

    #[error("relation compilation failed: {0}")]
    RelationCompile(String),

    #[error("key material at {}: {reason}", .path.display())]
    KeyMaterial { path: PathBuf, reason: String },

    #[error("incompatible key material: {0}")]
    IncompatibleKeys(String),

    #[error("hash commitment failed: {0}")]
    Commitment(String),

    #[error("proof generation failed: {0}")]
    ProofGenerationFailed(String),

    #[error("malformed proof: {0}")]
    MalformedProof(String),

    #[error("proof verification failed: {0}")]
    VerificationFailed(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl ZkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidKeyEncoding(_) | Self::KeyTooLarge { .. } | Self::Witness(_) => {
                ErrorKind::Input
            }
            Self::RelationCompile(_) | Self::KeyMaterial { .. } | Self::IncompatibleKeys(_) => {
                ErrorKind::Configuration
            }
            Self::Commitment(_)
            | Self::ProofGenerationFailed(_)
            | Self::MalformedProof(_)
            | Self::VerificationFailed(_)
            | Self::SerializationError(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn key_material(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::KeyMaterial {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ZkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_partition_variants() {
        assert_eq!(ZkError::InvalidKeyEncoding("zz".into()).kind(), ErrorKind::Input);
        assert_eq!(
            ZkError::KeyTooLarge { max: 64, actual: 65 }.kind(),
            ErrorKind::Input
        );
        assert_eq!(
            ZkError::key_material("/nope/pk.bin", "not found").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(ZkError::MalformedProof("short".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn key_material_message_names_path() {
        let err = ZkError::key_material("/keys/vk.bin", "no such file");
        assert_eq!(err.to_string(), "key material at /keys/vk.bin: no such file");
    }
}

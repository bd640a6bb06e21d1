use base64::DecodeError as Base64Error;
use rsa::errors::Error as RsaError;
use serde_json::Error as SerdeJSONError;
use x509_cert::der::Error as DerError;

/// Coarse classification of an [`Error`].
///
/// Callers deciding whether to reject a credential only need to look at this; a signature
/// that was checked and did not match is not an error at all (see [`crate::ldp::verify_proof`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingMandatoryField,
    UnexpandableDocument,
    CanonicalizationFailed,
    MalformedSignature,
    /// Key material, serialization or signing failure.
    Other,
}

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An attribute declared mandatory has no value.
    #[error("Missing mandatory field: {field}")]
    MissingMandatoryField { field: String },

    /// The document cannot be expanded into statements.
    #[error("Unable to expand document: {0}")]
    UnexpandableDocument(String),

    /// The canonicalization bound was exceeded or an internal invariant was violated.
    #[error("Canonicalization failed: {0}")]
    CanonicalizationFailed(String),

    /// The compact signature cannot be parsed or uses unsupported parameters.
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    /// A format template does not match the arguments supplied for it.
    #[error("Invalid format template `{template}`: {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// Key material is unusable for the requested operation.
    #[error("Invalid key: {0}")]
    Key(String),

    /// Missing private key parameters.
    #[error("Missing private key parameters")]
    MissingPrivateKey,

    /// RSA error.
    #[error(transparent)]
    Rsa(#[from] RsaError),

    /// Certificate decoding error.
    #[error("Invalid certificate: {0}")]
    Certificate(#[from] DerError),

    /// Signature creation failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Base64 decoding error.
    #[error(transparent)]
    Base64(#[from] Base64Error),

    /// JSON (de)serialization error.
    #[error(transparent)]
    Json(#[from] SerdeJSONError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingMandatoryField { .. } => ErrorKind::MissingMandatoryField,
            Self::UnexpandableDocument(_) => ErrorKind::UnexpandableDocument,
            Self::CanonicalizationFailed(_) => ErrorKind::CanonicalizationFailed,
            Self::MalformedSignature(_) => ErrorKind::MalformedSignature,
            _ => ErrorKind::Other,
        }
    }

    pub(crate) fn unexpandable(reason: impl Into<String>) -> Self {
        Self::UnexpandableDocument(reason.into())
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedSignature(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let err = Error::MissingMandatoryField {
            field: "gax-participant:name".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::MissingMandatoryField);
        assert_eq!(
            err.to_string(),
            "Missing mandatory field: gax-participant:name"
        );
        assert_eq!(
            Error::malformed("empty").kind(),
            ErrorKind::MalformedSignature
        );
        assert_eq!(Error::MissingPrivateKey.kind(), ErrorKind::Other);
    }
}

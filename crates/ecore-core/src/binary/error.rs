use ecore_pack::msgpack::MsgPackError;
use thiserror::Error;

use crate::metamodel::ConversionError;
use crate::object::ModelError;

/// Broad class of a [`BinaryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes are not a well-formed stream of this format.
    Framing,
    /// The stream names a package, class, feature or literal that is not known.
    Resolution,
    /// A value could not be converted or stored.
    Data,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BinaryError {
    #[error("not a binary model stream: bad signature")]
    Signature,
    #[error("unsupported binary model version {0}")]
    UnsupportedVersion(String),
    #[error(transparent)]
    Pack(#[from] MsgPackError),
    #[error("objects nested deeper than {0} levels")]
    TooDeep(usize),
    #[error("unknown package {0:?}")]
    UnknownPackage(String),
    #[error("unknown class {class:?} in package {package:?}")]
    UnknownClass { package: String, class: String },
    #[error("unknown feature {feature:?} in class {class:?}")]
    UnknownFeature { class: String, feature: String },
    #[error("unknown literal {literal:?} of enumeration {data_type:?}")]
    UnknownLiteral { data_type: String, literal: String },
    #[error("{table} id {id} out of sequence, next new id is {next}")]
    InvalidObjectId {
        table: &'static str,
        id: i64,
        next: usize,
    },
    #[error("invalid feature marker {0}")]
    InvalidMarker(i64),
    #[error("expected {expected}, found {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },
    #[error("feature {feature:?} holds {found}, which its encoding cannot carry")]
    UnencodableValue { feature: String, found: &'static str },
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl BinaryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BinaryError::Signature
            | BinaryError::UnsupportedVersion(_)
            | BinaryError::Pack(_)
            | BinaryError::TooDeep(_)
            | BinaryError::InvalidObjectId { .. }
            | BinaryError::InvalidMarker(_)
            | BinaryError::UnexpectedValue { .. } => ErrorKind::Framing,
            BinaryError::UnknownPackage(_)
            | BinaryError::UnknownClass { .. }
            | BinaryError::UnknownFeature { .. }
            | BinaryError::UnknownLiteral { .. } => ErrorKind::Resolution,
            BinaryError::UnencodableValue { .. }
            | BinaryError::Conversion(_)
            | BinaryError::Model(_) => ErrorKind::Data,
        }
    }
}

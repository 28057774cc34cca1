use thiserror::Error;

/// Errors raised while assembling a package.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetamodelError {
    #[error("class {class:?}: feature {feature:?} has unknown data type {data_type:?}")]
    UnknownDataType {
        class: String,
        feature: String,
        data_type: String,
    },
    #[error("class {class:?}: unknown super type {super_type:?}")]
    UnknownSuperType { class: String, super_type: String },
    #[error("duplicate classifier {0:?}")]
    DuplicateClassifier(String),
    #[error("class {class:?}: duplicate feature {feature:?}")]
    DuplicateFeature { class: String, feature: String },
    #[error("class {class:?}: feature {feature:?} cannot be both containment and container")]
    ConflictingReference { class: String, feature: String },
}

/// Errors raised by a factory converting between values and their string form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("cannot read {literal:?} as {data_type}: {reason}")]
    Parse {
        data_type: String,
        literal: String,
        reason: String,
    },
    #[error("{found} value does not fit data type {data_type}")]
    Mismatch {
        data_type: String,
        found: &'static str,
    },
    #[error("{literal:?} is not a literal of enumeration {data_type}")]
    UnknownLiteral { data_type: String, literal: String },
}

use thiserror::Error;

/// Failures surfaced while decoding references or compiling schemas.
///
/// Every variant indicates a static defect in the type definitions, not a
/// transient condition; callers should treat them as fatal for the
/// affected type.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid type reference: {0}")]
    InvalidTypeReference(String),

    #[error("unknown primitive type: {0}")]
    UnknownPrimitiveType(String),

    #[error("cannot place type in any category: {0}")]
    AmbiguousOrUnknownTypeKind(String),

    #[error("cyclic type `{0}` cannot be expanded without reference extraction")]
    UnterminatedRecursion(String),

    #[error("duplicate type definition: {0}")]
    DuplicateType(String),

    #[error("manifest error: {0}")]
    Manifest(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

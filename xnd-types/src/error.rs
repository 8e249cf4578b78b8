use thiserror::Error;

/// Errors raised while building or printing a [`crate::Type`] tree.
///
/// This is a type-library concern and is intentionally distinct from
/// `xnd_core::error::XndError`, which covers the container runtime's own
/// error kinds.
#[derive(Debug, Error)]
pub enum TypeBuildError {
    #[error("unexpected end of datashape string")]
    UnexpectedEof,

    #[error("unexpected token {found:?} at byte {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("unknown dtype name {0:?}")]
    UnknownDtype(String),

    #[error("invalid fixed-dim shape: {0}")]
    InvalidShape(String),

    #[error("invalid alignment or pack value: {0}")]
    InvalidAlignPack(String),

    #[error("categorical type must have at least one category")]
    EmptyCategorical,
}

pub type Result<T> = std::result::Result<T, TypeBuildError>;

use thiserror::Error;

/// Container runtime error kinds. Each variant carries enough
/// context to build a useful message; propagation is always explicit —
/// nothing here is swallowed or silently converted.
#[derive(Debug, Error)]
pub enum XndError {
    #[error("type error: {0}")]
    TypeError(String),

    #[error("value error: {0}")]
    ValueError(String),

    #[error("index {index} out of range for length {len}")]
    OutOfRange { index: i64, len: usize },

    #[error("overflow: {0}")]
    Overflow(String),

    #[error("too many indices: got {got}, type has {ndim} dimensions")]
    TooManyIndices { got: usize, ndim: usize },

    #[error("cannot index a missing value")]
    MissingValueNotIndexable,

    #[error(
        "integer index {index} is not in range for every remaining outer list \
         (mixed var/fixed indexing after a slice-derived view)"
    )]
    VarIndexOutOfRangeAcrossLists { index: i64 },

    #[error("wrong union tag: expected {expected}, found {found}")]
    WrongUnionTag { expected: String, found: String },

    #[error("{value:?} is not a category of this categorical type")]
    NotACategory { value: String },

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("memory error: {0}")]
    MemoryError(String),
}

pub type Result<T> = std::result::Result<T, XndError>;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Hard failures surfaced by this crate.
///
/// An unknown class is not an error anywhere in the crate; providers
/// model it as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid descriptor: {0:?}")]
    InvalidDescriptor(String),

    #[error("incomplete descriptor: {0:?}")]
    IncompleteDescriptor(String),

    #[error("parameter index {index} out of bounds for a method with {count} parameters")]
    OutOfBoundsParameter { index: usize, count: usize },

    #[error("malformed class file")]
    MalformedClassFile,
}

//! Models of the type and inheritance structure of compiled JVM
//! classes, for tools that rewrite, remap, or statically analyze
//! them.
//!
//! The crate has three layers:
//!
//! - [`descriptor`], [`signature`] and [`reference`]: the textual
//!   descriptor grammar and the typed handles built on it.
//! - [`class`] and [`source`]: a declared-facts class-file reader and
//!   the byte sources it pulls from.
//! - [`analysis`]: the [`InheritanceProvider`](analysis::InheritanceProvider)
//!   boundary, built-in providers with caching, and the resolution of
//!   transitive parent sets and member-visibility questions.

pub mod analysis;
pub mod class;
pub mod descriptor;
pub mod error;
pub mod reference;
pub mod signature;
pub mod source;

pub use error::{Error, Result};

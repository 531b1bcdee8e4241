//! Error types re-exported at the crate root.
//!
//! The whole workspace shares one error taxonomy, defined in
//! `kbindex-core`; the facade adds nothing to it.

pub use kbindex_core::{Error, Result};

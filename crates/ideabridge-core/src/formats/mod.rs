//! # Formats Module
//!
//! Binary snapshot encoding for attribute trees. File I/O stays in the app
//! layer.

mod persistence;

pub use persistence::*;

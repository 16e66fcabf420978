//! Data models for the personal library.
//!
//! These are plain structured values handed to outer layers, which decide
//! how to put them on the wire.

mod book;

pub use book::*;

//! Concrete recording sink implementations.

mod file;

pub use file::{RawFileOpener, RawFileSink};

//! Concrete frame source implementations.

mod http;

pub use http::HttpSnapshotSource;

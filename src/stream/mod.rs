//! Stream combinators for frame consumers.

mod pace;

pub use pace::{Pace, PaceExt};

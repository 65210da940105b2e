//! Wood lactation model.
//!
//! The model is implemented as small, pure functions so that fitting,
//! integration and plotting code can share one definition.

pub mod wood;

pub use wood::*;

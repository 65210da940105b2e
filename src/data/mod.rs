//! Built-in and synthetic datasets.
//!
//! - `EXAMPLE_DATASET`: the dataset pre-filled in the TUI and used by
//!   `lacta analyze` when no file is given
//! - `simulate`: seeded synthetic observations from known Wood parameters

pub mod sample;

pub use sample::*;

//! Terminal plotting for the plain CLI.

pub mod ascii;

pub use ascii::*;

//! Utilities that are used across the `sashimi` modules.

pub mod cigar;
pub mod formats;
pub mod pathbuf;

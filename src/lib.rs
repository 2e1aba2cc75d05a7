//! `sashimi` draws sashimi plots: per-sample coverage tracks overlaid with
//! arcs for splice junctions, scaled by the number of reads supporting each
//! junction. This package is composed of both a library crate, as well as a
//! binary crate.
//!
//! A plot is produced in four steps:
//!
//! * [`region`] resolves what to plot, either from an explicit
//!   `chrom:start-end` coordinate or from a splicing event identifier,
//! * [`coverage`] computes smoothed per-base depth from each sample's BAM
//!   file,
//! * [`junctions`] collects per-sample junction read counts, and
//! * [`plot`] lays out and draws the figure.
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]

pub mod coverage;
pub mod errors;
pub mod junctions;
pub mod metadata;
pub mod plot;
pub mod region;
pub mod utils;

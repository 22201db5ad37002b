//! Command implementations for the `mosaicade` binary.

pub mod create;
pub mod segments;

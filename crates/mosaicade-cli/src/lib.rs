//! Mosaicade CLI library.
//!
//! This crate provides the plumbing around the mosaicing engine: the
//! filesystem corpus, WAV audio I/O, subprocess collaborators for feature
//! extraction and time-stretching, and the command implementations.

pub mod commands;
pub mod corpus;
pub mod descriptors;
pub mod report;
pub mod tools;
pub mod wave;

//! The ubershader archive format: a single compressed container aggregating
//! many material packages, each tagged with a small declarative spec (C7-C9).
pub mod matcher;
pub mod reader;
pub mod spec;
pub mod specfile;
pub mod writer;

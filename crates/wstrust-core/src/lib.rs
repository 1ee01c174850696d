#![forbid(unsafe_code)]

//! Shared definitions for the wstrust client: the error taxonomy, the
//! algorithm URIs of the supported signing profiles and the WS-* namespace
//! and element-name constants.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Fault, Result};

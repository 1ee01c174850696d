#![forbid(unsafe_code)]

//! Authenticated SOAP service calls.
//!
//! A [`ServiceClient`] builds an operation envelope from a
//! [`ServiceDefinition`] and JSON parameters, injects the STS-issued
//! assertion, signs the timestamp with the token's proof key and retries
//! with a fresh token when the service answers with a fault.

pub mod client;
pub mod definition;
pub mod envelope;
pub mod params;
pub mod result;

pub use client::ServiceClient;
pub use definition::{ServiceDefinition, ServiceDefinitionBuilder};
pub use envelope::BusinessRequest;
pub use result::{flatten, process_output, CallOutput};

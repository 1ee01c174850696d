#![forbid(unsafe_code)]

//! WS-Security XML signatures.
//!
//! Signs designated elements of a SOAP header with Exclusive C14N and
//! appends the `<Signature>` block to the `Security` element, optionally
//! preceded by an X.509 `BinarySecurityToken`.

pub mod context;
pub mod references;
pub mod sign;
#[cfg(any(test, feature = "verify"))]
pub mod verify;

pub use context::SignContext;
pub use references::SignatureElementSet;
pub use sign::sign;

#![forbid(unsafe_code)]

pub use wstrust_core as core;
pub use wstrust_xml as xml;
pub use wstrust_c14n as c14n;
pub use wstrust_crypto as crypto;
pub use wstrust_keys as keys;
pub use wstrust_dsig as dsig;
pub use wstrust_sts as sts;
pub use wstrust_soap as soap;

pub use wstrust_core::{Error, Fault, Result};
pub use wstrust_soap::{CallOutput, ServiceClient, ServiceDefinition};
pub use wstrust_sts::{
    AccessToken, AccessTokenClient, AccessTokenConfig, FileCache, MemoryCache, RequestConfig,
    SecurityToken, TokenManager,
};

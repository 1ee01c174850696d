#![forbid(unsafe_code)]

use std::fmt;

/// Structured contents of a SOAP 1.2 `Fault` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// `Reason/Text`.
    pub reason: String,
    /// `Code/Value`.
    pub code: String,
    /// `Code/Subcode/Value`, when the server sent one.
    pub subcode: Option<String>,
    /// Vendor fault-detail tag (`Detail/FaultDetail/Messages/FaultMessage/Tag`).
    pub tag: Option<String>,
    /// Which endpoint produced the fault (the STS or a named service).
    pub source: String,
}

impl Fault {
    /// Placeholder for fault fields the server left out.
    pub const NOT_PROVIDED: &'static str = "not provided";
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} (code: {}", self.source, self.reason, self.code)?;
        if let Some(subcode) = &self.subcode {
            write!(f, ", subcode: {subcode}")?;
        }
        if let Some(tag) = &self.tag {
            write!(f, ", tag: {tag}")?;
        }
        f.write_str(")")
    }
}

/// Errors produced by the wstrust client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {}", describe_configuration(.missing, .unknown, .invalid))]
    Configuration {
        missing: Vec<String>,
        unknown: Vec<String>,
        invalid: Vec<String>,
    },

    #[error("unknown namespace: {0}")]
    Namespace(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("STS fault: {0}")]
    StsFault(Box<Fault>),

    #[error("service fault after {attempts} attempt(s): {fault}")]
    ServiceFault { fault: Box<Fault>, attempts: u32 },

    #[error("access token error: {error} ({description})")]
    AccessToken { error: String, description: String },

    #[error("unexpected token service response: {0}")]
    UnexpectedResponse(String),

    #[error("missing assertion data: {0}")]
    MissingAssertion(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// A configuration error listing only missing fields.
    pub fn missing_config<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::Configuration {
            missing: fields.into_iter().map(Into::into).collect(),
            unknown: Vec::new(),
            invalid: Vec::new(),
        }
    }

    /// The structured fault for `StsFault` and `ServiceFault`.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Error::StsFault(fault) | Error::ServiceFault { fault, .. } => Some(fault),
            _ => None,
        }
    }

    /// Number of calls made before a service fault was raised.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Error::ServiceFault { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

fn describe_configuration(missing: &[String], unknown: &[String], invalid: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing {}", missing.join(", ")));
    }
    if !unknown.is_empty() {
        parts.push(format!("unknown {}", unknown.join(", ")));
    }
    if !invalid.is_empty() {
        parts.push(format!("invalid {}", invalid.join(", ")));
    }
    parts.join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn fault() -> Fault {
        Fault {
            reason: "An error occurred when verifying security for the message.".into(),
            code: "s:Sender".into(),
            subcode: Some("a:InvalidSecurity".into()),
            tag: None,
            source: "GipodService".into(),
        }
    }

    #[test]
    fn configuration_lists_every_problem() {
        let err = Error::Configuration {
            missing: vec!["realm".into(), "certificate".into()],
            unknown: vec!["sts_uri".into()],
            invalid: vec![],
        };
        assert_eq!(
            err.to_string(),
            "configuration error: missing realm, certificate; unknown sts_uri"
        );
    }

    #[test]
    fn service_fault_exposes_structure() {
        let err = Error::ServiceFault {
            fault: Box::new(fault()),
            attempts: 2,
        };
        assert_eq!(err.attempts(), Some(2));
        assert_eq!(err.fault().and_then(|f| f.subcode.as_deref()), Some("a:InvalidSecurity"));
        assert!(err.to_string().starts_with("service fault after 2 attempt(s): GipodService:"));
    }

    #[test]
    fn sts_fault_has_no_attempt_count() {
        let err = Error::StsFault(Box::new(fault()));
        assert!(err.fault().is_some());
        assert_eq!(err.attempts(), None);
    }

    #[test]
    fn access_token_error_names_type_and_description() {
        let err = Error::AccessToken {
            error: "invalid_grant".into(),
            description: Fault::NOT_PROVIDED.into(),
        };
        assert_eq!(err.to_string(), "access token error: invalid_grant (not provided)");
        assert!(err.fault().is_none());
    }

    #[test]
    fn fault_display_skips_absent_fields() {
        let mut f = fault();
        f.subcode = None;
        f.tag = Some("NotFound".into());
        assert_eq!(
            f.to_string(),
            "GipodService: An error occurred when verifying security for the message. (code: s:Sender, tag: NotFound)"
        );
    }
}

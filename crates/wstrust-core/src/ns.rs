#![forbid(unsafe_code)]

//! XML namespace constants used across the client.

/// SOAP 1.2 envelope namespace
pub const SOAP12: &str = "http://www.w3.org/2003/05/soap-envelope";

/// WS-Addressing 1.0 namespace
pub const ADDRESSING: &str = "http://www.w3.org/2005/08/addressing";

/// WS-Security utility namespace (`Id`, `Timestamp`)
pub const WSU: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// WS-Security extension namespace (`Security`, `BinarySecurityToken`)
pub const WSSE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// WS-Trust 1.3 namespace
pub const TRUST: &str = "http://docs.oasis-open.org/ws-sx/ws-trust/200512";

/// WS-Policy namespace
pub const POLICY: &str = "http://schemas.xmlsoap.org/ws/2004/09/policy";

/// XML Schema instance namespace (`nil`)
pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// WCF serialization arrays namespace
pub const ARRAYS: &str = "http://schemas.microsoft.com/2003/10/Serialization/Arrays";

/// XML Encryption namespace
pub const ENC: &str = "http://www.w3.org/2001/04/xmlenc#";

/// XML Digital Signature namespace
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Fault detail namespace of the token service and its relying services
pub const FAULT_DETAIL: &str = "http://www.agiv.be/ErrorHandling/2010/04";

/// XML namespace
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

// ── Element names ────────────────────────────────────────────────────

pub mod node {
    // SOAP
    pub const ENVELOPE: &str = "Envelope";
    pub const HEADER: &str = "Header";
    pub const BODY: &str = "Body";
    pub const FAULT: &str = "Fault";
    pub const REASON: &str = "Reason";
    pub const TEXT: &str = "Text";
    pub const CODE: &str = "Code";
    pub const SUBCODE: &str = "Subcode";
    pub const VALUE: &str = "Value";
    pub const DETAIL: &str = "Detail";

    // Addressing
    pub const ACTION: &str = "Action";
    pub const MESSAGE_ID: &str = "MessageID";
    pub const REPLY_TO: &str = "ReplyTo";
    pub const ADDRESS: &str = "Address";
    pub const TO: &str = "To";
    pub const ENDPOINT_REFERENCE: &str = "EndpointReference";

    // WS-Security
    pub const SECURITY: &str = "Security";
    pub const TIMESTAMP: &str = "Timestamp";
    pub const CREATED: &str = "Created";
    pub const EXPIRES: &str = "Expires";
    pub const BINARY_SECURITY_TOKEN: &str = "BinarySecurityToken";
    pub const SECURITY_TOKEN_REFERENCE: &str = "SecurityTokenReference";

    // DSig
    pub const SIGNATURE: &str = "Signature";
    pub const SIGNED_INFO: &str = "SignedInfo";
    pub const CANONICALIZATION_METHOD: &str = "CanonicalizationMethod";
    pub const SIGNATURE_METHOD: &str = "SignatureMethod";
    pub const SIGNATURE_VALUE: &str = "SignatureValue";
    pub const REFERENCE: &str = "Reference";
    pub const TRANSFORMS: &str = "Transforms";
    pub const TRANSFORM: &str = "Transform";
    pub const DIGEST_METHOD: &str = "DigestMethod";
    pub const DIGEST_VALUE: &str = "DigestValue";
    pub const KEY_INFO: &str = "KeyInfo";

    // WS-Trust
    pub const REQUEST_SECURITY_TOKEN: &str = "RequestSecurityToken";
    pub const REQUEST_SECURITY_TOKEN_RESPONSE: &str = "RequestSecurityTokenResponse";
    pub const REQUEST_TYPE: &str = "RequestType";
    pub const APPLIES_TO: &str = "AppliesTo";
    pub const LIFETIME: &str = "Lifetime";
    pub const BINARY_SECRET: &str = "BinarySecret";

    // XML Encryption
    pub const ENCRYPTED_DATA: &str = "EncryptedData";

    // Fault detail
    pub const FAULT_DETAIL: &str = "FaultDetail";
    pub const MESSAGES: &str = "Messages";
    pub const FAULT_MESSAGE: &str = "FaultMessage";
    pub const TAG: &str = "Tag";
}

// ── Attribute names ──────────────────────────────────────────────────

pub mod attr {
    pub const ID: &str = "Id";
    pub const MUST_UNDERSTAND: &str = "mustUnderstand";
    pub const ALGORITHM: &str = "Algorithm";
    pub const URI: &str = "URI";
    pub const VALUE_TYPE: &str = "ValueType";
    pub const ENCODING_TYPE: &str = "EncodingType";
    pub const NIL: &str = "nil";
}

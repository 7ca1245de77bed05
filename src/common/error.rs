use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // unknown error
    UnknownError = 1000,
    // http request error
    HttpError = 1001,
    // invalid configuration
    ConfigError = 1002,
    // entity id has no slot in the channel index
    EntityNotIndexed = 1003,
    // CoE server unreachable or answered garbage
    CoeTransportError = 1004,
    // mqtt broker error
    MqttError = 1005,
    // CoE server speaks a protocol version we cannot send to
    UnsupportedProtocol = 1006,
}

#[derive(Debug)]
pub struct BridgeError {
    pub code: ErrorCode,
    pub msg: String,
}

impl BridgeError {
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        BridgeError { code, msg: msg.into() }
    }
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "bridge error code: {}, msg: {}", self.code as u16, self.msg)
    }
}

impl Error for BridgeError {}

// CoE transport error
#[derive(Debug, Clone, PartialEq)]
pub struct CoeError(pub String);

impl Display for CoeError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "CoE transport error msg: {}", self.0)
    }
}

impl Error for CoeError {}

impl From<reqwest::Error> for CoeError {
    fn from(e: reqwest::Error) -> Self {
        CoeError(format!("http request failed: {e}"))
    }
}

impl From<CoeError> for BridgeError {
    fn from(e: CoeError) -> Self {
        BridgeError { code: ErrorCode::CoeTransportError, msg: e.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coe_error_becomes_transport_error() {
        let err: BridgeError = CoeError("timeout".to_string()).into();
        assert_eq!(err.code, ErrorCode::CoeTransportError);
        assert_eq!(err.to_string(), "bridge error code: 1004, msg: timeout");
    }
}

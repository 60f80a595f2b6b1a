// ABOUTME: Validated supervisor domain names.
// ABOUTME: A domain name is the file stem of its control socket.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainNameError {
    #[error("domain name cannot be empty")]
    Empty,

    #[error("domain name cannot start with a dot")]
    Hidden,

    #[error("invalid character in domain name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DomainName(String);

impl DomainName {
    pub fn new(value: &str) -> Result<Self, DomainNameError> {
        if value.is_empty() {
            return Err(DomainNameError::Empty);
        }

        if value.starts_with('.') {
            return Err(DomainNameError::Hidden);
        }

        for c in value.chars() {
            if c == '/' || c == '\\' || c.is_whitespace() || c.is_control() {
                return Err(DomainNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

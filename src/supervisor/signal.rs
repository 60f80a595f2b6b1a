// ABOUTME: Signals that can be delivered through signalProcess.
// ABOUTME: Accepts symbolic names (KILL, USR2) or raw numbers (34 for SIGRTMIN).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::xmlrpc::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Signal {
    Named(String),
    Number(i64),
}

impl Signal {
    pub fn kill() -> Self {
        Signal::Named("KILL".to_string())
    }

    pub fn to_value(&self) -> Value {
        match self {
            Signal::Named(name) => Value::Str(name.clone()),
            Signal::Number(n) => Value::Str(n.to_string()),
        }
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("signal cannot be empty".to_string());
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            if n <= 0 {
                return Err(format!("invalid signal number: {n}"));
            }
            return Ok(Signal::Number(n));
        }
        let name = trimmed.to_ascii_uppercase();
        let name = name.strip_prefix("SIG").unwrap_or(&name);
        if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("invalid signal name: {trimmed}"));
        }
        Ok(Signal::Named(name.to_string()))
    }
}

impl TryFrom<String> for Signal {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Signal> for String {
    fn from(signal: Signal) -> Self {
        signal.to_string()
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Named(name) => f.write_str(name),
            Signal::Number(n) => write!(f, "{n}"),
        }
    }
}

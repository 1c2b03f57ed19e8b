//! Control tokens accepted by `POST /led/{state}`.

use std::str::FromStr;

use thiserror::Error;

use crate::device::state::state_label;

/// Errors raised by control requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// Token outside `{"on", "off"}`. Matching is case-sensitive.
    #[error("Invalid state: {0:?}")]
    InvalidStateToken(String),
}

/// A validated state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedCommand {
    On,
    Off,
}

impl LedCommand {
    /// Target value of the flag.
    pub fn is_on(self) -> bool {
        matches!(self, LedCommand::On)
    }

    pub fn as_str(self) -> &'static str {
        state_label(self.is_on())
    }
}

impl FromStr for LedCommand {
    type Err = ControlError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "on" => Ok(LedCommand::On),
            "off" => Ok(LedCommand::Off),
            other => Err(ControlError::InvalidStateToken(other.to_string())),
        }
    }
}

impl std::fmt::Display for LedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_tokens() {
        assert_eq!("on".parse::<LedCommand>(), Ok(LedCommand::On));
        assert_eq!("off".parse::<LedCommand>(), Ok(LedCommand::Off));
    }

    #[test]
    fn rejects_everything_else() {
        for token in ["ON", "Off", "xyz", "", " on", "toggle"] {
            assert_eq!(
                token.parse::<LedCommand>(),
                Err(ControlError::InvalidStateToken(token.to_string()))
            );
        }
    }
}

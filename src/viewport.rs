use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Browser viewport. Parses `WIDTHxHEIGHT` or the `desktop`/`mobile` presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const DESKTOP: Viewport = Viewport {
        width: 1440,
        height: 900,
    };
    pub const MOBILE: Viewport = Viewport {
        width: 390,
        height: 844,
    };
}

impl Default for Viewport {
    fn default() -> Self {
        Self::DESKTOP
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewportParseError {
    #[error("Invalid viewport '{0}': expected WIDTHxHEIGHT (e.g., 1440x900), desktop or mobile")]
    InvalidFormat(String),
    #[error("Invalid viewport dimension: {0}")]
    InvalidDimension(String),
}

impl FromStr for Viewport {
    type Err = ViewportParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "desktop" => return Ok(Self::DESKTOP),
            "mobile" => return Ok(Self::MOBILE),
            _ => {}
        }

        let (width, height) = trimmed
            .split_once('x')
            .ok_or_else(|| ViewportParseError::InvalidFormat(trimmed.to_string()))?;
        let parse = |part: &str| -> Result<u32, ViewportParseError> {
            match part.trim().parse::<u32>() {
                Ok(0) | Err(_) => Err(ViewportParseError::InvalidDimension(part.trim().to_string())),
                Ok(v) => Ok(v),
            }
        };

        Ok(Viewport {
            width: parse(width)?,
            height: parse(height)?,
        })
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

//! Shared types and helpers used across the Ladle crates.
//!
//! This crate holds observability setup, the output format enum the CLI and
//! config loader agree on, and a couple of text helpers. It does not depend on
//! any other Ladle crate so every member of the workspace can pull it in.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`OutputFormat`]: How extracted results are rendered
//! - [`text`]: Whitespace and truncation helpers for printing extracted text
//!
//! # Examples
//!
//! ```rust
//! use ladle_common::OutputFormat;
//!
//! assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
//! assert_eq!(OutputFormat::default(), OutputFormat::Text);
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod observability;
pub mod text;

/// Preferred output format for printed results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One human-readable line per match.
    #[default]
    Text,
    /// One JSON object per selector.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(" JSON ".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("Text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn display_matches_parse() {
        for f in [OutputFormat::Text, OutputFormat::Json] {
            assert_eq!(f.to_string().parse::<OutputFormat>(), Ok(f));
        }
    }
}

//! Process configuration, read once at startup and never mutated afterwards.
//!
//! Values come from environment variables, with a small set of CLI flags taking
//! precedence. The lookup is injected so tests can supply their own variables.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};

pub const ENV_PORT: &str = "PORT";
pub const ENV_CONSTRING: &str = "CONSTRING";
pub const ENV_INIT_SCHEMA: &str = "PLANCHECKER_INIT_SCHEMA";
pub const ENV_INDENT_UNIT: &str = "PLANCHECKER_INDENT_UNIT";
pub const ENV_INDENT_MULTIPLIER: &str = "PLANCHECKER_INDENT_MULTIPLIER";

/// Upper bound for each indent knob; keeps `depth * unit * multiplier` in range.
pub const MAX_INDENT_FACTOR: u32 = 100;

/// Presentation settings for the rendered plan tree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportConfig {
    /// Indent steps per tree level.
    pub indent_unit: u32,
    /// Pixels per indent step.
    pub indent_multiplier: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { indent_unit: 4, indent_multiplier: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub port: u16,
    /// Store connection string; `None` disables save/load.
    pub connection_string: Option<String>,
    /// Create the `plans` table at startup when missing.
    pub init_schema: bool,
    pub report: ReportConfig,
}

impl Config {
    pub fn from_env(args: &[String]) -> PlanResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok(), args)
    }

    pub fn from_lookup<F>(lookup: F, args: &[String]) -> PlanResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port_text = arg_value(args, "--port")
            .or_else(|| lookup(ENV_PORT))
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| PlanError::Config(format!("{} env variable not set", ENV_PORT)))?;
        let port = port_text
            .trim()
            .parse::<u16>()
            .map_err(|_| PlanError::Config(format!("invalid port '{}'", port_text)))?;

        let connection_string = arg_value(args, "--constring")
            .or_else(|| lookup(ENV_CONSTRING))
            .filter(|s| !s.trim().is_empty());

        let init_schema = has_flag(args, "--init-schema")
            || lookup(ENV_INIT_SCHEMA).as_deref().and_then(parse_bool).unwrap_or(false);

        let defaults = ReportConfig::default();
        let report = ReportConfig {
            indent_unit: parse_indent(&lookup, ENV_INDENT_UNIT)?.unwrap_or(defaults.indent_unit),
            indent_multiplier: parse_indent(&lookup, ENV_INDENT_MULTIPLIER)?.unwrap_or(defaults.indent_multiplier),
        };

        Ok(Self { port, connection_string, init_schema, report })
    }
}

fn parse_u32<F>(lookup: &F, name: &str) -> PlanResult<Option<u32>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(v) => v
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| PlanError::Config(format!("{} must be a non-negative integer, got '{}'", name, v))),
        None => Ok(None),
    }
}

/// Indent knobs must be in `1..=MAX_INDENT_FACTOR` so every level indents further.
fn parse_indent<F>(lookup: &F, name: &str) -> PlanResult<Option<u32>>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_u32(lookup, name)? {
        Some(v) if v == 0 || v > MAX_INDENT_FACTOR => Err(PlanError::Config(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_INDENT_FACTOR, v
        ))),
        other => Ok(other),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

//! Blitz command formatting
//!
//! Instead of generating load itself, a run can print a `blitz curl` command
//! that makes the Blitz service walk the sampled fixtures through its
//! `#{tags}` variable.

use serde::Deserialize;

use crate::config::EndpointConfig;
use crate::fixture::FixtureSet;

/// Placeholder Blitz substitutes with one entry of the `tags` list
pub const TAGS_PLACEHOLDER: &str = "#{tags}";

/// Static Blitz rush settings
#[derive(Debug, Clone, Deserialize)]
pub struct BlitzSettings {
    /// Concurrent users at the start of the rush
    pub min: u32,
    /// Concurrent users at the end of the rush
    pub max: u32,
    /// Rush duration in seconds
    pub duration: u32,
    /// Per-request timeout in milliseconds
    pub timeout: u32,
}

impl BlitzSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.min == 0 || self.max == 0 {
            return Err("blitz.min and blitz.max must be at least 1".to_string());
        }
        if self.min > self.max {
            return Err(format!(
                "blitz.min ({}) must not exceed blitz.max ({})",
                self.min, self.max
            ));
        }
        if self.duration == 0 {
            return Err("blitz.duration must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Render the `blitz curl` command for a fixture set
///
/// Each fixture becomes one `%2C`-joined list entry; entries are separated by
/// a plain comma.
pub fn format_command(
    fixtures: &FixtureSet,
    settings: &BlitzSettings,
    endpoint: &EndpointConfig,
) -> String {
    let lists = fixtures
        .iter()
        .map(|fixture| fixture.encode())
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "blitz curl -b {}-{}:{} -T {} -v:tags 'list[{}]' 'http://{}{}{}'",
        settings.min,
        settings.max,
        settings.duration,
        settings.timeout,
        lists,
        endpoint.hostname,
        endpoint.path,
        TAGS_PLACEHOLDER,
    )
}

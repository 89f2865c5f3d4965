// Feed metadata: what ESDR returns for existing feeds, what we send to
// create one, and the checks applied to the user's answers.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

/// Longest feed name ESDR accepts.
pub const MAX_FEED_NAME_LEN: usize = 255;

/// A feed as listed or created by ESDR. Only the fields we use are kept.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub api_key: String,
    #[serde(default)]
    pub api_key_read_only: String,
    #[serde(default, deserialize_with = "truthy")]
    pub is_public: bool,
}

impl Feed {
    /// Value of the `feed` query parameter in the plot viewer URL: the feed
    /// id for public feeds, the read-only API key otherwise.
    pub fn viewer_key(&self) -> String {
        if self.is_public {
            self.id.to_string()
        } else {
            self.api_key_read_only.clone()
        }
    }

    pub fn viewer_url(&self, plot_page: &Path) -> String {
        format!("file://{}?feed={}", plot_page.display(), self.viewer_key())
    }
}

// ESDR reports booleans as either `true`/`false` or 0/1.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        serde_json::Value::String(s) => !s.is_empty(),
        _ => false,
    })
}

/// Body of the create-feed request. Flamingos are always outdoor and never
/// mobile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeed {
    pub name: String,
    pub exposure: &'static str,
    pub is_public: bool,
    pub is_mobile: bool,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewFeed {
    pub fn new(name: String, is_public: bool, latitude: f64, longitude: f64) -> Self {
        Self {
            name,
            exposure: "outdoor",
            is_public,
            is_mobile: false,
            latitude,
            longitude,
        }
    }
}

/// Trimmed feed name if it is 1 to 255 characters long.
pub fn validate_feed_name(input: &str) -> Option<String> {
    let name = input.trim();
    let len = name.chars().count();
    if (1..=MAX_FEED_NAME_LEN).contains(&len) {
        Some(name.to_string())
    } else {
        None
    }
}

fn parse_in_range(input: &str, min: f64, max: f64) -> Option<f64> {
    let value: f64 = input.trim().parse().ok()?;
    if value >= min && value <= max {
        Some(value)
    } else {
        None
    }
}

pub fn parse_latitude(input: &str) -> Option<f64> {
    parse_in_range(input, -90.0, 90.0)
}

pub fn parse_longitude(input: &str) -> Option<f64> {
    parse_in_range(input, -180.0, 180.0)
}

/// Interpret a yes/no answer where an empty answer means yes.
pub fn is_yes(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "" | "y" | "yes" | "true" | "1"
    )
}

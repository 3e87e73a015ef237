use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::Status;

const FALLBACK_HEX: &str = "#6b7280";

const DEFAULT_COLORS: [(Status, &str); 10] = [
    (Status::Applied, "#3b82f6"),
    (Status::PhoneScreen, "#f59e0b"),
    (Status::TechnicalInterview, "#f97316"),
    (Status::OnsiteInterview, "#ef4444"),
    (Status::FinalInterview, "#8b5cf6"),
    (Status::Offered, "#10b981"),
    (Status::Accepted, "#059669"),
    (Status::Rejected, "#dc2626"),
    (Status::Withdrawn, "#6b7280"),
    (Status::FollowUp, "#8b5cf6"),
];

/// Chart colours per status, keyed by status label in `config.toml`:
///
/// ```toml
/// [palette]
/// "Phone Screen" = "#f59e0b"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusPalette {
    colors: BTreeMap<String, String>,
}

impl Default for StatusPalette {
    fn default() -> Self {
        let colors = DEFAULT_COLORS
            .iter()
            .map(|(status, hex)| (status.label().to_string(), (*hex).to_string()))
            .collect();
        Self { colors }
    }
}

impl StatusPalette {
    /// Drops entries that name no status or hold no valid colour, re-keys the
    /// rest by canonical label, then fills gaps from the defaults.
    pub fn sanitize(&mut self) {
        let mut colors = BTreeMap::new();
        for (key, hex) in std::mem::take(&mut self.colors) {
            let Ok(status) = Status::from_str(&key) else {
                tracing::warn!(label = %key, "unknown status in palette, ignoring");
                continue;
            };
            if parse_hex(&hex).is_none() {
                tracing::warn!(label = %key, %hex, "invalid palette colour, using default");
                continue;
            }
            let label = status.label();
            // an exact label beats an alias like "offered"
            if key == label {
                colors.insert(label.to_string(), hex);
            } else {
                colors.entry(label.to_string()).or_insert(hex);
            }
        }
        for (status, hex) in DEFAULT_COLORS {
            colors
                .entry(status.label().to_string())
                .or_insert_with(|| hex.to_string());
        }
        self.colors = colors;
    }

    pub fn rgb(&self, status: Status) -> (u8, u8, u8) {
        self.colors
            .get(status.label())
            .and_then(|hex| parse_hex(hex))
            .or_else(|| parse_hex(FALLBACK_HEX))
            .unwrap_or((107, 114, 128))
    }
}

fn parse_hex(raw: &str) -> Option<(u8, u8, u8)> {
    let digits = raw.trim().strip_prefix('#')?;
    if digits.len() != 6 || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

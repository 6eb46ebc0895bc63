//! Strategy configuration.
//!
//! Every threshold that historically varied between versions of the
//! methodology is a named field here instead of a constant. All fields have
//! defaults, so a partial TOML table is valid input.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::{SessionTable, SessionWindow};

/// Setup-time configuration problems. Raised before any candle is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("at least one session window is required")]
    NoSessionWindows,

    #[error("session window '{name}' is empty or crosses midnight")]
    EmptyWindow { name: String },

    #[error("session windows '{first}' and '{second}' overlap")]
    OverlappingWindows { first: String, second: String },

    #[error("session window name '{name}' is used more than once")]
    DuplicateWindowName { name: String },

    #[error("r_multiple must be positive, got {0}")]
    NonPositiveRMultiple(f64),

    #[error("{field} must be at least 1")]
    NonPositiveLookback { field: &'static str },

    #[error("{field} must be a finite non-negative number, got {value}")]
    InvalidThreshold { field: &'static str, value: f64 },

    #[error("risk_per_trade_pct must be in (0, 100], got {0}")]
    InvalidRiskPct(f64),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where the retracement zone is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSource {
    /// Most recent matching zone fully formed before the earliest window.
    #[default]
    PreWindow,
    /// Zones completed inside the session window while it is scanned.
    SessionWindow,
}

/// What counts as an engulfing confirmation candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngulfRule {
    /// Body contains the previous body.
    #[default]
    Body,
    /// Close beyond the previous candle's wick (high for longs, low for shorts).
    WickClose,
}

/// How the protective stop is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopRule {
    /// Second-most-recent opposite swing before confirmation, with a
    /// three-candle extreme as fallback.
    #[default]
    SecondSwing,
    /// Extreme of the confirmation candle and its predecessor.
    EngulfExtreme,
}

/// Resolution of candles whose range touches both stop and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntrabarPolicy {
    /// Stop fires first (conservative).
    #[default]
    WorstCase,
    /// Target fires first (optimistic).
    BestCase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub swing_lookback: usize,
    pub min_pre_window_candles: usize,
    pub min_dominant_move: f64,
    pub manipulation_lookback_candles: usize,
    pub manipulation_recency_candles: usize,
    pub min_impulse_move: f64,
    pub engulf_min_ratio: f64,
    pub r_multiple: f64,
    pub risk_per_trade_pct: f64,
    pub zone_source: ZoneSource,
    pub engulf_rule: EngulfRule,
    pub stop_rule: StopRule,
    /// Only swings whose right-hand lookback closed before confirmation may place the stop.
    pub require_confirmed_swings: bool,
    pub intrabar_policy: IntrabarPolicy,
    /// Kept last so TOML output places the window tables after plain values.
    pub session_windows: Vec<SessionWindow>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            swing_lookback: 2,
            min_pre_window_candles: 3,
            min_dominant_move: 40.0,
            manipulation_lookback_candles: 20,
            manipulation_recency_candles: 15,
            min_impulse_move: 60.0,
            engulf_min_ratio: 0.7,
            r_multiple: 3.0,
            risk_per_trade_pct: 1.0,
            zone_source: ZoneSource::default(),
            engulf_rule: EngulfRule::default(),
            stop_rule: StopRule::default(),
            require_confirmed_swings: false,
            intrabar_policy: IntrabarPolicy::default(),
            session_windows: vec![
                SessionWindow::hm("LONDON", (3, 0), (6, 0)),
                SessionWindow::hm("NEWYORK", (8, 30), (11, 30)),
            ],
        }
    }
}

impl StrategyConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> String {
        // Plain structs of strings, numbers, and enums always serialize.
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Check every parameter and build the session table.
    pub fn validate(&self) -> Result<SessionTable, ConfigError> {
        if !(self.r_multiple > 0.0 && self.r_multiple.is_finite()) {
            return Err(ConfigError::NonPositiveRMultiple(self.r_multiple));
        }
        for (field, value) in [
            ("swing_lookback", self.swing_lookback),
            ("min_pre_window_candles", self.min_pre_window_candles),
            (
                "manipulation_lookback_candles",
                self.manipulation_lookback_candles,
            ),
            (
                "manipulation_recency_candles",
                self.manipulation_recency_candles,
            ),
        ] {
            if value == 0 {
                return Err(ConfigError::NonPositiveLookback { field });
            }
        }
        for (field, value) in [
            ("min_dominant_move", self.min_dominant_move),
            ("min_impulse_move", self.min_impulse_move),
            ("engulf_min_ratio", self.engulf_min_ratio),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidThreshold { field, value });
            }
        }
        if !(self.risk_per_trade_pct > 0.0 && self.risk_per_trade_pct <= 100.0) {
            return Err(ConfigError::InvalidRiskPct(self.risk_per_trade_pct));
        }
        SessionTable::new(self.session_windows.clone())
    }

    /// BLAKE3 hash of the canonical JSON form. Identical configs hash identically.
    pub fn full_hash(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let table = StrategyConfig::default().validate().unwrap();
        assert_eq!(table.windows().len(), 2);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg = StrategyConfig::from_toml_str(
            r#"
r_multiple = 4.0
stop_rule = "engulf_extreme"

[[session_windows]]
name = "NY"
start = "08:30"
end = "11:30"
"#,
        )
        .unwrap();
        assert_eq!(cfg.r_multiple, 4.0);
        assert_eq!(cfg.stop_rule, StopRule::EngulfExtreme);
        assert_eq!(cfg.engulf_min_ratio, 0.7);
        assert_eq!(cfg.session_windows.len(), 1);
    }

    #[test]
    fn rejects_non_positive_r_multiple() {
        let cfg = StrategyConfig {
            r_multiple: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositiveRMultiple(_))
        ));
    }

    #[test]
    fn rejects_zero_lookback() {
        let cfg = StrategyConfig {
            swing_lookback: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositiveLookback {
                field: "swing_lookback"
            })
        ));
    }

    #[test]
    fn rejects_negative_threshold() {
        let cfg = StrategyConfig {
            min_impulse_move: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidThreshold { field: "min_impulse_move", .. })
        ));
    }

    #[test]
    fn rejects_bad_risk_pct() {
        let cfg = StrategyConfig {
            risk_per_trade_pct: 0.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidRiskPct(_))));
    }

    #[test]
    fn toml_parse_error_is_reported() {
        let err = StrategyConfig::from_toml_str("r_multiple = \"three\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = StrategyConfig::default();
        let text = cfg.to_toml_string();
        let back = StrategyConfig::from_toml_str(&text).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn hash_is_deterministic_and_param_sensitive() {
        let a = StrategyConfig::default();
        let mut b = a.clone();
        assert_eq!(a.full_hash(), b.full_hash());
        b.r_multiple = 4.0;
        assert_ne!(a.full_hash(), b.full_hash());
    }
}

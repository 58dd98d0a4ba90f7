//! Strategy catalog, parameters and validation.
//!
//! A strategy is selected by id from a closed catalog. Its free parameters
//! arrive as a name → number map, are checked against each parameter's
//! declared domain, and are then frozen into a typed `Strategy` variant.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::StratbenchError;
use crate::domain::indicator::IndicatorType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Momentum,
    MeanReversion,
    Breakout,
    DualMovingAverage,
}

/// Domain of a single strategy parameter.
/// Longest accepted window length.
pub const MAX_PERIOD: usize = u32::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    /// Integer window length in `min..=MAX_PERIOD`.
    Period { min: usize },
    NonNegative,
    Positive,
    /// Fraction of cash in (0, 1].
    Fraction,
}

impl Domain {
    fn check(&self, value: f64) -> Result<(), String> {
        if !value.is_finite() {
            return Err("must be finite".to_string());
        }
        match *self {
            Domain::Period { min } => {
                if value.fract() != 0.0 || value < min as f64 || value > MAX_PERIOD as f64 {
                    return Err(format!("must be an integer in {min}..={MAX_PERIOD}"));
                }
            }
            Domain::NonNegative => {
                if value < 0.0 {
                    return Err("must be >= 0".to_string());
                }
            }
            Domain::Positive => {
                if value <= 0.0 {
                    return Err("must be > 0".to_string());
                }
            }
            Domain::Fraction => {
                if value <= 0.0 || value > 1.0 {
                    return Err("must be in (0, 1]".to_string());
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Period { min } => write!(f, "integer in {min}..={MAX_PERIOD}"),
            Domain::NonNegative => write!(f, ">= 0"),
            Domain::Positive => write!(f, "> 0"),
            Domain::Fraction => write!(f, "(0, 1]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub default: f64,
    pub domain: Domain,
}

const fn spec(name: &'static str, default: f64, domain: Domain) -> ParameterSpec {
    ParameterSpec {
        name,
        default,
        domain,
    }
}

const MOMENTUM_PARAMS: &[ParameterSpec] = &[
    spec("lookback_period", 20.0, Domain::Period { min: 1 }),
    spec("threshold", 0.02, Domain::NonNegative),
    spec("position_size", 0.1, Domain::Fraction),
];

const MEAN_REVERSION_PARAMS: &[ParameterSpec] = &[
    spec("lookback_period", 50.0, Domain::Period { min: 2 }),
    spec("std_threshold", 2.0, Domain::Positive),
    spec("position_size", 0.15, Domain::Fraction),
];

const BREAKOUT_PARAMS: &[ParameterSpec] = &[
    spec("breakout_period", 20.0, Domain::Period { min: 1 }),
    spec("volume_multiplier", 1.5, Domain::Positive),
    spec("volume_period", 20.0, Domain::Period { min: 1 }),
    spec("position_size", 0.12, Domain::Fraction),
];

const DUAL_MA_PARAMS: &[ParameterSpec] = &[
    spec("fast_period", 10.0, Domain::Period { min: 1 }),
    spec("slow_period", 30.0, Domain::Period { min: 1 }),
    spec("position_size", 0.08, Domain::Fraction),
];

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Momentum,
        StrategyKind::MeanReversion,
        StrategyKind::Breakout,
        StrategyKind::DualMovingAverage,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            StrategyKind::Momentum => "momentum",
            StrategyKind::MeanReversion => "mean_reversion",
            StrategyKind::Breakout => "breakout",
            StrategyKind::DualMovingAverage => "dual_moving_average",
        }
    }

    pub fn parameter_specs(&self) -> &'static [ParameterSpec] {
        match self {
            StrategyKind::Momentum => MOMENTUM_PARAMS,
            StrategyKind::MeanReversion => MEAN_REVERSION_PARAMS,
            StrategyKind::Breakout => BREAKOUT_PARAMS,
            StrategyKind::DualMovingAverage => DUAL_MA_PARAMS,
        }
    }

    pub fn parameter_spec(&self, name: &str) -> Option<&'static ParameterSpec> {
        self.parameter_specs().iter().find(|s| s.name == name)
    }

    pub fn default_parameters(&self) -> StrategyParameters {
        self.parameter_specs()
            .iter()
            .map(|s| (s.name.to_string(), s.default))
            .collect()
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for StrategyKind {
    type Err = StratbenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.id() == wanted)
            .ok_or_else(|| StratbenchError::UnknownStrategy { id: s.to_string() })
    }
}

/// Parameter name → numeric value. Ordered by name so that serialization
/// and display are stable.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct StrategyParameters(BTreeMap<String, f64>);

impl StrategyParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.0.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for StrategyParameters {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        StrategyParameters(iter.into_iter().collect())
    }
}

impl fmt::Display for StrategyParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// A validated strategy with its parameters frozen for the run.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Momentum {
        lookback_period: usize,
        threshold: f64,
        position_size: f64,
    },
    MeanReversion {
        lookback_period: usize,
        std_threshold: f64,
        position_size: f64,
    },
    Breakout {
        breakout_period: usize,
        volume_multiplier: f64,
        volume_period: usize,
        position_size: f64,
    },
    DualMovingAverage {
        fast_period: usize,
        slow_period: usize,
        position_size: f64,
    },
}

/// Validated view over a parameter map with defaults filled in.
struct Resolved<'a> {
    kind: StrategyKind,
    params: &'a StrategyParameters,
}

impl Resolved<'_> {
    fn value(&self, name: &str) -> f64 {
        self.params
            .get(name)
            .or_else(|| self.kind.parameter_spec(name).map(|s| s.default))
            .unwrap_or(f64::NAN)
    }

    fn period(&self, name: &str) -> usize {
        self.value(name) as usize
    }
}

impl Strategy {
    pub fn from_id(id: &str, params: &StrategyParameters) -> Result<Self, StratbenchError> {
        Self::from_parameters(id.parse()?, params)
    }

    /// Validate `params` against `kind`'s declared domains. Unknown names and
    /// out-of-domain values are errors; omitted parameters take defaults.
    pub fn from_parameters(
        kind: StrategyKind,
        params: &StrategyParameters,
    ) -> Result<Self, StratbenchError> {
        for (name, _) in params.iter() {
            if kind.parameter_spec(name).is_none() {
                return Err(StratbenchError::UnknownParameter {
                    strategy: kind.id().to_string(),
                    parameter: name.to_string(),
                });
            }
        }

        let resolved = Resolved { kind, params };
        for spec in kind.parameter_specs() {
            let value = resolved.value(spec.name);
            spec.domain
                .check(value)
                .map_err(|reason| StratbenchError::ParameterOutOfDomain {
                    strategy: kind.id().to_string(),
                    parameter: spec.name.to_string(),
                    value,
                    reason,
                })?;
        }

        let strategy = match kind {
            StrategyKind::Momentum => Strategy::Momentum {
                lookback_period: resolved.period("lookback_period"),
                threshold: resolved.value("threshold"),
                position_size: resolved.value("position_size"),
            },
            StrategyKind::MeanReversion => Strategy::MeanReversion {
                lookback_period: resolved.period("lookback_period"),
                std_threshold: resolved.value("std_threshold"),
                position_size: resolved.value("position_size"),
            },
            StrategyKind::Breakout => Strategy::Breakout {
                breakout_period: resolved.period("breakout_period"),
                volume_multiplier: resolved.value("volume_multiplier"),
                volume_period: resolved.period("volume_period"),
                position_size: resolved.value("position_size"),
            },
            StrategyKind::DualMovingAverage => {
                let fast_period = resolved.period("fast_period");
                let slow_period = resolved.period("slow_period");
                if fast_period >= slow_period {
                    return Err(StratbenchError::ParameterOutOfDomain {
                        strategy: kind.id().to_string(),
                        parameter: "fast_period".to_string(),
                        value: fast_period as f64,
                        reason: format!("must be less than slow_period ({slow_period})"),
                    });
                }
                Strategy::DualMovingAverage {
                    fast_period,
                    slow_period,
                    position_size: resolved.value("position_size"),
                }
            }
        };
        Ok(strategy)
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Momentum { .. } => StrategyKind::Momentum,
            Strategy::MeanReversion { .. } => StrategyKind::MeanReversion,
            Strategy::Breakout { .. } => StrategyKind::Breakout,
            Strategy::DualMovingAverage { .. } => StrategyKind::DualMovingAverage,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().id()
    }

    pub fn position_size(&self) -> f64 {
        match *self {
            Strategy::Momentum { position_size, .. }
            | Strategy::MeanReversion { position_size, .. }
            | Strategy::Breakout { position_size, .. }
            | Strategy::DualMovingAverage { position_size, .. } => position_size,
        }
    }

    /// The full parameter map, defaults included.
    pub fn parameters(&self) -> StrategyParameters {
        match *self {
            Strategy::Momentum {
                lookback_period,
                threshold,
                position_size,
            } => StrategyParameters::new()
                .with("lookback_period", lookback_period as f64)
                .with("threshold", threshold)
                .with("position_size", position_size),
            Strategy::MeanReversion {
                lookback_period,
                std_threshold,
                position_size,
            } => StrategyParameters::new()
                .with("lookback_period", lookback_period as f64)
                .with("std_threshold", std_threshold)
                .with("position_size", position_size),
            Strategy::Breakout {
                breakout_period,
                volume_multiplier,
                volume_period,
                position_size,
            } => StrategyParameters::new()
                .with("breakout_period", breakout_period as f64)
                .with("volume_multiplier", volume_multiplier)
                .with("volume_period", volume_period as f64)
                .with("position_size", position_size),
            Strategy::DualMovingAverage {
                fast_period,
                slow_period,
                position_size,
            } => StrategyParameters::new()
                .with("fast_period", fast_period as f64)
                .with("slow_period", slow_period as f64)
                .with("position_size", position_size),
        }
    }

    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        match *self {
            Strategy::Momentum {
                lookback_period, ..
            } => vec![IndicatorType::Sma(lookback_period)],
            Strategy::MeanReversion {
                lookback_period,
                std_threshold,
                ..
            } => vec![IndicatorType::bollinger(lookback_period, std_threshold)],
            Strategy::Breakout {
                breakout_period,
                volume_period,
                ..
            } => vec![
                IndicatorType::PriorHigh(breakout_period),
                IndicatorType::VolumeSma(volume_period),
            ],
            Strategy::DualMovingAverage {
                fast_period,
                slow_period,
                ..
            } => vec![
                IndicatorType::Sma(fast_period),
                IndicatorType::Sma(slow_period),
            ],
        }
    }
}

//! Risk-managed strategy: confidence-driven sizing and the backtest pipeline.
//!
//! prices → features → confidence → positions → simulation → summary

use crate::domain::backtest::{simulate, BacktestResult, ExitRule};
use crate::domain::confidence::score_batch;
use crate::domain::error::ConftraderError;
use crate::domain::features::{build_features, FeatureRow};
use crate::domain::ohlcv::{PriceBar, PriceField, PriceSeries};
use crate::domain::position::{
    kelly_capped_size, prob_up, realized_vol, vol_targeted_size, Position,
};
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyConfig {
    pub vol_target_daily: f64,
    pub max_leverage: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub kelly_cap: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            vol_target_daily: 0.012,
            max_leverage: 2.0,
            stop_loss_pct: 0.02,
            take_profit_pct: 0.03,
            kelly_cap: 0.5,
        }
    }
}

impl StrategyConfig {
    /// Higher vol target and leverage, wider take-profit.
    pub fn hi_target() -> Self {
        Self {
            vol_target_daily: 0.015,
            max_leverage: 2.5,
            stop_loss_pct: 0.02,
            take_profit_pct: 0.04,
            kelly_cap: 0.6,
        }
    }

    pub fn validate(&self) -> Result<(), ConftraderError> {
        let invalid = |name: &str, reason: &str| ConftraderError::InvalidParameter {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if !(self.vol_target_daily.is_finite() && self.vol_target_daily > 0.0) {
            return Err(invalid("vol_target_daily", "must be positive"));
        }
        if !(self.max_leverage.is_finite() && self.max_leverage > 0.0) {
            return Err(invalid("max_leverage", "must be positive"));
        }
        if !(self.stop_loss_pct > 0.0 && self.stop_loss_pct < 1.0) {
            return Err(invalid("stop_loss_pct", "must be between 0 and 1 (exclusive)"));
        }
        if !(self.take_profit_pct > 0.0 && self.take_profit_pct < 1.0) {
            return Err(invalid("take_profit_pct", "must be between 0 and 1 (exclusive)"));
        }
        if !(0.0..=1.0).contains(&self.kelly_cap) {
            return Err(invalid("kelly_cap", "must be between 0 and 1"));
        }
        Ok(())
    }
}

/// Named parameter sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    Default,
    HiTarget,
}

impl Preset {
    pub fn config(self) -> StrategyConfig {
        match self {
            Preset::Default => StrategyConfig::default(),
            Preset::HiTarget => StrategyConfig::hi_target(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Default => f.write_str("default"),
            Preset::HiTarget => f.write_str("hi_target"),
        }
    }
}

impl FromStr for Preset {
    type Err = ConftraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "default" => Ok(Preset::Default),
            "hi_target" => Ok(Preset::HiTarget),
            other => Err(ConftraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "preset".into(),
                reason: format!("unknown preset '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskManagedStrategy {
    config: StrategyConfig,
}

impl RiskManagedStrategy {
    pub fn new(config: StrategyConfig) -> Result<Self, ConftraderError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Size in [0, max_leverage] for one bar.
    pub fn size_for(&self, confidence: f64, prob_up: f64, realized_vol: f64) -> f64 {
        let c = &self.config;
        let size = vol_targeted_size(confidence, realized_vol, c.vol_target_daily, c.max_leverage);
        kelly_capped_size(size, prob_up, c.kelly_cap, c.max_leverage)
    }

    /// Positions for every timestamp present in both `prices` and `features`.
    ///
    /// Confidence ranks are computed over exactly the aligned rows.
    pub fn generate_positions(
        &self,
        prices: &PriceSeries,
        price: PriceField,
        features: &[FeatureRow],
    ) -> Vec<Position> {
        self.positions_for(&align(prices.bars(), features), price)
    }

    fn positions_for(&self, aligned: &[(&PriceBar, &FeatureRow)], price: PriceField) -> Vec<Position> {
        let rows: Vec<FeatureRow> = aligned.iter().map(|(_, row)| (*row).clone()).collect();
        let confidence = score_batch(&rows);

        aligned
            .iter()
            .zip(confidence)
            .map(|((bar, row), conf)| {
                let p = prob_up(conf);
                Position {
                    timestamp: bar.timestamp,
                    close: bar.price(price),
                    prob_up: p,
                    confidence: conf,
                    size: self.size_for(conf, p, realized_vol(row)),
                }
            })
            .collect()
    }

    pub fn backtest(&self, prices: &PriceSeries, price: PriceField) -> BacktestResult {
        let features = build_features(prices, price);
        let aligned = align(prices.bars(), &features);
        if aligned.is_empty() {
            tracing::warn!(
                bars = prices.len(),
                "insufficient history for a complete feature row; returning empty result"
            );
            return BacktestResult::from_bars(Vec::new());
        }

        let positions = self.positions_for(&aligned, price);
        let bars: Vec<PriceBar> = aligned.iter().map(|(bar, _)| (*bar).clone()).collect();

        let exits = ExitRule {
            stop_loss_pct: self.config.stop_loss_pct,
            take_profit_pct: self.config.take_profit_pct,
        };
        let result = BacktestResult::from_bars(simulate(&positions, &bars, exits));

        tracing::debug!(
            bars = result.summary.bars,
            final_equity = result.summary.final_equity,
            "backtest complete"
        );
        result
    }
}

/// Inner join of bars and feature rows on timestamp. Both inputs ascend.
fn align<'a>(bars: &'a [PriceBar], features: &'a [FeatureRow]) -> Vec<(&'a PriceBar, &'a FeatureRow)> {
    let mut out = Vec::with_capacity(features.len());
    let (mut i, mut j) = (0, 0);
    while i < bars.len() && j < features.len() {
        match bars[i].timestamp.cmp(&features[j].timestamp) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push((&bars[i], &features[j]));
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Backtests each named series independently, in parallel, keeping input order.
pub fn run_many(
    strategy: &RiskManagedStrategy,
    inputs: &[(String, PriceSeries)],
    price: PriceField,
) -> Vec<(String, BacktestResult)> {
    inputs
        .par_iter()
        .map(|(name, series)| (name.clone(), strategy.backtest(series, price)))
        .collect()
}

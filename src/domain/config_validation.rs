//! Configuration validation and resolution.
//!
//! Validates all config fields before a backtest runs, then resolves the
//! strategy parameters: the `[backtest] preset` supplies defaults and any
//! `[strategy]` keys override them.

use crate::domain::error::ConftraderError;
use crate::domain::ohlcv::PriceField;
use crate::domain::strategy::{Preset, StrategyConfig};
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), ConftraderError> {
    validate_data_dir(config)?;
    parse_symbols(config)?;
    price_field(config)?;
    preset(config)?;
    lookback_days(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), ConftraderError> {
    check_range(config, "vol_target_daily", |v| v > 0.0, "vol_target_daily must be positive")?;
    check_range(config, "max_leverage", |v| v > 0.0, "max_leverage must be positive")?;
    check_range(
        config,
        "stop_loss_pct",
        |v| v > 0.0 && v < 1.0,
        "stop_loss_pct must be between 0 and 1 (exclusive)",
    )?;
    check_range(
        config,
        "take_profit_pct",
        |v| v > 0.0 && v < 1.0,
        "take_profit_pct must be between 0 and 1 (exclusive)",
    )?;
    check_range(
        config,
        "kelly_cap",
        |v| (0.0..=1.0).contains(&v),
        "kelly_cap must be between 0 and 1",
    )?;
    Ok(())
}

/// `preset` parameters with `[strategy]` overrides applied.
pub fn resolve_strategy_config(
    config: &dyn ConfigPort,
    preset: Preset,
) -> Result<StrategyConfig, ConftraderError> {
    validate_strategy_config(config)?;
    let base = preset.config();

    Ok(StrategyConfig {
        vol_target_daily: strategy_value(config, "vol_target_daily")?
            .unwrap_or(base.vol_target_daily),
        max_leverage: strategy_value(config, "max_leverage")?.unwrap_or(base.max_leverage),
        stop_loss_pct: strategy_value(config, "stop_loss_pct")?.unwrap_or(base.stop_loss_pct),
        take_profit_pct: strategy_value(config, "take_profit_pct")?
            .unwrap_or(base.take_profit_pct),
        kelly_cap: strategy_value(config, "kelly_cap")?.unwrap_or(base.kelly_cap),
    })
}

/// Comma-separated `[backtest] symbols`, trimmed and upper-cased.
pub fn parse_symbols(config: &dyn ConfigPort) -> Result<Vec<String>, ConftraderError> {
    let symbols: Vec<String> = config
        .get_string("backtest", "symbols")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    if symbols.is_empty() {
        return Err(ConftraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbols".to_string(),
        });
    }
    Ok(symbols)
}

/// `[backtest] price_col`, defaulting to close.
pub fn price_field(config: &dyn ConfigPort) -> Result<PriceField, ConftraderError> {
    match config.get_string("backtest", "price_col") {
        Some(s) if !s.trim().is_empty() => s.parse(),
        _ => Ok(PriceField::default()),
    }
}

/// `[backtest] preset`, defaulting to `default`.
pub fn preset(config: &dyn ConfigPort) -> Result<Preset, ConftraderError> {
    match config.get_string("backtest", "preset") {
        Some(s) if !s.trim().is_empty() => s.parse(),
        _ => Ok(Preset::default()),
    }
}

/// Optional `[backtest] lookback_days`: a positive whole number of days.
pub fn lookback_days(config: &dyn ConfigPort) -> Result<Option<u32>, ConftraderError> {
    match config.get_string("backtest", "lookback_days") {
        Some(s) if !s.trim().is_empty() => parse_lookback_days(&s).map(Some),
        _ => Ok(None),
    }
}

fn parse_lookback_days(raw: &str) -> Result<u32, ConftraderError> {
    match raw.trim().parse::<u32>() {
        Ok(days) => check_lookback_days(days),
        Err(_) => Err(invalid_lookback(raw.trim())),
    }
}

/// Rejects a zero-day window.
pub fn check_lookback_days(days: u32) -> Result<u32, ConftraderError> {
    if days == 0 {
        return Err(invalid_lookback("0"));
    }
    Ok(days)
}

fn invalid_lookback(raw: &str) -> ConftraderError {
    ConftraderError::ConfigInvalid {
        section: "backtest".to_string(),
        key: "lookback_days".to_string(),
        reason: format!("'{raw}' is not a positive number of days"),
    }
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), ConftraderError> {
    match config.get_string("data", "dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(ConftraderError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        }),
    }
}

fn strategy_value(config: &dyn ConfigPort, key: &str) -> Result<Option<f64>, ConftraderError> {
    let Some(raw) = config
        .get_string("strategy", key)
        .filter(|s| !s.trim().is_empty())
    else {
        return Ok(None);
    };
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| ConftraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: key.to_string(),
            reason: format!("'{raw}' is not a number"),
        })
}

fn check_range(
    config: &dyn ConfigPort,
    key: &str,
    ok: impl Fn(f64) -> bool,
    reason: &str,
) -> Result<(), ConftraderError> {
    match strategy_value(config, key)? {
        Some(v) if !ok(v) => Err(ConftraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[data]
dir = ./data

[backtest]
symbols = AAPL, msft
price_col = close
preset = hi_target
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
        assert_eq!(parse_symbols(&config).unwrap(), vec!["AAPL", "MSFT"]);
        assert_eq!(preset(&config).unwrap(), Preset::HiTarget);
    }

    #[test]
    fn missing_data_dir_fails() {
        let config = make_config("[backtest]\nsymbols = AAPL\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, ConftraderError::ConfigMissing { key, .. } if key == "dir"));
    }

    #[test]
    fn missing_symbols_fails() {
        let config = make_config("[data]\ndir = d\n[backtest]\nsymbols = , ,\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, ConftraderError::ConfigMissing { key, .. } if key == "symbols"));
    }

    #[test]
    fn unknown_price_col_fails() {
        let config = make_config("[data]\ndir = d\n[backtest]\nsymbols = A\nprice_col = vwap\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, ConftraderError::ConfigInvalid { key, .. } if key == "price_col"));
    }

    #[test]
    fn unknown_preset_fails() {
        let config = make_config("[data]\ndir = d\n[backtest]\nsymbols = A\npreset = yolo\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, ConftraderError::ConfigInvalid { key, .. } if key == "preset"));
    }

    #[test]
    fn lookback_days_optional_and_positive() {
        let config = make_config("[data]\ndir = d\n[backtest]\nsymbols = A\n");
        assert_eq!(lookback_days(&config).unwrap(), None);

        let config = make_config("[data]\ndir = d\n[backtest]\nsymbols = A\nlookback_days = 90\n");
        assert_eq!(lookback_days(&config).unwrap(), Some(90));

        for bad in ["0", "-5", "ninety", "1.5"] {
            let config = make_config(&format!(
                "[data]\ndir = d\n[backtest]\nsymbols = A\nlookback_days = {bad}\n"
            ));
            let err = validate_backtest_config(&config).unwrap_err();
            assert!(matches!(err, ConftraderError::ConfigInvalid { key, .. } if key == "lookback_days"));
        }
    }

    #[test]
    fn price_col_defaults_to_close() {
        let config = make_config("[backtest]\nsymbols = A\n");
        assert_eq!(price_field(&config).unwrap(), PriceField::Close);
    }

    #[test]
    fn empty_strategy_section_is_valid() {
        let config = make_config("[strategy]\n");
        assert!(validate_strategy_config(&config).is_ok());
        assert_eq!(
            resolve_strategy_config(&config, Preset::Default).unwrap(),
            StrategyConfig::default()
        );
    }

    #[test]
    fn overrides_apply_on_top_of_preset() {
        let config = make_config(
            "[backtest]\npreset = hi_target\n[strategy]\nmax_leverage = 1.5\nkelly_cap = 0.25\n",
        );
        let resolved = resolve_strategy_config(&config, preset(&config).unwrap()).unwrap();
        assert_eq!(resolved.max_leverage, 1.5);
        assert_eq!(resolved.kelly_cap, 0.25);
        assert_eq!(resolved.vol_target_daily, 0.015);
        assert_eq!(resolved.take_profit_pct, 0.04);
    }

    #[test]
    fn non_positive_leverage_fails() {
        let config = make_config("[strategy]\nmax_leverage = 0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, ConftraderError::ConfigInvalid { key, .. } if key == "max_leverage"));
    }

    #[test]
    fn non_positive_vol_target_fails() {
        let config = make_config("[strategy]\nvol_target_daily = -0.01\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(
            matches!(err, ConftraderError::ConfigInvalid { key, .. } if key == "vol_target_daily")
        );
    }

    #[test]
    fn stop_loss_out_of_range_fails() {
        let config = make_config("[strategy]\nstop_loss_pct = 1.0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, ConftraderError::ConfigInvalid { key, .. } if key == "stop_loss_pct"));
    }

    #[test]
    fn take_profit_zero_fails() {
        let config = make_config("[strategy]\ntake_profit_pct = 0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(
            matches!(err, ConftraderError::ConfigInvalid { key, .. } if key == "take_profit_pct")
        );
    }

    #[test]
    fn kelly_cap_above_one_fails() {
        let config = make_config("[strategy]\nkelly_cap = 1.2\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, ConftraderError::ConfigInvalid { key, .. } if key == "kelly_cap"));
    }

    #[test]
    fn non_numeric_value_fails() {
        let config = make_config("[strategy]\nmax_leverage = lots\n");
        let err = resolve_strategy_config(&config, Preset::HiTarget).unwrap_err();
        assert!(matches!(err, ConftraderError::ConfigInvalid { key, .. } if key == "max_leverage"));
    }
}

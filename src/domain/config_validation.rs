//! Configuration validation.
//!
//! Validates all config fields before a session is built. Errors here are
//! fatal at configuration time; nothing is computed afterwards.

use crate::domain::error::PapertraderError;
use crate::ports::config_port::ConfigPort;

pub fn validate_session_config(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    validate_symbol(config)?;
    validate_initial_balance(config)?;
    validate_signal_windows(config)?;
    validate_atr(config)?;
    validate_risk(config)?;
    Ok(())
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    match config.get_string("session", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(PapertraderError::ConfigMissing {
            section: "session".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn validate_initial_balance(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let value = config.get_double("session", "initial_balance", 0.0);
    if value < 0.0 {
        return Err(PapertraderError::ConfigInvalid {
            section: "session".to_string(),
            key: "initial_balance".to_string(),
            reason: "initial_balance must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_signal_windows(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let invalid = |key: &str, reason: &str| PapertraderError::ConfigInvalid {
        section: "signal".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let ema_fast = config.get_int("signal", "ema_fast", 9);
    let ema_slow = config.get_int("signal", "ema_slow", 21);
    if ema_fast < 1 {
        return Err(invalid("ema_fast", "must be a positive integer"));
    }
    if ema_slow < 1 {
        return Err(invalid("ema_slow", "must be a positive integer"));
    }
    if ema_fast >= ema_slow {
        return Err(invalid("ema_fast", "must be less than ema_slow"));
    }

    let macd_fast = config.get_int("signal", "macd_fast", 12);
    let macd_slow = config.get_int("signal", "macd_slow", 26);
    let macd_signal = config.get_int("signal", "macd_signal", 9);
    if macd_fast < 1 {
        return Err(invalid("macd_fast", "must be a positive integer"));
    }
    if macd_slow < 1 {
        return Err(invalid("macd_slow", "must be a positive integer"));
    }
    if macd_signal < 1 {
        return Err(invalid("macd_signal", "must be a positive integer"));
    }
    if macd_fast >= macd_slow {
        return Err(invalid("macd_fast", "must be less than macd_slow"));
    }

    Ok(())
}

fn validate_atr(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let period = config.get_int("signal", "atr_period", 14);
    if period < 1 {
        return Err(PapertraderError::ConfigInvalid {
            section: "signal".to_string(),
            key: "atr_period".to_string(),
            reason: "must be a positive integer".to_string(),
        });
    }
    let multiplier = config.get_double("signal", "atr_multiplier", 3.0);
    if multiplier <= 0.0 {
        return Err(PapertraderError::ConfigInvalid {
            section: "signal".to_string(),
            key: "atr_multiplier".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_risk(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let invalid = |key: &str, reason: &str| PapertraderError::ConfigInvalid {
        section: "risk".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let amount = config.get_double("risk", "amount_per_trade", 0.0);
    if amount <= 0.0 {
        return Err(invalid("amount_per_trade", "must be positive"));
    }

    let stop_loss = config.get_double("risk", "stop_loss_pct", 0.0);
    if stop_loss <= 0.0 || stop_loss >= 1.0 {
        return Err(invalid("stop_loss_pct", "must be between 0 and 1 exclusive"));
    }

    let take_profit = config.get_double("risk", "take_profit_pct", 0.0);
    if take_profit <= 0.0 || take_profit >= 1.0 {
        return Err(invalid(
            "take_profit_pct",
            "must be between 0 and 1 exclusive",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const VALID: &str = r#"
[session]
symbol = BTCUSDT
initial_balance = 10000.0
allow_shorting = false

[signal]
ema_fast = 9
ema_slow = 21
macd_fast = 12
macd_slow = 26
macd_signal = 9
atr_period = 14
atr_multiplier = 3.0
trend_filter = true

[risk]
amount_per_trade = 1000.0
stop_loss_pct = 0.02
take_profit_pct = 0.04
"#;

    #[test]
    fn valid_config_passes() {
        let config = make_config(VALID);
        assert!(validate_session_config(&config).is_ok());
    }

    #[test]
    fn missing_symbol_fails() {
        let config = make_config(
            "[session]\ninitial_balance = 100\n[risk]\namount_per_trade = 10\nstop_loss_pct = 0.1\ntake_profit_pct = 0.1\n",
        );
        let err = validate_session_config(&config).unwrap_err();
        assert!(matches!(err, PapertraderError::ConfigMissing { key, .. } if key == "symbol"));
    }

    #[test]
    fn negative_balance_fails() {
        let config = make_config("[session]\nsymbol = BTCUSDT\ninitial_balance = -1\n");
        let err = validate_session_config(&config).unwrap_err();
        assert!(
            matches!(err, PapertraderError::ConfigInvalid { key, .. } if key == "initial_balance")
        );
    }

    #[test]
    fn zero_balance_allowed() {
        let config = make_config(
            "[session]\nsymbol = BTCUSDT\ninitial_balance = 0\n[risk]\namount_per_trade = 10\nstop_loss_pct = 0.1\ntake_profit_pct = 0.1\n",
        );
        assert!(validate_session_config(&config).is_ok());
    }

    #[test]
    fn ema_fast_not_below_slow_fails() {
        let config = make_config(
            "[session]\nsymbol = BTCUSDT\n[signal]\nema_fast = 21\nema_slow = 21\n",
        );
        let err = validate_session_config(&config).unwrap_err();
        assert!(matches!(err, PapertraderError::ConfigInvalid { key, .. } if key == "ema_fast"));
    }

    #[test]
    fn zero_window_fails() {
        let config = make_config(
            "[session]\nsymbol = BTCUSDT\n[signal]\nema_fast = 0\nema_slow = 21\n",
        );
        let err = validate_session_config(&config).unwrap_err();
        assert!(matches!(err, PapertraderError::ConfigInvalid { key, .. } if key == "ema_fast"));
    }

    #[test]
    fn macd_fast_not_below_slow_fails() {
        let config = make_config(
            "[session]\nsymbol = BTCUSDT\n[signal]\nmacd_fast = 26\nmacd_slow = 26\n",
        );
        let err = validate_session_config(&config).unwrap_err();
        assert!(matches!(err, PapertraderError::ConfigInvalid { key, .. } if key == "macd_fast"));
    }

    #[test]
    fn non_positive_atr_multiplier_fails() {
        let config = make_config(
            "[session]\nsymbol = BTCUSDT\n[signal]\natr_multiplier = 0\n",
        );
        let err = validate_session_config(&config).unwrap_err();
        assert!(
            matches!(err, PapertraderError::ConfigInvalid { key, .. } if key == "atr_multiplier")
        );
    }

    #[test]
    fn missing_amount_per_trade_fails() {
        let config = make_config("[session]\nsymbol = BTCUSDT\n[risk]\nstop_loss_pct = 0.1\n");
        let err = validate_session_config(&config).unwrap_err();
        assert!(
            matches!(err, PapertraderError::ConfigInvalid { key, .. } if key == "amount_per_trade")
        );
    }

    #[test]
    fn stop_loss_out_of_range_fails() {
        let config = make_config(
            "[session]\nsymbol = BTCUSDT\n[risk]\namount_per_trade = 10\nstop_loss_pct = 1.5\ntake_profit_pct = 0.1\n",
        );
        let err = validate_session_config(&config).unwrap_err();
        assert!(
            matches!(err, PapertraderError::ConfigInvalid { key, .. } if key == "stop_loss_pct")
        );
    }

    #[test]
    fn take_profit_out_of_range_fails() {
        let config = make_config(
            "[session]\nsymbol = BTCUSDT\n[risk]\namount_per_trade = 10\nstop_loss_pct = 0.1\ntake_profit_pct = 0\n",
        );
        let err = validate_session_config(&config).unwrap_err();
        assert!(
            matches!(err, PapertraderError::ConfigInvalid { key, .. } if key == "take_profit_pct")
        );
    }
}

//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_bar_adapter::CsvBarAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::validate_session_config;
use crate::domain::error::PapertraderError;
use crate::domain::ledger::{TradeEvent, TradeSizingPolicy};
use crate::domain::session::{period_change_pct, Session, SessionConfig};
use crate::domain::signal::SignalConfig;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "papertrader", about = "Signal-driven paper-trading simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay bar data through a paper-trading session
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a session configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            data,
            symbol,
        } => run_session(&config, data, symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info {
            config,
            data,
            symbol,
        } => run_info(config.as_ref(), data, symbol.as_deref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = PapertraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Assemble a [`SessionConfig`] from a validated config source. Defaults
/// mirror the validation defaults, so a config that passed
/// [`validate_session_config`] always builds.
pub fn build_session_config(
    adapter: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<SessionConfig, PapertraderError> {
    let symbol = match symbol_override {
        Some(s) => s.to_uppercase(),
        None => adapter
            .get_string("session", "symbol")
            .ok_or_else(|| PapertraderError::ConfigMissing {
                section: "session".into(),
                key: "symbol".into(),
            })?,
    };

    Ok(SessionConfig {
        symbol,
        initial_balance: adapter.get_double("session", "initial_balance", 10_000.0),
        signal: SignalConfig {
            ema_fast: adapter.get_int("signal", "ema_fast", 9) as usize,
            ema_slow: adapter.get_int("signal", "ema_slow", 21) as usize,
            macd_fast: adapter.get_int("signal", "macd_fast", 12) as usize,
            macd_slow: adapter.get_int("signal", "macd_slow", 26) as usize,
            macd_signal: adapter.get_int("signal", "macd_signal", 9) as usize,
            atr_period: adapter.get_int("signal", "atr_period", 14) as usize,
            atr_multiplier: adapter.get_double("signal", "atr_multiplier", 3.0),
            trend_filter: adapter.get_bool("signal", "trend_filter", false),
        },
        sizing: TradeSizingPolicy {
            amount_per_trade: adapter.get_double("risk", "amount_per_trade", 0.0),
            stop_loss_pct: adapter.get_double("risk", "stop_loss_pct", 0.0),
            take_profit_pct: adapter.get_double("risk", "take_profit_pct", 0.0),
            allow_shorting: adapter.get_bool("session", "allow_shorting", false),
        },
    })
}

fn resolve_data_path(data_override: Option<PathBuf>, config: &dyn ConfigPort) -> PathBuf {
    data_override
        .or_else(|| config.get_string("data", "bars_path").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn run_session(
    config_path: &PathBuf,
    data_override: Option<PathBuf>,
    symbol_override: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_session_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let session_config = match build_session_config(&adapter, symbol_override) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_path = resolve_data_path(data_override, &adapter);
    let data_port = CsvBarAdapter::new(data_path);

    let bars = match data_port.fetch_bars(&session_config.symbol) {
        Ok(bars) => bars,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut session = match Session::new(session_config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let min_bars = session.min_bars();
    if bars.len() < min_bars {
        let err = PapertraderError::InsufficientData {
            symbol: session.symbol().to_string(),
            have: bars.len(),
            need: min_bars,
        };
        eprintln!("error: {err}");
        return (&err).into();
    }

    eprintln!(
        "Replaying {} bars for {} (warmup {})",
        bars.len(),
        session.symbol(),
        min_bars,
    );

    // Each tick sees the window as it would have existed live: the bars
    // up to and including the current one.
    for end in min_bars..=bars.len() {
        let window = &bars[..end];
        let last = &window[end - 1];

        let outcome = match session.tick(window, last.close, last.timestamp) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        if outcome.transitioned {
            println!("{}  signal {}  @ {:.2}", last.timestamp, outcome.signal, last.close);
        }
        match outcome.event {
            Some(TradeEvent::Opened(trade)) => {
                println!(
                    "{}  OPEN  {} {} @ {:.2} (amount {:.2}, stop {:.2}, target {:.2})",
                    last.timestamp,
                    trade.side,
                    trade.symbol,
                    trade.entry_price,
                    trade.amount_committed,
                    trade.stop_loss,
                    trade.take_profit,
                );
            }
            Some(TradeEvent::Closed(trade)) => {
                let pnl_sign = if trade.realized_pnl >= 0.0 { "+" } else { "" };
                println!(
                    "{}  CLOSE {} {} @ {:.2} ({}{:.2}, {})",
                    last.timestamp,
                    trade.side,
                    trade.symbol,
                    trade.exit_price,
                    pnl_sign,
                    trade.realized_pnl,
                    trade.exit_reason,
                );
            }
            None => {}
        }
    }

    let last_close = bars[bars.len() - 1].close;
    let summary = session.summary(last_close);

    eprintln!("\n=== Session Summary ===");
    eprintln!("Cash Balance:     {:.2}", summary.cash_balance);
    eprintln!("Equity:           {:.2}", summary.equity);
    eprintln!("Realized PnL:     {:.2}", summary.realized_pnl);
    eprintln!("Unrealized PnL:   {:.2}", summary.unrealized_pnl);
    eprintln!("Open Trades:      {}", summary.open_trades);
    eprintln!("Closed Trades:    {}", summary.closed_trades);
    if let Some(change) = period_change_pct(&bars) {
        eprintln!("Period Change:    {:.2}%", change);
    }

    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_session_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let session_config = match build_session_config(&adapter, None) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nSession:");
    eprintln!("  symbol:          {}", session_config.symbol);
    eprintln!("  initial balance: {:.2}", session_config.initial_balance);
    eprintln!("\nSignal pipeline:");
    eprintln!(
        "  EMA cross:       {}/{}",
        session_config.signal.ema_fast, session_config.signal.ema_slow
    );
    eprintln!(
        "  MACD:            {}/{}/{}",
        session_config.signal.macd_fast,
        session_config.signal.macd_slow,
        session_config.signal.macd_signal
    );
    eprintln!(
        "  ATR:             {} x{:.1} (trend filter {})",
        session_config.signal.atr_period,
        session_config.signal.atr_multiplier,
        if session_config.signal.trend_filter {
            "on"
        } else {
            "off"
        }
    );
    eprintln!("  warmup bars:     {}", session_config.signal.min_bars());
    eprintln!("\nRisk:");
    eprintln!(
        "  amount/trade:    {:.2}",
        session_config.sizing.amount_per_trade
    );
    eprintln!(
        "  stop loss:       {:.1}%",
        session_config.sizing.stop_loss_pct * 100.0
    );
    eprintln!(
        "  take profit:     {:.1}%",
        session_config.sizing.take_profit_pct * 100.0
    );
    eprintln!(
        "  shorting:        {}",
        if session_config.sizing.allow_shorting {
            "allowed"
        } else {
            "disabled"
        }
    );

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(
    config_path: Option<&PathBuf>,
    data_override: Option<PathBuf>,
    symbol: Option<&str>,
) -> ExitCode {
    let adapter = match config_path {
        Some(path) => match load_config(path) {
            Ok(a) => Some(a),
            Err(code) => return code,
        },
        None => None,
    };

    let data_path = match (&data_override, &adapter) {
        (Some(p), _) => p.clone(),
        (None, Some(a)) => resolve_data_path(None, a),
        (None, None) => {
            eprintln!("error: --data or --config is required for info");
            return ExitCode::from(1);
        }
    };

    let data_port = CsvBarAdapter::new(data_path);

    let symbols = match symbol {
        Some(s) => vec![s.to_uppercase()],
        None => match data_port.list_symbols() {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
        return ExitCode::SUCCESS;
    }

    for s in &symbols {
        match data_port.data_range(s) {
            Ok(Some((first, last, count))) => {
                println!("{}: {} bars, {} to {}", s, count, first, last);
            }
            Ok(None) => {
                eprintln!("{}: no data found", s);
            }
            Err(e) => {
                eprintln!("error querying {}: {}", s, e);
            }
        }
    }
    ExitCode::SUCCESS
}

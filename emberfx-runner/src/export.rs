//! Export — JSON and CSV artifact generation for a `BacktestResult` (§6).
//!
//! JSON carries the full `BacktestResult` with schema versioning; CSV gives
//! a trade tape and an equity curve for external analysis tools. Schema
//! versions newer than this crate's `SCHEMA_VERSION` are rejected on load,
//! mirroring the teacher's `export_json`/`import_json` contract.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use emberfx_core::domain::Side;

use crate::runner::{BacktestResult, SCHEMA_VERSION};

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

/// Export the trade tape as CSV, one row per closed trade.
pub fn export_trades_csv(result: &BacktestResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp_closed",
        "symbol",
        "side",
        "original_quantity",
        "entry_price",
        "exit_price",
        "realized_pnl",
        "strategy_name",
        "timestamp_opened",
        "breakeven_triggered",
        "partial_count",
        "closure_reason",
    ])?;

    for t in &result.trades {
        wtr.write_record([
            &t.closed_at.to_rfc3339(),
            t.symbol.as_str(),
            if t.side == Side::Long { "1" } else { "-1" }.to_string().as_str(),
            &format!("{:.6}", t.original_quantity),
            &format!("{:.6}", t.entry_price),
            &format!("{:.6}", t.exit_price),
            &format!("{:.2}", t.realized_pnl),
            t.strategy_name.as_str(),
            &t.opened_at.to_rfc3339(),
            if t.breakeven_triggered { "1" } else { "0" }.to_string().as_str(),
            &t.partial_close_history.len().to_string(),
            &t.closure_reason.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the bar-by-bar equity curve as CSV.
pub fn export_equity_csv(result: &BacktestResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "balance", "equity"])?;
    for ((ts, balance), equity) in result.timestamps.iter().zip(&result.balance_series).zip(&result.equity_series) {
        wtr.write_record([&ts.to_rfc3339(), &format!("{:.2}", balance), &format!("{:.2}", equity)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Save the full artifact set for a run into `output_dir/{symbol}_{timestamp}/`.
///
/// Writes `manifest.json`, `trades.csv`, and `equity.csv`. Returns the
/// created directory. `timestamp` is supplied by the caller rather than
/// read from the system clock, so artifact naming stays deterministic and
/// testable.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path, timestamp: &str) -> Result<PathBuf> {
    let run_dir = output_dir.join(format!("{}_{}", result.symbol, timestamp));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("manifest.json"), export_json(result)?)?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(result)?)?;
    std::fs::write(run_dir.join("equity.csv"), export_equity_csv(result)?)?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's `manifest.json`.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

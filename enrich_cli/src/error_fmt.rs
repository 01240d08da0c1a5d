//! Human-readable error descriptions and structured JSON error formatting.

use std::fmt;

/// Which input an error came from; attached as the outermost context so
/// exit codes and hints can be chosen without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Trace,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Config => f.write_str("invalid configuration"),
            Stage::Trace => f.write_str("invalid trace"),
        }
    }
}

fn cause_chain(err: &eyre::Report) -> String {
    err.chain()
        .skip(1)
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use enrich_core::error::{BuildError, EnrichError};

    let cause = cause_chain(err);

    // typed root causes first
    if let Some(e) = err.chain().find_map(|c| c.downcast_ref::<EnrichError>()) {
        return format!(
            "What happened: {e}.\nHow to fix: Choose a history length between 1 and {}.",
            enrich_core::MAX_HISTORY_LEN
        );
    }

    if let Some(be) = err.chain().find_map(|c| c.downcast_ref::<BuildError>()) {
        return format!(
            "What happened: {be} ({cause}).\nLikely causes: Table bins out of order or value grid size mismatch.\nHow to fix: Fix the table definition and rerun."
        );
    }

    if let Some(stage) = err.downcast_ref::<Stage>() {
        return match stage {
            Stage::Config => {
                let lower = cause.to_ascii_lowercase();
                if lower.contains("csv must have headers") {
                    return format!(
                        "What happened: Invalid headers in table CSV ({cause}).\nHow to fix: Throttle tables use 'from,to,extra_ms', tapers use 'distance,mult'."
                    );
                }
                format!(
                    "What happened: Invalid configuration ({cause}).\nLikely causes: Missing or out-of-range values in the TOML or table files.\nHow to fix: Edit the config file, then rerun. `enrich info` shows the effective values."
                )
            }
            Stage::Trace => format!(
                "What happened: The trace could not be read ({cause}).\nLikely causes: Wrong path, headers other than 'tps,load,cycle_end', or a malformed row.\nHow to fix: Check the CSV file and rerun."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let cause = if cause.is_empty() {
        String::new()
    } else {
        format!(" Cause: {cause}")
    };
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Configuration errors exit with 2, trace errors with 3, anything else with 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<Stage>() {
        Some(Stage::Config) => 2,
        Some(Stage::Trace) => 3,
        None => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = match err.downcast_ref::<Stage>() {
        Some(Stage::Config) => "Config",
        Some(Stage::Trace) => "Trace",
        None => "Error",
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}

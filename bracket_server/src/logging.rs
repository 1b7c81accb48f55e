//! Structured logging configuration.
//!
//! Installs a `tracing` subscriber that also captures `log` records emitted
//! by the bracket engine, plus helpers for the events operators search for.

use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Operations slower than this are logged at warn level
const SLOW_OPERATION: Duration = Duration::from_millis(250);

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use bracket_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bracket_engine=info,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a freshly generated bracket
pub fn log_bracket_generated(
    tournament_id: &str,
    tournament_type: &str,
    participants: usize,
    total_matches: u32,
    total_rounds: u32,
) {
    tracing::info!(
        tournament_id = tournament_id,
        tournament_type = tournament_type,
        participants = participants,
        total_matches = total_matches,
        total_rounds = total_rounds,
        "Bracket generated"
    );
}

/// Log a generated bracket whose counts disagree with the closed forms
pub fn log_validation_failure(tournament_type: &str, issues: &[String]) {
    tracing::error!(
        tournament_type = tournament_type,
        issues = ?issues,
        "Bracket failed validation"
    );
}

/// Log an applied match result
pub fn log_result_applied(tournament_id: &str, match_id: u32, completed: bool) {
    tracing::info!(
        tournament_id = tournament_id,
        match_id = match_id,
        completed = completed,
        "Match result applied"
    );
}

/// Log operation timing, warning when slow
///
/// # Example
///
/// ```
/// use bracket_server::logging::log_performance;
/// use std::time::Instant;
///
/// let start = Instant::now();
/// log_performance("generate", start.elapsed(), Some("double-elimination"));
/// ```
pub fn log_performance(operation: &str, elapsed: Duration, metadata: Option<&str>) {
    let duration_ms = elapsed.as_millis() as u64;
    if elapsed > SLOW_OPERATION {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "PERFORMANCE: Slow operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Performance metric"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_helpers_do_not_panic() {
        log_bracket_generated("t-1", "single-elimination", 8, 7, 3);
        log_validation_failure("swiss-system", &["matches: expected 16, got 15".to_string()]);
        log_result_applied("t-1", 3, false);
    }

    #[test]
    fn test_log_performance() {
        log_performance("generate", Duration::from_millis(5), Some("round-robin"));
        log_performance("generate", Duration::from_secs(2), None);
    }
}

use std::time::Duration;

use serde_json::json;

use ratefold_core::{evaluate_change, LastSeenRates, RateService, RefreshLimiter};

use crate::cli::WatchArgs;
use crate::error::CliError;
use crate::output;

use super::CommandResult;

/// Polls current rates until interrupted, emitting one envelope per cycle.
pub async fn run(args: &WatchArgs, service: &RateService, pretty: bool) -> Result<(), CliError> {
    if args.interval_secs == 0 {
        return Err(CliError::Command(String::from(
            "--interval-secs must be greater than zero",
        )));
    }

    let limiter = RefreshLimiter::default();
    let mut last_seen = LastSeenRates::default();
    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval_secs));
    let mut completed = 0_u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(cycles = completed, "watch interrupted");
                return Ok(());
            }
        }

        if let Err(wait) = limiter.try_acquire() {
            tracing::warn!(wait_secs = wait.as_secs(), "refresh limit reached, skipping cycle");
            continue;
        }

        let report = service.current_rates_report().await;
        let evaluation = evaluate_change(&last_seen, &report.data);
        last_seen = evaluation.last_seen;

        if let Some(notice) = &evaluation.notice {
            tracing::info!(title = %notice.title, body = %notice.body(), "rate change");
        }

        let mut result = CommandResult::from_report(report)?;
        result.data = json!({
            "rates": result.data,
            "notice": evaluation.notice,
        });
        output::render(&result.into_envelope(), pretty)?;

        completed += 1;
        if args.cycles.is_some_and(|cycles| completed >= cycles) {
            return Ok(());
        }
    }
}

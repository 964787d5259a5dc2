mod convert;
mod history;
mod history_page;
mod rates;
mod status;
pub mod watch;

use ratefold_core::{ProviderId, RateService, RouteReport};
use serde::Serialize;
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::envelope::{Envelope, EnvelopeError, EnvelopeMeta};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
    pub source_chain: Vec<ProviderId>,
}

impl CommandResult {
    pub fn ok(data: Value, source_chain: Vec<ProviderId>) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: 0,
            source_chain,
        }
    }

    /// Wraps an orchestrated call, flagging fallbacks and zero-filled defaults.
    pub fn from_report<T: Serialize>(report: RouteReport<T>) -> Result<Self, CliError> {
        let served = report.served_by_source();
        let failed = report.failures.len();
        let mut result = Self::ok(serde_json::to_value(&report.data)?, report.source_chain)
            .with_latency(report.latency_ms);

        if !served {
            result = result.with_warning("all sources failed; data holds zero-filled defaults");
        } else if failed > 0 {
            result = result.with_warning(format!(
                "served by fallback after {failed} failed attempt(s)"
            ));
        }

        Ok(result.with_errors(report.failures.into_iter().map(EnvelopeError::from).collect()))
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn into_envelope(self) -> Envelope<Value> {
        let mut meta = EnvelopeMeta::new(self.source_chain, self.latency_ms);
        for warning in self.warnings {
            meta.push_warning(warning);
        }
        Envelope {
            meta,
            data: self.data,
            errors: self.errors,
        }
    }
}

pub async fn run(cli: &Cli, service: &RateService) -> Result<Envelope<Value>, CliError> {
    let command_result = match &cli.command {
        Command::Rates => rates::run(service).await?,
        Command::History => history::run(service).await?,
        Command::HistoryPage(args) => history_page::run(args, service).await?,
        Command::Status => status::run(service).await?,
        Command::Convert(args) => convert::run(args, service).await?,
        Command::Watch(_) => {
            return Err(CliError::Command(String::from(
                "watch streams its own output and has no single envelope",
            )))
        }
    };

    Ok(command_result.into_envelope())
}

fn elapsed_ms(started: std::time::Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use ratefold_core::SourceFailure;
    use serde_json::json;

    use super::*;

    fn failure(source: ProviderId) -> SourceFailure {
        SourceFailure {
            source,
            code: String::from("source.transport"),
            message: format!("{source} transport error: connection refused"),
            retryable: true,
        }
    }

    fn report(chain: Vec<ProviderId>, failures: Vec<SourceFailure>) -> RouteReport<Value> {
        RouteReport {
            data: json!({"bcv_usd": {"price": 36.5}}),
            source_chain: chain,
            failures,
            latency_ms: 40,
        }
    }

    #[test]
    fn primary_success_carries_no_warnings() {
        let result = CommandResult::from_report(report(vec![ProviderId::Backend], Vec::new()))
            .expect("serializable");

        assert!(result.warnings.is_empty());
        assert!(result.errors.is_empty());
        assert_eq!(result.latency_ms, 40);
        assert_eq!(result.data["bcv_usd"]["price"], 36.5);
    }

    #[test]
    fn fallback_is_flagged_with_the_failed_attempts() {
        let result = CommandResult::from_report(report(
            vec![ProviderId::Backend, ProviderId::Official, ProviderId::P2p],
            vec![failure(ProviderId::Backend)],
        ))
        .expect("serializable");

        assert_eq!(result.warnings, vec!["served by fallback after 1 failed attempt(s)"]);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].source, ProviderId::Backend);
    }

    #[test]
    fn total_failure_envelope_marks_defaults() {
        let chain = vec![ProviderId::Backend, ProviderId::Official, ProviderId::P2p];
        let failures = chain.iter().copied().map(failure).collect();

        let envelope = CommandResult::from_report(report(chain, failures))
            .expect("serializable")
            .into_envelope();

        assert!(envelope.all_sources_failed());
        assert_eq!(
            envelope.meta.warnings,
            vec!["all sources failed; data holds zero-filled defaults"]
        );
        assert_eq!(envelope.meta.source_chain.len(), 3);
        assert_eq!(envelope.meta.latency_ms, 40);
        assert!(envelope
            .errors
            .iter()
            .all(|error| error.code == "source.transport"));
    }
}

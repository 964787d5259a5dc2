use std::time::Instant;

use ratefold_core::{ProviderId, RateService};

use crate::error::CliError;

use super::{elapsed_ms, CommandResult};

pub async fn run(service: &RateService) -> Result<CommandResult, CliError> {
    let started = Instant::now();
    let status = service.check_backend_status().await;
    let online = status.online;

    let result = CommandResult::ok(serde_json::to_value(status)?, vec![ProviderId::Backend])
        .with_latency(elapsed_ms(started));

    Ok(if online {
        result
    } else {
        result.with_warning("backend is offline")
    })
}

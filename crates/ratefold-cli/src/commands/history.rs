use ratefold_core::RateService;

use crate::error::CliError;

use super::CommandResult;

pub async fn run(service: &RateService) -> Result<CommandResult, CliError> {
    let report = service.history_report().await;
    let empty = report.data.is_empty();
    let result = CommandResult::from_report(report)?;

    Ok(if empty && result.errors.is_empty() {
        result.with_warning("history source answered with no rows")
    } else {
        result
    })
}

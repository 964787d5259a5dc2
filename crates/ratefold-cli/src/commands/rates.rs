use ratefold_core::RateService;

use crate::error::CliError;

use super::CommandResult;

pub async fn run(service: &RateService) -> Result<CommandResult, CliError> {
    CommandResult::from_report(service.current_rates_report().await)
}

use serde::Serialize;

use ratefold_core::{convert, ConversionMode, Instrument, RateService};

use crate::cli::ConvertArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct ConversionData {
    rate: String,
    mode: ConversionMode,
    amount: f64,
    price: f64,
    result: f64,
}

pub async fn run(args: &ConvertArgs, service: &RateService) -> Result<CommandResult, CliError> {
    let report = service.current_rates_report().await;

    let (rate, price) = match &args.custom {
        Some(name) => {
            let snapshot = report.data.custom_rate(name).ok_or_else(|| {
                CliError::Command(format!("no custom rate named '{name}' is configured"))
            })?;
            (name.clone(), snapshot.price)
        }
        None => {
            let instrument = Instrument::from(args.instrument);
            (
                instrument.as_str().to_owned(),
                report.data.get(instrument).price,
            )
        }
    };
    let mode = ConversionMode::from(args.mode);

    let data = ConversionData {
        rate,
        mode,
        amount: args.amount,
        price,
        result: convert(args.amount, price, mode),
    };

    let mut result = CommandResult::from_report(report)?;
    result.data = serde_json::to_value(data)?;
    if price == 0.0 {
        result = result.with_warning("rate is unavailable; conversion used a zero price");
    }
    Ok(result)
}

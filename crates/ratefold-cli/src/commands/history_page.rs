use std::str::FromStr;
use std::time::Instant;

use ratefold_core::{filter_range, HistoryQuery, ProviderId, RateName, RateService, UtcDateTime};

use crate::cli::HistoryPageArgs;
use crate::error::CliError;

use super::{elapsed_ms, CommandResult};

pub async fn run(args: &HistoryPageArgs, service: &RateService) -> Result<CommandResult, CliError> {
    let started = Instant::now();
    let from = bound("--from", args.from.as_deref())?;
    let to = bound("--to", args.to.as_deref())?;
    let name = if args.p2p_only {
        Some(RateName::Usdt)
    } else {
        args.name.as_deref().map(RateName::from_str).transpose()?
    };
    let query = HistoryQuery {
        name,
        limit: args.limit,
        offset: args.offset,
        order: args.order.into(),
        from: args.from.clone(),
        to: args.to.clone(),
    };

    let page = service.history_advanced(&query).await;
    let rows = page.records.len();

    let data = if args.p2p_only {
        serde_json::to_value(filter_range(&page.p2p_series(), from, to))?
    } else {
        serde_json::to_value(page)?
    };

    let result =
        CommandResult::ok(data, vec![ProviderId::Backend]).with_latency(elapsed_ms(started));
    Ok(if rows == 0 {
        result.with_warning("backend returned no rows for this query")
    } else {
        result
    })
}

fn bound(flag: &str, raw: Option<&str>) -> Result<Option<UtcDateTime>, CliError> {
    raw.map(|value| {
        UtcDateTime::parse_lenient(value).ok_or_else(|| {
            CliError::Command(format!("{flag} must be a date or RFC3339 timestamp: '{value}'"))
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use ratefold_core::{HttpClient, HttpError, HttpRequest, HttpResponse, RatesConfig};

    use super::*;
    use crate::cli::OrderArg;

    /// Answers every request with an empty page and counts the calls.
    #[derive(Default)]
    struct CountingHttpClient {
        calls: AtomicUsize,
    }

    impl HttpClient for CountingHttpClient {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>,
        > {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(HttpResponse::ok_json(r#"{"success":true,"data":[]}"#)) })
        }
    }

    fn args(from: Option<&str>) -> HistoryPageArgs {
        HistoryPageArgs {
            name: None,
            limit: 100,
            offset: 0,
            order: OrderArg::Desc,
            from: from.map(str::to_owned),
            to: None,
            p2p_only: true,
        }
    }

    fn service(client: Arc<CountingHttpClient>) -> RateService {
        let config = RatesConfig::new().with_backend("https://rates.example", None);
        RateService::with_http_client(&config, client).expect("valid configuration")
    }

    #[tokio::test]
    async fn bad_bounds_are_rejected_before_any_request() {
        let client = Arc::new(CountingHttpClient::default());

        let error = run(&args(Some("last week")), &service(client.clone()))
            .await
            .err()
            .expect("unparseable --from must fail");

        assert!(error.to_string().contains("--from"));
        assert_eq!(error.exit_code(), 2);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_page_is_flagged() {
        let client = Arc::new(CountingHttpClient::default());

        let result = run(&args(Some("2024-01-01")), &service(client.clone()))
            .await
            .expect("valid bounds");

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.data, serde_json::json!([]));
        assert_eq!(result.warnings, vec!["backend returned no rows for this query"]);
    }
}

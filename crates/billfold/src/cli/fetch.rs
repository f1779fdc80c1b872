//! Fetch command handler.

use billfold::{BillfoldConfig, BillfoldResult, ConfigError, JsonError, StripeFetchProvider};

/// Options for one fetch run.
#[derive(Debug, Clone, Default)]
pub struct FetchArgs {
    /// Resource name
    pub resource: String,
    /// Extra expansions
    pub expand: Vec<String>,
    /// Page size override
    pub limit: Option<u32>,
    /// Connected account override
    pub account: Option<String>,
    /// Pretty-print output
    pub pretty: bool,
}

/// Fetches the resource, aggregates it and prints the JSON on stdout.
pub async fn run_fetch(config: BillfoldConfig, args: FetchArgs) -> BillfoldResult<()> {
    let config = apply_overrides(config, &args)?;
    let provider = StripeFetchProvider::new(config.event(&args.resource))?;

    let report = provider.fetch_report().await;
    if !report.outcome().is_complete() {
        tracing::warn!(outcome = ?report.outcome(), "Fetch did not complete; aggregate is empty");
    }
    let aggregate = provider.process(report.records());

    let output = if args.pretty {
        serde_json::to_string_pretty(&aggregate)
    } else {
        serde_json::to_string(&aggregate)
    }
    .map_err(JsonError::from)?;
    println!("{}", output);

    Ok(())
}

fn apply_overrides(config: BillfoldConfig, args: &FetchArgs) -> BillfoldResult<BillfoldConfig> {
    let fetcher = config.fetcher().clone().ok_or_else(|| {
        ConfigError::new(
            "No fetcher configured; set [fetcher.connection_params] api_key or \
             BILLFOLD__FETCHER__CONNECTION_PARAMS__API_KEY",
        )
    })?;

    let mut params = fetcher.request_params().clone().unwrap_or_default();
    if !args.expand.is_empty() {
        params = params.with_expand(args.expand.iter().cloned());
    }
    if let Some(limit) = args.limit {
        params = params.with_limit(limit);
    }
    if let Some(account) = &args.account {
        params = params.with_account(account.as_str());
    }

    Ok(config.with_fetcher(fetcher.with_request_params(params)))
}

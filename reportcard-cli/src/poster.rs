//! Publishing evaluation reports to a remote collector.

use crate::CliResult;
use log::info;
use reportcard_core::RepoReport;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

const POST_TIMEOUT_SECS: u64 = 30;

/// Sends a finished report somewhere.
pub(crate) trait ResultPoster {
    fn post<'a>(
        &'a self,
        url: &'a str,
        report: &'a RepoReport,
    ) -> Pin<Box<dyn Future<Output = CliResult<()>> + Send + 'a>>;
}

/// Reqwest-backed poster that sends the report as JSON.
pub(crate) struct ReqwestPoster {
    client: Client,
}

impl ReqwestPoster {
    pub(crate) fn new() -> CliResult<Self> {
        let client = Client::builder()
            .user_agent("reportcard-cli")
            .timeout(Duration::from_secs(POST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

impl ResultPoster for ReqwestPoster {
    fn post<'a>(
        &'a self,
        url: &'a str,
        report: &'a RepoReport,
    ) -> Pin<Box<dyn Future<Output = CliResult<()>> + Send + 'a>> {
        Box::pin(post_report(&self.client, url, report))
    }
}

async fn post_report(client: &Client, url: &str, report: &RepoReport) -> CliResult<()> {
    client
        .post(url)
        .json(report)
        .send()
        .await?
        .error_for_status()?;
    info!("posted {} to {url}", report.repo_key);
    Ok(())
}

/// Post every evaluated report, collecting failures instead of stopping.
pub(crate) async fn post_reports<P: ResultPoster>(
    poster: &P,
    url: &str,
    reports: &[RepoReport],
) -> Vec<String> {
    let mut failures = Vec::new();
    for report in reports.iter().filter(|report| report.evaluation.is_some()) {
        if let Err(err) = poster.post(url, report).await {
            failures.push(format!("{}: {err}", report.repo_key));
        }
    }
    failures
}

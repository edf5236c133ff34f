#![deny(missing_docs)]
//! Report Card command-line interface.
//!
//! Grades local or cloned repositories and shows the leaderboard and recent
//! evaluations kept in the result cache.

mod poster;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use reportcard_core::{
    Cache, CloneStatus, EngineConfig, FileCache, LeaderboardEntry, MemoryCache, RecentView,
    RepoReport, ReportCardService, SourceInspector, StdFileSystem, render_json,
    render_leaderboard_markdown, render_recent_markdown, render_report_markdown, schema_json,
    validate_check_ids,
};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const FORGE_HOSTS: &[&str] = &["github.com", "gitlab.com", "bitbucket.org", "codeberg.org"];

#[derive(Parser)]
#[command(name = "reportcard", version, about = "Grade Go repositories")]
struct Cli {
    /// Log evaluation progress.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(&["file", "url", "dir", "path"])
))]
struct RepoSourceArgs {
    /// File containing repository URLs (one per line).
    #[arg(short, long)]
    file: Option<PathBuf>,
    /// Single repository URL to clone.
    #[arg(long)]
    url: Option<String>,
    /// Directory containing repositories to evaluate locally.
    #[arg(long)]
    dir: Option<PathBuf>,
    /// Local repository path to evaluate.
    #[arg(long)]
    path: Option<PathBuf>,
}

#[derive(Args, Clone)]
struct CloneArgs {
    /// Output directory to clone into.
    #[arg(short, long, default_value = "reportcard-repos")]
    output: PathBuf,
    /// Maximum number of repositories evaluated at once.
    #[arg(short = 'j', long, default_value_t = 4)]
    concurrency: usize,
}

#[derive(Args, Clone)]
struct StoreArgs {
    /// Directory persisting results, leaderboard and recent list.
    #[arg(long, env = "REPORTCARD_CACHE_DIR")]
    cache_dir: Option<PathBuf>,
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Args, Clone)]
struct CheckOptions {
    /// Check IDs to run (repeatable or comma-separated).
    #[arg(long, value_delimiter = ',')]
    check: Vec<String>,
    /// Ignore cached results and run the checks again.
    #[arg(long)]
    force: bool,
    /// Fail when any repository scores below this percentage.
    #[arg(short, long)]
    threshold: Option<f64>,
    /// POST each evaluated report as JSON to this URL.
    #[arg(long)]
    post: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade repositories from a URL, file, directory, or local path.
    Check {
        #[command(flatten)]
        source: RepoSourceArgs,
        #[command(flatten)]
        clone: CloneArgs,
        #[command(flatten)]
        options: CheckOptions,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Show the best scoring repositories.
    Leaderboard {
        /// Number of entries to show.
        #[arg(long, default_value_t = 50)]
        limit: usize,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Show recently evaluated repositories.
    Recent {
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Print the JSON schema of reports.
    Schema {
        /// Write the schema to a file instead of stdout.
        #[arg(long = "report-output")]
        report_output: Option<PathBuf>,
    },
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check {
            source,
            clone,
            options,
            store,
            report,
        } => {
            let source = source.resolve()?;
            let service = open_service(&store, &options.check)?;
            let reports = run_check(
                source,
                clone.output,
                clone.concurrency,
                service,
                options.force,
                &report,
            )
            .await?;
            if let Some(url) = &options.post {
                let poster = poster::ReqwestPoster::new()?;
                for failure in poster::post_reports(&poster, url, &reports).await {
                    warn!("post failed for {failure}");
                }
            }
            if let Some(threshold) = options.threshold {
                enforce_threshold(&reports, threshold)?;
            }
        }
        Commands::Leaderboard {
            limit,
            store,
            report,
        } => {
            let service = open_service(&store, &[])?;
            emit_leaderboard(&service.top_scores(limit), &report).await?;
        }
        Commands::Recent { store, report } => {
            let service = open_service(&store, &[])?;
            emit_recent(&service.recent(), &report).await?;
        }
        Commands::Schema { report_output } => {
            let output = OutputArgs {
                format: OutputFormat::Json,
                report_output,
            };
            emit_output(&output, format!("{}\n", schema_json()?)).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

#[cfg_attr(test, allow(dead_code))]
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn open_service(store: &StoreArgs, check_ids: &[String]) -> CliResult<Arc<ReportCardService>> {
    validate_check_ids(check_ids)?;
    let config = EngineConfig::from_env().with_checks(check_ids.to_vec());
    let cache: Arc<dyn Cache> = match &store.cache_dir {
        Some(dir) => Arc::new(FileCache::open(dir)?),
        None => Arc::new(MemoryCache::new()),
    };
    Ok(Arc::new(ReportCardService::new(cache, config)))
}

async fn run_check(
    source: Source,
    clone_output: PathBuf,
    concurrency: usize,
    service: Arc<ReportCardService>,
    force: bool,
    report: &OutputArgs,
) -> CliResult<Vec<RepoReport>> {
    let targets = expand_source(source, &clone_output).await?;
    if targets.is_empty() {
        println!("No repositories found to check.");
        return Ok(Vec::new());
    }

    if targets
        .iter()
        .any(|target| matches!(target, RepoTarget::Clone { .. }))
    {
        tokio::fs::create_dir_all(&clone_output).await?;
    }
    let concurrency = if concurrency == 0 { 1 } else { concurrency };
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();

    for target in targets {
        let permit = semaphore.clone().acquire_owned().await?;
        let service = service.clone();
        tasks.spawn(async move {
            let _permit = permit;
            check_target(target, service, force).await
        });
    }

    let mut reports = Vec::new();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(report) => reports.push(report),
            Err(err) => reports.push(repo_report_from_task_error(err)),
        }
    }
    reports.sort_by(|a, b| a.source.cmp(&b.source));

    emit_reports(&reports, report).await?;

    Ok(reports)
}

impl RepoSourceArgs {
    /// The one source clap let through, with a blank `--url` rejected.
    fn resolve(&self) -> CliResult<Source> {
        match (&self.file, &self.url, &self.dir, &self.path) {
            (Some(list), _, _, _) => Ok(Source::UrlList(list.clone())),
            (None, Some(url), _, _) => match url.trim() {
                "" => Err("url cannot be empty".into()),
                url => Ok(Source::Url(url.to_string())),
            },
            (None, None, Some(parent), _) => Ok(Source::Parent(parent.clone())),
            (None, None, None, Some(checkout)) => Ok(Source::Checkout(checkout.clone())),
            (None, None, None, None) => Err("no repository source provided".into()),
        }
    }
}

async fn read_url_list(list: &Path) -> CliResult<Vec<String>> {
    let contents = tokio::fs::read_to_string(list).await?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !(line.is_empty() || line.starts_with('#')))
        .map(String::from)
        .collect())
}

async fn checkouts_under(parent: &Path) -> CliResult<Vec<PathBuf>> {
    let mut children = tokio::fs::read_dir(parent).await?;
    let mut checkouts = Vec::new();
    while let Some(child) = children.next_entry().await? {
        let visible = !child.file_name().to_string_lossy().starts_with('.');
        if visible && child.file_type().await?.is_dir() {
            checkouts.push(child.path());
        }
    }
    checkouts.sort();
    Ok(checkouts)
}

async fn expand_source(source: Source, clone_root: &Path) -> CliResult<Vec<RepoTarget>> {
    let clone_target = |url: String| RepoTarget::Clone {
        dest: clone_root.join(repo_dir_name(&url)),
        url,
    };
    let targets = match source {
        Source::UrlList(list) => read_url_list(&list)
            .await?
            .into_iter()
            .map(clone_target)
            .collect(),
        Source::Url(url) => vec![clone_target(url)],
        Source::Parent(parent) => checkouts_under(&parent)
            .await?
            .into_iter()
            .map(|path| RepoTarget::Local { path })
            .collect(),
        Source::Checkout(path) => vec![RepoTarget::Local { path }],
    };
    Ok(targets)
}

enum Source {
    UrlList(PathBuf),
    Url(String),
    Parent(PathBuf),
    Checkout(PathBuf),
}

enum RepoTarget {
    Clone { url: String, dest: PathBuf },
    Local { path: PathBuf },
}

async fn check_target(
    target: RepoTarget,
    service: Arc<ReportCardService>,
    force: bool,
) -> RepoReport {
    match target {
        RepoTarget::Clone { url, dest } => clone_and_check(url, dest, service, force).await,
        RepoTarget::Local { path } => check_local(path, service, force).await,
    }
}

async fn clone_and_check(
    url: String,
    repo_dir: PathBuf,
    service: Arc<ReportCardService>,
    force: bool,
) -> RepoReport {
    let mut report = RepoReport::new(url.clone(), repo_key_for_url(&url), repo_dir);

    if !force {
        match service.cached(&report.repo_key) {
            Ok(Some(record)) => {
                info!("{}: using cached result", report.repo_key);
                report.clone_status = CloneStatus::Cached;
                report.from_cache = true;
                report.evaluation = Some(record);
                return report;
            }
            Ok(None) => {}
            Err(err) => report.errors.push(format!("cache lookup: {err}")),
        }
    }

    if report.path.exists() {
        report.clone_status =
            CloneStatus::Failed(format!("destination exists: {}", report.path.display()));
        return report;
    }

    match clone_repo(&report.source, &report.path).await {
        Ok(()) => report.clone_status = CloneStatus::Cloned,
        Err(err) => {
            report.clone_status = CloneStatus::Failed(err.to_string());
            return report;
        }
    }

    let file_url_base = file_url_base(&url);
    evaluate_in_background(report, service, force, file_url_base).await
}

async fn check_local(path: PathBuf, service: Arc<ReportCardService>, force: bool) -> RepoReport {
    let mut report = RepoReport::new(
        path.display().to_string(),
        repo_key_for_path(&path),
        path,
    );
    if !report.path.is_dir() {
        report.clone_status =
            CloneStatus::Failed(format!("path not found: {}", report.path.display()));
        return report;
    }

    report.clone_status = CloneStatus::Local;
    evaluate_in_background(report, service, force, None).await
}

// Checks block on external processes, so they run off the async workers.
async fn evaluate_in_background(
    report: RepoReport,
    service: Arc<ReportCardService>,
    force: bool,
    file_url_base: Option<String>,
) -> RepoReport {
    let source = report.source.clone();
    let path = report.path.clone();
    match tokio::task::spawn_blocking(move || {
        let mut report = report;
        populate_evaluation(&mut report, &service, force, file_url_base);
        report
    })
    .await
    {
        Ok(report) => report,
        Err(err) => RepoReport::failed(source, path, err.to_string()),
    }
}

fn populate_evaluation(
    report: &mut RepoReport,
    service: &ReportCardService,
    force: bool,
    file_url_base: Option<String>,
) {
    let inspector = SourceInspector::new(StdFileSystem::new());
    let target = match inspector.target(&report.path) {
        Ok(target) => target,
        Err(err) => {
            report.errors.push(format!("source files: {err}"));
            return;
        }
    };
    let target = match file_url_base {
        Some(base) => target.with_file_url_base(base),
        None => target,
    };

    match service.evaluate(&report.repo_key, &target, force) {
        Ok(outcome) => {
            report.from_cache = outcome.from_cache;
            report.errors.extend(outcome.persistence_errors);
            report.evaluation = Some(outcome.record);
        }
        Err(err) => report.errors.push(format!("evaluation: {err}")),
    }
}

async fn clone_repo(url: &str, dest: &Path) -> CliResult<()> {
    let status = Command::new("git")
        .arg("clone")
        .arg("--depth")
        .arg("1")
        .arg(url)
        .arg(dest)
        .status()
        .await?;

    if status.success() {
        Ok(())
    } else {
        Err(format!("git clone failed with status {status}").into())
    }
}

fn repo_dir_name(url: &str) -> String {
    let key = repo_key_for_url(url);
    match key.rsplit_once('/') {
        Some((_, name)) => name.to_string(),
        None => key,
    }
}

/// `host/path` form of a clone URL, used as the cache and ranking key.
fn repo_key_for_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let without_scheme = match trimmed.split_once("://") {
        Some((_, rest)) => rest,
        None => trimmed,
    };
    let without_user = match without_scheme.split_once('@') {
        Some((_, rest)) => rest,
        None => without_scheme,
    };
    without_user
        .replacen(':', "/", 1)
        .trim_end_matches(".git")
        .to_string()
}

fn repo_key_for_path(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn file_url_base(url: &str) -> Option<String> {
    let key = repo_key_for_url(url);
    let host = key.split('/').next()?;
    if !FORGE_HOSTS.contains(&host) {
        return None;
    }
    let separator = if host == "gitlab.com" { "/-/blob/HEAD" } else { "/blob/HEAD" };
    Some(format!("https://{key}{separator}"))
}

fn repo_report_from_task_error(error: tokio::task::JoinError) -> RepoReport {
    RepoReport::failed("unknown".to_string(), PathBuf::from("."), error.to_string())
}

fn enforce_threshold(reports: &[RepoReport], threshold: f64) -> CliResult<()> {
    let below: Vec<String> = reports
        .iter()
        .filter(|report| report.percentage().is_none_or(|score| score < threshold))
        .map(|report| match report.percentage() {
            Some(score) => format!("{} ({score:.2}%)", report.source),
            None => format!("{} (not evaluated)", report.source),
        })
        .collect();
    if below.is_empty() {
        return Ok(());
    }
    Err(format!("below threshold {threshold:.2}%: {}", below.join(", ")).into())
}

async fn emit_reports(reports: &[RepoReport], output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_report_text(reports),
        OutputFormat::Markdown => render_report_markdown(reports),
        OutputFormat::Json => render_json(reports)?,
    };
    emit_output(output, contents).await
}

async fn emit_leaderboard(entries: &[LeaderboardEntry], output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_leaderboard_text(entries),
        OutputFormat::Markdown => render_leaderboard_markdown(entries),
        OutputFormat::Json => render_json(entries)?,
    };
    emit_output(output, contents).await
}

async fn emit_recent(views: &[RecentView], output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_recent_text(views),
        OutputFormat::Markdown => render_recent_markdown(views),
        OutputFormat::Json => render_json(views)?,
    };
    emit_output(output, contents).await
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}

fn render_report_text(reports: &[RepoReport]) -> String {
    let mut output = String::new();
    for report in reports {
        let _ = writeln!(output, "Source: {}", report.source);
        let _ = writeln!(output, "Path: {}", report.path.display());
        match &report.clone_status {
            CloneStatus::Cloned => {
                let _ = writeln!(output, "Status: cloned");
            }
            CloneStatus::Local => {
                let _ = writeln!(output, "Status: local");
            }
            CloneStatus::Cached => {
                let _ = writeln!(output, "Status: cached");
            }
            CloneStatus::Failed(error) => {
                let _ = writeln!(output, "Status: failed ({error})");
                let _ = writeln!(output);
                continue;
            }
            CloneStatus::Pending => {
                let _ = writeln!(output, "Status: pending");
                let _ = writeln!(output);
                continue;
            }
        }

        match &report.evaluation {
            Some(record) => {
                let result = &record.result;
                let _ = writeln!(
                    output,
                    "Grade: {} ({:.1}%){}",
                    result.grade,
                    result.average * 100.0,
                    if report.from_cache { " [cached]" } else { "" }
                );
                let _ = writeln!(
                    output,
                    "Files: {} analyzed, {} with issues",
                    result.files_analyzed, result.issue_count
                );
                for score in &result.scores {
                    match &score.error {
                        Some(error) => {
                            let _ = writeln!(output, "- {}: error ({error})", score.name);
                        }
                        None => {
                            let _ = writeln!(
                                output,
                                "- {}: {:.0}%",
                                score.name,
                                score.percentage * 100.0
                            );
                        }
                    }
                    for summary in &score.file_summaries {
                        let label = if summary.filename.is_empty() {
                            "(repository)"
                        } else {
                            summary.filename.as_str()
                        };
                        for issue in &summary.issues {
                            if issue.line == 0 {
                                let _ = writeln!(output, "    {label}: {}", issue.message);
                            } else {
                                let _ = writeln!(
                                    output,
                                    "    {label}:{}: {}",
                                    issue.line, issue.message
                                );
                            }
                        }
                    }
                }
            }
            None => {
                let _ = writeln!(output, "Grade: unavailable");
            }
        }

        if !report.errors.is_empty() {
            let _ = writeln!(output, "Errors:");
            for error in &report.errors {
                let _ = writeln!(output, "- {error}");
            }
        }

        let _ = writeln!(output);
    }
    output
}

fn render_leaderboard_text(entries: &[LeaderboardEntry]) -> String {
    let mut output = String::new();
    if entries.is_empty() {
        let _ = writeln!(output, "Leaderboard: empty");
        return output;
    }
    for (index, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            output,
            "{:>3}. {:6.2}%  {} ({} files)",
            index + 1,
            entry.score,
            entry.repo_key,
            entry.file_count
        );
    }
    output
}

fn render_recent_text(views: &[RecentView]) -> String {
    let mut output = String::new();
    if views.is_empty() {
        let _ = writeln!(output, "Recent: none");
        return output;
    }
    for view in views {
        let _ = writeln!(output, "{}", view.repo_key);
    }
    output
}

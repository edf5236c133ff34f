//! Check registry, external tool wrappers and built-in checks.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use regex::Regex;

use crate::check::{Check, CheckFailure, CheckReport, Target};
use crate::command::{CommandOutput, CommandSpec};
use crate::domain::{FileSummary, Issue};
use crate::error::{ReportCardError, Result};
use crate::inspector::is_generated_file;
use crate::normalize::{FormatKind, OutputNormalizer};

/// Check ids run when no explicit selection is configured.
pub const DEFAULT_CHECKS: &[&str] = &[
    "gofmt",
    "go_vet",
    "golint",
    "gocyclo",
    "license",
    "misspell",
    "ineffassign",
    "errcheck",
];

const LICENSE_PREFIXES: &[&str] = &[
    "license",
    "licence",
    "copying",
    "copyright",
    "unlicense",
    "copyleft",
];

const TODO_PATTERN: &str = r"//.*\b(?i:todo)\b";

/// Build check instances for `ids`, bound to `target`.
pub fn build_checks(
    ids: &[String],
    target: &Target,
    timeout: Duration,
) -> Result<Vec<Arc<dyn Check>>> {
    let target = Arc::new(target.clone());
    let mut checks: Vec<Arc<dyn Check>> = Vec::with_capacity(ids.len());
    for id in ids {
        let check: Arc<dyn Check> = match normalize_check_id(id) {
            Some(CheckKind::Gofmt) => Arc::new(gofmt_check(target.clone(), timeout)),
            Some(CheckKind::GoVet) => Arc::new(go_vet_check(target.clone(), timeout)),
            Some(CheckKind::Golint) => Arc::new(golint_check(target.clone(), timeout)),
            Some(CheckKind::Gocyclo) => Arc::new(gocyclo_check(target.clone(), timeout)),
            Some(CheckKind::Ineffassign) => Arc::new(ineffassign_check(target.clone(), timeout)),
            Some(CheckKind::Errcheck) => Arc::new(errcheck_check(target.clone(), timeout)),
            Some(CheckKind::Staticcheck) => Arc::new(staticcheck_check(target.clone(), timeout)),
            Some(CheckKind::Misspell) => Arc::new(misspell_check(target.clone(), timeout)),
            Some(CheckKind::License) => Arc::new(LicenseCheck::new(target.clone())),
            Some(CheckKind::Readme) => Arc::new(ReadmeCheck::new(target.clone())),
            Some(CheckKind::Todo) => Arc::new(TodoCheck::new(target.clone())?),
            None => return Err(ReportCardError::UnknownCheck(id.clone())),
        };
        checks.push(check);
    }
    Ok(checks)
}

/// Fail with [`ReportCardError::UnknownCheck`] on the first unrecognized id.
pub fn validate_check_ids(ids: &[String]) -> Result<()> {
    match ids.iter().find(|id| normalize_check_id(id).is_none()) {
        Some(id) => Err(ReportCardError::UnknownCheck(id.clone())),
        None => Ok(()),
    }
}

/// The default check ids as owned strings.
pub fn default_check_ids() -> Vec<String> {
    DEFAULT_CHECKS.iter().map(|id| id.to_string()).collect()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum CheckKind {
    Gofmt,
    GoVet,
    Golint,
    Gocyclo,
    Ineffassign,
    Errcheck,
    Staticcheck,
    Misspell,
    License,
    Readme,
    Todo,
}

fn normalize_check_id(id: &str) -> Option<CheckKind> {
    match id.trim().to_lowercase().as_str() {
        "gofmt" | "fmt" => Some(CheckKind::Gofmt),
        "go_vet" | "govet" | "vet" => Some(CheckKind::GoVet),
        "golint" | "lint" => Some(CheckKind::Golint),
        "gocyclo" | "cyclo" => Some(CheckKind::Gocyclo),
        "ineffassign" => Some(CheckKind::Ineffassign),
        "errcheck" => Some(CheckKind::Errcheck),
        "staticcheck" => Some(CheckKind::Staticcheck),
        "misspell" => Some(CheckKind::Misspell),
        "license" | "licence" => Some(CheckKind::License),
        "readme" => Some(CheckKind::Readme),
        "todo" | "todofinder" => Some(CheckKind::Todo),
        _ => None,
    }
}

/// What the tool receives after its fixed arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToolArgs {
    /// Every target file, relative to the root where possible.
    Files,
    /// The recursive package pattern `./...`.
    Packages,
    /// The root directory itself.
    Root,
}

/// Which captured stream holds the findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// A check backed by one external analysis tool.
#[derive(Debug, Clone)]
struct ExternalCheck {
    name: &'static str,
    description: &'static str,
    weight: f64,
    command: CommandSpec,
    tool_args: ToolArgs,
    format: FormatKind,
    stream: Stream,
    /// Exit codes that mean "ran and found issues" rather than "broke".
    finding_codes: &'static [i32],
    /// Lines starting with these prefixes are progress noise, not findings.
    noise_prefixes: &'static [&'static str],
    target: Arc<Target>,
    timeout: Duration,
}

impl ExternalCheck {
    fn extra_args(&self) -> Vec<String> {
        match self.tool_args {
            ToolArgs::Files => relative_files(&self.target),
            ToolArgs::Packages => vec!["./...".to_string()],
            ToolArgs::Root => vec![".".to_string()],
        }
    }

    fn findings(&self, output: &CommandOutput) -> String {
        let raw = match self.stream {
            Stream::Stdout => &output.stdout,
            Stream::Stderr => &output.stderr,
        };
        raw.lines()
            .filter(|line| {
                let trimmed = line.trim_start();
                !self
                    .noise_prefixes
                    .iter()
                    .any(|prefix| trimmed.starts_with(prefix))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn normalizer(&self) -> OutputNormalizer {
        let normalizer = OutputNormalizer::new(&self.target.dir);
        match &self.target.file_url_base {
            Some(base) => normalizer.with_file_url_base(base.clone()),
            None => normalizer,
        }
    }
}

impl Check for ExternalCheck {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn percentage(&self) -> std::result::Result<CheckReport, CheckFailure> {
        let output = self
            .command
            .run(&self.target.dir, &self.extra_args(), self.timeout)?;

        let summaries: Vec<FileSummary> = self
            .normalizer()
            .normalize(self.format, &self.findings(&output))
            .into_iter()
            .filter(|summary| !is_generated_file(Path::new(&summary.filename)))
            .collect();

        if output.timed_out {
            let error = ReportCardError::Timeout {
                tool: self.command.program.clone(),
                seconds: self.timeout.as_secs(),
            };
            return Err(CheckFailure::with_partial(error, summaries));
        }
        let ran = match output.code() {
            Some(0) => true,
            Some(code) => self.finding_codes.contains(&code),
            None => false,
        };
        if !ran {
            let error = ReportCardError::ToolFailed {
                tool: self.command.program.clone(),
                status: output.status.to_string(),
                output: output.merged_output(),
            };
            return Err(CheckFailure::with_partial(error, summaries));
        }

        debug!(
            "{} reported {} file(s) with issues",
            self.name,
            summaries.len()
        );
        match pass_ratio(&self.target, &summaries) {
            Ok(percentage) => Ok(CheckReport {
                percentage,
                file_summaries: summaries,
            }),
            Err(error) => Err(CheckFailure::with_partial(error, summaries)),
        }
    }
}

/// Share of the target that passed, given the summaries a tool produced.
///
/// A single-file target is scored per line, larger targets per file.
fn pass_ratio(target: &Target, summaries: &[FileSummary]) -> Result<f64> {
    if summaries.is_empty() {
        return Ok(1.0);
    }
    if let [file] = target.files.as_slice() {
        let lines = std::fs::read_to_string(file)?.lines().count();
        let issues: usize = summaries.iter().map(|summary| summary.issues.len()).sum();
        if lines == 0 {
            return Ok(0.0);
        }
        return Ok(ratio(lines.saturating_sub(issues), lines));
    }

    let failing = summaries
        .iter()
        .filter(|summary| !summary.filename.is_empty())
        .count();
    let total = target.files.len();
    Ok(ratio(total.saturating_sub(failing), total))
}

fn ratio(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    (passed as f64 / total as f64).clamp(0.0, 1.0)
}

fn relative_files(target: &Target) -> Vec<String> {
    target
        .files
        .iter()
        .map(|file| match file.strip_prefix(&target.dir) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => std::path::absolute(file).unwrap_or_else(|_| file.clone()),
        })
        .map(|path| path.to_string_lossy().to_string())
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn external(
    name: &'static str,
    description: &'static str,
    weight: f64,
    command: CommandSpec,
    tool_args: ToolArgs,
    format: FormatKind,
    target: Arc<Target>,
    timeout: Duration,
) -> ExternalCheck {
    ExternalCheck {
        name,
        description,
        weight,
        command,
        tool_args,
        format,
        stream: Stream::Stdout,
        finding_codes: &[1],
        noise_prefixes: &[],
        target,
        timeout,
    }
}

fn gofmt_check(target: Arc<Target>, timeout: Duration) -> ExternalCheck {
    external(
        "gofmt",
        "Gofmt formats Go programs. We run `gofmt -s` on your code, where `-s` is for the \"simplify\" command.",
        0.30,
        CommandSpec::new("gofmt", &["-s", "-l"]),
        ToolArgs::Files,
        FormatKind::FreeText,
        target,
        timeout,
    )
}

fn go_vet_check(target: Arc<Target>, timeout: Duration) -> ExternalCheck {
    ExternalCheck {
        stream: Stream::Stderr,
        noise_prefixes: &["#"],
        ..external(
            "go_vet",
            "`go vet` examines Go source code and reports suspicious constructs, such as Printf calls whose arguments do not align with the format string.",
            0.25,
            CommandSpec::new("go", &["vet"]),
            ToolArgs::Packages,
            FormatKind::ColonDelimited,
            target,
            timeout,
        )
    }
}

fn golint_check(target: Arc<Target>, timeout: Duration) -> ExternalCheck {
    external(
        "golint",
        "Golint is a linter for Go source code.",
        0.10,
        CommandSpec::new("golint", &[]),
        ToolArgs::Packages,
        FormatKind::ColonDelimited,
        target,
        timeout,
    )
}

fn gocyclo_check(target: Arc<Target>, timeout: Duration) -> ExternalCheck {
    external(
        "gocyclo",
        "Gocyclo calculates cyclomatic complexities of functions in Go source code. Functions over 15 are reported.",
        0.10,
        CommandSpec::new("gocyclo", &["-over", "15"]),
        ToolArgs::Root,
        FormatKind::SpaceDelimitedTrailingLocator,
        target,
        timeout,
    )
}

fn ineffassign_check(target: Arc<Target>, timeout: Duration) -> ExternalCheck {
    ExternalCheck {
        stream: Stream::Stderr,
        finding_codes: &[1, 3],
        ..external(
            "ineffassign",
            "IneffAssign detects ineffectual assignments in Go code.",
            0.05,
            CommandSpec::new("ineffassign", &[]),
            ToolArgs::Packages,
            FormatKind::ColonDelimited,
            target,
            timeout,
        )
    }
}

fn errcheck_check(target: Arc<Target>, timeout: Duration) -> ExternalCheck {
    external(
        "errcheck",
        "errcheck finds unchecked errors in Go programs.",
        0.15,
        CommandSpec::new("errcheck", &[]),
        ToolArgs::Packages,
        FormatKind::ColonDelimited,
        target,
        timeout,
    )
}

fn staticcheck_check(target: Arc<Target>, timeout: Duration) -> ExternalCheck {
    external(
        "staticcheck",
        "Staticcheck finds bugs, performance issues, and more.",
        0.15,
        CommandSpec::new("staticcheck", &[]),
        ToolArgs::Packages,
        FormatKind::ColonDelimited,
        target,
        timeout,
    )
}

fn misspell_check(target: Arc<Target>, timeout: Duration) -> ExternalCheck {
    external(
        "misspell",
        "Misspell finds commonly misspelled English words.",
        0.0,
        CommandSpec::new("misspell", &[]),
        ToolArgs::Files,
        FormatKind::ColonDelimited,
        target,
        timeout,
    )
}

/// Passes when the root holds a license file.
struct LicenseCheck {
    target: Arc<Target>,
}

impl LicenseCheck {
    fn new(target: Arc<Target>) -> Self {
        Self { target }
    }
}

impl Check for LicenseCheck {
    fn name(&self) -> &str {
        "license"
    }

    fn description(&self) -> &str {
        "Checks whether your project has a LICENSE file."
    }

    fn weight(&self) -> f64 {
        0.05
    }

    fn percentage(&self) -> std::result::Result<CheckReport, CheckFailure> {
        let found = root_has_file(&self.target.dir, |name| {
            LICENSE_PREFIXES
                .iter()
                .any(|prefix| name.starts_with(prefix))
        })?;
        if found {
            return Ok(CheckReport::passed());
        }
        Ok(CheckReport {
            percentage: 0.0,
            file_summaries: vec![FileSummary::repo_level(
                "https://choosealicense.com/",
                "no LICENSE file found in the repository root",
            )],
        })
    }
}

/// Passes when the root holds a readme.
struct ReadmeCheck {
    target: Arc<Target>,
}

impl ReadmeCheck {
    fn new(target: Arc<Target>) -> Self {
        Self { target }
    }
}

impl Check for ReadmeCheck {
    fn name(&self) -> &str {
        "readme"
    }

    fn description(&self) -> &str {
        "Checks whether your project has a README file."
    }

    fn weight(&self) -> f64 {
        0.05
    }

    fn percentage(&self) -> std::result::Result<CheckReport, CheckFailure> {
        if root_has_file(&self.target.dir, |name| name.starts_with("readme"))? {
            return Ok(CheckReport::passed());
        }
        Ok(CheckReport {
            percentage: 0.0,
            file_summaries: vec![FileSummary::repo_level(
                "https://www.makeareadme.com/",
                "no README file found in the repository root",
            )],
        })
    }
}

fn root_has_file(dir: &Path, matches: impl Fn(&str) -> bool) -> Result<bool> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.ends_with(".go") {
            continue;
        }
        if matches(&name) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Reports `// TODO` comments in the target files.
struct TodoCheck {
    target: Arc<Target>,
    pattern: Regex,
}

impl TodoCheck {
    fn new(target: Arc<Target>) -> Result<Self> {
        let pattern = Regex::new(TODO_PATTERN)
            .map_err(|err| ReportCardError::Other(format!("invalid todo pattern: {err}")))?;
        Ok(Self { target, pattern })
    }

    fn todos_in(&self, file: &PathBuf) -> Vec<Issue> {
        let contents = match std::fs::read_to_string(file) {
            Ok(contents) => contents,
            Err(err) => {
                debug!("todo: skipping {}: {err}", file.display());
                return Vec::new();
            }
        };
        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| self.pattern.is_match(line))
            .map(|(index, line)| Issue::new(index as u32 + 1, line.trim()))
            .collect()
    }
}

impl Check for TodoCheck {
    fn name(&self) -> &str {
        "todo"
    }

    fn description(&self) -> &str {
        "Finds TODO notes left in comments."
    }

    fn weight(&self) -> f64 {
        0.0
    }

    fn percentage(&self) -> std::result::Result<CheckReport, CheckFailure> {
        let normalizer = OutputNormalizer::new(&self.target.dir);
        let normalizer = match &self.target.file_url_base {
            Some(base) => normalizer.with_file_url_base(base.clone()),
            None => normalizer,
        };
        let mut summaries = Vec::new();
        for file in &self.target.files {
            let issues = self.todos_in(file);
            if issues.is_empty() {
                continue;
            }
            let filename = normalizer.filename(&file.to_string_lossy());
            let file_url = match &self.target.file_url_base {
                Some(base) => format!("{}/{filename}", base.trim_end_matches('/')),
                None => String::new(),
            };
            summaries.push(FileSummary {
                filename,
                file_url,
                issues,
            });
        }
        let total = self.target.files.len();
        Ok(CheckReport {
            percentage: ratio(total.saturating_sub(summaries.len()), total),
            file_summaries: summaries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CommandSpec, ExternalCheck, FormatKind, ToolArgs, build_checks, default_check_ids,
        external, pass_ratio, validate_check_ids,
    };
    use crate::check::{Check, Target};
    use crate::domain::{FileSummary, Issue};
    use crate::error::ReportCardError;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn build_checks_supports_aliases() {
        let target = Target::new(".", vec![PathBuf::from("main.go")]);
        let checks = build_checks(
            &[
                "govet".to_string(),
                "cyclo".to_string(),
                "todofinder".to_string(),
                " License ".to_string(),
            ],
            &target,
            Duration::from_secs(1),
        )
        .expect("build checks");

        let names: Vec<&str> = checks.iter().map(|check| check.name()).collect();
        assert_eq!(names, vec!["go_vet", "gocyclo", "todo", "license"]);
    }

    #[test]
    fn build_checks_rejects_unknown_ids() {
        let target = Target::new(".", vec![PathBuf::from("main.go")]);
        let err = build_checks(&["nope".to_string()], &target, Duration::from_secs(1))
            .err()
            .expect("unknown check");
        assert!(matches!(err, ReportCardError::UnknownCheck(id) if id == "nope"));
    }

    #[test]
    fn validate_check_ids_names_first_unknown() {
        assert!(validate_check_ids(&default_check_ids()).is_ok());
        let err = validate_check_ids(&["vet".to_string(), "gosec".to_string()])
            .expect_err("unknown");
        assert!(matches!(err, ReportCardError::UnknownCheck(id) if id == "gosec"));
    }

    #[test]
    fn default_checks_resolve() {
        let target = Target::new(".", vec![PathBuf::from("main.go")]);
        let checks = build_checks(&default_check_ids(), &target, Duration::from_secs(1))
            .expect("defaults");
        assert_eq!(checks.len(), 8);
        assert!(checks.iter().all(|check| (0.0..=1.0).contains(&check.weight())));
    }

    #[test]
    fn pass_ratio_counts_failing_files() {
        let target = Target::new(
            ".",
            vec![
                PathBuf::from("a.go"),
                PathBuf::from("b.go"),
                PathBuf::from("c.go"),
                PathBuf::from("d.go"),
            ],
        );
        let summaries = vec![summary("a.go", 3), summary("", 1)];
        let ratio = pass_ratio(&target, &summaries).expect("ratio");
        assert!((ratio - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn pass_ratio_is_full_without_summaries() {
        let target = Target::new(".", vec![PathBuf::from("a.go"), PathBuf::from("b.go")]);
        assert_eq!(pass_ratio(&target, &[]).expect("ratio"), 1.0);
    }

    #[test]
    fn pass_ratio_scores_single_file_by_line() {
        let root = temp_dir();
        let file = root.join("main.go");
        std::fs::write(&file, "package main\n\nfunc main() {\n}\n").expect("write");
        let target = Target::new(&root, vec![file]);

        let ratio = pass_ratio(&target, &[summary("main.go", 1)]).expect("ratio");
        assert!((ratio - 0.75).abs() < f64::EPSILON);

        cleanup(&root);
    }

    #[cfg(unix)]
    #[test]
    fn external_check_parses_findings_and_scores() {
        let root = temp_dir();
        let files = vec![root.join("a.go"), root.join("b.go")];
        let check = scripted_check(
            &root,
            files,
            "printf 'a.go:4:2: shadowed variable\\na.go:9: unused result\\n'; exit 1",
        );

        let report = check.percentage().expect("check runs");
        assert!((report.percentage - 0.5).abs() < f64::EPSILON);
        assert_eq!(report.file_summaries.len(), 1);
        assert_eq!(report.file_summaries[0].filename, "a.go");
        assert_eq!(
            report.file_summaries[0].issues,
            vec![
                Issue::new(4, "shadowed variable"),
                Issue::new(9, "unused result")
            ]
        );

        cleanup(&root);
    }

    #[cfg(unix)]
    #[test]
    fn external_check_failure_keeps_partial_summaries() {
        let root = temp_dir();
        let files = vec![root.join("a.go"), root.join("b.go")];
        let check = scripted_check(&root, files, "echo 'b.go:1: broken'; exit 2");

        let failure = check.percentage().expect_err("exit 2 is a failure");
        assert!(matches!(failure.error, ReportCardError::ToolFailed { .. }));
        assert_eq!(failure.partial.len(), 1);
        assert_eq!(failure.partial[0].filename, "b.go");

        cleanup(&root);
    }

    #[cfg(unix)]
    #[test]
    fn failed_tool_reports_stdout_and_stderr() {
        let root = temp_dir();
        let files = vec![root.join("a.go"), root.join("b.go")];
        let check = scripted_check(
            &root,
            files,
            "echo 'usage: scripted'; echo 'bad flag' >&2; exit 2",
        );

        let failure = check.percentage().expect_err("exit 2 is a failure");
        match failure.error {
            ReportCardError::ToolFailed { output, .. } => {
                assert_eq!(output, "usage: scripted\nbad flag");
            }
            other => panic!("expected tool failure, got {other:?}"),
        }

        cleanup(&root);
    }

    #[cfg(unix)]
    #[test]
    fn timed_out_tool_keeps_findings_printed_so_far() {
        let root = temp_dir();
        let files = vec![root.join("a.go"), root.join("b.go")];
        let check = ExternalCheck {
            timeout: Duration::from_secs(1),
            ..scripted_check(
                &root,
                files,
                "echo 'a.go:1:1: \"teh\" is a misspelling'; exec sleep 5",
            )
        };

        let started = std::time::Instant::now();
        let failure = check.percentage().expect_err("deadline passes");

        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(matches!(
            failure.error,
            ReportCardError::Timeout { seconds: 1, .. }
        ));
        assert_eq!(failure.partial.len(), 1);
        assert_eq!(failure.partial[0].filename, "a.go");
        assert_eq!(failure.partial[0].issues[0].line, 1);

        cleanup(&root);
    }

    #[cfg(unix)]
    #[test]
    fn external_check_ignores_generated_files() {
        let root = temp_dir();
        let files = vec![root.join("a.go"), root.join("b.go")];
        let check = scripted_check(&root, files, "echo 'api.pb.go:1: generated'");

        let report = check.percentage().expect("check runs");
        assert_eq!(report.percentage, 1.0);
        assert!(report.file_summaries.is_empty());

        cleanup(&root);
    }

    #[test]
    fn license_and_readme_checks_inspect_root() {
        let root = temp_dir();
        let target = Target::new(&root, vec![root.join("main.go")]);
        let checks = build_checks(
            &["license".to_string(), "readme".to_string()],
            &target,
            Duration::from_secs(1),
        )
        .expect("checks");

        for check in &checks {
            let report = check.percentage().expect("runs");
            assert_eq!(report.percentage, 0.0, "{} should fail", check.name());
            assert_eq!(report.file_summaries.len(), 1);
            assert!(report.file_summaries[0].filename.is_empty());
        }

        std::fs::write(root.join("LICENSE.md"), "MIT").expect("license");
        std::fs::write(root.join("README"), "hello").expect("readme");
        for check in &checks {
            let report = check.percentage().expect("runs");
            assert_eq!(report.percentage, 1.0, "{} should pass", check.name());
            assert!(report.file_summaries.is_empty());
        }

        cleanup(&root);
    }

    #[test]
    fn todo_check_reports_comment_lines() {
        let root = temp_dir();
        let noisy = root.join("noisy.go");
        let clean = root.join("clean.go");
        std::fs::write(&noisy, "package x\n// TODO: tidy up\nvar todoList = 1\n").expect("noisy");
        std::fs::write(&clean, "package x\n").expect("clean");
        let target = Target::new(&root, vec![noisy, clean]);

        let checks = build_checks(&["todo".to_string()], &target, Duration::from_secs(1))
            .expect("checks");
        let report = checks[0].percentage().expect("runs");

        assert!((report.percentage - 0.5).abs() < f64::EPSILON);
        assert_eq!(report.file_summaries.len(), 1);
        assert_eq!(report.file_summaries[0].filename, "noisy.go");
        assert_eq!(
            report.file_summaries[0].issues,
            vec![Issue::new(2, "// TODO: tidy up")]
        );

        cleanup(&root);
    }

    fn scripted_check(root: &Path, files: Vec<PathBuf>, script: &str) -> ExternalCheck {
        for file in &files {
            std::fs::write(file, "package x\n").expect("write source");
        }
        external(
            "scripted",
            "runs a shell script",
            0.5,
            CommandSpec::new("sh", &["-c", script]),
            ToolArgs::Root,
            FormatKind::ColonDelimited,
            Arc::new(Target::new(root, files)),
            Duration::from_secs(10),
        )
    }

    fn summary(filename: &str, issues: usize) -> FileSummary {
        FileSummary {
            filename: filename.to_string(),
            file_url: String::new(),
            issues: (0..issues).map(|line| Issue::new(line as u32 + 1, "x")).collect(),
        }
    }

    fn temp_dir() -> PathBuf {
        static COUNTER: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        let count = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!("reportcard_checks_test_{nanos}_{count}"));
        std::fs::create_dir_all(&root).expect("create temp dir");
        root
    }

    fn cleanup(root: &Path) {
        std::fs::remove_dir_all(root).expect("cleanup temp dir");
    }
}

//! Conversion of raw analyzer output into [`FileSummary`] values.
//!
//! Every analyzer prints findings in its own shape. A check picks one
//! [`FormatKind`] and the [`OutputNormalizer`] turns the text into issues,
//! grouped per file and keyed by the filename relative to the analyzed root.
//! Malformed lines are never dropped; they degrade to file-level issues.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{FileSummary, Issue};

/// Source-tree prefixes that clone locations are nested under.
const SOURCE_TREE_PREFIXES: &[&str] = &["_repos/src/", "repos/src/"];

/// Hosts whose `host/org/repo/` prefix is stripped from reported paths.
const FORGE_HOSTS: &[&str] = &["github.com", "gitlab.com", "bitbucket.org", "codeberg.org"];

/// Shape of a tool's per-line report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    /// `path[:line[:column]]: message`, as printed by vet-style linters.
    ColonDelimited,
    /// `message ... path:line:column`, as printed by complexity reporters.
    SpaceDelimitedTrailingLocator,
    /// A non-indented line names a file; indented lines below it describe it.
    FreeText,
}

/// Normalizes tool output for one analyzed root.
#[derive(Debug, Clone)]
pub struct OutputNormalizer {
    roots: Vec<PathBuf>,
    file_url_base: Option<String>,
}

impl OutputNormalizer {
    /// Create a normalizer that reports filenames relative to `root`.
    pub fn new(root: &Path) -> Self {
        let mut roots = vec![root.to_path_buf()];
        if let Ok(stripped) = root.strip_prefix(".") {
            if !stripped.as_os_str().is_empty() {
                roots.push(stripped.to_path_buf());
            }
        }
        if let Ok(canonical) = root.canonicalize() {
            if !roots.contains(&canonical) {
                roots.push(canonical);
            }
        }
        Self {
            roots,
            file_url_base: None,
        }
    }

    /// Build display links as `{base}/{filename}` for every summary.
    pub fn with_file_url_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.file_url_base = if base.trim().is_empty() {
            None
        } else {
            Some(base.trim_end_matches('/').to_string())
        };
        self
    }

    /// Parse raw tool output into one summary per reported file.
    pub fn normalize(&self, kind: FormatKind, output: &str) -> Vec<FileSummary> {
        let mut collector = SummaryCollector::default();
        match kind {
            FormatKind::ColonDelimited => {
                for line in non_empty_lines(output) {
                    let (path, issue) = parse_colon_line(line);
                    collector.push(self.filename(path), issue);
                }
            }
            FormatKind::SpaceDelimitedTrailingLocator => {
                for line in non_empty_lines(output) {
                    let (path, issue) = parse_trailing_locator_line(line);
                    collector.push(self.filename(path), issue);
                }
            }
            FormatKind::FreeText => self.collect_free_text(output, &mut collector),
        }
        collector.finish(self.file_url_base.as_deref())
    }

    /// Express a reported path relative to the analyzed root.
    pub fn filename(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() {
            return String::new();
        }
        let path = Path::new(raw);
        for root in &self.roots {
            if let Ok(relative) = path.strip_prefix(root) {
                if !relative.as_os_str().is_empty() {
                    return clean_relative(&relative.to_string_lossy());
                }
            }
        }

        let mut name = raw.replace('\\', "/");
        for prefix in SOURCE_TREE_PREFIXES {
            if let Some(index) = name.find(prefix) {
                name = name[index + prefix.len()..].to_string();
                break;
            }
        }
        let name = clean_relative(&name);
        strip_forge_prefix(&name).unwrap_or(name)
    }

    fn collect_free_text(&self, output: &str, collector: &mut SummaryCollector) {
        let mut header: Option<(String, bool)> = None;
        for line in non_empty_lines(output) {
            let indented = line.starts_with(char::is_whitespace);
            if indented {
                match header.as_mut() {
                    Some((filename, has_body)) => {
                        collector.push(filename.clone(), Issue::file_level(line.trim()));
                        *has_body = true;
                    }
                    None => collector.push(String::new(), Issue::file_level(line.trim())),
                }
                continue;
            }

            if let Some((filename, has_body)) = header.take() {
                if !has_body {
                    collector.push(filename.clone(), Issue::file_level(filename));
                }
            }
            let name = line.trim().trim_end_matches(':');
            header = Some((self.filename(name), false));
        }
        if let Some((filename, has_body)) = header {
            if !has_body {
                collector.push(filename.clone(), Issue::file_level(filename));
            }
        }
    }
}

/// Accumulates issues per filename, preserving first-seen order.
#[derive(Default)]
struct SummaryCollector {
    summaries: Vec<FileSummary>,
    index: HashMap<String, usize>,
}

impl SummaryCollector {
    fn push(&mut self, filename: String, issue: Issue) {
        let position = match self.index.get(&filename) {
            Some(position) => *position,
            None => {
                self.summaries.push(FileSummary::new(filename.clone()));
                self.index.insert(filename, self.summaries.len() - 1);
                self.summaries.len() - 1
            }
        };
        self.summaries[position].issues.push(issue);
    }

    fn finish(mut self, file_url_base: Option<&str>) -> Vec<FileSummary> {
        if let Some(base) = file_url_base {
            for summary in &mut self.summaries {
                if !summary.filename.is_empty() {
                    summary.file_url = format!("{base}/{}", summary.filename);
                }
            }
        }
        self.summaries
    }
}

fn non_empty_lines(output: &str) -> impl Iterator<Item = &str> {
    output
        .lines()
        .map(|line| line.trim_end())
        .filter(|line| !line.trim().is_empty())
}

/// Split `path:line:column: message` into its parts.
///
/// Lines with no colon at all are repository-level findings.
fn parse_colon_line(line: &str) -> (&str, Issue) {
    let line = line.trim();
    let Some((path, rest)) = line.split_once(':') else {
        return ("", Issue::file_level(line));
    };

    let (line_field, after_line) = rest.split_once(':').unwrap_or((rest, ""));
    let Ok(line_number) = line_field.trim().parse::<u32>() else {
        return (path, Issue::file_level(rest.trim()));
    };

    let message = match after_line.split_once(':') {
        Some((column, message)) if column.trim().parse::<u32>().is_ok() => message,
        _ => after_line,
    };
    (path, Issue::new(line_number, message.trim()))
}

/// Split `message ... path:line:column`, reading the locator from the end.
fn parse_trailing_locator_line(line: &str) -> (&str, Issue) {
    let line = line.trim();
    let (message, locator) = match line.rsplit_once(char::is_whitespace) {
        Some((message, locator)) => (message.trim(), locator),
        None => ("", line),
    };

    match parse_locator(locator) {
        Some((path, line_number)) => {
            let message = if message.is_empty() { line } else { message };
            (path, Issue::new(line_number, message))
        }
        None => ("", Issue::file_level(line)),
    }
}

/// Parse `path[:line[:column]]`. Returns `None` when no path can be found.
fn parse_locator(locator: &str) -> Option<(&str, u32)> {
    let locator = locator.trim_end_matches(':');
    let mut path = locator;
    let mut numbers = Vec::with_capacity(2);
    while numbers.len() < 2 {
        let Some((head, tail)) = path.rsplit_once(':') else {
            break;
        };
        let Ok(number) = tail.parse::<u32>() else {
            break;
        };
        numbers.push(number);
        path = head;
    }
    if path.is_empty() || (numbers.is_empty() && !looks_like_path(path)) {
        return None;
    }
    // The number closest to the path is the line; a second one is the column.
    let line_number = numbers.last().copied().unwrap_or(0);
    Some((path, line_number))
}

fn looks_like_path(candidate: &str) -> bool {
    candidate.contains('/')
        || Path::new(candidate)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.chars().all(|c| c.is_ascii_alphabetic()))
}

fn clean_relative(path: &str) -> String {
    let mut path = path.trim();
    while let Some(stripped) = path.strip_prefix("./") {
        path = stripped;
    }
    path.trim_start_matches('/').to_string()
}

fn strip_forge_prefix(path: &str) -> Option<String> {
    let mut segments = path.splitn(4, '/');
    let host = segments.next()?;
    if !FORGE_HOSTS.contains(&host) {
        return None;
    }
    let _org = segments.next()?;
    let _repo = segments.next()?;
    let rest = segments.next()?;
    Some(rest.to_string())
}

#[cfg(test)]
mod tests {
    use super::{FormatKind, OutputNormalizer, parse_colon_line, parse_locator};
    use crate::domain::Issue;
    use std::path::Path;

    fn normalizer() -> OutputNormalizer {
        OutputNormalizer::new(Path::new("/work/repo"))
    }

    #[test]
    fn colon_line_round_trips_line_and_message() {
        let (path, issue) = parse_colon_line("handlers/linter.go:68: exported func Lint should have comment");
        assert_eq!(path, "handlers/linter.go");
        assert_eq!(
            issue,
            Issue::new(68, "exported func Lint should have comment")
        );
    }

    #[test]
    fn colon_line_skips_column_and_keeps_colons_in_message() {
        let (path, issue) =
            parse_colon_line("handlers/linter.go:68:3: ineffectual assignment to `err`: value unused");
        assert_eq!(path, "handlers/linter.go");
        assert_eq!(issue.line, 68);
        assert_eq!(
            issue.message,
            "ineffectual assignment to `err`: value unused"
        );
    }

    #[test]
    fn colon_line_with_bad_line_number_is_file_level() {
        let (path, issue) = parse_colon_line("main.go:abc: something odd");
        assert_eq!(path, "main.go");
        assert_eq!(issue, Issue::file_level("abc: something odd"));
    }

    #[test]
    fn colon_line_without_colon_is_repo_level() {
        let (path, issue) = parse_colon_line("build failed");
        assert_eq!(path, "");
        assert_eq!(issue, Issue::file_level("build failed"));
    }

    #[test]
    fn normalize_groups_non_contiguous_reports_per_file() {
        let output = "/work/repo/a.go:1:1: first\n\
                      /work/repo/b.go:2: second\n\
                      /work/repo/a.go:9:4: third\n\n";
        let summaries = normalizer().normalize(FormatKind::ColonDelimited, output);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].filename, "a.go");
        assert_eq!(
            summaries[0].issues,
            vec![Issue::new(1, "first"), Issue::new(9, "third")]
        );
        assert_eq!(summaries[1].filename, "b.go");
        assert_eq!(summaries[1].issues, vec![Issue::new(2, "second")]);
    }

    #[test]
    fn normalize_never_drops_lines() {
        let output = "a.go:1: ok\nnot a location\nb.go:x: odd\n";
        let summaries = normalizer().normalize(FormatKind::ColonDelimited, output);
        let issues: usize = summaries.iter().map(|summary| summary.issues.len()).sum();
        assert_eq!(issues, 3);
    }

    #[test]
    fn trailing_locator_reads_from_end() {
        let output = "16 server (*Server).handle /work/repo/server/http.go:42:1\n";
        let summaries =
            normalizer().normalize(FormatKind::SpaceDelimitedTrailingLocator, output);

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].filename, "server/http.go");
        assert_eq!(
            summaries[0].issues,
            vec![Issue::new(42, "16 server (*Server).handle")]
        );
    }

    #[test]
    fn trailing_locator_without_location_is_repo_level() {
        let output = "Average: 3.2\n";
        let summaries =
            normalizer().normalize(FormatKind::SpaceDelimitedTrailingLocator, output);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].filename, "");
        assert_eq!(summaries[0].issues, vec![Issue::file_level("Average: 3.2")]);
    }

    #[test]
    fn locator_takes_line_before_column() {
        assert_eq!(parse_locator("a/b.go:12:5"), Some(("a/b.go", 12)));
        assert_eq!(parse_locator("a/b.go:12"), Some(("a/b.go", 12)));
        assert_eq!(parse_locator("a/b.go"), Some(("a/b.go", 0)));
        assert_eq!(parse_locator("3.2"), None);
        assert_eq!(parse_locator("word"), None);
    }

    #[test]
    fn free_text_blocks_and_bare_filenames() {
        let output = "/work/repo/fmt.go\nstyle.go:\n    line too long\n    missing blank line\n";
        let summaries = normalizer().normalize(FormatKind::FreeText, output);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].filename, "fmt.go");
        assert_eq!(summaries[0].issues, vec![Issue::file_level("fmt.go")]);
        assert_eq!(summaries[1].filename, "style.go");
        assert_eq!(
            summaries[1].issues,
            vec![
                Issue::file_level("line too long"),
                Issue::file_level("missing blank line")
            ]
        );
    }

    #[test]
    fn empty_output_yields_no_summaries() {
        for kind in [
            FormatKind::ColonDelimited,
            FormatKind::SpaceDelimitedTrailingLocator,
            FormatKind::FreeText,
        ] {
            assert!(normalizer().normalize(kind, "\n  \n").is_empty());
        }
    }

    #[test]
    fn filenames_drop_source_tree_and_forge_prefixes() {
        let normalizer = OutputNormalizer::new(Path::new("elsewhere"));
        assert_eq!(
            normalizer.filename("repos/src/github.com/org/repo/pkg/a.go"),
            "pkg/a.go"
        );
        assert_eq!(
            normalizer.filename("/srv/_repos/src/github.com/org/repo/b.go"),
            "b.go"
        );
        assert_eq!(normalizer.filename("./pkg/c.go"), "pkg/c.go");
        assert_eq!(normalizer.filename("pkg/d.go"), "pkg/d.go");
    }

    #[test]
    fn file_urls_are_built_from_base() {
        let normalizer = normalizer().with_file_url_base("https://github.com/org/repo/blob/master/");
        let summaries = normalizer.normalize(FormatKind::ColonDelimited, "/work/repo/a.go:3: x\n");
        assert_eq!(
            summaries[0].file_url,
            "https://github.com/org/repo/blob/master/a.go"
        );
    }
}

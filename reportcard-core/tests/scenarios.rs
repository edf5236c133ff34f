use std::path::PathBuf;
use std::sync::Arc;

use reportcard_core::{
    Check, CheckFailure, CheckReport, EngineConfig, FileSummary, FormatKind, Grade, Leaderboard,
    LeaderboardEntry, MemoryCache, OutputNormalizer, RecentQueue, ReportCardError,
    ReportCardService, SourceInspector, StdFileSystem, Target, aggregate, evaluate, run_checks,
};

struct FixedCheck {
    name: &'static str,
    weight: f64,
    percentage: f64,
    fails: bool,
}

impl Check for FixedCheck {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "fixed result"
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn percentage(&self) -> Result<CheckReport, CheckFailure> {
        if self.fails {
            return Err(ReportCardError::ToolNotFound(self.name.to_string()).into());
        }
        Ok(CheckReport {
            percentage: self.percentage,
            file_summaries: Vec::new(),
        })
    }
}

fn fixed(name: &'static str, weight: f64, percentage: f64, fails: bool) -> Arc<dyn Check> {
    Arc::new(FixedCheck {
        name,
        weight,
        percentage,
        fails,
    })
}

fn temp_dir(label: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let root = std::env::temp_dir().join(format!("reportcard_it_{label}_{nanos}"));
    std::fs::create_dir_all(&root).expect("create temp dir");
    root
}

#[test]
fn weighted_average_with_failed_check_grades_c() {
    let checks = vec![
        fixed("fmt", 0.5, 1.0, false),
        fixed("vet", 0.3, 0.5, false),
        fixed("cyclo", 0.2, 0.0, true),
    ];

    let result = aggregate(run_checks(&checks), 12);

    assert!((result.average - 0.65).abs() < 1e-9);
    assert_eq!(result.grade, Grade::C);
    let names: Vec<&str> = result.scores.iter().map(|score| score.name.as_str()).collect();
    assert_eq!(names, vec!["fmt", "vet", "cyclo"]);
    assert!(result.scores[2].error.is_some());
}

#[test]
fn empty_file_list_is_a_structural_error() {
    let root = temp_dir("empty");
    let target = Target::new(&root, Vec::new());

    let err = evaluate(&target, &EngineConfig::default()).expect_err("no files");
    assert!(matches!(err, ReportCardError::NoFiles));
    assert!(err.is_structural());

    std::fs::remove_dir_all(&root).expect("cleanup temp dir");
}

#[test]
fn leaderboard_keeps_the_best_two() {
    let mut board = Leaderboard::new(2, 100);
    for (key, score) in [("repoA", 80.0), ("repoB", 60.0), ("repoC", 90.0)] {
        board.upsert(LeaderboardEntry {
            repo_key: key.to_string(),
            score,
            file_count: 100,
        });
    }

    let ranked: Vec<(String, f64)> = board
        .top_n(10)
        .into_iter()
        .map(|entry| (entry.repo_key, entry.score))
        .collect();
    assert_eq!(
        ranked,
        vec![("repoC".to_string(), 90.0), ("repoA".to_string(), 80.0)]
    );
}

#[test]
fn recency_queue_ignores_repeats_and_evicts_oldest() {
    let mut queue = RecentQueue::new(2);
    for key in ["x", "y", "x", "z"] {
        queue.touch(key);
    }
    let keys: Vec<String> = queue.views().into_iter().map(|view| view.repo_key).collect();
    assert_eq!(keys, vec!["z", "y"]);
}

#[test]
fn grade_is_monotonic_over_percentages() {
    let mut previous = Grade::from_percentage(0.0);
    for step in 0..=1000 {
        let grade = Grade::from_percentage(f64::from(step) / 10.0);
        assert!(grade >= previous, "grade dropped at {step}");
        previous = grade;
    }
}

#[test]
fn well_formed_colon_line_yields_one_issue() {
    let normalizer = OutputNormalizer::new(std::path::Path::new("/src/project"));
    let summaries = normalizer.normalize(
        FormatKind::ColonDelimited,
        "/src/project/pkg/server.go:42:7:  error return value not checked  \n",
    );
    assert_eq!(
        summaries,
        vec![FileSummary {
            filename: "pkg/server.go".to_string(),
            file_url: String::new(),
            issues: vec![reportcard_core::Issue::new(
                42,
                "error return value not checked"
            )],
        }]
    );
}

#[test]
fn service_evaluates_inspected_checkout_end_to_end() {
    let root = temp_dir("e2e");
    std::fs::create_dir_all(root.join("vendor/dep")).expect("vendor");
    std::fs::write(root.join("main.go"), "package main\n// TODO: wire flags\n").expect("main");
    std::fs::write(root.join("util.go"), "package main\n").expect("util");
    std::fs::write(root.join("assets_bindata.go"), "package main\n").expect("generated");
    std::fs::write(root.join("vendor/dep/dep.go"), "package dep\n// TODO\n").expect("dep");
    std::fs::write(root.join("README.md"), "# demo\n").expect("readme");

    let target = SourceInspector::new(StdFileSystem::new())
        .target(&root)
        .expect("sources");
    assert_eq!(target.files.len(), 2);

    let config = EngineConfig {
        leaderboard_min_files: 2,
        checks: vec![
            "readme".to_string(),
            "license".to_string(),
            "todo".to_string(),
        ],
        ..EngineConfig::default()
    };
    let service = ReportCardService::new(Arc::new(MemoryCache::new()), config);
    let outcome = service.evaluate("local/demo", &target, false).expect("evaluate");

    let result = &outcome.record.result;
    assert_eq!(result.files_analyzed, 2);
    // readme passes, license fails, todo has zero weight.
    assert!((result.average - 0.5).abs() < 1e-9);
    assert_eq!(result.grade, Grade::E);
    let todo = result
        .scores
        .iter()
        .find(|score| score.name == "todo")
        .expect("todo score");
    assert_eq!(todo.file_summaries.len(), 1);
    assert_eq!(todo.file_summaries[0].filename, "main.go");
    assert_eq!(service.top_scores(1)[0].repo_key, "local/demo");
    assert_eq!(service.total_repos().expect("total"), 1);

    std::fs::remove_dir_all(&root).expect("cleanup temp dir");
}

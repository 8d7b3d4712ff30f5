use std::fs;
use std::path::{Path, PathBuf};

use sortwise_core::OrganizerConfig;
use sortwise_organize::{Action, OrganizerRun, ReportFormat, Reporter, RunOptions, SkipReason};
use tempfile::TempDir;

const FINANCIAL_RULES: &str = r#"
rules:
  - category: Financial
    signals:
      - type: filename
        patterns: [invoice, receipt]
        weight: 2.0
      - type: extension
        extensions: [pdf]
        weight: 1.0
  - category: Temporary
    signals:
      - type: path
        keywords: [downloads]
        weight: 1.0
"#;

fn config(source: &Path, destination: &Path, extra: &str) -> OrganizerConfig {
    let yaml = format!(
        "source_directory: '{}'\norganization:\n  destination_directory: '{}'\n{extra}",
        source.display(),
        destination.display()
    );
    OrganizerConfig::from_yaml_str(&yaml).unwrap()
}

/// Every regular file below `root`.
fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let Ok(entries) = fs::read_dir(root) else {
        return found;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            found.extend(files_under(&path));
        } else {
            found.push(path);
        }
    }
    found.sort();
    found
}

#[test]
fn test_identical_files_leave_one_copy() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("in");
    let dest = temp.path().join("out");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("a.txt"), "same content").unwrap();
    fs::write(source.join("b.txt"), "same content").unwrap();

    let report = OrganizerRun::new(&config(&source, &dest, "rules: []\n"), RunOptions::default())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.statistics.scanned, 2);
    assert_eq!(report.statistics.duplicates_found, 1);
    assert_eq!(report.statistics.moved, 1);
    assert_eq!(report.statistics.skipped, 1);
    assert_eq!(files_under(&dest).len(), 1);
    assert_eq!(files_under(&source).len(), 1);
}

#[test]
fn test_invoice_in_downloads_lands_in_financial() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("in");
    let dest = temp.path().join("out");
    fs::create_dir_all(source.join("Downloads")).unwrap();
    fs::write(source.join("Downloads/invoice_2024.pdf"), "%PDF-1.7").unwrap();

    let report = OrganizerRun::new(&config(&source, &dest, FINANCIAL_RULES), RunOptions::default())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.statistics.classified["Financial"], 1);
    assert_eq!(report.statistics.classified["Temporary"], 0);
    assert!(dest.join("Financial/invoice_2024.pdf").is_file());
}

#[test]
fn test_empty_rules_route_to_unsorted() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("in");
    let dest = temp.path().join("out");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("notes.md"), "# notes").unwrap();

    let report = OrganizerRun::new(&config(&source, &dest, ""), RunOptions::default())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.statistics.unclassified, 1);
    assert!(dest.join("Unsorted/notes.md").is_file());
}

#[test]
fn test_dry_run_matches_live_run() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("in");
    let dest = temp.path().join("out");
    fs::create_dir_all(source.join("Downloads")).unwrap();
    fs::create_dir_all(source.join("other")).unwrap();
    fs::write(source.join("Downloads/invoice_2024.pdf"), "one").unwrap();
    fs::write(source.join("other/invoice_2024.pdf"), "two").unwrap();
    fs::write(source.join("other/copy.pdf"), "one").unwrap();
    fs::write(source.join("readme.txt"), "three").unwrap();

    // A pre-existing file forces a rename in both runs.
    fs::create_dir_all(dest.join("Unsorted")).unwrap();
    fs::write(dest.join("Unsorted/readme.txt"), "old").unwrap();

    let config = config(&source, &dest, FINANCIAL_RULES);
    let before = files_under(temp.path());

    let dry = OrganizerRun::new(&config, RunOptions::dry_run())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(files_under(temp.path()), before);

    let live = OrganizerRun::new(&config, RunOptions::default())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(dry.statistics, live.statistics);
    let destinations = |report: &sortwise_organize::RunReport| {
        let mut all: Vec<_> = report
            .outcomes
            .iter()
            .filter_map(|o| o.destination.clone())
            .collect();
        all.sort();
        all
    };
    assert_eq!(destinations(&dry), destinations(&live));
    assert!(dest.join("Unsorted/readme (1).txt").is_file());
}

#[test]
fn test_nested_destination_is_not_rescanned() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().to_path_buf();
    let dest = source.join("Organized");
    fs::write(source.join("a.txt"), "a").unwrap();

    let config = config(&source, &dest, "");
    let first = OrganizerRun::new(&config, RunOptions::default())
        .unwrap()
        .run()
        .unwrap();
    let second = OrganizerRun::new(&config, RunOptions::default())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(first.statistics.moved, 1);
    assert_eq!(second.statistics.scanned, 0);
}

#[test]
fn test_duplicates_folder_policy() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("in");
    let dest = temp.path().join("out");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("a.txt"), "same").unwrap();
    fs::create_dir_all(source.join("sub")).unwrap();
    fs::write(source.join("sub/b.txt"), "same").unwrap();

    let config = config(
        &source,
        &dest,
        "  duplicate_policy: move\n  operation: copy\n",
    );
    let report = OrganizerRun::new(&config, RunOptions::default())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.statistics.duplicates_found, 1);
    assert_eq!(report.statistics.moved, 2);
    assert_eq!(files_under(&dest.join("Duplicates")).len(), 1);
    assert_eq!(files_under(&source).len(), 2);
    assert!(
        report
            .outcomes
            .iter()
            .all(|o| o.action == Action::Copied)
    );
}

#[test]
fn test_skip_conflict_policy_counts_skips() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("in");
    let dest = temp.path().join("out");
    fs::create_dir_all(source.join("x")).unwrap();
    fs::create_dir_all(source.join("y")).unwrap();
    fs::write(source.join("x/a.txt"), "first").unwrap();
    fs::write(source.join("y/a.txt"), "second").unwrap();

    let config = config(&source, &dest, "  conflict_policy: skip\n");
    let report = OrganizerRun::new(&config, RunOptions::default())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.statistics.moved, 1);
    assert_eq!(report.statistics.skipped, 1);
    assert!(report.outcomes.iter().any(|o| matches!(
        o.action,
        Action::Skipped {
            reason: SkipReason::Conflict { .. }
        }
    )));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_does_not_stop_the_run() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let source = temp.path().join("in");
    let dest = temp.path().join("out");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("ok.txt"), "fine").unwrap();
    let locked = source.join("locked.txt");
    fs::write(&locked, "secret").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits; nothing to assert in that case.
    if fs::read(&locked).is_ok() {
        return;
    }

    let report = OrganizerRun::new(&config(&source, &dest, ""), RunOptions::default())
        .unwrap()
        .run()
        .unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(report.statistics.errors, 1);
    assert_eq!(report.statistics.moved, 1);
    assert!(dest.join("Unsorted/ok.txt").is_file());
    assert!(locked.exists());

    let text = Reporter::new(ReportFormat::Text).render(&report).unwrap();
    assert!(text.contains("Errors:"));
}

#[test]
fn test_missing_source_is_fatal() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp.path().join("nope"), &temp.path().join("out"), "");
    let run = OrganizerRun::new(&config, RunOptions::default()).unwrap();
    assert!(run.run().is_err());
}

#[test]
fn test_run_with_dispatch_logs_to_caller_subscriber() {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let temp = TempDir::new().unwrap();
    let source = temp.path().join("in");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("a.txt"), "a").unwrap();

    let buffer = Buffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .with_writer(move || writer.clone())
        .finish();
    let dispatch = tracing::Dispatch::new(subscriber);

    OrganizerRun::new(
        &config(&source, &temp.path().join("out"), ""),
        RunOptions::dry_run(),
    )
    .unwrap()
    .run_with_dispatch(&dispatch)
    .unwrap();

    let logged = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert!(logged.contains("run complete"));
    assert!(logged.contains("[dry run] would move"));
}

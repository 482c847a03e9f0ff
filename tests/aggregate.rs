#[path = "common/mod.rs"]
mod common;

use common::*;
use dumpsift::{aggregate, CancelToken, CommunityTargets, FileOutcome, FilterSpec};
use std::fs;

fn spec() -> FilterSpec {
    FilterSpec::new(CommunityTargets::new(["depression", "math"]))
}

/// A corrupt archive in the middle of a batch fails alone: the files around
/// it are processed, and its failure is distinguishable from "no matches".
#[test]
fn partial_batch_survives_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let dumps = dir.path().join("dumps");
    let out = dir.path().join("filtered");

    let f1 = dumps.join("RS_2023-10.zst");
    let f2 = dumps.join("RS_2023-11.gz");
    let f3 = dumps.join("RS_2023-12.jsonl");
    write_zst_lines(&f1, &sample_month_lines());
    fs::write(&f2, b"corrupt, not gzip").unwrap();
    write_plain_lines(&f3, &[raw_line("z1", "rust", true, 1)]);

    let report = aggregate(&[f1.clone(), f2.clone(), f3.clone()], &spec(), &out, 1).unwrap();

    // a1, a3, a5, a8 from r/depression plus a7 from r/math.
    assert_eq!(report.outcome("RS_2023-10.zst"), Some(&FileOutcome::Extracted(5)));
    assert!(matches!(report.outcome("RS_2023-11.gz"), Some(FileOutcome::Failed(_))));
    assert_eq!(report.outcome("RS_2023-12.jsonl"), Some(&FileOutcome::Extracted(0)));

    let counts = report.counts();
    assert_eq!(counts.len(), 3);
    assert_eq!(counts["RS_2023-10.zst"], 5);
    assert_eq!(counts["RS_2023-11.gz"], 0);
    assert_eq!(counts["RS_2023-12.jsonl"], 0);
    assert_eq!(report.total_extracted(), 5);

    assert_eq!(read_jsonl_values(&out.join("filtered_RS_2023-10.jsonl")).len(), 5);
    assert!(!out.join("filtered_RS_2023-11.jsonl").exists());
    assert!(out.join("filtered_RS_2023-12.jsonl").exists());
    assert_eq!(
        report.output_paths(),
        vec![out.join("filtered_RS_2023-10.jsonl"), out.join("filtered_RS_2023-12.jsonl")]
    );
}

/// Missing inputs are recorded as `NotFound` and left out of the legacy count map.
#[test]
fn missing_inputs_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("RS_2024-01.jsonl");
    write_plain_lines(&present, &sample_month_lines());
    let absent = dir.path().join("RS_2024-02.zst");

    let report = aggregate(&[absent, present], &spec(), &dir.path().join("out"), 1).unwrap();
    assert_eq!(report.files.len(), 2);
    assert_eq!(report.files[0].outcome, FileOutcome::NotFound);
    assert_eq!(report.files[1].outcome, FileOutcome::Extracted(5));
    let counts = report.counts();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts["RS_2024-01.jsonl"], 5);
}

/// Two inputs with the same file name would overwrite each other; the later one fails.
#[test]
fn duplicate_output_names_fail_later_input() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a").join("RS_2024-01.jsonl");
    let b = dir.path().join("b").join("RS_2024-01.jsonl");
    write_plain_lines(&a, &sample_month_lines());
    write_plain_lines(&b, &[raw_line("b1", "math", true, 1)]);

    let report = aggregate(&[a, b], &spec(), &dir.path().join("out"), 1).unwrap();
    assert_eq!(report.files[0].outcome, FileOutcome::Extracted(5));
    assert!(matches!(report.files[1].outcome, FileOutcome::Failed(_)));
    let kept = read_jsonl_values(&dir.path().join("out").join("filtered_RS_2024-01.jsonl"));
    assert_eq!(kept.len(), 5);
}

/// The per-file cap applies to each archive separately.
#[test]
fn cap_applies_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let f1 = dir.path().join("RS_2024-01.jsonl");
    let f2 = dir.path().join("RS_2024-02.jsonl");
    write_plain_lines(&f1, &sample_month_lines());
    write_plain_lines(&f2, &sample_month_lines());

    let report = aggregate(&[f1, f2], &spec().max_posts(Some(3)), &dir.path().join("out"), 1).unwrap();
    assert_eq!(report.total_extracted(), 6);
    assert!(report.files.iter().all(|f| f.outcome == FileOutcome::Extracted(3)));
}

/// Parallel processing yields the same per-file results, in input order.
#[test]
fn parallel_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let inputs: Vec<_> = (1..=6)
        .map(|m| {
            let p = dir.path().join(format!("RS_2022-{m:02}.zst"));
            let lines: Vec<String> = (0..m).map(|i| raw_line(&format!("m{m}_{i}"), "math", true, i as i64)).collect();
            write_zst_lines(&p, &lines);
            p
        })
        .collect();

    let seq = aggregate(&inputs, &spec(), &dir.path().join("seq"), 1).unwrap();
    let par = aggregate(&inputs, &spec(), &dir.path().join("par"), 4).unwrap();

    let seq_names: Vec<_> = seq.files.iter().map(|f| (f.name.clone(), f.outcome.clone())).collect();
    let par_names: Vec<_> = par.files.iter().map(|f| (f.name.clone(), f.outcome.clone())).collect();
    assert_eq!(seq_names, par_names);
    assert_eq!(par.total_extracted(), 1 + 2 + 3 + 4 + 5 + 6);
}

/// A cancelled batch marks untouched files as cancelled and writes nothing.
#[test]
fn cancelled_batch() {
    let dir = tempfile::tempdir().unwrap();
    let f1 = dir.path().join("RS_2024-01.jsonl");
    write_plain_lines(&f1, &sample_month_lines());

    let token = CancelToken::new();
    token.cancel();
    let out = dir.path().join("out");
    let report = aggregate(&[f1], &spec().cancel_token(token), &out, 1).unwrap();
    assert_eq!(report.files[0].outcome, FileOutcome::Cancelled);
    assert!(!out.join("filtered_RS_2024-01.jsonl").exists());
}

/// An output directory that cannot be created is fatal for the whole call.
#[test]
fn unusable_output_dir_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    fs::write(&blocker, b"file").unwrap();

    let res = aggregate(&[], &spec(), &blocker.join("sub"), 1);
    assert!(res.is_err());
}

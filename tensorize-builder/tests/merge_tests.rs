use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tensorize_builder::{merge_duplicates, MergeOptions, MergePolicy};

fn write_tensor(dir: &std::path::Path, lines: &[&str]) -> PathBuf {
    let path = dir.join("test.tns");
    let mut out = fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(out, "{line}").unwrap();
    }
    path
}

fn read_lines(path: &std::path::Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.to_string())
        .collect()
}

#[test]
fn merge_sums_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tensor(dir.path(), &["1 2 3 1.0", "1 2 3 1.0"]);

    merge_duplicates(&path, 3, &MergePolicy::Sum, &MergeOptions::default()).unwrap();

    assert_eq!(read_lines(&path), vec!["1 2 3 2.0"]);
}

#[test]
fn merge_max_keeps_largest() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tensor(dir.path(), &["1 2 3 1.0", "1 2 3 5.0"]);

    merge_duplicates(&path, 3, &MergePolicy::Max, &MergeOptions::default()).unwrap();

    assert_eq!(read_lines(&path), vec!["1 2 3 5.0"]);
}

#[test]
fn merge_orders_distinct_groups_by_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tensor(dir.path(), &["1 2 3 1.0", "2 1 3 2.0", "1 2 3 5.0"]);

    merge_duplicates(&path, 3, &MergePolicy::Sum, &MergeOptions::default()).unwrap();

    assert_eq!(read_lines(&path), vec!["1 2 3 6.0", "2 1 3 2.0"]);
}

#[test]
fn merge_with_custom_reduction() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tensor(dir.path(), &["1 2 3 1.0", "1 2 3 1.0"]);

    let policy = MergePolicy::Custom(Arc::new(|_values: &[f64]| -1.0));
    merge_duplicates(&path, 3, &policy, &MergeOptions::default()).unwrap();

    assert_eq!(read_lines(&path), vec!["1 2 3 -1.0"]);
}

#[test]
fn merge_none_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tensor(dir.path(), &["1 2 3 1.0", "1 2 3 1.0"]);

    merge_duplicates(&path, 3, &MergePolicy::None, &MergeOptions::default()).unwrap();

    assert_eq!(read_lines(&path), vec!["1 2 3 1.0", "1 2 3 1.0"]);
}

// Small chunks force multiple spill runs and a real k-way merge.
#[test]
fn merge_spills_and_merges_across_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let mut lines = Vec::new();
    // 40 distinct coordinate pairs, each appearing 250 times, interleaved so
    // no run is already grouped.
    for _ in 0..250 {
        for coord in (1..=40u64).rev() {
            lines.push(format!("{coord} {} 1.0", coord % 5 + 1));
        }
    }
    let refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    let path = write_tensor(dir.path(), &refs);

    let options = MergeOptions { chunk_lines: 137 };
    merge_duplicates(&path, 2, &MergePolicy::Sum, &options).unwrap();

    let merged = read_lines(&path);
    assert_eq!(merged.len(), 40);
    assert_eq!(merged[0], "1 2 250.0");
    assert_eq!(merged[39], "40 1 250.0");
    // Sorted coordinate order, coordinate-major.
    let mut sorted = merged.clone();
    sorted.sort_by_key(|line| {
        line.split_whitespace()
            .take(2)
            .map(|t| t.parse::<u64>().unwrap())
            .collect::<Vec<_>>()
    });
    assert_eq!(merged, sorted);
}

#[test]
fn failed_merge_leaves_original_untouched_and_no_temporaries() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tensor(dir.path(), &["1 2 3 1.0", "1 2 3 not-a-number"]);
    let before = fs::read(&path).unwrap();

    let err = merge_duplicates(&path, 3, &MergePolicy::Sum, &MergeOptions::default());
    assert!(err.is_err());

    // Original byte-identical, no stray temp files or spill directories.
    assert_eq!(fs::read(&path).unwrap(), before);
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("test.tns")]);
}

#[test]
fn merge_mean_and_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tensor(dir.path(), &["4 4 2.0", "4 4 6.0", "5 5 9.0"]);
    merge_duplicates(&path, 2, &MergePolicy::Mean, &MergeOptions::default()).unwrap();
    assert_eq!(read_lines(&path), vec!["4 4 4.0", "5 5 9.0"]);

    let path = write_tensor(dir.path(), &["4 4 2.0", "4 4 6.0", "5 5 9.0"]);
    merge_duplicates(&path, 2, &MergePolicy::Count, &MergeOptions::default()).unwrap();
    assert_eq!(read_lines(&path), vec!["4 4 2.0", "5 5 1.0"]);
}

//! Integration tests for `fighting_words`.
//
// This suite verifies:
// - Library pipeline (guest list + comment files -> ranked tables -> exports)
// - CLI behavior including export formats, prior options and failures
// - CSV/TSV cell sanitizing
//
// Notes:
// - All outputs go to an explicit --out-dir / AnalysisOptions::out_dir, so no
//   test changes the global CWD.

use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use csv::WriterBuilder;
use predicates::prelude::*;
use regex::Regex;
use serde_json::Value as Json;
use tempfile::tempdir;

use fighting_words::{
    AnalysisOptions, Error, ExportFormat, ModelError, NAME_TOKEN, PRONOUN_TOKEN, PriorMode,
    analyze_corpus, csv_safe_cell, load_table,
};

// --------------------- helpers ---------------------

/// Create a file with content in a temp dir.
fn write_file(dir: &assert_fs::TempDir, name: &str, content: &str) -> PathBuf {
    let f = dir.child(name);
    f.write_str(content).unwrap();
    f.path().to_path_buf()
}

/// JSON array of comment objects as the scraper writes them.
fn comments_json(texts: &[&str]) -> String {
    let items: Vec<Json> = texts
        .iter()
        .map(|t| serde_json::json!({ "commentText": t, "author": "someone" }))
        .collect();
    serde_json::to_string(&items).unwrap()
}

/// Guest list with two men (group "0") and two women (group "1") plus their comments.
fn fixture() -> (assert_fs::TempDir, PathBuf, PathBuf) {
    let td = assert_fs::TempDir::new().unwrap();
    let guests = write_file(
        &td,
        "guest_list.csv",
        "guest_name,video_id,female_flag,done\n\
         Alan Turing,v1,0,1\n\
         Charles Babbage,v2,0,1\n\
         Ada Lovelace,v3,1,1\n\
         Grace Hopper,v4,1,1\n\
         Unknown Guest,v5,,\n",
    );
    let comments = td.child("comments");
    comments.create_dir_all().unwrap();
    comments
        .child("comments-v1.json")
        .write_str(&comments_json(&[
            "Turing is a legend",
            "He is a legend, a true legend!",
            "legend legend legend",
        ]))
        .unwrap();
    comments
        .child("comments-v2.json")
        .write_str(&comments_json(&["Babbage legend", "his machine was a legend"]))
        .unwrap();
    comments
        .child("comments-v3.json")
        .write_str(&comments_json(&[
            "Ada is so inspiring 😍",
            "She is inspiring",
            "inspiring inspiring",
        ]))
        .unwrap();
    comments
        .child("comments-v4.json")
        .write_str(&comments_json(&["Hopper is inspiring 😍", "her work is inspiring"]))
        .unwrap();
    let dir = comments.path().to_path_buf();
    (td, guests, dir)
}

fn opts(out_dir: &Path, formats: Vec<ExportFormat>) -> AnalysisOptions {
    AnalysisOptions {
        out_dir: out_dir.to_path_buf(),
        export_formats: formats,
        prefix: "gender_analysis".to_string(),
        ..AnalysisOptions::default()
    }
}

/// Find an output file whose name ends with `suffix`.
fn find_with_suffix(dir: &Path, suffix: &str) -> PathBuf {
    for entry in fs::read_dir(dir).unwrap().filter_map(|e| e.ok()) {
        let p = entry.path();
        if let Some(name) = p.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(suffix) {
                return p;
            }
        }
    }
    panic!("No file found ending with {}", suffix);
}

fn count_matching(dir: &Path, re: &Regex) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| re.is_match(e.file_name().to_string_lossy().as_ref()))
        .count()
}

/// Run CLI successfully with a specific working directory.
fn run_cli_ok_in(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = assert_cmd::Command::cargo_bin("fighting_words").unwrap();
    cmd.current_dir(dir);
    cmd.args(args).assert().success()
}

/// Run CLI expecting failure with a specific working directory.
fn run_cli_fail_in(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = assert_cmd::Command::cargo_bin("fighting_words").unwrap();
    cmd.current_dir(dir);
    cmd.args(args).assert().failure()
}

// --------------------- library tests ---------------------

#[test]
fn lib_pipeline_ranks_group_words() {
    let (td, guests, comments) = fixture();
    let out = td.child("out");
    let report = analyze_corpus(&guests, &comments, &opts(out.path(), vec![])).unwrap();

    assert_eq!(report.labels, ["0".to_string(), "1".to_string()]);
    assert_eq!(report.tables.len(), 2);
    assert!(report.skipped.is_empty());

    let (kind, words) = &report.tables[0];
    assert_eq!(kind, "word");
    // group 0 = men: "legend" skews positive, "inspiring" negative
    assert!(words.get("legend").unwrap().z_score > 0.0);
    assert!(words.get("inspiring").unwrap().z_score < 0.0);
    assert_eq!(words.rows.last().unwrap().token, "legend");
    assert_eq!(words.rows.first().unwrap().token, "inspiring");
    assert!(words.rows.windows(2).all(|w| w[0].z_score <= w[1].z_score));

    // names scrubbed in the guest's own comments, pronouns collapsed
    assert!(words.get(NAME_TOKEN).is_some());
    assert!(words.get("ada").is_none());
    assert!(words.get("turing").is_none());
    assert!(words.get("he").is_none());
    assert!(words.get(PRONOUN_TOKEN).is_some());
    assert!(words.get("😍").unwrap().z_score < 0.0);

    let (kind, bigrams) = &report.tables[1];
    assert_eq!(kind, "bigram");
    assert!(bigrams.get("a legend").is_some());
    assert!(bigrams.len() > words.len());
}

#[test]
fn lib_pipeline_writes_timestamped_exports() {
    let (td, guests, comments) = fixture();
    let out = td.child("out");
    let report = analyze_corpus(
        &guests,
        &comments,
        &opts(out.path(), vec![ExportFormat::Csv, ExportFormat::Bin]),
    )
    .unwrap();
    assert_eq!(report.written.len(), 4);

    let csv_re = Regex::new(r"^gender_analysis_\d{8}_\d{6}_(word|bigram)\.csv$").unwrap();
    let bin_re = Regex::new(r"^gender_analysis_\d{8}_\d{6}_(word|bigram)\.bin$").unwrap();
    assert_eq!(count_matching(out.path(), &csv_re), 2);
    assert_eq!(count_matching(out.path(), &bin_re), 2);

    // binary export keeps emoji tokens and every value
    let bin = find_with_suffix(out.path(), "_word.bin");
    let loaded = load_table(&bin).unwrap();
    assert_eq!(&loaded, &report.tables[0].1);
    assert!(loaded.get("😍").is_some());
}

#[test]
fn lib_sampled_run_is_repeatable_and_tagged() {
    let (td, guests, comments) = fixture();
    let out = td.child("sampled");
    let mut o = opts(out.path(), vec![ExportFormat::Csv]);
    o.sample_rate = 0.5;
    let first = analyze_corpus(&guests, &comments, &o).unwrap();

    let re = Regex::new(r"^gender_analysis_\d{8}_\d{6}_(word|bigram)_50pct\.csv$").unwrap();
    assert_eq!(count_matching(out.path(), &re), 2);

    o.export_formats = vec![];
    let second = analyze_corpus(&guests, &comments, &o).unwrap();
    assert_eq!(first.tables, second.tables);

    // one comment per guest survives, so each group holds two of the five
    let full = analyze_corpus(&guests, &comments, &opts(td.path(), vec![])).unwrap();
    let total = |r: &fighting_words::AnalysisReport| -> f64 {
        r.tables[0].1.iter().map(|t| t.count_0 + t.count_1).sum()
    };
    assert!(total(&first) < total(&full));
}

#[test]
fn lib_uniform_prior_and_alpha_are_applied() {
    let (td, guests, comments) = fixture();
    let mut o = opts(td.path(), vec![]);
    o.prior_mode = PriorMode::Uniform;
    o.alpha = 0.5;
    o.ngram = 1;
    let report = analyze_corpus(&guests, &comments, &o).unwrap();
    assert_eq!(report.tables.len(), 1);
    let table = &report.tables[0].1;
    assert_eq!(table.prior_mode, PriorMode::Uniform);
    assert_eq!(table.alpha, 0.5);
}

#[test]
fn lib_without_name_scrubbing_keeps_names() {
    let (td, guests, comments) = fixture();
    let mut o = opts(td.path(), vec![]);
    o.scrub_names = false;
    o.ngram = 1;
    let report = analyze_corpus(&guests, &comments, &o).unwrap();
    let words = &report.tables[0].1;
    assert!(words.get("ada").is_some());
    assert!(words.get(NAME_TOKEN).is_none());
}

#[test]
fn lib_max_features_limits_vocabulary() {
    let (td, guests, comments) = fixture();
    let mut o = opts(td.path(), vec![]);
    o.max_features = Some(3);
    let report = analyze_corpus(&guests, &comments, &o).unwrap();
    for (_, table) in &report.tables {
        assert_eq!(table.len(), 3);
    }
}

#[test]
fn lib_requires_exactly_two_groups() {
    let (td, _guests, comments) = fixture();
    let three = write_file(
        &td,
        "three.csv",
        "guest_name,video_id,party\nAlan Turing,v1,a\nAda Lovelace,v3,b\nGrace Hopper,v4,c\n",
    );
    let mut o = opts(td.path(), vec![]);
    o.group_by = "party".to_string();
    let err = analyze_corpus(&three, &comments, &o).unwrap_err();
    assert!(matches!(err, Error::Model(ModelError::InvalidShape(_))));
}

#[test]
fn lib_missing_group_column_is_reported() {
    let (td, guests, comments) = fixture();
    let mut o = opts(td.path(), vec![]);
    o.group_by = "age".to_string();
    let err = analyze_corpus(&guests, &comments, &o).unwrap_err();
    assert!(err.to_string().contains("no column 'age'"));
}

#[test]
fn lib_missing_comment_file_is_skipped() {
    let (td, _guests, comments) = fixture();
    let guests = write_file(
        &td,
        "more.csv",
        "guest_name,video_id,female_flag\nAlan Turing,v1,0\nAda Lovelace,v3,1\nLost,v9,1\n",
    );
    let report = analyze_corpus(&guests, &comments, &opts(td.path(), vec![])).unwrap();
    assert_eq!(report.skipped, vec!["v9".to_string()]);
}

#[test]
fn lib_invalid_alpha_fails_before_reading_files() {
    let td = tempdir().unwrap();
    let run = |alpha: f64| {
        let mut o = opts(td.path(), vec![]);
        o.alpha = alpha;
        analyze_corpus(&td.path().join("nope.csv"), &td.path().join("nope"), &o).unwrap_err()
    };
    assert!(matches!(run(f64::NAN), Error::Model(ModelError::InvalidAlpha(_))));
    assert!(matches!(run(-1.0), Error::Model(ModelError::DegeneratePrior(_))));
}

// --------------------- CLI tests ---------------------

#[test]
fn cli_nonexistent_path_fails() {
    let td = tempdir().unwrap();
    let bad = td.path().join("does_not_exist_here.csv");
    run_cli_fail_in(
        td.path(),
        &[
            bad.to_string_lossy().as_ref(),
            td.path().to_string_lossy().as_ref(),
        ],
    );
}

#[test]
fn cli_basic_run_csv() {
    let (td, guests, comments) = fixture();
    run_cli_ok_in(
        td.path(),
        &[
            guests.to_str().unwrap(),
            comments.to_str().unwrap(),
            "--export-format",
            "csv",
            "--ngram",
            "1",
        ],
    )
    .stdout(predicate::str::contains("group 0 = '0', group 1 = '1'"))
    .stdout(predicate::str::contains("legend"));

    // default prefix, written into the working directory
    let re = Regex::new(r"^group_analysis_\d{8}_\d{6}_word\.csv$").unwrap();
    assert_eq!(count_matching(td.path(), &re), 1);

    let csv = fs::read_to_string(find_with_suffix(td.path(), "_word.csv")).unwrap();
    let header = csv.lines().next().unwrap();
    assert_eq!(
        header,
        "token,feature_index,count_0,count_1,freq_0,freq_1,log_odds_ratio,variance,z_score"
    );
    assert!(csv.lines().last().unwrap().starts_with("legend,"));
}

#[test]
fn cli_export_json_and_tsv_into_out_dir() {
    let (td, guests, comments) = fixture();
    let out = td.child("results");
    run_cli_ok_in(
        td.path(),
        &[
            guests.to_str().unwrap(),
            comments.to_str().unwrap(),
            "--export-format",
            "json,tsv",
            "--out-dir",
            out.path().to_str().unwrap(),
            "--prefix",
            "run",
        ],
    );

    let json = fs::read_to_string(find_with_suffix(out.path(), "_bigram.json")).unwrap();
    let v: Json = serde_json::from_str(&json).expect("valid json");
    let rows = v.as_array().expect("json array");
    assert!(!rows.is_empty());
    let z: Vec<f64> = rows.iter().map(|r| r["z_score"].as_f64().unwrap()).collect();
    assert!(z.windows(2).all(|w| w[0] <= w[1]));
    assert!(rows.iter().any(|r| r["token"] == "😍"));

    let tsv = fs::read_to_string(find_with_suffix(out.path(), "_word.tsv")).unwrap();
    assert!(tsv.lines().next().unwrap().starts_with("token\tfeature_index\t"));
}

#[test]
fn cli_invalid_prior_fails() {
    let (td, guests, comments) = fixture();
    run_cli_fail_in(
        td.path(),
        &[
            guests.to_str().unwrap(),
            comments.to_str().unwrap(),
            "--prior",
            "bayesian",
        ],
    )
    .stderr(predicate::str::contains("prior must be 'informative' or 'uniform'"));
}

#[test]
fn cli_zero_alpha_uniform_is_degenerate() {
    let (td, guests, comments) = fixture();
    run_cli_fail_in(
        td.path(),
        &[
            guests.to_str().unwrap(),
            comments.to_str().unwrap(),
            "--prior",
            "uniform",
            "--alpha=0",
            "--export-format",
            "txt",
        ],
    )
    .stderr(predicate::str::contains("degenerate prior"));
}

#[test]
fn cli_sample_rate_out_of_range_fails() {
    let (td, guests, comments) = fixture();
    run_cli_fail_in(
        td.path(),
        &[
            guests.to_str().unwrap(),
            comments.to_str().unwrap(),
            "--sample-rate=1.5",
        ],
    )
    .stderr(predicate::str::contains("sample rate must be in (0, 1]"));
}

#[test]
fn cli_stem_lang_forces_stemming() {
    let (td, guests, comments) = fixture();
    let out = td.child("stemmed");
    run_cli_ok_in(
        td.path(),
        &[
            guests.to_str().unwrap(),
            comments.to_str().unwrap(),
            "--ngram",
            "1",
            "--stem-lang",
            "en",
            "--export-format",
            "json",
            "--out-dir",
            out.path().to_str().unwrap(),
        ],
    );
    let json = fs::read_to_string(find_with_suffix(out.path(), "_word.json")).unwrap();
    let v: Json = serde_json::from_str(&json).unwrap();
    let tokens: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["token"].as_str().unwrap())
        .collect();
    assert!(tokens.contains(&"inspir"));
    assert!(!tokens.contains(&"inspiring"));
}

// --------------------- CSV sanitizing ---------------------

#[test]
fn csv_writer_sanitizes_and_quotes_correctly() {
    let mut buf = Vec::new();
    {
        let mut wtr = WriterBuilder::new().from_writer(&mut buf);
        wtr.write_record(["token", "note"]).unwrap();

        let dangerous = r#"=HYPERLINK("http://x")"#.to_string();
        wtr.write_record([csv_safe_cell(dangerous), "ok".to_string()])
            .unwrap();
        wtr.flush().unwrap();
    }

    let out = String::from_utf8(buf).unwrap();
    assert!(out.contains("'=HYPERLINK"), "CSV must prefix '=' at start of cell");
    assert!(
        out.contains(r#"'=HYPERLINK(""http://x"")"#),
        "inner quotes should be escaped (doubled)"
    );
}

#[test]
fn no_double_prefix_when_cell_already_safe() {
    let already_safe = "'@SAFE".to_string();
    assert_eq!(csv_safe_cell(already_safe.clone()), already_safe);
    let normal = "normal".to_string();
    assert_eq!(csv_safe_cell(normal.clone()), normal);
}

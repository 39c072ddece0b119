#![forbid(unsafe_code)]
//! # fighting_words
//!
//! Compare word usage between two groups of YouTube comments (for example
//! comments on videos with male vs. female guests) with the informative
//! Dirichlet log-odds-ratio model ("Fightin' Words", Monroe et al.).
//!
//! The crate is organized as a pipeline:
//!
//! 1. [`corpus`]: read the guest list and scraped comment files and
//!    concatenate the comments per group, optionally replacing each guest's
//!    name in their own comments with `<name>`.
//! 2. [`tokenize`]: split comments into tokens, drop punctuation, rewrite
//!    gendered pronouns and optionally stem.
//! 3. [`vectorize`]: count n-grams into a sparse document-term matrix.
//! 4. [`model`]: score every token with a log-odds-ratio, its variance and a
//!    z-score.
//! 5. [`export`]: write the ranked table as CSV, TSV, JSON, text or binary.
//!
//! The model can be used on its own:
//!
//! ```
//! use fighting_words::{CountMatrix, PriorMode, compare_groups};
//!
//! let counts = CountMatrix::from_rows(&[[10.0, 0.0, 5.0], [2.0, 8.0, 5.0]]).unwrap();
//! let vocab: Vec<String> = ["great", "awful", "neutral"].map(String::from).to_vec();
//! let table = compare_groups(&counts, Some(vocab.as_slice()), PriorMode::Informative, 1.0).unwrap();
//! assert_eq!(table.rows[0].token, "awful");
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use rayon::prelude::*;

pub mod corpus;
pub mod error;
pub mod export;
pub mod matrix;
pub mod model;
pub mod tokenize;
pub mod vectorize;

pub use corpus::{
    Guest, GroupedCorpus, build_groups, load_comments, load_guest_list, sample_comments,
};
pub use error::{Error, ModelError, Result};
pub use export::{ExportFormat, csv_safe_cell, export_table, load_table, ngram_kind, write_table};
pub use matrix::{CountMatrix, SparseCounts};
pub use model::{ComparisonTable, GroupComparisonModel, PriorMode, TokenStat, compare_groups};
pub use tokenize::{
    CommentTokenizer, NAME_TOKEN, PRONOUN_TOKEN, PronounMode, StemLang, StemMode, scrub_names,
};
pub use vectorize::{CountVectorizer, DocumentTermCounts};

/// Settings for a full comparison run.
///
/// The defaults reproduce the reference gender analysis (two groups from
/// `female_flag`, words and bigrams, 20 000 features, informative prior with
/// alpha 1, all comments, names scrubbed, simple pronoun placeholders) except
/// that stemming is off unless asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    /// Guest-list column whose two values define the groups.
    pub group_by: String,
    /// Tables are produced for n-gram ranges `(1, 1)` up to `(1, ngram)`.
    pub ngram: usize,
    pub max_features: Option<usize>,
    pub prior_mode: PriorMode,
    pub alpha: f64,
    /// Share of each guest's comments to use, in `(0, 1]`.
    pub sample_rate: f64,
    /// Replace each guest's name in their own comments with `<name>`.
    pub scrub_names: bool,
    pub pronouns: PronounMode,
    pub stem_mode: StemMode,
    pub export_formats: Vec<ExportFormat>,
    pub out_dir: PathBuf,
    /// File name prefix for exports.
    pub prefix: String,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            group_by: "female_flag".to_string(),
            ngram: 2,
            max_features: Some(20_000),
            prior_mode: PriorMode::Informative,
            alpha: 1.0,
            sample_rate: 1.0,
            scrub_names: true,
            pronouns: PronounMode::Simple,
            stem_mode: StemMode::Off,
            export_formats: vec![ExportFormat::Csv, ExportFormat::Bin],
            out_dir: PathBuf::from("."),
            prefix: "group_analysis".to_string(),
        }
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Group labels; `labels[0]` is group 0 (positive z-scores).
    pub labels: [String; 2],
    /// `(kind, table)` per n-gram range, e.g. `("bigram", ..)`.
    pub tables: Vec<(String, ComparisonTable)>,
    pub written: Vec<PathBuf>,
    /// Video ids without a comment file.
    pub skipped: Vec<String>,
    pub stem_lang: Option<StemLang>,
}

impl AnalysisReport {
    /// Text summary of every table.
    pub fn summary(&self, top: usize) -> String {
        let labels = [self.labels[0].as_str(), self.labels[1].as_str()];
        self.tables
            .iter()
            .map(|(kind, table)| {
                format!(
                    "== {kind} ==\n{}",
                    export::render_summary(table, labels, top)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Compare two raw texts: tokenize, vectorize and score.
///
/// ```
/// use fighting_words::{CommentTokenizer, CountVectorizer, GroupComparisonModel, compare_texts};
///
/// let table = compare_texts(
///     "what a great great great show",
///     "what an awful awful awful show",
///     &CommentTokenizer::new(),
///     &CountVectorizer::new(),
///     &GroupComparisonModel::default(),
/// )
/// .unwrap();
/// assert!(table.get("great").unwrap().z_score > 0.0);
/// assert!(table.get("awful").unwrap().z_score < 0.0);
/// ```
pub fn compare_texts(
    group0: &str,
    group1: &str,
    tokenizer: &CommentTokenizer,
    vectorizer: &CountVectorizer,
    model: &GroupComparisonModel,
) -> Result<ComparisonTable, ModelError> {
    let dtc = vectorizer.fit_transform_texts(tokenizer, &[group0, group1])?;
    let counts = CountMatrix::from_sparse(&dtc.counts)?;
    model.compare(&counts, Some(dtc.vocabulary.as_slice()))
}

/// Run the whole pipeline over a guest list and a directory of scraped
/// comment files, exporting one table per n-gram range.
pub fn analyze_corpus(
    guest_list: &Path,
    comment_dir: &Path,
    opts: &AnalysisOptions,
) -> Result<AnalysisReport> {
    let start = Instant::now();
    let model = GroupComparisonModel::new(opts.prior_mode, opts.alpha)?;
    corpus::check_sample_rate(opts.sample_rate)?;

    let guests = load_guest_list(guest_list, &opts.group_by)?;
    log::info!("Loaded {} guests from {}", guests.len(), guest_list.display());
    let corpus = build_groups(&guests, comment_dir, opts.scrub_names, opts.sample_rate)?;

    let labels = corpus.labels();
    let [label0, label1] = labels.as_slice() else {
        return Err(ModelError::InvalidShape(format!(
            "column '{}' must split the guests into exactly two groups, found {:?}",
            opts.group_by, labels
        ))
        .into());
    };
    let labels = [*label0, *label1];
    for label in labels {
        log::info!(
            "Group '{label}': {} guests",
            corpus.guests_per_group.get(label).copied().unwrap_or(0)
        );
    }
    log::info!("data prep: {:.1?}", start.elapsed());

    let texts = corpus.texts();
    let stem_lang =
        tokenize::resolve_stem_lang(opts.stem_mode, &tokenize::detection_sample(&texts));
    let tokenizer = CommentTokenizer::new()
        .with_pronouns(opts.pronouns)
        .with_stemming(stem_lang);
    let docs: Vec<Vec<String>> = texts.par_iter().map(|t| tokenizer.tokenize(t)).collect();

    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let pct = if opts.sample_rate < 1.0 {
        format!("_{}pct", (opts.sample_rate * 100.0).round())
    } else {
        String::new()
    };
    let mut tables = Vec::new();
    let mut written = Vec::new();
    for n in 1..=opts.ngram.max(1) {
        let step = Instant::now();
        let kind = ngram_kind(n);
        let dtc = CountVectorizer::new()
            .with_ngram_range(1, n)
            .with_max_features(opts.max_features)
            .fit_transform(&docs)?;
        let counts = CountMatrix::from_sparse(&dtc.counts)?;
        let table = model.compare(&counts, Some(dtc.vocabulary.as_slice()))?;

        let stem = format!("{}_{stamp}_{kind}{pct}", opts.prefix);
        for &fmt in &opts.export_formats {
            written.push(export_table(&table, fmt, labels, &opts.out_dir, &stem)?);
        }
        log::info!(
            "{kind} analysis: {} tokens in {:.1?}",
            table.len(),
            step.elapsed()
        );
        tables.push((kind, table));
    }
    log::info!("total: {:.1?}", start.elapsed());

    Ok(AnalysisReport {
        labels: [labels[0].to_string(), labels[1].to_string()],
        tables,
        written,
        skipped: corpus.skipped.clone(),
        stem_lang,
    })
}

/// Print video ids that had no comment file.
pub fn print_skipped(skipped: &[String]) {
    eprintln!("Skipped {} guest(s) without comments:", skipped.len());
    for id in skipped {
        eprintln!("  {id}");
    }
}

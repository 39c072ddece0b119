#![forbid(unsafe_code)]
//! # fighting_words CLI
//!
//! Runs the group comparison over a guest list and a directory of scraped
//! comment files and exports one ranked table per n-gram range.
//!
//! ## Example
//! ```bash
//! cargo run --release -- guest_list.csv comments/ --group-by female_flag --ngram 2 --export-format csv,bin
//! ```
//!
//! Set `RUST_LOG=info` to see stage timings. See `--help` for all options.

use std::path::PathBuf;
use std::process;

use chrono::Local;
use clap::Parser;
use fighting_words::{
    AnalysisOptions, ExportFormat, PriorMode, PronounMode, StemLang, StemMode, analyze_corpus,
    print_skipped,
};
use log::{error, info};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Guest list CSV (needs guest_name, video_id and the grouping column)
    guest_list: PathBuf,

    /// Directory with comments-<video_id>.json files
    comment_dir: PathBuf,

    /// Guest-list column that splits guests into two groups
    #[arg(long, default_value = "female_flag")]
    group_by: String,

    /// Largest n-gram size; one table is produced for each range (1, 1)..(1, N)
    #[arg(long, default_value_t = 2)]
    ngram: usize,

    /// Keep only the N most frequent terms (0 = unlimited)
    #[arg(long, default_value_t = 20_000)]
    max_features: usize,

    /// Dirichlet prior: informative or uniform
    #[arg(long, default_value = "informative")]
    prior: PriorMode,

    /// Prior strength
    #[arg(long, default_value_t = 1.0)]
    alpha: f64,

    /// Share of each guest's comments to use, in (0, 1]; below 1 the output
    /// names get a _<pct>pct suffix
    #[arg(long, default_value_t = 1.0)]
    sample_rate: f64,

    /// Keep guest names instead of replacing them with <name>
    #[arg(long, default_value_t = false)]
    no_scrub_names: bool,

    /// Gendered pronoun rewriting
    #[arg(long, value_enum, default_value = "simple")]
    pronouns: PronounMode,

    /// Stem tokens, detecting the language automatically
    #[arg(long, default_value_t = false)]
    stem: bool,

    /// Stem with this language (implies --stem)
    #[arg(long, value_enum)]
    stem_lang: Option<StemLang>,

    /// Output formats, comma separated (txt, csv, tsv, json, bin)
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = [ExportFormat::Csv, ExportFormat::Bin]
    )]
    export_format: Vec<ExportFormat>,

    /// Output directory
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Output file name prefix
    #[arg(long, default_value = "group_analysis")]
    prefix: String,

    /// Tokens per group in the printed summary
    #[arg(long, default_value_t = 25)]
    top: usize,
}

impl Cli {
    fn options(&self) -> AnalysisOptions {
        let stem_mode = match (self.stem_lang, self.stem) {
            (Some(lang), _) => StemMode::Force(lang),
            (None, true) => StemMode::Auto,
            (None, false) => StemMode::Off,
        };
        AnalysisOptions {
            group_by: self.group_by.clone(),
            ngram: self.ngram,
            max_features: (self.max_features > 0).then_some(self.max_features),
            prior_mode: self.prior,
            alpha: self.alpha,
            sample_rate: self.sample_rate,
            scrub_names: !self.no_scrub_names,
            pronouns: self.pronouns,
            stem_mode,
            export_formats: self.export_format.clone(),
            out_dir: self.out_dir.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    info!("starting at {}", Local::now().format("%Y-%m-%d %I:%M:%S %p"));

    match analyze_corpus(&cli.guest_list, &cli.comment_dir, &cli.options()) {
        Ok(report) => {
            println!(
                "group 0 = '{}', group 1 = '{}'\n",
                report.labels[0], report.labels[1]
            );
            println!("{}", report.summary(cli.top));
            for path in &report.written {
                println!("Wrote {}", path.display());
            }
            if !report.skipped.is_empty() {
                print_skipped(&report.skipped);
            }
        }
        Err(e) => {
            error!("Error: {}", e);
            process::exit(1);
        }
    }
    info!("finished at {}", Local::now().format("%Y-%m-%d %I:%M:%S %p"));
}

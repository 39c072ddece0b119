//! Guest list and scraped comment files, grouped into one text per group.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde_json::Value;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::tokenize::scrub_names;

pub const NAME_COLUMN: &str = "guest_name";
pub const VIDEO_COLUMN: &str = "video_id";

/// Seed of the generator used for comment sampling.
pub const SAMPLE_SEED: u64 = 0;

/// One row of the guest list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guest {
    pub name: String,
    pub video_id: String,
    /// Value of the grouping column.
    pub group: String,
}

/// Read the guest list CSV, keeping rows with a non-empty `group_by` value.
pub fn load_guest_list(path: &Path, group_by: &str) -> Result<Vec<Guest>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| Error::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let (name_col, video_col, group_col) =
        (column(NAME_COLUMN)?, column(VIDEO_COLUMN)?, column(group_by)?);

    let mut guests = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        let guest = Guest {
            name: field(name_col),
            video_id: field(video_col),
            group: field(group_col),
        };
        if guest.group.is_empty() || guest.video_id.is_empty() {
            log::debug!("Excluding guest '{}' without {group_by}/video id", guest.name);
            continue;
        }
        guests.push(guest);
    }
    Ok(guests)
}

/// Parse `comments-<id>.json` or a browser duplicate `comments-<id> (N).json`.
fn parse_comment_file_name(name: &str) -> Option<(String, u32)> {
    let stem = name.strip_prefix("comments-")?.strip_suffix(".json")?;
    match stem.rsplit_once(" (") {
        Some((id, rest)) => {
            let n = rest.strip_suffix(')')?.parse().ok()?;
            Some((id.to_string(), n))
        }
        None => Some((stem.to_string(), 0)),
    }
}

/// Map video id to its comment file. Of several downloads of the same video
/// the one with the highest duplicate number (the latest) wins.
pub fn index_comment_files(dir: &Path) -> Result<HashMap<String, PathBuf>> {
    let mut best: HashMap<String, (u32, PathBuf)> = HashMap::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some((id, n)) = entry.file_name().to_str().and_then(parse_comment_file_name) else {
            continue;
        };
        match best.get(&id) {
            Some((seen, _)) if *seen >= n => {}
            _ => {
                best.insert(id, (n, entry.into_path()));
            }
        }
    }
    Ok(best.into_iter().map(|(id, (_, p))| (id, p)).collect())
}

/// Comment texts from one scraped file: a JSON array of objects with a
/// `commentText` field. Entries without it are skipped.
pub fn load_comments(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let items: Vec<Value> = serde_json::from_reader(reader)?;
    Ok(items
        .iter()
        .filter_map(|c| c.get("commentText").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

/// Fail unless `rate` is in `(0, 1]`.
pub fn check_sample_rate(rate: f64) -> Result<()> {
    if rate > 0.0 && rate <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidSampleRate(rate))
    }
}

/// Keep `floor(len * rate)` of the comments, chosen with a generator seeded
/// from [`SAMPLE_SEED`], in their original order. `rate >= 1` keeps all.
/// Every call starts from a freshly seeded generator.
pub fn sample_comments(comments: Vec<String>, rate: f64) -> Vec<String> {
    if rate >= 1.0 {
        return comments;
    }
    let len = comments.len();
    let amount = ((len as f64 * rate).floor() as usize).min(len);
    let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
    let mut keep = rand::seq::index::sample(&mut rng, len, amount).into_vec();
    keep.sort_unstable();

    let mut slots: Vec<Option<String>> = comments.into_iter().map(Some).collect();
    keep.into_iter().filter_map(|i| slots[i].take()).collect()
}

/// Concatenated comment text per group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedCorpus {
    /// Group label to text, labels in sorted order.
    pub groups: BTreeMap<String, String>,
    pub guests_per_group: BTreeMap<String, usize>,
    /// Video ids whose comment file was missing.
    pub skipped: Vec<String>,
}

impl GroupedCorpus {
    pub fn labels(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.groups.values().map(String::as_str).collect()
    }
}

/// Join each guest's comments (a `sample_rate` share of them), optionally
/// replace the guest's own name in them, and concatenate per group.
pub fn build_groups(
    guests: &[Guest],
    comment_dir: &Path,
    scrub: bool,
    sample_rate: f64,
) -> Result<GroupedCorpus> {
    check_sample_rate(sample_rate)?;
    let files = index_comment_files(comment_dir)?;
    if sample_rate < 1.0 {
        log::info!("Sampling {:.0}% of each guest's comments", sample_rate * 100.0);
    }

    let loaded: Vec<Option<String>> = guests
        .par_iter()
        .map(|g| -> Result<Option<String>> {
            let Some(path) = files.get(&g.video_id) else {
                return Ok(None);
            };
            let text = sample_comments(load_comments(path)?, sample_rate).join(" ");
            Ok(Some(if scrub { scrub_names(&text, &g.name) } else { text }))
        })
        .collect::<Result<_>>()?;

    let mut corpus = GroupedCorpus::default();
    for (guest, text) in guests.iter().zip(loaded) {
        let Some(text) = text else {
            log::warn!(
                "No comment file for guest '{}' (video {})",
                guest.name,
                guest.video_id
            );
            corpus.skipped.push(guest.video_id.clone());
            continue;
        };
        let group = corpus.groups.entry(guest.group.clone()).or_default();
        if !group.is_empty() {
            group.push(' ');
        }
        group.push_str(&text);
        *corpus
            .guests_per_group
            .entry(guest.group.clone())
            .or_insert(0) += 1;
    }

    if corpus.groups.is_empty() {
        return Err(Error::NoComments(comment_dir.to_path_buf()));
    }
    Ok(corpus)
}

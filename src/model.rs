//! Informative-Dirichlet log-odds-ratio comparison of two groups
//! ("Fightin' Words", Monroe, Colaresi & Quinn 2008).
//!
//! Given per-token counts for two groups, the model estimates for every token
//! a regularized log-odds-ratio of its use in group 0 versus group 1, the
//! variance of that estimate and the resulting z-score. Positive z-scores mark
//! tokens over-represented in group 0, negative ones tokens over-represented
//! in group 1.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::matrix::CountMatrix;

/// How the Dirichlet prior weights are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorMode {
    /// Weight each token by its share of the combined corpus.
    #[default]
    Informative,
    /// Same weight `alpha` for every token.
    Uniform,
}

impl FromStr for PriorMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "informative" => Ok(PriorMode::Informative),
            "uniform" => Ok(PriorMode::Uniform),
            _ => Err(ModelError::InvalidPrior(s.to_string())),
        }
    }
}

impl fmt::Display for PriorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorMode::Informative => f.write_str("informative"),
            PriorMode::Uniform => f.write_str("uniform"),
        }
    }
}

/// Statistics for one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenStat {
    pub token: String,
    /// Column of the token in the input count matrix.
    pub feature_index: usize,
    pub count_0: f64,
    pub count_1: f64,
    pub freq_0: f64,
    pub freq_1: f64,
    pub log_odds_ratio: f64,
    pub variance: f64,
    pub z_score: f64,
}

/// Per-token results, sorted ascending by z-score: tokens most typical of
/// group 1 come first, tokens most typical of group 0 last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub prior_mode: PriorMode,
    pub alpha: f64,
    pub rows: Vec<TokenStat>,
}

impl ComparisonTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TokenStat> {
        self.rows.iter()
    }

    /// Row for `token`, if present.
    pub fn get(&self, token: &str) -> Option<&TokenStat> {
        self.rows.iter().find(|r| r.token == token)
    }

    /// The `n` tokens most over-represented in group 0, strongest first.
    pub fn top_group0(&self, n: usize) -> Vec<&TokenStat> {
        self.rows
            .iter()
            .rev()
            .take(n)
            .filter(|r| r.z_score > 0.0)
            .collect()
    }

    /// The `n` tokens most over-represented in group 1, strongest first.
    pub fn top_group1(&self, n: usize) -> Vec<&TokenStat> {
        self.rows
            .iter()
            .take(n)
            .filter(|r| r.z_score < 0.0)
            .collect()
    }

    /// Rows re-ordered by their original column index.
    pub fn in_vocabulary_order(&self) -> Vec<&TokenStat> {
        let mut rows: Vec<&TokenStat> = self.rows.iter().collect();
        rows.sort_by_key(|r| r.feature_index);
        rows
    }
}

impl<'a> IntoIterator for &'a ComparisonTable {
    type Item = &'a TokenStat;
    type IntoIter = std::slice::Iter<'a, TokenStat>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// The comparison model. Holds only its configuration; every call to
/// [`GroupComparisonModel::compare`] is independent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupComparisonModel {
    prior_mode: PriorMode,
    alpha: f64,
}

impl Default for GroupComparisonModel {
    fn default() -> Self {
        Self {
            prior_mode: PriorMode::Informative,
            alpha: 1.0,
        }
    }
}

impl GroupComparisonModel {
    /// `alpha` controls the prior strength: larger values pull rare-token
    /// estimates toward the prior.
    ///
    /// NaN or infinite alpha is [`ModelError::InvalidAlpha`]. Negative alpha
    /// is [`ModelError::DegeneratePrior`]: it yields negative prior weights.
    pub fn new(prior_mode: PriorMode, alpha: f64) -> Result<Self, ModelError> {
        if !alpha.is_finite() {
            return Err(ModelError::InvalidAlpha(alpha));
        }
        if alpha < 0.0 {
            return Err(ModelError::DegeneratePrior(format!(
                "alpha must be non-negative for the {prior_mode} prior, got {alpha}"
            )));
        }
        Ok(Self { prior_mode, alpha })
    }

    pub fn prior_mode(&self) -> PriorMode {
        self.prior_mode
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Prior weights, one per column.
    ///
    /// Informative weights sum to `alpha`; uniform weights all equal `alpha`.
    pub fn prior(&self, counts: &CountMatrix) -> Result<Vec<f64>, ModelError> {
        match self.prior_mode {
            PriorMode::Informative => {
                let total = counts.total();
                if total <= 0.0 {
                    return Err(ModelError::DegeneratePrior(
                        "informative prior needs at least one non-zero count".to_string(),
                    ));
                }
                Ok((0..counts.width())
                    .map(|k| {
                        let (c0, c1) = counts.column(k);
                        self.alpha * (c0 + c1) / total
                    })
                    .collect())
            }
            PriorMode::Uniform => Ok(vec![self.alpha; counts.width()]),
        }
    }

    /// Score every token. `vocabulary` labels the columns; without it the
    /// column index is used as the label.
    ///
    /// ```
    /// use fighting_words::{CountMatrix, GroupComparisonModel};
    ///
    /// let counts = CountMatrix::from_rows(&[[10.0, 0.0, 5.0], [2.0, 8.0, 5.0]]).unwrap();
    /// let vocab = ["great", "awful", "neutral"].map(String::from);
    /// let table = GroupComparisonModel::default().compare(&counts, Some(&vocab[..])).unwrap();
    /// assert_eq!(table.rows.first().unwrap().token, "awful");
    /// assert_eq!(table.rows.last().unwrap().token, "great");
    /// ```
    pub fn compare(
        &self,
        counts: &CountMatrix,
        vocabulary: Option<&[String]>,
    ) -> Result<ComparisonTable, ModelError> {
        let width = counts.width();
        if let Some(vocab) = vocabulary {
            if vocab.len() != width {
                return Err(ModelError::VocabularyMismatch {
                    expected: width,
                    got: vocab.len(),
                });
            }
        }

        let prior = self.prior(counts)?;
        let prior_sum: f64 = prior.iter().sum();
        let totals = [counts.group_total(0), counts.group_total(1)];

        // in-class and out-of-class pseudo-counts for both groups
        let mut terms = Vec::with_capacity(width);
        for (k, &p) in prior.iter().enumerate() {
            let (c0, c1) = counts.column(k);
            let t = [
                c0 + p,
                (totals[0] - c0) + (prior_sum - p),
                c1 + p,
                (totals[1] - c1) + (prior_sum - p),
            ];
            if t.iter().any(|&x| x <= 0.0) {
                let label = vocabulary.map_or_else(|| k.to_string(), |v| v[k].clone());
                return Err(ModelError::DegeneratePrior(format!(
                    "token '{label}' (column {k}) has a zero pseudo-count under the {} prior with alpha {}",
                    self.prior_mode, self.alpha
                )));
            }
            terms.push(t);
        }

        let mut rows: Vec<TokenStat> = terms
            .iter()
            .enumerate()
            .map(|(k, &[a0, b0, a1, b1])| {
                let (c0, c1) = counts.column(k);
                let log_odds_ratio = (a0.ln() - b0.ln()) - (a1.ln() - b1.ln());
                let variance = (1.0 / a0 + 1.0 / b0) + (1.0 / a1 + 1.0 / b1);
                TokenStat {
                    token: vocabulary.map_or_else(|| k.to_string(), |v| v[k].clone()),
                    feature_index: k,
                    count_0: c0,
                    count_1: c1,
                    freq_0: relative(c0, totals[0]),
                    freq_1: relative(c1, totals[1]),
                    log_odds_ratio,
                    variance,
                    z_score: log_odds_ratio / variance.sqrt(),
                }
            })
            .collect();

        // stable: equal z-scores keep column order
        rows.sort_by(|a, b| a.z_score.total_cmp(&b.z_score));

        Ok(ComparisonTable {
            prior_mode: self.prior_mode,
            alpha: self.alpha,
            rows,
        })
    }
}

fn relative(count: f64, total: f64) -> f64 {
    if total > 0.0 { count / total } else { 0.0 }
}

/// One-shot form of [`GroupComparisonModel::compare`].
pub fn compare_groups(
    counts: &CountMatrix,
    vocabulary: Option<&[String]>,
    prior_mode: PriorMode,
    alpha: f64,
) -> Result<ComparisonTable, ModelError> {
    GroupComparisonModel::new(prior_mode, alpha)?.compare(counts, vocabulary)
}

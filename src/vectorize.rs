//! Bag-of-n-grams count vectorizer.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::error::ModelError;
use crate::matrix::SparseCounts;
use crate::tokenize::CommentTokenizer;

/// Vocabulary plus one row of counts per document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTermCounts {
    /// Alphabetically sorted terms; position = column.
    pub vocabulary: Vec<String>,
    pub counts: SparseCounts,
}

/// Counts n-grams over tokenized documents.
///
/// N-grams are joined with a single space. When `max_features` is set only the
/// most frequent terms across all documents are kept; ties go to the
/// alphabetically smaller term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountVectorizer {
    ngram_range: (usize, usize),
    max_features: Option<usize>,
}

impl Default for CountVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CountVectorizer {
    /// Unigrams, unlimited vocabulary.
    pub fn new() -> Self {
        Self {
            ngram_range: (1, 1),
            max_features: None,
        }
    }

    /// Inclusive n-gram range; both bounds are at least 1.
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        let min_n = min_n.max(1);
        self.ngram_range = (min_n, max_n.max(min_n));
        self
    }

    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }

    fn ngrams<'a>(&self, tokens: &'a [String]) -> impl Iterator<Item = String> + 'a {
        let (lo, hi) = self.ngram_range;
        (lo..=hi).flat_map(move |n| tokens.windows(n).map(|w| w.join(" ")))
    }

    /// Learn the vocabulary from `docs` and count it.
    pub fn fit_transform(&self, docs: &[Vec<String>]) -> Result<DocumentTermCounts, ModelError> {
        let per_doc: Vec<HashMap<String, usize>> = docs
            .par_iter()
            .map(|tokens| {
                let mut counts = HashMap::new();
                for term in self.ngrams(tokens) {
                    *counts.entry(term).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let mut corpus: HashMap<&str, usize> = HashMap::new();
        for doc in &per_doc {
            for (term, &n) in doc {
                *corpus.entry(term.as_str()).or_insert(0) += n;
            }
        }

        let mut terms: Vec<(&str, usize)> = corpus.into_iter().collect();
        if let Some(limit) = self.max_features {
            terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            terms.truncate(limit);
        }
        let mut vocabulary: Vec<String> = terms.into_iter().map(|(t, _)| t.to_string()).collect();
        vocabulary.sort();

        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let mut triplets = Vec::new();
        for (row, doc) in per_doc.iter().enumerate() {
            for (term, &n) in doc {
                if let Some(&col) = index.get(term.as_str()) {
                    triplets.push((row, col, n as f64));
                }
            }
        }
        log::debug!(
            "Vectorized {} documents: {} terms, {} non-zero cells",
            docs.len(),
            vocabulary.len(),
            triplets.len()
        );

        let counts = SparseCounts::from_triplets(docs.len(), vocabulary.len(), &triplets)?;
        Ok(DocumentTermCounts { vocabulary, counts })
    }

    /// Tokenize `texts` in parallel, then [`CountVectorizer::fit_transform`].
    pub fn fit_transform_texts<S: AsRef<str> + Sync>(
        &self,
        tokenizer: &CommentTokenizer,
        texts: &[S],
    ) -> Result<DocumentTermCounts, ModelError> {
        let docs: Vec<Vec<String>> = texts
            .par_iter()
            .map(|t| tokenizer.tokenize(t.as_ref()))
            .collect();
        self.fit_transform(&docs)
    }
}

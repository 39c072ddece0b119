//! Two-group count matrix and its compressed-sparse-row input form.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Token counts for exactly two groups over a shared vocabulary.
///
/// Row 0 holds group 0, row 1 holds group 1. Every entry is finite and
/// non-negative and both rows have the same, non-zero, width. These checks
/// run once here so the model can trust the shape at the point of use.
/// Deserialization goes through the same checks; the serialized form is the
/// plain `[[group 0], [group 1]]` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct CountMatrix {
    rows: [Vec<f64>; 2],
}

impl CountMatrix {
    /// Build from the two group rows.
    pub fn new(group0: Vec<f64>, group1: Vec<f64>) -> Result<Self, ModelError> {
        if group0.len() != group1.len() {
            return Err(ModelError::InvalidShape(format!(
                "rows have different lengths ({} and {})",
                group0.len(),
                group1.len()
            )));
        }
        if group0.is_empty() {
            return Err(ModelError::InvalidShape(
                "count matrix has no columns".to_string(),
            ));
        }
        for (row, values) in [&group0, &group1].into_iter().enumerate() {
            if let Some((col, &value)) = values
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite() || **v < 0.0)
            {
                return Err(ModelError::InvalidCount { row, col, value });
            }
        }
        Ok(Self {
            rows: [group0, group1],
        })
    }

    /// Build from a row-major slice of rows. Fails unless there are exactly two.
    ///
    /// ```
    /// use fighting_words::CountMatrix;
    /// let m = CountMatrix::from_rows(&[[10.0, 0.0, 5.0], [2.0, 8.0, 5.0]]).unwrap();
    /// assert_eq!(m.width(), 3);
    /// assert_eq!(m.total(), 30.0);
    /// ```
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, ModelError> {
        match rows {
            [g0, g1] => Self::new(g0.as_ref().to_vec(), g1.as_ref().to_vec()),
            _ => Err(ModelError::InvalidShape(format!(
                "count matrix must have two rows -- one for each group being compared, got {}",
                rows.len()
            ))),
        }
    }

    /// Densify a sparse matrix, then apply the same checks as [`CountMatrix::from_rows`].
    pub fn from_sparse(sparse: &SparseCounts) -> Result<Self, ModelError> {
        Self::from_rows(&sparse.to_dense())
    }

    /// Number of columns (V).
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    /// Counts of group `g` (0 or 1).
    pub fn row(&self, g: usize) -> &[f64] {
        &self.rows[g]
    }

    /// Sum of the counts of group `g`.
    pub fn group_total(&self, g: usize) -> f64 {
        self.rows[g].iter().sum()
    }

    /// Sum over both groups.
    pub fn total(&self) -> f64 {
        self.group_total(0) + self.group_total(1)
    }

    /// `(group 0, group 1)` counts for column `k`.
    pub fn column(&self, k: usize) -> (f64, f64) {
        (self.rows[0][k], self.rows[1][k])
    }

    /// Same counts with the two groups exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            rows: [self.rows[1].clone(), self.rows[0].clone()],
        }
    }
}

impl TryFrom<Vec<Vec<f64>>> for CountMatrix {
    type Error = ModelError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        let n = rows.len();
        let mut it = rows.into_iter();
        match (it.next(), it.next(), it.next()) {
            (Some(g0), Some(g1), None) => Self::new(g0, g1),
            _ => Err(ModelError::InvalidShape(format!(
                "count matrix must have two rows -- one for each group being compared, got {n}"
            ))),
        }
    }
}

impl From<CountMatrix> for Vec<Vec<f64>> {
    fn from(m: CountMatrix) -> Self {
        let [g0, g1] = m.rows;
        vec![g0, g1]
    }
}

/// Compressed-sparse-row matrix of counts, the shape a vectorizer produces.
///
/// Entries that share a cell are summed when densified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSparseCounts")]
pub struct SparseCounts {
    n_rows: usize,
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

/// Unchecked CSR arrays as they appear on the wire.
#[derive(Deserialize)]
struct RawSparseCounts {
    n_rows: usize,
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl TryFrom<RawSparseCounts> for SparseCounts {
    type Error = ModelError;

    fn try_from(raw: RawSparseCounts) -> Result<Self, Self::Error> {
        Self::new(raw.n_rows, raw.n_cols, raw.indptr, raw.indices, raw.data)
    }
}

impl SparseCounts {
    /// Validate and wrap raw CSR arrays.
    pub fn new(
        n_rows: usize,
        n_cols: usize,
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<f64>,
    ) -> Result<Self, ModelError> {
        if indptr.len() != n_rows.saturating_add(1) {
            return Err(ModelError::InvalidShape(format!(
                "indptr must have {} entries, got {}",
                n_rows.saturating_add(1),
                indptr.len()
            )));
        }
        if indices.len() != data.len() {
            return Err(ModelError::InvalidShape(format!(
                "indices ({}) and data ({}) lengths differ",
                indices.len(),
                data.len()
            )));
        }
        if indptr[0] != 0 || indptr[n_rows] != data.len() {
            return Err(ModelError::InvalidShape(
                "indptr must start at 0 and end at the number of stored entries".to_string(),
            ));
        }
        if indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(ModelError::InvalidShape(
                "indptr must be non-decreasing".to_string(),
            ));
        }
        if let Some(&col) = indices.iter().find(|&&c| c >= n_cols) {
            return Err(ModelError::InvalidShape(format!(
                "column index {col} out of range for {n_cols} columns"
            )));
        }
        Ok(Self {
            n_rows,
            n_cols,
            indptr,
            indices,
            data,
        })
    }

    /// Build from `(row, col, value)` triplets in any order.
    pub fn from_triplets(
        n_rows: usize,
        n_cols: usize,
        triplets: &[(usize, usize, f64)],
    ) -> Result<Self, ModelError> {
        if let Some(&(row, _, _)) = triplets.iter().find(|t| t.0 >= n_rows) {
            return Err(ModelError::InvalidShape(format!(
                "row index {row} out of range for {n_rows} rows"
            )));
        }
        let mut sorted = triplets.to_vec();
        sorted.sort_by_key(|&(r, c, _)| (r, c));

        let mut indptr = vec![0; n_rows + 1];
        for &(r, _, _) in &sorted {
            indptr[r + 1] += 1;
        }
        for r in 0..n_rows {
            indptr[r + 1] += indptr[r];
        }
        let indices = sorted.iter().map(|t| t.1).collect();
        let data = sorted.iter().map(|t| t.2).collect();
        Self::new(n_rows, n_cols, indptr, indices, data)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Row-major dense copy.
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        let mut dense = vec![vec![0.0; self.n_cols]; self.n_rows];
        for (r, row) in dense.iter_mut().enumerate() {
            for i in self.indptr[r]..self.indptr[r + 1] {
                row[self.indices[i]] += self.data[i];
            }
        }
        dense
    }
}

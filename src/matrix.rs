use crate::{FitError, FitResult};
use core::ops::Index;

/// View of an item every stride on a collection of data.
/// Starts at start, ends at the end.
pub struct StridedVecView<'a, A: 'a> {
    pub data: &'a [A],
    pub start: usize,
    pub stride: usize,
}

impl<'a, A: 'a> StridedVecView<'a, A> {
    pub fn new(data: &'a [A], start: usize, stride: usize) -> Self {
        assert_ne!(stride, 0, "stride must be positive");
        Self {
            data,
            start,
            stride,
        }
    }

    pub fn len(&self) -> usize {
        if self.start >= self.data.len() {
            0
        } else {
            (self.data.len() - self.start + self.stride - 1) / self.stride
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a A> {
        let (data, start, stride) = (self.data, self.start, self.stride);
        (0..self.len()).map(move |pos| &data[start + pos * stride])
    }
}

impl<'a, A: 'a> Index<usize> for StridedVecView<'a, A> {
    type Output = A;
    fn index(&self, pos: usize) -> &A {
        &self.data[self.start + pos * self.stride]
    }
}

/// Store a dense matrix in a row-major way: one row per example, one column per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowMajorMatrix<A> {
    /// Number of rows in the matrix
    n_rows: usize,
    /// Number of columns in the matrix
    n_cols: usize,
    /// Values, row after row
    values: Vec<A>,
}

impl<A> RowMajorMatrix<A> {
    /// Build from a flat buffer of `n_rows * n_cols` values, row after row.
    pub fn from_vec(n_rows: usize, n_cols: usize, values: Vec<A>) -> FitResult<Self> {
        if values.len() != n_rows * n_cols {
            return Err(FitError::ShapeMismatch {
                what: "matrix buffer",
                expected: n_rows * n_cols,
                got: values.len(),
            });
        }
        Ok(Self {
            n_rows,
            n_cols,
            values,
        })
    }

    /// Build from a list of rows. All the rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<A>>) -> FitResult<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(|row| row.len()).unwrap_or(0);
        let mut values = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(FitError::ShapeMismatch {
                    what: "row length",
                    expected: n_cols,
                    got: row.len(),
                });
            }
            values.extend(row);
        }
        Ok(Self {
            n_rows,
            n_cols,
            values,
        })
    }

    pub fn from_function(
        n_rows: usize,
        n_cols: usize,
        mut f: impl FnMut(usize, usize) -> A,
    ) -> Self {
        let mut values = Vec::with_capacity(n_rows * n_cols);
        for row in 0..n_rows {
            for col in 0..n_cols {
                values.push(f(row, col));
            }
        }
        Self {
            n_rows,
            n_cols,
            values,
        }
    }

    pub fn row(&self, row: usize) -> &[A] {
        let start = row * self.n_cols;
        &self.values[start..start + self.n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[A]> {
        // chunks() panics on a zero size, and a matrix without columns still has rows
        let n_cols = self.n_cols;
        (0..self.n_rows).map(move |row| &self.values[row * n_cols..(row + 1) * n_cols])
    }

    pub fn column(&self, col: usize) -> StridedVecView<A> {
        assert!(col < self.n_cols);
        StridedVecView::new(&self.values, col, self.n_cols)
    }

    pub fn flat(&self) -> &[A] {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }
}

impl<A: Clone> RowMajorMatrix<A> {
    /// Keep the rows where `mask` is true, in their original order.
    pub fn select_rows(&self, mask: &[bool]) -> FitResult<Self> {
        if mask.len() != self.n_rows {
            return Err(FitError::ShapeMismatch {
                what: "row mask",
                expected: self.n_rows,
                got: mask.len(),
            });
        }
        let mut values = Vec::new();
        let mut n_rows = 0;
        for (row, _) in self.rows().zip(mask).filter(|(_, &keep)| keep) {
            values.extend_from_slice(row);
            n_rows += 1;
        }
        Ok(Self {
            n_rows,
            n_cols: self.n_cols,
            values,
        })
    }

    /// Pad with `fill` or truncate every row so the matrix has exactly `n_cols` columns.
    ///
    /// This lets a query matrix with a different schema be fed to a model trained on
    /// `n_cols` features.
    pub fn reconcile_features(&self, n_cols: usize, fill: A) -> Self {
        Self::from_function(self.n_rows, n_cols, |row, col| {
            if col < self.n_cols {
                self[(row, col)].clone()
            } else {
                fill.clone()
            }
        })
    }
}

impl RowMajorMatrix<f64> {
    pub fn column_mean(&self, col: usize) -> f64 {
        let column = self.column(col);
        column.iter().sum::<f64>() / column.len() as f64
    }

    /// Population variance of a column.
    pub fn column_variance(&self, col: usize) -> f64 {
        let mean = self.column_mean(col);
        let column = self.column(col);
        column.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / column.len() as f64
    }

    pub(crate) fn check_finite(&self) -> FitResult<()> {
        if self.values.iter().all(|x| x.is_finite()) {
            Ok(())
        } else {
            Err(FitError::NonFinite { what: "features" })
        }
    }
}

impl<A> Index<(usize, usize)> for RowMajorMatrix<A> {
    type Output = A;
    fn index(&self, (row, col): (usize, usize)) -> &A {
        // No need to check for row because it will be out of the buffer
        assert!(col < self.n_cols);
        &self.values[row * self.n_cols + col]
    }
}

//! Small dense matrix/vector operations for recurrent forward passes.
//!
//! Model weights here are tens of kilobytes, so plain row-major `Vec<f64>`
//! storage is sufficient; no BLAS or array crate is warranted.

use serde::{Deserialize, Serialize};

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Construct from row-major data. Returns `None` when the element count
    /// does not match rows * cols.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != rows * cols {
            return None;
        }
        Some(Matrix { rows, cols, data })
    }

    /// Zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, v: f64) {
        self.data[r * self.cols + c] = v;
    }

    /// y = M x. Panics in debug builds on dimension mismatch; callers
    /// validate shapes once at weight-load time.
    pub fn matvec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.cols, "matvec dimension mismatch");
        let mut y = vec![0.0; self.rows];
        for r in 0..self.rows {
            let row = &self.data[r * self.cols..(r + 1) * self.cols];
            y[r] = dot(row, x);
        }
        y
    }

    /// Validate this matrix against an expected shape and finite contents.
    pub fn check_shape(&self, rows: usize, cols: usize, name: &str) -> Result<(), String> {
        if self.rows != rows || self.cols != cols {
            return Err(format!(
                "{name}: expected {rows}x{cols}, got {}x{}",
                self.rows, self.cols
            ));
        }
        if self.data.iter().any(|v| !v.is_finite()) {
            return Err(format!("{name}: contains non-finite entries"));
        }
        Ok(())
    }
}

/// Dot product of equal-length slices.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "dot dimension mismatch");
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// a += b, element-wise.
pub fn add_assign(a: &mut [f64], b: &[f64]) {
    debug_assert_eq!(a.len(), b.len(), "add_assign dimension mismatch");
    for (x, y) in a.iter_mut().zip(b) {
        *x += y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_bad_length() {
        assert!(Matrix::new(2, 3, vec![0.0; 5]).is_none());
        assert!(Matrix::new(2, 3, vec![0.0; 6]).is_some());
    }

    #[test]
    fn matvec_identity() {
        let m = Matrix::new(2, 2, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        assert_eq!(m.matvec(&[3.0, -4.0]), vec![3.0, -4.0]);
    }

    #[test]
    fn matvec_known_product() {
        let m = Matrix::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let y = m.matvec(&[1.0, 0.0, -1.0]);
        assert_eq!(y, vec![-2.0, -2.0]);
    }

    #[test]
    fn check_shape_reports_name() {
        let m = Matrix::zeros(2, 2);
        let err = m.check_shape(3, 2, "w_ih").unwrap_err();
        assert!(err.contains("w_ih"));

        let mut m = Matrix::zeros(1, 1);
        m.set(0, 0, f64::NAN);
        assert!(m.check_shape(1, 1, "bias").unwrap_err().contains("non-finite"));
    }

    #[test]
    fn add_assign_accumulates() {
        let mut a = [1.0, 2.0];
        add_assign(&mut a, &[0.5, -2.0]);
        assert_eq!(a, [1.5, 0.0]);
    }
}

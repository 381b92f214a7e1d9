use crate::error::{HrvError, Result};
use serde::{Deserialize, Serialize};

/// Numeric input of arbitrary shape, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl RawSeries {
    pub fn with_shape(shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(HrvError::Shape(format!(
                "shape {:?} holds {} values, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Build a 2-D array from rows; ragged rows are rejected.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().position(|r| r.len() != n_cols) {
            return Err(HrvError::Shape(format!(
                "row {} has {} columns, expected {}",
                bad,
                rows[bad].len(),
                n_cols
            )));
        }
        let shape = vec![rows.len(), n_cols];
        Ok(Self {
            shape,
            data: rows.into_iter().flatten().collect(),
        })
    }

    /// Drop unit dimensions, failing if more than one dimension remains.
    pub fn squeeze_1d(self) -> Result<Vec<f64>> {
        let non_unit = self.shape.iter().filter(|&&d| d != 1).count();
        if non_unit > 1 {
            return Err(HrvError::Shape(format!(
                "expected a row, column or flat vector, got shape {:?}",
                self.shape
            )));
        }
        Ok(self.data)
    }
}

impl From<Vec<f64>> for RawSeries {
    fn from(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }
}

impl From<&[f64]> for RawSeries {
    fn from(data: &[f64]) -> Self {
        data.to_vec().into()
    }
}

/// RR intervals (seconds) with their onset times (seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RRSeries {
    pub rri: Vec<f64>,
    pub trr: Vec<f64>,
}

impl RRSeries {
    /// Flatten both arrays to 1-D and synthesize onset times when absent.
    pub fn standardize(rri: RawSeries, trr: Option<RawSeries>) -> Result<Self> {
        let rri = rri.squeeze_1d()?;
        let trr = match trr {
            Some(trr) => {
                let trr = trr.squeeze_1d()?;
                if trr.len() != rri.len() {
                    return Err(HrvError::ShapeMismatch {
                        rri: rri.len(),
                        trr: trr.len(),
                    });
                }
                trr
            }
            None => onset_times(&rri),
        };
        Ok(Self { rri, trr })
    }

    pub fn from_slices(rri: &[f64], trr: Option<&[f64]>) -> Result<Self> {
        Self::standardize(rri.into(), trr.map(RawSeries::from))
    }

    pub fn len(&self) -> usize {
        self.rri.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rri.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.trr.first().copied().unwrap_or(0.0)
    }

    pub fn end(&self) -> f64 {
        self.trr.last().copied().unwrap_or(0.0)
    }

    /// Span between the first and last onset.
    pub fn duration(&self) -> f64 {
        self.end() - self.start()
    }
}

/// Zero-based onsets: `[0, rri[0], rri[0] + rri[1], ...]`.
fn onset_times(rri: &[f64]) -> Vec<f64> {
    let mut trr = Vec::with_capacity(rri.len());
    let mut acc = 0.0;
    for &interval in rri {
        trr.push(acc);
        acc += interval;
    }
    trr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesizes_onset_times() {
        let rr = RRSeries::from_slices(&[0.8, 0.9, 1.0, 0.7], None).unwrap();
        assert_eq!(rr.rri.len(), rr.trr.len());
        assert_eq!(rr.trr[0], 0.0);
        assert!((rr.trr[1] - 0.8).abs() < 1e-12);
        assert!((rr.trr[3] - 2.7).abs() < 1e-12);
        assert!((rr.duration() - 2.7).abs() < 1e-12);
    }

    #[test]
    fn flattens_rows_and_columns() {
        let column = RawSeries::from_rows(vec![vec![0.8], vec![0.9], vec![1.0]]).unwrap();
        let row = RawSeries::from_rows(vec![vec![0.1, 0.9, 1.8]]).unwrap();
        let rr = RRSeries::standardize(column, Some(row)).unwrap();
        assert_eq!(rr.rri, vec![0.8, 0.9, 1.0]);
        assert_eq!(rr.trr, vec![0.1, 0.9, 1.8]);
    }

    #[test]
    fn rejects_matrices() {
        let matrix = RawSeries::from_rows(vec![vec![0.8, 0.9], vec![1.0, 1.1]]).unwrap();
        let err = RRSeries::standardize(matrix, None).unwrap_err();
        assert!(matches!(err, HrvError::Shape(_)));

        let cube = RawSeries::with_shape(vec![2, 1, 2], vec![0.8; 4]).unwrap();
        assert!(matches!(cube.squeeze_1d(), Err(HrvError::Shape(_))));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = RawSeries::from_rows(vec![vec![0.8, 0.9], vec![1.0]]).unwrap_err();
        assert!(matches!(err, HrvError::Shape(_)));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = RRSeries::from_slices(&[0.8, 0.9, 1.0], Some(&[0.0, 0.8])).unwrap_err();
        assert!(matches!(err, HrvError::ShapeMismatch { rri: 3, trr: 2 }));
    }

    #[test]
    fn singleton_dimensions_are_squeezed() {
        let raw = RawSeries::with_shape(vec![1, 3, 1], vec![0.8, 0.9, 1.0]).unwrap();
        assert_eq!(raw.squeeze_1d().unwrap(), vec![0.8, 0.9, 1.0]);
    }
}

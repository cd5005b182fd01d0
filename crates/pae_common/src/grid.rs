//! Projection of PAE error matrices onto display grids.
//!
//! A protein's stored matrix has a fixed native size; the UI asks for an N×N
//! grid. Each target cell samples its nearest source cell:
//!
//! ```text
//! src_row = floor(i * rows / n)
//! src_col = floor(j * cols / n)
//! ```
//!
//! This works for shrinking, equal and enlarging projections. When enlarging,
//! several target cells share one source cell.

use crate::confidence::{classify, ConfidenceBand};
use crate::error::{PaeError, PaeResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Matrix
// ============================================================================

/// Immutable rectangular matrix of predicted aligned error values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct ErrorMatrix {
    values: Vec<Vec<f64>>,
    cols: usize,
}

impl ErrorMatrix {
    /// Build a matrix, rejecting empty, ragged, negative or non-finite input
    pub fn new(values: Vec<Vec<f64>>) -> PaeResult<Self> {
        if values.is_empty() {
            return Err(PaeError::InvalidInput("error matrix has no rows".to_string()));
        }
        let cols = values[0].len();
        if cols == 0 {
            return Err(PaeError::InvalidInput("error matrix has no columns".to_string()));
        }
        for (r, row) in values.iter().enumerate() {
            if row.len() != cols {
                return Err(PaeError::InvalidInput(format!(
                    "error matrix row {} has {} columns, expected {}",
                    r,
                    row.len(),
                    cols
                )));
            }
            if let Some(c) = row.iter().position(|v| !v.is_finite() || *v < 0.0) {
                return Err(PaeError::InvalidInput(format!(
                    "error matrix value at [{}][{}] is {} (must be finite and non-negative)",
                    r, c, row[c]
                )));
            }
        }
        Ok(Self { values, cols })
    }

    pub fn rows(&self) -> usize {
        self.values.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }
}

impl TryFrom<Vec<Vec<f64>>> for ErrorMatrix {
    type Error = PaeError;

    fn try_from(values: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<ErrorMatrix> for Vec<Vec<f64>> {
    fn from(matrix: ErrorMatrix) -> Self {
        matrix.values
    }
}

// ============================================================================
// Display Grid
// ============================================================================

/// One cell of a projected grid, addressed by its output coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayCell {
    pub row: usize,
    pub col: usize,
    pub confidence: ConfidenceBand,
}

/// Number of cells per confidence band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl BandCounts {
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }

    pub fn get(&self, band: ConfidenceBand) -> usize {
        match band {
            ConfidenceBand::High => self.high,
            ConfidenceBand::Medium => self.medium,
            ConfidenceBand::Low => self.low,
        }
    }
}

/// Square grid of display cells in row-major order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayGrid {
    pub size: usize,
    pub cells: Vec<Vec<DisplayCell>>,
}

impl DisplayGrid {
    pub fn cell(&self, row: usize, col: usize) -> Option<&DisplayCell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[DisplayCell]> {
        self.cells.iter().map(|r| r.as_slice())
    }

    /// Confidence bands only, row-major
    pub fn bands(&self) -> Vec<Vec<ConfidenceBand>> {
        self.cells
            .iter()
            .map(|r| r.iter().map(|c| c.confidence).collect())
            .collect()
    }

    pub fn band_counts(&self) -> BandCounts {
        let mut counts = BandCounts::default();
        for cell in self.cells.iter().flatten() {
            match cell.confidence {
                ConfidenceBand::High => counts.high += 1,
                ConfidenceBand::Medium => counts.medium += 1,
                ConfidenceBand::Low => counts.low += 1,
            }
        }
        counts
    }
}

/// Source index for target index `i` of an `n`-wide projection over `len` entries
fn source_index(i: usize, len: usize, n: usize) -> usize {
    i * len / n
}

/// Project `matrix` onto a `grid_size` × `grid_size` confidence grid
pub fn project(matrix: &ErrorMatrix, grid_size: usize) -> PaeResult<DisplayGrid> {
    if grid_size == 0 {
        return Err(PaeError::InvalidInput("grid size must be positive".to_string()));
    }
    if matrix.rows() == 0 || matrix.cols() == 0 {
        return Err(PaeError::InvalidInput("error matrix is empty".to_string()));
    }

    let cells = (0..grid_size)
        .map(|i| {
            let src_row = source_index(i, matrix.rows(), grid_size);
            (0..grid_size)
                .map(|j| {
                    let src_col = source_index(j, matrix.cols(), grid_size);
                    DisplayCell {
                        row: i,
                        col: j,
                        confidence: classify(matrix.values[src_row][src_col]),
                    }
                })
                .collect()
        })
        .collect();

    Ok(DisplayGrid {
        size: grid_size,
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConfidenceBand::{High, Low, Medium};

    fn matrix(values: &[&[f64]]) -> ErrorMatrix {
        ErrorMatrix::new(values.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    #[test]
    fn test_matrix_rejects_empty_and_ragged() {
        assert!(matches!(ErrorMatrix::new(vec![]), Err(PaeError::InvalidInput(_))));
        assert!(matches!(ErrorMatrix::new(vec![vec![]]), Err(PaeError::InvalidInput(_))));
        assert!(matches!(
            ErrorMatrix::new(vec![vec![1.0, 2.0], vec![3.0]]),
            Err(PaeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_matrix_rejects_bad_values() {
        assert!(ErrorMatrix::new(vec![vec![-1.0]]).is_err());
        assert!(ErrorMatrix::new(vec![vec![f64::NAN]]).is_err());
        assert!(ErrorMatrix::new(vec![vec![f64::INFINITY]]).is_err());
    }

    #[test]
    fn test_matrix_deserialize_validates() {
        let ok: ErrorMatrix = serde_json::from_str("[[1.0, 2.0], [3.0, 4.0]]").unwrap();
        assert_eq!(ok.rows(), 2);
        assert_eq!(ok.cols(), 2);
        assert!(serde_json::from_str::<ErrorMatrix>("[[1.0], [2.0, 3.0]]").is_err());
        assert!(serde_json::from_str::<ErrorMatrix>("[]").is_err());
    }

    #[test]
    fn test_project_identity_size() {
        let m = matrix(&[&[2.0, 18.0], &[18.0, 2.0]]);
        let grid = project(&m, 2).unwrap();
        assert_eq!(grid.bands(), vec![vec![High, Low], vec![Low, High]]);
    }

    #[test]
    fn test_project_zero_size_fails() {
        let m = matrix(&[&[1.0]]);
        assert!(matches!(project(&m, 0), Err(PaeError::InvalidInput(_))));
    }

    #[test]
    fn test_project_upsampling_blocks() {
        let m = matrix(&[&[0.0, 20.0], &[20.0, 0.0]]);
        let grid = project(&m, 4).unwrap();
        assert_eq!(
            grid.bands(),
            vec![
                vec![High, High, Low, Low],
                vec![High, High, Low, Low],
                vec![Low, Low, High, High],
                vec![Low, Low, High, High],
            ]
        );
        assert_eq!(grid.cell(0, 0).unwrap().confidence, High);
        assert_eq!(grid.cell(1, 0).unwrap().confidence, High);
    }

    #[test]
    fn test_project_downsampling_picks_floor_index() {
        // 3x3 -> 2x2 samples rows/cols 0 and 1 (floor(1*3/2) = 1)
        let m = matrix(&[&[1.0, 7.0, 20.0], &[7.0, 1.0, 20.0], &[20.0, 20.0, 1.0]]);
        let grid = project(&m, 2).unwrap();
        assert_eq!(grid.bands(), vec![vec![High, Medium], vec![Medium, High]]);
    }

    #[test]
    fn test_project_rectangular_matrix() {
        let m = matrix(&[&[1.0, 10.0, 30.0]]);
        let grid = project(&m, 3).unwrap();
        for row in grid.rows() {
            let bands: Vec<_> = row.iter().map(|c| c.confidence).collect();
            assert_eq!(bands, vec![High, Medium, Low]);
        }
    }

    #[test]
    fn test_project_coordinates_are_output_positions() {
        let m = matrix(&[&[3.0, 9.0], &[9.0, 3.0]]);
        for n in [1, 2, 3, 5, 8] {
            let grid = project(&m, n).unwrap();
            assert_eq!(grid.size, n);
            assert_eq!(grid.cells.len(), n);
            for (i, row) in grid.cells.iter().enumerate() {
                assert_eq!(row.len(), n);
                for (j, cell) in row.iter().enumerate() {
                    assert_eq!((cell.row, cell.col), (i, j));
                }
            }
        }
    }

    #[test]
    fn test_project_idempotent() {
        let m = matrix(&[&[1.0, 6.0, 16.0], &[6.0, 1.0, 6.0], &[16.0, 6.0, 1.0]]);
        assert_eq!(project(&m, 7).unwrap(), project(&m, 7).unwrap());
    }

    #[test]
    fn test_band_counts() {
        let m = matrix(&[&[0.0, 20.0], &[20.0, 0.0]]);
        let counts = project(&m, 4).unwrap().band_counts();
        let expected = BandCounts {
            high: 8,
            medium: 0,
            low: 8,
        };
        assert_eq!(counts, expected);
        assert_eq!(counts.total(), 16);
        assert_eq!(counts.get(Low), 8);
    }
}

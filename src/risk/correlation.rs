//! Correlation matrices for normal and stressed regimes.
//!
//! # Overview
//!
//! Diversification that holds in calm markets often disappears in a sell-off.
//! [`compute_correlation_matrices`] measures this by comparing:
//!
//! - **Normal matrix**: Pearson correlation over the full returns table
//! - **Stress matrix**: Pearson correlation over stress dates only
//!
//! ## Pearson Correlation
//!
//! ```text
//! ρ(X,Y) = Σ (xᵢ - x̄)(yᵢ - ȳ) / √(Σ (xᵢ - x̄)² · Σ (yᵢ - ȳ)²)
//! ```
//!
//! A pair with fewer than two observations or a constant series has no
//! measurable co-movement. It is stored as 0 and flagged as undefined, and
//! any undefined pair leaves the matrix without an average correlation.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::types::error::{XRayError, XRayResult};
use crate::types::table::ReturnsTable;
use crate::types::ticker::Ticker;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Symmetric correlation matrix over a set of tickers.
///
/// Stores only the upper triangle of the matrix.
///
/// # Invariants
///
/// - Diagonal elements are always 1.0
/// - Off-diagonal elements are in range \[-1, 1\]
/// - Matrix is symmetric: ρ(A,B) = ρ(B,A)
///
/// # Example
///
/// ```rust
/// use portfolio_xray::risk::CorrelationMatrix;
/// use portfolio_xray::types::Ticker;
///
/// let spy = Ticker::new("SPY");
/// let tlt = Ticker::new("TLT");
///
/// let mut matrix = CorrelationMatrix::identity(vec![spy.clone(), tlt.clone()]);
/// matrix.set_correlation(&spy, &tlt, -0.3).unwrap();
///
/// assert_eq!(matrix.get_correlation(&tlt, &spy), Some(-0.3));
/// assert_eq!(matrix.get_correlation(&spy, &spy), Some(1.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorrelationMatrix {
    tickers: Vec<Ticker>,
    /// Flat upper triangle including the diagonal.
    /// Index formula: i * n - i * (i + 1) / 2 + j for i <= j
    correlations: Vec<f64>,
    /// Whether each entry of `correlations` was measurable.
    defined: Vec<bool>,
}

impl CorrelationMatrix {
    /// Creates an identity matrix: self-correlations 1, all others 0.
    #[must_use]
    pub fn identity(tickers: Vec<Ticker>) -> Self {
        let n = tickers.len();
        let mut correlations = vec![0.0; n * (n + 1) / 2];
        for i in 0..n {
            correlations[Self::index_for(i, i, n)] = 1.0;
        }
        let defined = vec![true; correlations.len()];
        Self {
            tickers,
            correlations,
            defined,
        }
    }

    /// Computes pairwise Pearson correlations of every column in `returns`.
    #[must_use]
    pub fn from_returns(returns: &ReturnsTable) -> Self {
        let mut matrix = Self::identity(returns.tickers().to_vec());
        let columns: Vec<&[f64]> = returns.columns().map(|(_, c)| c).collect();
        let n = columns.len();

        for i in 0..n {
            for j in (i + 1)..n {
                let idx = Self::index_for(i, j, n);
                match pearson(columns[i], columns[j]) {
                    Some(rho) => matrix.correlations[idx] = rho,
                    None => matrix.defined[idx] = false,
                }
            }
        }

        matrix
    }

    /// Returns the number of tickers.
    #[must_use]
    pub fn size(&self) -> usize {
        self.tickers.len()
    }

    /// Returns the tickers in matrix order.
    #[must_use]
    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    fn index_for(i: usize, j: usize, n: usize) -> usize {
        let (row, col) = if i <= j { (i, j) } else { (j, i) };
        row * n - row * (row + 1) / 2 + col
    }

    fn ticker_index(&self, ticker: &Ticker) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    /// Returns the correlation between two tickers, `None` if either is absent.
    #[must_use]
    pub fn get_correlation(&self, a: &Ticker, b: &Ticker) -> Option<f64> {
        let i = self.ticker_index(a)?;
        let j = self.ticker_index(b)?;
        Some(self.correlations[Self::index_for(i, j, self.tickers.len())])
    }

    /// Returns whether the pair had a measurable correlation, `None` if
    /// either ticker is absent.
    #[must_use]
    pub fn is_defined(&self, a: &Ticker, b: &Ticker) -> Option<bool> {
        let i = self.ticker_index(a)?;
        let j = self.ticker_index(b)?;
        Some(self.defined[Self::index_for(i, j, self.tickers.len())])
    }

    /// Sets the correlation between two tickers.
    ///
    /// # Errors
    ///
    /// Returns `XRayError::Validation` if:
    /// - Either ticker is not in the matrix
    /// - Correlation is outside \[-1, 1\]
    /// - Trying to set self-correlation to a value other than 1.0
    pub fn set_correlation(&mut self, a: &Ticker, b: &Ticker, correlation: f64) -> XRayResult<()> {
        if !(-1.0..=1.0).contains(&correlation) {
            return Err(XRayError::Validation(format!(
                "Correlation must be in [-1, 1], got {}",
                correlation
            )));
        }

        let i = self
            .ticker_index(a)
            .ok_or_else(|| XRayError::Validation(format!("Ticker {} not in matrix", a)))?;
        let j = self
            .ticker_index(b)
            .ok_or_else(|| XRayError::Validation(format!("Ticker {} not in matrix", b)))?;

        if i == j && correlation != 1.0 {
            return Err(XRayError::Validation(
                "Self-correlation must be 1.0".to_string(),
            ));
        }

        let idx = Self::index_for(i, j, self.tickers.len());
        self.correlations[idx] = correlation;
        self.defined[idx] = true;
        Ok(())
    }

    /// Returns the mean of all off-diagonal correlations.
    ///
    /// `None` for matrices with fewer than two tickers or with any
    /// undefined pair.
    #[must_use]
    pub fn average_off_diagonal(&self) -> Option<f64> {
        let n = self.tickers.len();
        if n < 2 {
            return None;
        }
        let mut sum = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let idx = Self::index_for(i, j, n);
                if !self.defined[idx] {
                    return None;
                }
                sum += self.correlations[idx];
            }
        }
        Some(sum / (n * (n - 1) / 2) as f64)
    }

    /// Checks the matrix invariants.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let n = self.tickers.len();
        for i in 0..n {
            for j in i..n {
                let corr = self.correlations[Self::index_for(i, j, n)];
                if i == j {
                    if corr != 1.0 {
                        return false;
                    }
                } else if !(-1.0..=1.0).contains(&corr) {
                    return false;
                }
            }
        }
        true
    }

    /// Returns the full matrix as rows.
    #[must_use]
    pub fn to_matrix(&self) -> Vec<Vec<f64>> {
        let n = self.tickers.len();
        let mut matrix = vec![vec![0.0; n]; n];
        for (i, row) in matrix.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = self.correlations[Self::index_for(i, j, n)];
            }
        }
        matrix
    }
}

/// Correlations in normal and stressed regimes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorrelationShift {
    /// Correlation over every date.
    pub normal: CorrelationMatrix,
    /// Correlation over stress dates only.
    pub stress: CorrelationMatrix,
}

impl CorrelationShift {
    /// Change in average off-diagonal correlation from normal to stress.
    #[must_use]
    pub fn average_shift(&self) -> Option<f64> {
        Some(self.stress.average_off_diagonal()? - self.normal.average_off_diagonal()?)
    }
}

/// Computes normal-period and stress-period correlation matrices.
///
/// # Errors
///
/// Returns `XRayError::EmptyData` if no stress date is in the returns index.
pub fn compute_correlation_matrices(
    asset_returns: &ReturnsTable,
    stress_dates: &BTreeSet<NaiveDate>,
) -> XRayResult<CorrelationShift> {
    let stressed = asset_returns.restrict_to(stress_dates);
    if stressed.is_empty() {
        return Err(XRayError::EmptyData(
            "correlation: no asset returns on stress dates".to_string(),
        ));
    }

    Ok(CorrelationShift {
        normal: CorrelationMatrix::from_returns(asset_returns),
        stress: CorrelationMatrix::from_returns(&stressed),
    })
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let mean_x = x[..n].iter().sum::<f64>() / n_f;
    let mean_y = y[..n].iter().sum::<f64>() / n_f;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x[..n].iter().zip(&y[..n]) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }

    // Clamp to [-1, 1] to absorb rounding
    Some((cov / denominator).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn returns() -> ReturnsTable {
        ReturnsTable::new(
            (1..=5).map(day).collect(),
            vec![Ticker::new("A"), Ticker::new("B"), Ticker::new("C")],
            vec![
                vec![0.01, -0.02, 0.03, -0.01, 0.02],
                vec![0.02, -0.04, 0.06, -0.02, 0.04],
                vec![-0.01, 0.02, -0.03, 0.01, -0.02],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_identity() {
        let a = Ticker::new("A");
        let b = Ticker::new("B");
        let matrix = CorrelationMatrix::identity(vec![a.clone(), b.clone()]);

        assert_eq!(matrix.size(), 2);
        assert_eq!(matrix.get_correlation(&a, &a), Some(1.0));
        assert_eq!(matrix.get_correlation(&a, &b), Some(0.0));
        assert!(matrix.is_valid());
    }

    #[test]
    fn test_set_correlation_validation() {
        let a = Ticker::new("A");
        let b = Ticker::new("B");
        let mut matrix = CorrelationMatrix::identity(vec![a.clone(), b.clone()]);

        assert!(matrix.set_correlation(&a, &b, 1.5).is_err());
        assert!(matrix.set_correlation(&a, &a, 0.5).is_err());
        assert!(matrix.set_correlation(&a, &Ticker::new("Z"), 0.5).is_err());
        assert!(matrix.set_correlation(&b, &a, 0.7).is_ok());
        assert_eq!(matrix.get_correlation(&a, &b), Some(0.7));
    }

    #[test]
    fn test_from_returns_perfect_correlation() {
        let matrix = CorrelationMatrix::from_returns(&returns());
        let a = Ticker::new("A");
        let b = Ticker::new("B");
        let c = Ticker::new("C");

        assert_relative_eq!(matrix.get_correlation(&a, &b).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(matrix.get_correlation(&a, &c).unwrap(), -1.0, epsilon = 1e-12);
        assert!(matrix.is_valid());
    }

    #[test]
    fn test_from_returns_is_symmetric() {
        let matrix = CorrelationMatrix::from_returns(&returns()).to_matrix();
        for (i, row) in matrix.iter().enumerate() {
            assert_eq!(row[i], 1.0);
            for (j, value) in row.iter().enumerate() {
                assert_eq!(*value, matrix[j][i]);
            }
        }
    }

    #[test]
    fn test_constant_series_correlates_zero() {
        let table = ReturnsTable::new(
            vec![day(1), day(2), day(3)],
            vec![Ticker::new("A"), Ticker::new("FLAT")],
            vec![vec![0.01, 0.02, -0.01], vec![0.0, 0.0, 0.0]],
        )
        .unwrap();
        let matrix = CorrelationMatrix::from_returns(&table);
        assert_eq!(
            matrix.get_correlation(&Ticker::new("A"), &Ticker::new("FLAT")),
            Some(0.0)
        );
        assert_eq!(
            matrix.is_defined(&Ticker::new("A"), &Ticker::new("FLAT")),
            Some(false)
        );
        assert!(matrix.is_valid());
        assert!(matrix.average_off_diagonal().is_none());
    }

    #[test]
    fn test_single_stress_date_has_no_average() {
        let stress: BTreeSet<NaiveDate> = [day(3)].into_iter().collect();
        let shift = compute_correlation_matrices(&returns(), &stress).unwrap();

        assert_eq!(shift.stress.get_correlation(&Ticker::new("A"), &Ticker::new("B")), Some(0.0));
        assert_eq!(shift.stress.is_defined(&Ticker::new("A"), &Ticker::new("B")), Some(false));
        assert!(shift.normal.average_off_diagonal().is_some());
        assert!(shift.stress.average_off_diagonal().is_none());
        assert!(shift.average_shift().is_none());
    }

    #[test]
    fn test_set_correlation_marks_pair_defined() {
        let a = Ticker::new("A");
        let flat = Ticker::new("FLAT");
        let table = ReturnsTable::new(
            vec![day(1), day(2)],
            vec![a.clone(), flat.clone()],
            vec![vec![0.01, 0.02], vec![0.0, 0.0]],
        )
        .unwrap();
        let mut matrix = CorrelationMatrix::from_returns(&table);
        matrix.set_correlation(&a, &flat, 0.2).unwrap();

        assert_eq!(matrix.is_defined(&a, &flat), Some(true));
        assert_eq!(matrix.average_off_diagonal(), Some(0.2));
    }

    #[test]
    fn test_average_off_diagonal() {
        let matrix = CorrelationMatrix::from_returns(&returns());
        // pairs: AB = 1, AC = -1, BC = -1
        assert_relative_eq!(
            matrix.average_off_diagonal().unwrap(),
            -1.0 / 3.0,
            epsilon = 1e-12
        );
        assert!(
            CorrelationMatrix::identity(vec![Ticker::new("A")])
                .average_off_diagonal()
                .is_none()
        );
    }

    #[test]
    fn test_compute_matrices() {
        let stress: BTreeSet<NaiveDate> = [day(2), day(4)].into_iter().collect();
        let shift = compute_correlation_matrices(&returns(), &stress).unwrap();

        assert_eq!(shift.normal.size(), 3);
        assert_eq!(shift.stress.size(), 3);
        assert!(shift.stress.is_valid());
        assert!(shift.average_shift().is_some());
    }

    #[test]
    fn test_compute_matrices_disjoint_stress_dates() {
        let stress: BTreeSet<NaiveDate> = [day(20)].into_iter().collect();
        let result = compute_correlation_matrices(&returns(), &stress);
        assert!(matches!(result, Err(XRayError::EmptyData(_))));
    }
}

//! Narrative classification of X-ray results.
//!
//! Each classifier is a pure threshold rule over numbers the pipeline has
//! already computed; the [`fmt::Display`] impls carry the user-facing text.

use std::fmt;

use crate::Decimal;
use crate::dec;
use crate::risk::{CorrelationShift, HorizonMetric, StressContribution};
use crate::types::ticker::Ticker;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const EQUITY_HEAVY_PCT: Decimal = dec!(70);
const BALANCED_PCT: Decimal = dec!(40);
const CORRELATION_RISE: f64 = 0.15;
const CORRELATION_FALL: f64 = 0.10;
const CONCENTRATION_SHARE_PCT: f64 = 60.0;
const SHORT_HORIZON: &str = "6 Months";
const LONG_HORIZON: &str = "3 Years";

/// Overall equity positioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PortfolioProfile {
    /// More than 70% in equity types.
    EquityHeavy,
    /// More than 40% and at most 70% in equity types.
    Balanced,
    /// At most 40% in equity types.
    Defensive,
}

impl PortfolioProfile {
    /// Classifies an equity allocation percentage.
    #[must_use]
    pub fn from_equity_pct(equity_pct: Decimal) -> Self {
        if equity_pct > EQUITY_HEAVY_PCT {
            PortfolioProfile::EquityHeavy
        } else if equity_pct > BALANCED_PCT {
            PortfolioProfile::Balanced
        } else {
            PortfolioProfile::Defensive
        }
    }
}

impl fmt::Display for PortfolioProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PortfolioProfile::EquityHeavy => {
                "This portfolio is equity-heavy, making it sensitive to market fluctuations."
            }
            PortfolioProfile::Balanced => {
                "This portfolio has a balanced mix of growth and defensive assets."
            }
            PortfolioProfile::Defensive => {
                "This portfolio is defensively positioned with lower exposure to equities."
            }
        };
        f.write_str(text)
    }
}

/// How average correlation moves from normal to stressed markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CorrelationRegime {
    /// Stress average exceeds normal by more than 0.15.
    RisesUnderStress,
    /// Stress average is more than 0.10 below normal.
    FallsUnderStress,
    /// Neither.
    Stable,
}

impl CorrelationRegime {
    /// Classifies normal and stress average off-diagonal correlations.
    #[must_use]
    pub fn from_averages(normal_avg: f64, stress_avg: f64) -> Self {
        if stress_avg > normal_avg + CORRELATION_RISE {
            CorrelationRegime::RisesUnderStress
        } else if stress_avg < normal_avg - CORRELATION_FALL {
            CorrelationRegime::FallsUnderStress
        } else {
            CorrelationRegime::Stable
        }
    }

    /// Classifies a correlation shift.
    ///
    /// `None` with fewer than two tickers, or when a pair has no measurable
    /// correlation in either regime (for example a single stress date).
    #[must_use]
    pub fn from_shift(shift: &CorrelationShift) -> Option<Self> {
        Some(Self::from_averages(
            shift.normal.average_off_diagonal()?,
            shift.stress.average_off_diagonal()?,
        ))
    }
}

impl fmt::Display for CorrelationRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CorrelationRegime::RisesUnderStress => {
                "Asset correlations increase during stress, reducing diversification when it is most needed."
            }
            CorrelationRegime::FallsUnderStress => {
                "Assets become less correlated during stress, improving diversification in difficult periods."
            }
            CorrelationRegime::Stable => {
                "Asset relationships remain relatively stable during stress periods."
            }
        };
        f.write_str(text)
    }
}

/// Whether stress losses come from one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StressConcentration {
    /// The largest contributor accounts for more than 60% of the total.
    Concentrated {
        /// The dominant contributor.
        ticker: Ticker,
    },
    /// No single asset dominates.
    Distributed,
}

impl StressConcentration {
    /// Classifies stress-loss contributions.
    #[must_use]
    pub fn from_contribution(contribution: &StressContribution) -> Self {
        let total = contribution.total();
        let Some((ticker, largest)) = contribution.largest_loss() else {
            return StressConcentration::Distributed;
        };
        if total == 0.0 {
            return StressConcentration::Distributed;
        }

        let share = (largest / total).abs() * 100.0;
        if share > CONCENTRATION_SHARE_PCT {
            StressConcentration::Concentrated {
                ticker: ticker.clone(),
            }
        } else {
            StressConcentration::Distributed
        }
    }
}

impl fmt::Display for StressConcentration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StressConcentration::Concentrated { ticker } => write!(
                f,
                "Most stress losses are driven by {}, indicating concentration risk in this asset.",
                ticker
            ),
            StressConcentration::Distributed => f.write_str(
                "Stress losses are distributed across assets, indicating limited concentration risk.",
            ),
        }
    }
}

/// How loss probability evolves with holding period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HorizonTrend {
    /// 3-year loss probability is under half the 6-month one.
    FallsWithTime,
    /// Otherwise.
    Persistent,
}

impl HorizonTrend {
    /// Classifies a pair of loss probabilities.
    #[must_use]
    pub fn from_probabilities(short_loss: f64, long_loss: f64) -> Self {
        if long_loss < short_loss * 0.5 {
            HorizonTrend::FallsWithTime
        } else {
            HorizonTrend::Persistent
        }
    }

    /// Compares the "6 Months" and "3 Years" rows. `None` if either is absent.
    #[must_use]
    pub fn from_metrics(metrics: &[HorizonMetric]) -> Option<Self> {
        let probability = |label: &str| {
            metrics
                .iter()
                .find(|m| m.horizon == label)
                .map(|m| m.probability_of_loss)
        };
        Some(Self::from_probabilities(
            probability(SHORT_HORIZON)?,
            probability(LONG_HORIZON)?,
        ))
    }
}

impl fmt::Display for HorizonTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            HorizonTrend::FallsWithTime => {
                "The probability of loss decreases significantly over longer holding periods, highlighting the benefits of staying invested."
            }
            HorizonTrend::Persistent => {
                "Loss risk remains persistent even over longer holding periods, indicating structural portfolio risk."
            }
        };
        f.write_str(text)
    }
}

/// All narrative classifications of one run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Insights {
    /// Equity positioning.
    pub portfolio: PortfolioProfile,
    /// Correlation regime, absent with a single surviving ticker.
    pub correlation: Option<CorrelationRegime>,
    /// Stress-loss concentration.
    pub stress: StressConcentration,
    /// Horizon trend, absent unless both 6-month and 3-year rows exist.
    pub horizon: Option<HorizonTrend>,
}

impl Insights {
    /// Joins the portfolio, stress and horizon messages into one paragraph.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![self.portfolio.to_string(), self.stress.to_string()];
        if let Some(horizon) = &self.horizon {
            parts.push(horizon.to_string());
        }
        parts.join(" ")
    }
}

//! Raw portfolio records and asset classes.

use std::fmt;
use std::str::FromStr;

use crate::Decimal;
use crate::types::decimal::f64_to_decimal;
use crate::types::error::{XRayError, XRayResult};
use crate::types::ticker::Ticker;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Asset class of a holding.
///
/// # Example
///
/// ```rust
/// use portfolio_xray::portfolio::AssetType;
///
/// let kind: AssetType = "Bond ETF".parse().unwrap();
/// assert_eq!(kind, AssetType::BondEtf);
/// assert!(!kind.is_equity());
/// assert!(AssetType::Index.is_equity());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AssetType {
    /// Single listed company.
    #[cfg_attr(feature = "serde", serde(rename = "Stock"))]
    Stock,
    /// Exchange-traded fund.
    #[cfg_attr(feature = "serde", serde(rename = "ETF"))]
    Etf,
    /// Market index.
    #[cfg_attr(feature = "serde", serde(rename = "Index"))]
    Index,
    /// Bond exchange-traded fund.
    #[cfg_attr(feature = "serde", serde(rename = "Bond ETF"))]
    BondEtf,
    /// Gold.
    #[cfg_attr(feature = "serde", serde(rename = "Gold"))]
    Gold,
}

impl AssetType {
    /// All supported asset types in display order.
    pub const ALL: [AssetType; 5] = [
        AssetType::Stock,
        AssetType::Etf,
        AssetType::Index,
        AssetType::BondEtf,
        AssetType::Gold,
    ];

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            AssetType::Stock => "Stock",
            AssetType::Etf => "ETF",
            AssetType::Index => "Index",
            AssetType::BondEtf => "Bond ETF",
            AssetType::Gold => "Gold",
        }
    }

    /// Returns true for equity exposure (stocks, ETFs and indices).
    #[must_use]
    pub fn is_equity(&self) -> bool {
        matches!(self, AssetType::Stock | AssetType::Etf | AssetType::Index)
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for AssetType {
    type Err = XRayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AssetType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| XRayError::Validation(format!("Unknown asset type '{}'", s)))
    }
}

/// One user-declared holding: ticker, invested amount and asset class.
///
/// # Example
///
/// ```rust
/// use portfolio_xray::portfolio::{AssetType, PortfolioRecord};
/// use portfolio_xray::dec;
///
/// let record = PortfolioRecord::new("SPY", dec!(6000), AssetType::Etf);
/// assert_eq!(record.ticker.as_str(), "SPY");
///
/// let raw = PortfolioRecord::from_raw(" GLD ", 4000.0, "Gold").unwrap();
/// assert_eq!(raw.ticker.as_str(), "GLD");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PortfolioRecord {
    /// Ticker symbol.
    pub ticker: Ticker,
    /// Invested amount. Must be positive to build a portfolio.
    pub amount: Decimal,
    /// Asset class.
    pub asset_type: AssetType,
}

impl PortfolioRecord {
    /// Creates a new record.
    #[must_use]
    pub fn new(ticker: impl Into<Ticker>, amount: Decimal, asset_type: AssetType) -> Self {
        Self {
            ticker: ticker.into(),
            amount,
            asset_type,
        }
    }

    /// Creates a record from host-supplied raw values.
    ///
    /// The ticker is trimmed and the asset type parsed from its label.
    ///
    /// # Errors
    ///
    /// Returns `XRayError::Validation` if the amount is not a finite number
    /// or the asset type label is unknown.
    pub fn from_raw(ticker: &str, amount: f64, asset_type: &str) -> XRayResult<Self> {
        let amount = f64_to_decimal(amount)
            .map_err(|_| XRayError::Validation(format!("Amount for {} is not a number", ticker)))?;
        Ok(Self::new(ticker.trim(), amount, asset_type.parse()?))
    }
}

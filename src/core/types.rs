use serde::Serialize;
use thiserror::Error;

/// Domain failures of the income model. Returned as values, never raised.
#[derive(Copy, Clone, Debug, Error, PartialEq)]
pub enum CalcError {
    #[error("share price must be > 0 to buy new shares (got {price})")]
    NonPositivePrice { price: f64 },
    /// Zero shares, or a zero or negative price, leaves yields undefined.
    #[error("portfolio value must be > 0 to compute yields (got {value})")]
    NonPositivePortfolioValue { value: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    pub share_count: i64,
    pub share_price: f64,
    /// Carried for display; no formula reads it.
    pub strike_price: f64,
    pub option_premium: f64,
    pub monthly_dividend: f64,
    /// Carried for display; no formula reads it.
    pub days_to_expiration: u32,
    pub monthly_contribution: f64,
}

impl Default for Inputs {
    fn default() -> Self {
        Self {
            share_count: 2320,
            share_price: 8.28,
            strike_price: 9.00,
            option_premium: 0.10,
            monthly_dividend: 0.56,
            days_to_expiration: 5,
            monthly_contribution: 0.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldPercentages {
    pub option_yield_pct: f64,
    pub dividend_yield_pct: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reinvestment {
    pub new_shares: i64,
    pub final_share_count: i64,
}

/// Point-in-time income metrics for the current position.
///
/// `total_income` excludes the monthly contribution; the one-step
/// reinvestment adds it on top.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeSnapshot {
    pub lot_count: i64,
    pub option_income: f64,
    pub dividend_income: f64,
    pub total_income: f64,
    pub portfolio_value: f64,
    pub annualized_income: f64,
    pub yields: Result<YieldPercentages, CalcError>,
    pub reinvestment: Result<Reinvestment, CalcError>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionMonth {
    pub month: u32,
    pub lot_count: i64,
    pub option_income: f64,
    pub dividend_income: f64,
    pub contribution: f64,
    /// Option + dividend + contribution, before reinvestment.
    pub month_income: f64,
    pub new_shares: i64,
    /// Share count after this month's purchase.
    pub share_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub initial_share_count: i64,
    pub(super) months: Vec<ProjectionMonth>,
}

impl Projection {
    pub fn months(&self) -> &[ProjectionMonth] {
        &self.months
    }

    pub fn into_months(self) -> Vec<ProjectionMonth> {
        self.months
    }

    pub fn positions(&self) -> Vec<i64> {
        self.months.iter().map(|m| m.share_count).collect()
    }

    pub fn incomes(&self) -> Vec<f64> {
        self.months.iter().map(|m| m.month_income).collect()
    }

    pub fn final_share_count(&self) -> i64 {
        self.months
            .last()
            .map(|m| m.share_count)
            .unwrap_or(self.initial_share_count)
    }
}

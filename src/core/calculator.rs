use super::types::{CalcError, IncomeSnapshot, Inputs, Reinvestment, YieldPercentages};

pub(super) const SHARES_PER_CONTRACT: i64 = 100;
const MONTHS_PER_YEAR: f64 = 12.0;

pub fn calculate_income(inputs: &Inputs) -> IncomeSnapshot {
    let lot_count = lot_count(inputs.share_count);
    let option_income = option_income(lot_count, inputs.option_premium);
    let dividend_income = dividend_income(inputs.share_count, inputs.monthly_dividend);
    let total_income = option_income + dividend_income;
    let portfolio_value = inputs.share_count as f64 * inputs.share_price;

    let yields = yield_percentages(option_income, dividend_income, portfolio_value);
    let reinvestment = whole_shares_for(
        total_income + inputs.monthly_contribution,
        inputs.share_price,
    )
    .map(|new_shares| Reinvestment {
        new_shares,
        final_share_count: inputs.share_count.saturating_add(new_shares),
    });

    IncomeSnapshot {
        lot_count,
        option_income,
        dividend_income,
        total_income,
        portfolio_value,
        annualized_income: total_income * MONTHS_PER_YEAR,
        yields,
        reinvestment,
    }
}

/// Whole contracts the position can cover. Floors toward negative infinity.
pub(super) fn lot_count(share_count: i64) -> i64 {
    share_count.div_euclid(SHARES_PER_CONTRACT)
}

pub(super) fn option_income(lot_count: i64, option_premium: f64) -> f64 {
    lot_count as f64 * option_premium * SHARES_PER_CONTRACT as f64
}

pub(super) fn dividend_income(share_count: i64, monthly_dividend: f64) -> f64 {
    share_count as f64 * monthly_dividend
}

/// Whole shares `cash` buys at `share_price`, floored. Saturates at the
/// `i64` bounds.
pub(super) fn whole_shares_for(cash: f64, share_price: f64) -> Result<i64, CalcError> {
    ensure_priced(share_price)?;
    Ok((cash / share_price).floor() as i64)
}

pub(super) fn ensure_priced(share_price: f64) -> Result<(), CalcError> {
    if share_price.is_nan() || share_price <= 0.0 {
        return Err(CalcError::NonPositivePrice { price: share_price });
    }
    Ok(())
}

fn yield_percentages(
    option_income: f64,
    dividend_income: f64,
    portfolio_value: f64,
) -> Result<YieldPercentages, CalcError> {
    if portfolio_value.is_nan() || portfolio_value <= 0.0 {
        return Err(CalcError::NonPositivePortfolioValue {
            value: portfolio_value,
        });
    }
    Ok(YieldPercentages {
        option_yield_pct: option_income / portfolio_value * 100.0,
        dividend_yield_pct: dividend_income / portfolio_value * 100.0,
    })
}

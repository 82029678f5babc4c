use super::calculator::{
    dividend_income, ensure_priced, lot_count, option_income, whole_shares_for,
};
use super::types::{CalcError, Inputs, Projection, ProjectionMonth};

pub const PROJECTION_MONTHS: u32 = 12;

/// Reinvests each month's income into whole shares at the initial price.
///
/// Contracts are recounted every month on the grown position, so option
/// income steps up only once the share count reaches the next multiple of
/// 100. Unlike `calculate_income`, each month's income includes the monthly
/// contribution. A non-positive price fails the whole projection.
pub fn run_projection(inputs: &Inputs) -> Result<Projection, CalcError> {
    ensure_priced(inputs.share_price)?;

    let mut shares = inputs.share_count;
    let mut months = Vec::with_capacity(PROJECTION_MONTHS as usize);
    for month in 1..=PROJECTION_MONTHS {
        let point = simulate_month(inputs, month, shares)?;
        shares = point.share_count;
        months.push(point);
    }

    Ok(Projection {
        initial_share_count: inputs.share_count,
        months,
    })
}

fn simulate_month(
    inputs: &Inputs,
    month: u32,
    shares_at_start: i64,
) -> Result<ProjectionMonth, CalcError> {
    let lots = lot_count(shares_at_start);
    let option = option_income(lots, inputs.option_premium);
    let dividend = dividend_income(shares_at_start, inputs.monthly_dividend);
    let month_income = option + dividend + inputs.monthly_contribution;
    let new_shares = whole_shares_for(month_income, inputs.share_price)?;

    Ok(ProjectionMonth {
        month,
        lot_count: lots,
        option_income: option,
        dividend_income: dividend,
        contribution: inputs.monthly_contribution,
        month_income,
        new_shares,
        share_count: shares_at_start.saturating_add(new_shares),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calculate_income;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_inputs() -> Inputs {
        Inputs::default()
    }

    fn staircase_inputs() -> Inputs {
        Inputs {
            share_count: 90,
            share_price: 10.0,
            option_premium: 1.0,
            monthly_dividend: 0.5,
            monthly_contribution: 0.0,
            ..sample_inputs()
        }
    }

    #[test]
    fn projection_has_fixed_twelve_month_horizon() {
        let projection = run_projection(&sample_inputs()).expect("positive price");
        assert_eq!(projection.months().len(), 12);
        assert_eq!(projection.positions().len(), 12);
        assert_eq!(projection.incomes().len(), 12);
        let numbers = projection.months().iter().map(|m| m.month).collect::<Vec<_>>();
        assert_eq!(numbers, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn first_month_matches_one_step_calculator_without_contribution() {
        let inputs = sample_inputs();
        let projection = run_projection(&inputs).expect("positive price");
        let snapshot = calculate_income(&inputs);

        assert_approx(projection.incomes()[0], 1529.2);
        assert_approx(projection.incomes()[0], snapshot.total_income);
        assert_eq!(projection.positions()[0], 2504);
        assert_eq!(
            projection.positions()[0],
            snapshot.reinvestment.expect("priced").final_share_count
        );
    }

    #[test]
    fn second_month_reinvests_on_grown_position() {
        let projection = run_projection(&sample_inputs()).expect("positive price");
        let second = projection.months()[1];

        // 2504 shares -> 25 contracts; 25 * 0.10 * 100 = 250
        // 2504 * 0.56 = 1402.24; floor(1652.24 / 8.28) = floor(199.54...) = 199
        assert_eq!(second.lot_count, 25);
        assert_approx(second.option_income, 250.0);
        assert_approx(second.dividend_income, 1402.24);
        assert_approx(second.month_income, 1652.24);
        assert_eq!(second.new_shares, 199);
        assert_eq!(second.share_count, 2703);
    }

    #[test]
    fn option_income_steps_up_only_after_crossing_a_contract_boundary() {
        let projection = run_projection(&staircase_inputs()).expect("positive price");
        let months = projection.months();

        // 90 -> 94 -> 98 -> 102: boundary crossed at the end of month 3
        assert_eq!(projection.positions()[..3], [94, 98, 102]);
        for month in &months[..3] {
            assert_eq!(month.lot_count, 0);
            assert_approx(month.option_income, 0.0);
        }
        assert_eq!(months[3].lot_count, 1);
        assert_approx(months[3].option_income, 100.0);
        assert_approx(months[3].month_income, 151.0);
        assert_eq!(months[3].share_count, 117);
    }

    #[test]
    fn lot_count_tracks_shares_at_start_of_each_month() {
        let inputs = staircase_inputs();
        let projection = run_projection(&inputs).expect("positive price");

        let mut shares_at_start = inputs.share_count;
        for month in projection.months() {
            assert_eq!(month.lot_count, shares_at_start.div_euclid(100));
            assert_approx(
                month.option_income,
                month.lot_count as f64 * inputs.option_premium * 100.0,
            );
            shares_at_start = month.share_count;
        }
    }

    #[test]
    fn odd_lot_position_earns_no_premium_until_reinvestment_reaches_one_contract() {
        let inputs = Inputs {
            share_count: 50,
            share_price: 10.0,
            option_premium: 0.5,
            monthly_dividend: 0.2,
            monthly_contribution: 0.0,
            ..sample_inputs()
        };
        let projection = run_projection(&inputs).expect("positive price");

        // 50 * 0.2 = 10 buys one share a month; never reaches 100 in a year
        assert_eq!(projection.final_share_count(), 62);
        for month in projection.months() {
            assert_approx(month.option_income, 0.0);
        }
    }

    #[test]
    fn incomes_include_monthly_contribution() {
        let inputs = Inputs {
            share_count: 0,
            share_price: 10.0,
            option_premium: 0.0,
            monthly_dividend: 0.0,
            monthly_contribution: 100.0,
            ..sample_inputs()
        };
        let projection = run_projection(&inputs).expect("positive price");

        assert!(projection.incomes().iter().all(|&income| income == 100.0));
        assert_eq!(
            projection.positions(),
            (1..=12).map(|m| m * 10).collect::<Vec<i64>>()
        );
    }

    #[test]
    fn contribution_separates_projection_income_from_calculator_total() {
        let mut inputs = sample_inputs();
        inputs.monthly_contribution = 250.0;

        let projection = run_projection(&inputs).expect("positive price");
        let snapshot = calculate_income(&inputs);
        assert_approx(projection.incomes()[0], snapshot.total_income + 250.0);
        assert_eq!(
            projection.positions()[0],
            snapshot.reinvestment.expect("priced").final_share_count
        );
    }

    #[test]
    fn price_stays_fixed_across_the_horizon() {
        let inputs = Inputs {
            share_count: 1000,
            share_price: 20.0,
            option_premium: 0.0,
            monthly_dividend: 0.1,
            monthly_contribution: 0.0,
            ..sample_inputs()
        };
        let projection = run_projection(&inputs).expect("positive price");
        for month in projection.months() {
            let shares_at_start = month.share_count - month.new_shares;
            assert_eq!(
                month.new_shares,
                (shares_at_start as f64 * 0.1 / 20.0).floor() as i64
            );
        }
    }

    #[test]
    fn zero_price_fails_whole_projection() {
        let mut inputs = sample_inputs();
        inputs.share_price = 0.0;
        assert_eq!(
            run_projection(&inputs),
            Err(CalcError::NonPositivePrice { price: 0.0 })
        );
    }

    #[test]
    fn negative_income_sells_down_the_position() {
        let inputs = Inputs {
            share_count: 100,
            share_price: 10.0,
            option_premium: 0.0,
            monthly_dividend: 0.0,
            monthly_contribution: -25.0,
            ..sample_inputs()
        };
        let projection = run_projection(&inputs).expect("positive price");
        // floor(-2.5) = -3 each month
        assert_eq!(projection.months()[0].new_shares, -3);
        assert_eq!(projection.final_share_count(), 100 - 36);
    }

    #[test]
    fn projection_saturates_huge_positions_instead_of_overflowing() {
        let inputs = Inputs {
            share_count: 5_000_000_000_000_000_000,
            share_price: 1.0,
            option_premium: 0.0,
            monthly_dividend: 1.0,
            monthly_contribution: 0.0,
            ..sample_inputs()
        };
        let projection = run_projection(&inputs).expect("positive price");
        assert_eq!(projection.positions()[0], i64::MAX);
        assert_eq!(projection.final_share_count(), i64::MAX);
    }

    #[test]
    fn into_months_hands_over_the_rows() {
        let projection = run_projection(&sample_inputs()).expect("positive price");
        let positions = projection.positions();
        let months = projection.into_months();
        assert_eq!(months.len(), 12);
        assert_eq!(
            months.iter().map(|m| m.share_count).collect::<Vec<_>>(),
            positions
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_positions_never_decrease_with_non_negative_income(
            share_count in 0i64..100_000,
            price_cents in 1u32..50_000,
            premium_cents in 0u32..300,
            dividend_cents in 0u32..300,
            contribution in 0u32..5_000
        ) {
            let inputs = Inputs {
                share_count,
                share_price: price_cents as f64 / 100.0,
                option_premium: premium_cents as f64 / 100.0,
                monthly_dividend: dividend_cents as f64 / 100.0,
                monthly_contribution: contribution as f64,
                ..sample_inputs()
            };
            let projection = run_projection(&inputs).expect("positive price");
            let positions = projection.positions();

            prop_assert_eq!(positions.len(), PROJECTION_MONTHS as usize);
            prop_assert!(positions[0] >= share_count);
            for pair in positions.windows(2) {
                prop_assert!(pair[1] >= pair[0]);
            }
            prop_assert!(projection.final_share_count() >= share_count);
        }

        #[test]
        fn prop_projection_is_deterministic(
            share_count in 0i64..100_000,
            price_cents in 1u32..50_000,
            dividend_cents in 0u32..300
        ) {
            let inputs = Inputs {
                share_count,
                share_price: price_cents as f64 / 100.0,
                monthly_dividend: dividend_cents as f64 / 100.0,
                ..sample_inputs()
            };
            prop_assert_eq!(run_projection(&inputs), run_projection(&inputs));
        }
    }
}

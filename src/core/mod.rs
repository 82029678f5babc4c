mod calculator;
mod engine;
mod types;

pub use calculator::calculate_income;
pub use engine::{PROJECTION_MONTHS, run_projection};
pub use types::{
    CalcError, IncomeSnapshot, Inputs, Projection, ProjectionMonth, Reinvestment,
    YieldPercentages,
};

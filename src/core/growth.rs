use serde::Serialize;

use super::types::GrowthPoint;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthParams {
    pub monthly_contribution: f64,
    /// Fraction of each contribution routed to the investment track.
    pub split_ratio: f64,
    pub investment_rate: f64,
    pub bank_rate: f64,
    pub horizon_years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthSummary {
    pub final_investment: f64,
    pub final_bank: f64,
    pub total_contributed: f64,
    pub investment_growth: f64,
    pub bank_growth: f64,
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

fn clamp_split(ratio: f64) -> f64 {
    if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Balance of the investment and bank tracks at the start of each year, from an empty year 0
/// through `horizon_years`.
///
/// Each year's contributions land at the start of the year and compound once.
pub fn simulate_growth(params: &GrowthParams) -> Vec<GrowthPoint> {
    let monthly = non_negative(params.monthly_contribution);
    let split = clamp_split(params.split_ratio);
    let investment_rate = non_negative(params.investment_rate);
    let bank_rate = non_negative(params.bank_rate);

    let annual_investment = monthly * split * 12.0;
    let annual_bank = monthly * (1.0 - split) * 12.0;

    let mut investment = 0.0;
    let mut bank = 0.0;
    let mut points = Vec::with_capacity(params.horizon_years as usize + 1);
    for year in 0..=params.horizon_years {
        points.push(GrowthPoint {
            year,
            investment,
            bank,
        });
        investment = (investment + annual_investment) * (1.0 + investment_rate);
        bank = (bank + annual_bank) * (1.0 + bank_rate);
    }
    points
}

pub fn summarize_growth(params: &GrowthParams, points: &[GrowthPoint]) -> GrowthSummary {
    let last = points.last().copied().unwrap_or(GrowthPoint {
        year: 0,
        investment: 0.0,
        bank: 0.0,
    });
    let monthly = non_negative(params.monthly_contribution);
    let split = clamp_split(params.split_ratio);
    let years = last.year as f64;
    let invested = monthly * split * 12.0 * years;
    let banked = monthly * (1.0 - split) * 12.0 * years;

    GrowthSummary {
        final_investment: last.investment,
        final_bank: last.bank,
        total_contributed: invested + banked,
        investment_growth: last.investment - invested,
        bank_growth: last.bank - banked,
    }
}

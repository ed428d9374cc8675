use super::types::TaxBreakdown;

pub const STANDARD_DEDUCTION: f64 = 14_600.0;
pub const FICA_RATE: f64 = 0.0765;

#[derive(Debug, Clone, Copy)]
struct Bracket {
    floor: f64,
    rate: f64,
    tax_at_floor: f64,
}

/// Single-filer federal brackets on taxable income, lowest first.
const FEDERAL_BRACKETS: [Bracket; 7] = [
    Bracket {
        floor: 0.0,
        rate: 0.10,
        tax_at_floor: 0.0,
    },
    Bracket {
        floor: 11_600.0,
        rate: 0.12,
        tax_at_floor: 1_160.0,
    },
    Bracket {
        floor: 47_150.0,
        rate: 0.22,
        tax_at_floor: 5_426.0,
    },
    Bracket {
        floor: 100_525.0,
        rate: 0.24,
        tax_at_floor: 17_168.5,
    },
    Bracket {
        floor: 191_950.0,
        rate: 0.32,
        tax_at_floor: 39_110.5,
    },
    Bracket {
        floor: 243_725.0,
        rate: 0.35,
        tax_at_floor: 55_678.5,
    },
    Bracket {
        floor: 609_350.0,
        rate: 0.37,
        tax_at_floor: 183_647.25,
    },
];

fn clamp_non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

pub fn taxable_income(annual_income: f64) -> f64 {
    (clamp_non_negative(annual_income) - STANDARD_DEDUCTION).max(0.0)
}

fn bracket_for(taxable: f64) -> &'static Bracket {
    FEDERAL_BRACKETS
        .iter()
        .rev()
        .find(|bracket| bracket.floor <= taxable)
        .unwrap_or(&FEDERAL_BRACKETS[0])
}

fn federal_tax(taxable: f64) -> f64 {
    let bracket = bracket_for(taxable);
    bracket.tax_at_floor + (taxable - bracket.floor) * bracket.rate
}

/// Federal, state and payroll tax for one year of gross income.
///
/// The bracket table is the single-filer schedule regardless of filing status.
pub fn estimate_tax(annual_income: f64, state_base_rate: f64) -> TaxBreakdown {
    let gross = clamp_non_negative(annual_income);
    let taxable = taxable_income(gross);

    let federal = federal_tax(taxable);
    let fica = gross * FICA_RATE;
    let state = (taxable * clamp_non_negative(state_base_rate)).max(0.0);

    TaxBreakdown {
        federal,
        state,
        fica,
        total: federal + state + fica,
    }
}

/// Federal rate applied to the last dollar of income.
pub fn marginal_rate(annual_income: f64) -> f64 {
    let taxable = taxable_income(annual_income);
    if taxable <= 0.0 {
        return 0.0;
    }
    bracket_for(taxable).rate
}

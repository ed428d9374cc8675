use thiserror::Error;

use super::types::{AmortizationResult, BalancePoint};

pub const DEFAULT_MAX_MONTHS: u32 = 720;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MortgageParams {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub monthly_payment: f64,
    pub extra_principal: f64,
    pub max_months: u32,
}

impl MortgageParams {
    pub fn new(
        principal: f64,
        annual_rate_percent: f64,
        monthly_payment: f64,
        extra_principal: f64,
    ) -> Self {
        Self {
            principal,
            annual_rate_percent,
            monthly_payment,
            extra_principal,
            max_months: DEFAULT_MAX_MONTHS,
        }
    }
}

/// Why a payment schedule can never retire the loan.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Infeasible {
    #[error("interest rate must be greater than zero")]
    NonPositiveRate,
    #[error(
        "monthly payment {payment:.2} does not exceed the interest-only payment {interest_only_payment:.2}"
    )]
    PaymentBelowInterest {
        payment: f64,
        interest_only_payment: f64,
    },
}

#[derive(Debug)]
struct Schedule {
    balance: f64,
    payment: f64,
    total_interest: f64,
    months: u32,
}

impl Schedule {
    fn new(balance: f64, payment: f64) -> Self {
        Self {
            balance,
            payment,
            total_interest: 0.0,
            months: 0,
        }
    }

    fn paid_off(&self) -> bool {
        self.balance <= 0.0
    }

    fn step(&mut self, monthly_rate: f64) {
        if self.paid_off() {
            return;
        }
        let interest = self.balance * monthly_rate;
        let principal_paid = (self.payment - interest).min(self.balance);
        self.balance -= principal_paid;
        self.total_interest += interest;
        self.months += 1;
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Runs the standard and extra-principal schedules side by side, month by month.
///
/// Balances are sampled every 12 months starting at month 0. Both schedules stop at
/// `max_months` even if a balance remains.
pub fn simulate_amortization(params: &MortgageParams) -> Result<AmortizationResult, Infeasible> {
    let principal = non_negative(params.principal);
    let monthly_rate = params.annual_rate_percent / 100.0 / 12.0;
    if monthly_rate.is_nan() || monthly_rate <= 0.0 {
        return Err(Infeasible::NonPositiveRate);
    }

    let interest_only_payment = principal * monthly_rate;
    if params.monthly_payment.is_nan() || params.monthly_payment <= interest_only_payment {
        return Err(Infeasible::PaymentBelowInterest {
            payment: params.monthly_payment,
            interest_only_payment,
        });
    }

    let mut standard = Schedule::new(principal, params.monthly_payment);
    let mut accelerated = Schedule::new(
        principal,
        params.monthly_payment + non_negative(params.extra_principal),
    );

    let mut balance_series = vec![BalancePoint {
        year: 0,
        standard: principal,
        accelerated: principal,
    }];

    for month in 1..=params.max_months {
        standard.step(monthly_rate);
        accelerated.step(monthly_rate);

        if month % 12 == 0 {
            balance_series.push(BalancePoint {
                year: month / 12,
                standard: standard.balance.max(0.0),
                accelerated: accelerated.balance.max(0.0),
            });
        }

        if standard.paid_off() && accelerated.paid_off() {
            break;
        }
    }

    Ok(AmortizationResult {
        interest_saved: standard.total_interest - accelerated.total_interest,
        time_saved_months: standard.months.saturating_sub(accelerated.months),
        standard_payoff_months: standard.months,
        accelerated_payoff_months: accelerated.months,
        standard_payoff_years: standard.months as f64 / 12.0,
        accelerated_payoff_years: accelerated.months as f64 / 12.0,
        standard_total_interest: standard.total_interest,
        accelerated_total_interest: accelerated.total_interest,
        balance_series,
    })
}

/// Level monthly payment that retires `principal` over `term_years`.
pub fn standard_payment(principal: f64, annual_rate_percent: f64, term_years: u32) -> f64 {
    let principal = non_negative(principal);
    let months = term_years.saturating_mul(12);
    if months == 0 {
        return principal;
    }
    let monthly_rate = annual_rate_percent / 100.0 / 12.0;
    if monthly_rate.is_nan() || monthly_rate <= 0.0 {
        return principal / months as f64;
    }
    principal * monthly_rate / (1.0 - (1.0 + monthly_rate).powf(-f64::from(months)))
}

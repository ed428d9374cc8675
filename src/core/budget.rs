use serde::Serialize;

use super::allocation::{AllocationTemplate, RebalancePolicy, rebalance};
use super::tax::{estimate_tax, marginal_rate};
use super::types::{AllocationSet, Category, FinancialProfile, TaxBreakdown};

/// Everything derived from a profile: taxes, take-home pay and the monthly plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSnapshot {
    pub profile: FinancialProfile,
    pub tax: TaxBreakdown,
    pub effective_tax_rate: f64,
    pub marginal_tax_rate: f64,
    pub net_annual: f64,
    pub net_monthly: f64,
    pub allocations: AllocationSet,
}

impl BudgetSnapshot {
    /// Builds a fresh snapshot; any previous allocation edits are discarded.
    pub fn from_profile(profile: &FinancialProfile, template: &AllocationTemplate) -> Self {
        let income = if profile.annual_income.is_finite() {
            profile.annual_income.max(0.0)
        } else {
            0.0
        };
        let profile = FinancialProfile {
            annual_income: income,
            ..*profile
        };
        let tax = estimate_tax(income, profile.state.base_rate());
        let net_annual = tax.net_annual(income).max(0.0);
        let net_monthly = net_annual / 12.0;

        Self {
            profile,
            tax,
            effective_tax_rate: tax.effective_rate(income),
            marginal_tax_rate: marginal_rate(income),
            net_annual,
            net_monthly,
            allocations: template.apply(net_monthly),
        }
    }

    pub fn rebalance(self, category: Category, value: f64, policy: &RebalancePolicy) -> Self {
        let allocations = rebalance(&self.allocations, category, value, self.net_monthly, policy);
        Self {
            allocations,
            ..self
        }
    }
}

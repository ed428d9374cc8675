mod allocation;
mod budget;
mod growth;
mod mortgage;
mod tax;
mod types;

pub use allocation::{ALLOCATION_EPSILON, AllocationTemplate, RebalancePolicy, rebalance};
pub use budget::BudgetSnapshot;
pub use growth::{GrowthParams, GrowthSummary, simulate_growth, summarize_growth};
pub use mortgage::{
    DEFAULT_MAX_MONTHS, Infeasible, MortgageParams, simulate_amortization, standard_payment,
};
pub use tax::{FICA_RATE, STANDARD_DEDUCTION, estimate_tax, marginal_rate, taxable_income};
pub use types::{
    AllocationSet, AmortizationResult, BalancePoint, Category, FilingStatus, FinancialProfile,
    GrowthPoint, StateCode, TaxBreakdown,
};

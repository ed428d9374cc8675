use tracing::debug;

use super::types::{AllocationSet, Category};

pub const ALLOCATION_EPSILON: f64 = 0.001;

/// Share of net monthly income assigned to each category when a budget is reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationTemplate {
    pub housing: f64,
    pub food: f64,
    pub general: f64,
}

impl Default for AllocationTemplate {
    fn default() -> Self {
        Self {
            housing: 0.35,
            food: 0.15,
            general: 0.20,
        }
    }
}

impl AllocationTemplate {
    /// Savings receives whatever the other shares leave, so the set always sums to `net_monthly`.
    pub fn savings(&self) -> f64 {
        1.0 - self.housing - self.food - self.general
    }

    pub fn apply(&self, net_monthly: f64) -> AllocationSet {
        let net = if net_monthly.is_finite() {
            net_monthly.max(0.0)
        } else {
            0.0
        };
        let housing = net * self.housing;
        let food = net * self.food;
        let general = net * self.general;
        AllocationSet {
            housing,
            food,
            general,
            savings: net - housing - food - general,
        }
    }
}

/// Priority lists that decide where money comes from and goes to during a rebalance.
#[derive(Debug, Clone, PartialEq)]
pub struct RebalancePolicy {
    pub donor_order: Vec<Category>,
    pub recipient_order: Vec<Category>,
    pub absorber: Category,
    pub epsilon: f64,
}

impl Default for RebalancePolicy {
    fn default() -> Self {
        Self {
            donor_order: vec![
                Category::Savings,
                Category::General,
                Category::Food,
                Category::Housing,
            ],
            recipient_order: vec![Category::Savings, Category::General],
            absorber: Category::Savings,
            epsilon: ALLOCATION_EPSILON,
        }
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Sets `edited` to `new_value` and moves the difference between the other categories so the
/// set keeps summing to `total_budget`.
pub fn rebalance(
    current: &AllocationSet,
    edited: Category,
    new_value: f64,
    total_budget: f64,
    policy: &RebalancePolicy,
) -> AllocationSet {
    if !total_budget.is_finite() || total_budget <= 0.0 {
        return *current;
    }

    let safe_value = if new_value.is_nan() {
        0.0
    } else {
        new_value.clamp(0.0, total_budget)
    };
    let delta = safe_value - current[edited];
    if delta.abs() < policy.epsilon {
        return *current;
    }

    let mut next = *current;
    for category in Category::ALL {
        next[category] = sanitize(next[category]);
    }

    if delta > 0.0 {
        let mut remaining = delta;
        for &donor in policy.donor_order.iter().filter(|&&c| c != edited) {
            if remaining < policy.epsilon {
                break;
            }
            let taken = next[donor].min(remaining);
            next[donor] -= taken;
            remaining -= taken;
        }
        if remaining >= policy.epsilon {
            debug!(
                category = %edited,
                uncovered = remaining,
                "donor categories exhausted before covering increase"
            );
        }
    } else if let Some(&target) = policy.recipient_order.iter().find(|&&c| c != edited) {
        next[target] += -delta;
    }

    next[edited] = safe_value;
    restore_total(&mut next, total_budget, policy);
    next
}

/// Pushes any drift from `total_budget` into the absorber category.
fn restore_total(set: &mut AllocationSet, total_budget: f64, policy: &RebalancePolicy) {
    let drift = total_budget - set.total();
    if drift.abs() <= policy.epsilon {
        return;
    }

    let absorbed = set[policy.absorber] + drift;
    if absorbed >= 0.0 {
        set[policy.absorber] = absorbed;
        return;
    }

    // Only reachable when the incoming set already exceeded the budget.
    set[policy.absorber] = 0.0;
    let mut shortfall = -absorbed;
    let fallback = policy
        .donor_order
        .iter()
        .copied()
        .chain(Category::ALL)
        .filter(|&c| c != policy.absorber);
    for donor in fallback {
        if shortfall <= 0.0 {
            break;
        }
        let taken = set[donor].min(shortfall);
        set[donor] -= taken;
        shortfall -= taken;
    }
}

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilingStatus {
    #[default]
    Single,
    Married,
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StateCode {
    AL,
    AK,
    AZ,
    AR,
    CA,
    CO,
    CT,
    DE,
    DC,
    FL,
    GA,
    HI,
    ID,
    IL,
    IN,
    IA,
    KS,
    KY,
    LA,
    ME,
    MD,
    MA,
    MI,
    MN,
    MS,
    MO,
    MT,
    NE,
    NV,
    NH,
    NJ,
    NM,
    NY,
    NC,
    ND,
    OH,
    OK,
    OR,
    PA,
    RI,
    SC,
    SD,
    TN,
    TX,
    UT,
    VT,
    VA,
    WA,
    WV,
    WI,
    WY,
}

/// Postal code, display name and flat income tax approximation for each state.
const STATE_TABLE: [(StateCode, &str, &str, f64); 51] = [
    (StateCode::AL, "AL", "Alabama", 0.05),
    (StateCode::AK, "AK", "Alaska", 0.0),
    (StateCode::AZ, "AZ", "Arizona", 0.025),
    (StateCode::AR, "AR", "Arkansas", 0.044),
    (StateCode::CA, "CA", "California", 0.093),
    (StateCode::CO, "CO", "Colorado", 0.044),
    (StateCode::CT, "CT", "Connecticut", 0.05),
    (StateCode::DE, "DE", "Delaware", 0.055),
    (StateCode::DC, "DC", "District of Columbia", 0.065),
    (StateCode::FL, "FL", "Florida", 0.0),
    (StateCode::GA, "GA", "Georgia", 0.0539),
    (StateCode::HI, "HI", "Hawaii", 0.0725),
    (StateCode::ID, "ID", "Idaho", 0.058),
    (StateCode::IL, "IL", "Illinois", 0.0495),
    (StateCode::IN, "IN", "Indiana", 0.0305),
    (StateCode::IA, "IA", "Iowa", 0.057),
    (StateCode::KS, "KS", "Kansas", 0.057),
    (StateCode::KY, "KY", "Kentucky", 0.04),
    (StateCode::LA, "LA", "Louisiana", 0.0425),
    (StateCode::ME, "ME", "Maine", 0.0675),
    (StateCode::MD, "MD", "Maryland", 0.0475),
    (StateCode::MA, "MA", "Massachusetts", 0.05),
    (StateCode::MI, "MI", "Michigan", 0.0425),
    (StateCode::MN, "MN", "Minnesota", 0.068),
    (StateCode::MS, "MS", "Mississippi", 0.047),
    (StateCode::MO, "MO", "Missouri", 0.048),
    (StateCode::MT, "MT", "Montana", 0.059),
    (StateCode::NE, "NE", "Nebraska", 0.0584),
    (StateCode::NV, "NV", "Nevada", 0.0),
    (StateCode::NH, "NH", "New Hampshire", 0.0),
    (StateCode::NJ, "NJ", "New Jersey", 0.0637),
    (StateCode::NM, "NM", "New Mexico", 0.049),
    (StateCode::NY, "NY", "New York", 0.0685),
    (StateCode::NC, "NC", "North Carolina", 0.045),
    (StateCode::ND, "ND", "North Dakota", 0.0195),
    (StateCode::OH, "OH", "Ohio", 0.035),
    (StateCode::OK, "OK", "Oklahoma", 0.0475),
    (StateCode::OR, "OR", "Oregon", 0.0875),
    (StateCode::PA, "PA", "Pennsylvania", 0.0307),
    (StateCode::RI, "RI", "Rhode Island", 0.0475),
    (StateCode::SC, "SC", "South Carolina", 0.064),
    (StateCode::SD, "SD", "South Dakota", 0.0),
    (StateCode::TN, "TN", "Tennessee", 0.0),
    (StateCode::TX, "TX", "Texas", 0.0),
    (StateCode::UT, "UT", "Utah", 0.0465),
    (StateCode::VT, "VT", "Vermont", 0.066),
    (StateCode::VA, "VA", "Virginia", 0.0575),
    (StateCode::WA, "WA", "Washington", 0.0),
    (StateCode::WV, "WV", "West Virginia", 0.0512),
    (StateCode::WI, "WI", "Wisconsin", 0.053),
    (StateCode::WY, "WY", "Wyoming", 0.0),
];

impl StateCode {
    pub fn all() -> impl Iterator<Item = StateCode> {
        STATE_TABLE.iter().map(|row| row.0)
    }

    fn row(self) -> &'static (StateCode, &'static str, &'static str, f64) {
        // Table rows are in declaration order.
        &STATE_TABLE[self as usize]
    }

    pub fn code(self) -> &'static str {
        self.row().1
    }

    pub fn name(self) -> &'static str {
        self.row().2
    }

    /// Flat approximation of the state income tax rate, 0 for states without one.
    pub fn base_rate(self) -> f64 {
        self.row().3
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for StateCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        STATE_TABLE
            .iter()
            .find(|row| row.1.eq_ignore_ascii_case(trimmed) || row.2.eq_ignore_ascii_case(trimmed))
            .map(|row| row.0)
            .ok_or_else(|| format!("unknown state code '{trimmed}'"))
    }
}

impl TryFrom<String> for StateCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StateCode> for String {
    fn from(value: StateCode) -> Self {
        value.code().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProfile {
    pub annual_income: f64,
    pub state: StateCode,
    #[serde(default)]
    pub filing_status: FilingStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub federal: f64,
    pub state: f64,
    pub fica: f64,
    pub total: f64,
}

impl TaxBreakdown {
    pub fn net_annual(&self, annual_income: f64) -> f64 {
        annual_income.max(0.0) - self.total
    }

    pub fn effective_rate(&self, annual_income: f64) -> f64 {
        if annual_income > 0.0 {
            self.total / annual_income
        } else {
            0.0
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Housing,
    Food,
    General,
    Savings,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Housing,
        Category::Food,
        Category::General,
        Category::Savings,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Housing => "housing",
            Category::Food => "food",
            Category::General => "general",
            Category::Savings => "savings",
        };
        f.write_str(label)
    }
}

/// Monthly amount per spending category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSet {
    pub housing: f64,
    pub food: f64,
    pub general: f64,
    pub savings: f64,
}

impl AllocationSet {
    pub fn total(&self) -> f64 {
        self.housing + self.food + self.general + self.savings
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::ALL.into_iter().map(|category| (category, self[category]))
    }
}

impl Index<Category> for AllocationSet {
    type Output = f64;

    fn index(&self, category: Category) -> &f64 {
        match category {
            Category::Housing => &self.housing,
            Category::Food => &self.food,
            Category::General => &self.general,
            Category::Savings => &self.savings,
        }
    }
}

impl IndexMut<Category> for AllocationSet {
    fn index_mut(&mut self, category: Category) -> &mut f64 {
        match category {
            Category::Housing => &mut self.housing,
            Category::Food => &mut self.food,
            Category::General => &mut self.general,
            Category::Savings => &mut self.savings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPoint {
    pub year: u32,
    pub investment: f64,
    pub bank: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancePoint {
    pub year: u32,
    pub standard: f64,
    pub accelerated: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationResult {
    pub interest_saved: f64,
    pub time_saved_months: u32,
    pub standard_payoff_months: u32,
    pub accelerated_payoff_months: u32,
    pub standard_payoff_years: f64,
    pub accelerated_payoff_years: f64,
    pub standard_total_interest: f64,
    pub accelerated_total_interest: f64,
    pub balance_series: Vec<BalancePoint>,
}

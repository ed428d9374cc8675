use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::advisor::{
    Advice, AdviceRequest, AdviceSlot, AdvisoryClient, SlotOutcome, advise_or_placeholder,
};
use crate::config::Config;
use crate::core::{
    AllocationSet, AllocationTemplate, AmortizationResult, BudgetSnapshot, Category,
    DEFAULT_MAX_MONTHS, FilingStatus, FinancialProfile, GrowthParams, GrowthPoint, GrowthSummary,
    Infeasible, MortgageParams, RebalancePolicy, StateCode, estimate_tax, marginal_rate, rebalance,
    simulate_amortization, simulate_growth, standard_payment, summarize_growth, taxable_income,
};

const DEFAULT_INCOME: f64 = 60_000.0;
const DEFAULT_STATE: StateCode = StateCode::TX;
const DEFAULT_MONTHLY_CONTRIBUTION: f64 = 500.0;
const DEFAULT_SPLIT_RATIO: f64 = 0.7;
const DEFAULT_INVESTMENT_RATE: f64 = 7.0;
const DEFAULT_BANK_RATE: f64 = 2.0;
const DEFAULT_HORIZON_YEARS: u32 = 30;
const MAX_HORIZON_YEARS: u32 = 100;
const DEFAULT_PRINCIPAL: f64 = 300_000.0;
const DEFAULT_MORTGAGE_RATE: f64 = 6.5;
const DEFAULT_TERM_YEARS: u32 = 30;
const MAX_TERM_YEARS: u32 = 50;
const MAX_SIMULATED_MONTHS: u32 = 1_200;
const DEFAULT_DWELLING_TYPE: &str = "apartment";

#[derive(Debug, Error, PartialEq)]
enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        error_response(StatusCode::BAD_REQUEST, &self.to_string())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub advisor: Arc<dyn AdvisoryClient>,
    pub quick_advice: Arc<AdviceSlot>,
    pub template: AllocationTemplate,
    pub policy: Arc<RebalancePolicy>,
}

impl AppState {
    pub fn new(advisor: Arc<dyn AdvisoryClient>, quick_advice: AdviceSlot) -> Self {
        Self {
            advisor,
            quick_advice: Arc::new(quick_advice),
            template: AllocationTemplate::default(),
            policy: Arc::new(RebalancePolicy::default()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProfilePayload {
    income: Option<f64>,
    state: Option<StateCode>,
    filing_status: Option<FilingStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TaxPayload {
    income: Option<f64>,
    state: Option<StateCode>,
    state_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RebalancePayload {
    income: Option<f64>,
    state: Option<StateCode>,
    allocations: Option<AllocationSet>,
    category: Option<Category>,
    value: Option<f64>,
    total_budget: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GrowthPayload {
    monthly_contribution: Option<f64>,
    split_ratio: Option<f64>,
    investment_rate: Option<f64>,
    bank_rate: Option<f64>,
    horizon_years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MortgagePayload {
    principal: Option<f64>,
    annual_rate: Option<f64>,
    monthly_payment: Option<f64>,
    term_years: Option<u32>,
    extra_principal: Option<f64>,
    max_months: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct QuickAdvicePayload {
    income: Option<f64>,
    state: Option<StateCode>,
    allocations: Option<AllocationSet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HousingPayload {
    location: Option<String>,
    dwelling_type: Option<String>,
    monthly_budget: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaxResponse {
    federal: f64,
    state: f64,
    fica: f64,
    total: f64,
    taxable_income: f64,
    effective_rate: f64,
    marginal_rate: f64,
    net_annual: f64,
    net_monthly: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RebalanceResponse {
    allocations: AllocationSet,
    total_budget: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GrowthResponse {
    points: Vec<GrowthPoint>,
    summary: GrowthSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MortgageResponse {
    feasible: bool,
    monthly_payment: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interest_only_payment: Option<f64>,
    #[serde(flatten)]
    result: Option<AmortizationResult>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

struct RebalanceRequest {
    allocations: AllocationSet,
    category: Category,
    value: f64,
    total_budget: f64,
}

fn finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NotFinite { field })
    }
}

fn finite_allocations(set: AllocationSet) -> Result<AllocationSet, ValidationError> {
    for (_, value) in set.iter() {
        finite("allocations", value)?;
    }
    Ok(set)
}

fn profile_from_payload(payload: ProfilePayload) -> Result<FinancialProfile, ValidationError> {
    let income = finite("income", payload.income.unwrap_or(DEFAULT_INCOME))?;
    Ok(FinancialProfile {
        annual_income: income.max(0.0),
        state: payload.state.unwrap_or(DEFAULT_STATE),
        filing_status: payload.filing_status.unwrap_or_default(),
    })
}

fn tax_response_from_payload(payload: TaxPayload) -> Result<TaxResponse, ValidationError> {
    let income = finite("income", payload.income.unwrap_or(DEFAULT_INCOME))?.max(0.0);
    let state_rate = match payload.state_rate {
        Some(rate) => finite("stateRate", rate)? / 100.0,
        None => payload.state.unwrap_or(DEFAULT_STATE).base_rate(),
    };

    let tax = estimate_tax(income, state_rate);
    let net_annual = tax.net_annual(income).max(0.0);
    Ok(TaxResponse {
        federal: tax.federal,
        state: tax.state,
        fica: tax.fica,
        total: tax.total,
        taxable_income: taxable_income(income),
        effective_rate: tax.effective_rate(income),
        marginal_rate: marginal_rate(income),
        net_annual,
        net_monthly: net_annual / 12.0,
    })
}

fn rebalance_request_from_payload(
    payload: RebalancePayload,
    template: &AllocationTemplate,
) -> Result<RebalanceRequest, ValidationError> {
    let category = payload
        .category
        .ok_or(ValidationError::Missing { field: "category" })?;
    let value = finite(
        "value",
        payload
            .value
            .ok_or(ValidationError::Missing { field: "value" })?,
    )?;

    let snapshot = BudgetSnapshot::from_profile(
        &profile_from_payload(ProfilePayload {
            income: payload.income,
            state: payload.state,
            filing_status: None,
        })?,
        template,
    );
    let allocations = match payload.allocations {
        Some(set) => finite_allocations(set)?,
        None => snapshot.allocations,
    };
    let total_budget = match payload.total_budget {
        Some(total) => finite("totalBudget", total)?,
        None if payload.allocations.is_some() => allocations.total(),
        None => snapshot.net_monthly,
    };

    Ok(RebalanceRequest {
        allocations,
        category,
        value,
        total_budget,
    })
}

fn growth_params_from_payload(payload: GrowthPayload) -> Result<GrowthParams, ValidationError> {
    let monthly_contribution = finite(
        "monthlyContribution",
        payload
            .monthly_contribution
            .unwrap_or(DEFAULT_MONTHLY_CONTRIBUTION),
    )?;
    let split_ratio = finite(
        "splitRatio",
        payload.split_ratio.unwrap_or(DEFAULT_SPLIT_RATIO),
    )?;
    let investment_rate = finite(
        "investmentRate",
        payload.investment_rate.unwrap_or(DEFAULT_INVESTMENT_RATE),
    )?;
    let bank_rate = finite("bankRate", payload.bank_rate.unwrap_or(DEFAULT_BANK_RATE))?;

    Ok(GrowthParams {
        monthly_contribution,
        split_ratio,
        investment_rate: investment_rate / 100.0,
        bank_rate: bank_rate / 100.0,
        horizon_years: payload
            .horizon_years
            .unwrap_or(DEFAULT_HORIZON_YEARS)
            .clamp(1, MAX_HORIZON_YEARS),
    })
}

fn mortgage_params_from_payload(payload: MortgagePayload) -> Result<MortgageParams, ValidationError> {
    let principal = finite("principal", payload.principal.unwrap_or(DEFAULT_PRINCIPAL))?.max(0.0);
    let annual_rate = finite(
        "annualRate",
        payload.annual_rate.unwrap_or(DEFAULT_MORTGAGE_RATE),
    )?;
    let monthly_payment = match payload.monthly_payment {
        Some(payment) => finite("monthlyPayment", payment)?,
        None => standard_payment(
            principal,
            annual_rate,
            payload
                .term_years
                .unwrap_or(DEFAULT_TERM_YEARS)
                .clamp(1, MAX_TERM_YEARS),
        ),
    };
    let extra_principal = finite("extraPrincipal", payload.extra_principal.unwrap_or(0.0))?;

    Ok(MortgageParams {
        principal,
        annual_rate_percent: annual_rate,
        monthly_payment,
        extra_principal: extra_principal.max(0.0),
        max_months: payload
            .max_months
            .unwrap_or(DEFAULT_MAX_MONTHS)
            .clamp(1, MAX_SIMULATED_MONTHS),
    })
}

fn build_mortgage_response(
    params: &MortgageParams,
    outcome: Result<AmortizationResult, Infeasible>,
) -> MortgageResponse {
    match outcome {
        Ok(result) => MortgageResponse {
            feasible: true,
            monthly_payment: params.monthly_payment,
            reason: None,
            interest_only_payment: None,
            result: Some(result),
        },
        Err(infeasible) => {
            let interest_only_payment = match infeasible {
                Infeasible::PaymentBelowInterest {
                    interest_only_payment,
                    ..
                } => Some(interest_only_payment),
                Infeasible::NonPositiveRate => None,
            };
            MortgageResponse {
                feasible: false,
                monthly_payment: params.monthly_payment,
                reason: Some(infeasible.to_string()),
                interest_only_payment,
                result: None,
            }
        }
    }
}

fn quick_advice_request(
    payload: QuickAdvicePayload,
    template: &AllocationTemplate,
) -> Result<AdviceRequest, ValidationError> {
    let profile = profile_from_payload(ProfilePayload {
        income: payload.income,
        state: payload.state,
        filing_status: None,
    })?;
    let allocations = match payload.allocations {
        Some(set) => finite_allocations(set)?,
        None => BudgetSnapshot::from_profile(&profile, template).allocations,
    };
    Ok(AdviceRequest::Quick {
        income: profile.annual_income,
        state: profile.state,
        allocations,
    })
}

fn housing_advice_request(payload: HousingPayload) -> Result<AdviceRequest, ValidationError> {
    let location = payload
        .location
        .ok_or(ValidationError::Missing { field: "location" })?;
    if location.trim().is_empty() {
        return Err(ValidationError::Blank { field: "location" });
    }
    let monthly_budget = finite(
        "monthlyBudget",
        payload
            .monthly_budget
            .ok_or(ValidationError::Missing {
                field: "monthlyBudget",
            })?,
    )?;
    let dwelling_type = payload
        .dwelling_type
        .filter(|kind| !kind.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DWELLING_TYPE.to_string());

    Ok(AdviceRequest::Housing {
        location: location.trim().to_string(),
        dwelling_type: dwelling_type.trim().to_string(),
        monthly_budget: monthly_budget.max(0.0),
    })
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/budget", get(budget_get_handler).post(budget_post_handler))
        .route("/api/tax", get(tax_get_handler).post(tax_post_handler))
        .route("/api/rebalance", post(rebalance_handler))
        .route("/api/growth", get(growth_get_handler).post(growth_post_handler))
        .route(
            "/api/mortgage",
            get(mortgage_get_handler).post(mortgage_post_handler),
        )
        .route("/api/advice/quick", post(quick_advice_handler))
        .route("/api/advice/quick/latest", get(latest_quick_advice_handler))
        .route("/api/advice/overview", post(overview_advice_handler))
        .route("/api/advice/housing", post(housing_advice_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: &Config, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("Budget API listening on http://{}", config.listen_addr);

    axum::serve(listener, app_router(state)).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn budget_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<ProfilePayload>,
) -> Response {
    budget_handler_impl(&state, payload)
}

async fn budget_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<ProfilePayload>,
) -> Response {
    budget_handler_impl(&state, payload)
}

fn budget_handler_impl(state: &AppState, payload: ProfilePayload) -> Response {
    let profile = match profile_from_payload(payload) {
        Ok(profile) => profile,
        Err(err) => return err.into_response(),
    };
    debug!(income = profile.annual_income, state = %profile.state, "budget snapshot");
    json_response(
        StatusCode::OK,
        BudgetSnapshot::from_profile(&profile, &state.template),
    )
}

async fn tax_get_handler(Query(payload): Query<TaxPayload>) -> Response {
    tax_handler_impl(payload)
}

async fn tax_post_handler(Json(payload): Json<TaxPayload>) -> Response {
    tax_handler_impl(payload)
}

fn tax_handler_impl(payload: TaxPayload) -> Response {
    match tax_response_from_payload(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => err.into_response(),
    }
}

async fn rebalance_handler(
    State(state): State<AppState>,
    Json(payload): Json<RebalancePayload>,
) -> Response {
    let request = match rebalance_request_from_payload(payload, &state.template) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };
    let allocations = rebalance(
        &request.allocations,
        request.category,
        request.value,
        request.total_budget,
        &state.policy,
    );
    json_response(
        StatusCode::OK,
        RebalanceResponse {
            allocations,
            total_budget: request.total_budget,
        },
    )
}

async fn growth_get_handler(Query(payload): Query<GrowthPayload>) -> Response {
    growth_handler_impl(payload)
}

async fn growth_post_handler(Json(payload): Json<GrowthPayload>) -> Response {
    growth_handler_impl(payload)
}

fn growth_handler_impl(payload: GrowthPayload) -> Response {
    let params = match growth_params_from_payload(payload) {
        Ok(params) => params,
        Err(err) => return err.into_response(),
    };
    let points = simulate_growth(&params);
    let summary = summarize_growth(&params, &points);
    json_response(StatusCode::OK, GrowthResponse { points, summary })
}

async fn mortgage_get_handler(Query(payload): Query<MortgagePayload>) -> Response {
    mortgage_handler_impl(payload)
}

async fn mortgage_post_handler(Json(payload): Json<MortgagePayload>) -> Response {
    mortgage_handler_impl(payload)
}

fn mortgage_handler_impl(payload: MortgagePayload) -> Response {
    let params = match mortgage_params_from_payload(payload) {
        Ok(params) => params,
        Err(err) => return err.into_response(),
    };
    let outcome = simulate_amortization(&params);
    if let Err(infeasible) = &outcome {
        debug!(reason = %infeasible, "mortgage schedule infeasible");
    }
    json_response(StatusCode::OK, build_mortgage_response(&params, outcome))
}

async fn quick_advice_handler(
    State(state): State<AppState>,
    Json(payload): Json<QuickAdvicePayload>,
) -> Response {
    let request = match quick_advice_request(payload, &state.template) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };
    match state
        .quick_advice
        .submit(state.advisor.as_ref(), &request)
        .await
    {
        SlotOutcome::Delivered(advice) => json_response(StatusCode::OK, advice),
        SlotOutcome::Superseded => with_cache_control(StatusCode::NO_CONTENT),
    }
}

async fn latest_quick_advice_handler(State(state): State<AppState>) -> Response {
    match state.quick_advice.latest().await {
        Some(advice) => json_response(StatusCode::OK, advice),
        None => with_cache_control(StatusCode::NO_CONTENT),
    }
}

async fn overview_advice_handler(
    State(state): State<AppState>,
    Json(payload): Json<ProfilePayload>,
) -> Response {
    let profile = match profile_from_payload(payload) {
        Ok(profile) => profile,
        Err(err) => return err.into_response(),
    };
    let request = AdviceRequest::Overview {
        income: profile.annual_income,
        state: profile.state,
    };
    advice_response(&state, &request).await
}

async fn housing_advice_handler(
    State(state): State<AppState>,
    Json(payload): Json<HousingPayload>,
) -> Response {
    match housing_advice_request(payload) {
        Ok(request) => advice_response(&state, &request).await,
        Err(err) => err.into_response(),
    }
}

async fn advice_response(state: &AppState, request: &AdviceRequest) -> Response {
    let advice: Advice = advise_or_placeholder(state.advisor.as_ref(), request).await;
    json_response(StatusCode::OK, advice)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::advisor::testing::FakeClient;
    use crate::core::ALLOCATION_EPSILON;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn test_state(client: FakeClient) -> AppState {
        AppState::new(Arc::new(client), AdviceSlot::new(Duration::ZERO))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be json")
    }

    #[test]
    fn profile_payload_parses_web_keys_and_defaults() {
        let payload: ProfilePayload = serde_json::from_str(
            r#"{"income": 85000, "state": "ca", "filingStatus": "married"}"#,
        )
        .expect("json should parse");
        let profile = profile_from_payload(payload).expect("valid profile");
        assert_approx(profile.annual_income, 85_000.0);
        assert_eq!(profile.state, StateCode::CA);
        assert_eq!(profile.filing_status, FilingStatus::Married);

        let profile = profile_from_payload(ProfilePayload::default()).expect("valid profile");
        assert_approx(profile.annual_income, DEFAULT_INCOME);
        assert_eq!(profile.state, DEFAULT_STATE);
    }

    #[test]
    fn profile_payload_clamps_negative_income_and_rejects_nan() {
        let profile = profile_from_payload(ProfilePayload {
            income: Some(-20.0),
            ..Default::default()
        })
        .expect("valid profile");
        assert_eq!(profile.annual_income, 0.0);

        let err = profile_from_payload(ProfilePayload {
            income: Some(f64::NAN),
            ..Default::default()
        })
        .expect_err("must reject NaN");
        assert_eq!(err, ValidationError::NotFinite { field: "income" });
    }

    #[test]
    fn unknown_state_fails_to_parse() {
        let parsed = serde_json::from_str::<ProfilePayload>(r#"{"state": "ZZ"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn tax_state_rate_override_is_a_percentage() {
        let response = tax_response_from_payload(TaxPayload {
            income: Some(60_000.0),
            state: Some(StateCode::TX),
            state_rate: Some(5.0),
        })
        .expect("valid payload");
        assert_approx(response.state, 45_400.0 * 0.05);
        assert_approx(response.taxable_income, 45_400.0);
        assert_approx(response.marginal_rate, 0.12);
    }

    #[test]
    fn rebalance_requires_category_and_value() {
        let template = AllocationTemplate::default();
        let err = rebalance_request_from_payload(RebalancePayload::default(), &template)
            .err()
            .expect("must require category");
        assert_eq!(err, ValidationError::Missing { field: "category" });

        let err = rebalance_request_from_payload(
            RebalancePayload {
                category: Some(Category::Food),
                ..Default::default()
            },
            &template,
        )
        .err()
        .expect("must require value");
        assert_eq!(err, ValidationError::Missing { field: "value" });
    }

    #[test]
    fn rebalance_total_defaults_to_supplied_allocations() {
        let payload: RebalancePayload = serde_json::from_str(
            r#"{
              "allocations": {"housing": 1000, "food": 400, "general": 300, "savings": 300},
              "category": "housing",
              "value": 1200
            }"#,
        )
        .expect("json should parse");
        let request = rebalance_request_from_payload(payload, &AllocationTemplate::default())
            .expect("valid payload");
        assert_approx(request.total_budget, 2_000.0);
        assert_eq!(request.category, Category::Housing);
    }

    #[test]
    fn growth_payload_converts_percent_rates_and_clamps_horizon() {
        let params = growth_params_from_payload(GrowthPayload {
            investment_rate: Some(8.0),
            bank_rate: Some(1.5),
            horizon_years: Some(0),
            ..Default::default()
        })
        .expect("valid payload");
        assert_approx(params.investment_rate, 0.08);
        assert_approx(params.bank_rate, 0.015);
        assert_eq!(params.horizon_years, 1);
        assert_approx(params.split_ratio, DEFAULT_SPLIT_RATIO);

        let params = growth_params_from_payload(GrowthPayload {
            horizon_years: Some(500),
            ..Default::default()
        })
        .expect("valid payload");
        assert_eq!(params.horizon_years, MAX_HORIZON_YEARS);
    }

    #[test]
    fn mortgage_payment_defaults_to_level_payment_for_term() {
        let params = mortgage_params_from_payload(MortgagePayload::default()).expect("valid");
        assert!((params.monthly_payment - 1_896.204).abs() < 1e-3);
        assert_eq!(params.max_months, DEFAULT_MAX_MONTHS);

        let params = mortgage_params_from_payload(MortgagePayload {
            monthly_payment: Some(2_500.0),
            extra_principal: Some(-10.0),
            max_months: Some(10_000),
            ..Default::default()
        })
        .expect("valid");
        assert_approx(params.monthly_payment, 2_500.0);
        assert_approx(params.extra_principal, 0.0);
        assert_eq!(params.max_months, MAX_SIMULATED_MONTHS);
    }

    #[test]
    fn oversized_term_is_clamped_before_deriving_payment() {
        let params = mortgage_params_from_payload(MortgagePayload {
            term_years: Some(200_000_000),
            ..Default::default()
        })
        .expect("valid");
        assert_approx(
            params.monthly_payment,
            standard_payment(DEFAULT_PRINCIPAL, DEFAULT_MORTGAGE_RATE, MAX_TERM_YEARS),
        );
        assert!(params.monthly_payment > 1_625.0);
        let response = build_mortgage_response(&params, simulate_amortization(&params));
        assert!(response.feasible);

        let params = mortgage_params_from_payload(MortgagePayload {
            term_years: Some(0),
            ..Default::default()
        })
        .expect("valid");
        assert_approx(
            params.monthly_payment,
            standard_payment(DEFAULT_PRINCIPAL, DEFAULT_MORTGAGE_RATE, 1),
        );
    }

    #[test]
    fn infeasible_mortgage_serializes_reason_and_interest_only_payment() {
        let params = mortgage_params_from_payload(MortgagePayload {
            monthly_payment: Some(1_000.0),
            ..Default::default()
        })
        .expect("valid");
        let response = build_mortgage_response(&params, simulate_amortization(&params));
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["feasible"], false);
        assert!(json["reason"].as_str().expect("reason").contains("interest-only"));
        assert!((json["interestOnlyPayment"].as_f64().expect("number") - 1_625.0).abs() < 1e-6);
        assert!(json.get("balanceSeries").is_none());
    }

    #[test]
    fn feasible_mortgage_flattens_result_fields() {
        let params = mortgage_params_from_payload(MortgagePayload {
            monthly_payment: Some(2_500.0),
            extra_principal: Some(500.0),
            ..Default::default()
        })
        .expect("valid");
        let response = build_mortgage_response(&params, simulate_amortization(&params));
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["feasible"], true);
        assert_eq!(json["timeSavedMonths"], 50);
        assert!(json["balanceSeries"].is_array());
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn housing_request_requires_location_and_budget() {
        let err = housing_advice_request(HousingPayload::default()).expect_err("location");
        assert_eq!(err, ValidationError::Missing { field: "location" });

        let err = housing_advice_request(HousingPayload {
            location: Some("   ".to_string()),
            monthly_budget: Some(1_500.0),
            ..Default::default()
        })
        .expect_err("blank location");
        assert_eq!(err, ValidationError::Blank { field: "location" });

        let request = housing_advice_request(HousingPayload {
            location: Some(" Denver, CO ".to_string()),
            monthly_budget: Some(2_100.0),
            dwelling_type: None,
        })
        .expect("valid payload");
        assert_eq!(
            request,
            AdviceRequest::Housing {
                location: "Denver, CO".to_string(),
                dwelling_type: DEFAULT_DWELLING_TYPE.to_string(),
                monthly_budget: 2_100.0,
            }
        );
    }

    #[tokio::test]
    async fn budget_handler_returns_snapshot_with_no_store() {
        let state = test_state(FakeClient::new());
        let response = budget_post_handler(
            State(state),
            Json(ProfilePayload {
                income: Some(60_000.0),
                state: Some(StateCode::FL),
                filing_status: None,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let json = body_json(response).await;
        assert!((json["netMonthly"].as_f64().expect("number") - 50_194.0 / 12.0).abs() < 1e-6);
        assert_eq!(json["profile"]["state"], "FL");
        let allocations = &json["allocations"];
        let total: f64 = ["housing", "food", "general", "savings"]
            .iter()
            .map(|key| allocations[*key].as_f64().expect("number"))
            .sum();
        assert!((total - 50_194.0 / 12.0).abs() <= ALLOCATION_EPSILON);
    }

    #[tokio::test]
    async fn rebalance_handler_conserves_budget() {
        let state = test_state(FakeClient::new());
        let payload: RebalancePayload = serde_json::from_str(
            r#"{"income": 60000, "state": "TX", "category": "food", "value": 900}"#,
        )
        .expect("json should parse");
        let response = rebalance_handler(State(state), Json(payload)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let total_budget = json["totalBudget"].as_f64().expect("number");
        assert!((total_budget - 50_194.0 / 12.0).abs() < 1e-6);
        assert!((json["allocations"]["food"].as_f64().expect("number") - 900.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn validation_errors_become_bad_request() {
        let state = test_state(FakeClient::new());
        let response = rebalance_handler(State(state), Json(RebalancePayload::default())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "category is required");
    }

    #[tokio::test]
    async fn growth_handler_returns_points_and_summary() {
        let response = growth_get_handler(Query(GrowthPayload::default())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["points"].as_array().expect("array").len(), 31);
        assert!(json["summary"]["finalInvestment"].as_f64().expect("number") > 0.0);
    }

    #[tokio::test]
    async fn quick_advice_is_stored_as_latest() {
        let state = test_state(FakeClient::new());
        let response = latest_quick_advice_handler(State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = quick_advice_handler(
            State(state.clone()),
            Json(QuickAdvicePayload {
                income: Some(70_000.0),
                state: Some(StateCode::GA),
                allocations: None,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let delivered = body_json(response).await;
        assert!(delivered["narrative"].as_str().expect("text").contains("Georgia"));

        let response = latest_quick_advice_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, delivered);
    }

    #[tokio::test]
    async fn failing_advisor_serves_placeholder() {
        let state = test_state(FakeClient::failing());
        let response = overview_advice_handler(
            State(state),
            Json(ProfilePayload::default()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["degraded"], true);
        assert_eq!(json["narrative"], crate::advisor::PLACEHOLDER_NARRATIVE);
    }

    #[tokio::test]
    async fn unknown_routes_are_json_not_found() {
        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Not found");
    }
}

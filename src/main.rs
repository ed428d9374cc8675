use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use budgetwise::advisor::{AdviceSlot, GeminiClient};
use budgetwise::api::{AppState, run_http_server};
use budgetwise::config::Config;
use budgetwise::core::{
    AllocationTemplate, BudgetSnapshot, FinancialProfile, GrowthParams, MortgageParams, StateCode,
    simulate_amortization, simulate_growth, standard_payment, summarize_growth,
};
use budgetwise::logging::init_tracing;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "budgetwise", about = "Personal budget planning calculators")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long)]
        listen: Option<SocketAddr>,
    },
    /// Estimate taxes and the default monthly plan for an income.
    Tax {
        #[arg(long)]
        income: f64,
        #[arg(long, default_value = "TX")]
        state: StateCode,
    },
    /// Project a monthly contribution split between investments and a bank account.
    Growth {
        #[arg(long, default_value_t = 500.0)]
        monthly: f64,
        #[arg(long, default_value_t = 0.7)]
        split: f64,
        #[arg(long, default_value_t = 7.0)]
        investment_rate: f64,
        #[arg(long, default_value_t = 2.0)]
        bank_rate: f64,
        #[arg(long, default_value_t = 30)]
        years: u32,
    },
    /// Compare a mortgage payoff with and without extra principal.
    Mortgage {
        #[arg(long)]
        principal: f64,
        #[arg(long)]
        rate: f64,
        /// Defaults to the level payment for a 30 year term.
        #[arg(long)]
        payment: Option<f64>,
        #[arg(long, default_value_t = 0.0)]
        extra: f64,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    init_tracing(config.log_format);

    match cli.command {
        Command::Serve { listen } => {
            if let Some(addr) = listen {
                config.listen_addr = addr;
            }
            if config.gemini_api_key.is_none() {
                tracing::warn!("GEMINI_API_KEY is not set; advice endpoints will serve placeholders");
            }
            let advisor = GeminiClient::new(config.gemini_api_key.clone(), &config.gemini_model);
            let state = AppState::new(Arc::new(advisor), AdviceSlot::new(config.advice_debounce));
            run_http_server(&config, state)
                .await
                .context("HTTP server failed")?;
        }
        Command::Tax { income, state } => {
            let profile = FinancialProfile {
                annual_income: income,
                state,
                filing_status: Default::default(),
            };
            print_json(&BudgetSnapshot::from_profile(
                &profile,
                &AllocationTemplate::default(),
            ))?;
        }
        Command::Growth {
            monthly,
            split,
            investment_rate,
            bank_rate,
            years,
        } => {
            let params = GrowthParams {
                monthly_contribution: monthly,
                split_ratio: split,
                investment_rate: investment_rate / 100.0,
                bank_rate: bank_rate / 100.0,
                horizon_years: years,
            };
            let points = simulate_growth(&params);
            let summary = summarize_growth(&params, &points);
            print_json(&json!({ "points": points, "summary": summary }))?;
        }
        Command::Mortgage {
            principal,
            rate,
            payment,
            extra,
        } => {
            let payment = payment.unwrap_or_else(|| standard_payment(principal, rate, 30));
            let params = MortgageParams::new(principal, rate, payment, extra);
            let result = simulate_amortization(&params)
                .with_context(|| format!("payment {payment:.2} cannot retire the loan"))?;
            print_json(&result)?;
        }
    }

    Ok(())
}

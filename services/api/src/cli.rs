use crate::infra::{build_agents, Agents};
use crate::report::{banner, render_fundamental, render_pool, render_value_report};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use value_agent::config::AppConfig;
use value_agent::error::AppError;
use value_agent::telemetry;
use value_agent::workflows::fundamental::FundamentalRequest;

#[derive(Parser, Debug)]
#[command(
    name = "value-agent",
    about = "Value-investing analysis: rule scoring, factor screening and analyst blending",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run the four-dimension value analysis for one code or every sample company
    Analyze(AnalyzeArgs),
    /// Run the factor pipeline on a JSON request file
    Factors(FactorsArgs),
    /// Inspect or edit the observation pool
    Pool {
        #[command(subcommand)]
        command: PoolCommand,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Stock code such as 600519.SH; every sample company when omitted
    #[arg(long)]
    pub(crate) code: Option<String>,
    /// Try real-time quotes before the sample catalog
    #[arg(long)]
    pub(crate) real_time: bool,
    /// Question steering the analyst's focus
    #[arg(long)]
    pub(crate) question: Option<String>,
    /// Print the full report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct FactorsArgs {
    /// JSON file holding stock_code, company_name, factor_data and business_data
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Add the conclusion to the observation pool
    #[arg(long)]
    pub(crate) observe: bool,
    /// Print the analysis as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Subcommand, Debug)]
enum PoolCommand {
    /// List watched stocks
    List,
    /// Stop watching a stock
    Remove { code: String },
    /// Empty the pool
    Clear,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Analyze(args) => run_analyze(args, &console_agents()?).await,
        Command::Factors(args) => run_factors(args, &console_agents()?).await,
        Command::Pool { command } => run_pool(command, &console_agents()?),
    }
}

/// Console commands log to stderr so stdout carries only the report.
fn console_agents() -> Result<Agents, AppError> {
    let config = AppConfig::load()?;
    telemetry::init_for_console(&config.telemetry)?;
    build_agents(&config)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))
}

async fn run_analyze(args: AnalyzeArgs, agents: &Agents) -> Result<(), AppError> {
    let agent = &agents.value;
    let question = args.question.as_deref();

    let codes: Vec<String> = match &args.code {
        Some(code) => vec![code.clone()],
        None => agent.stocks().into_iter().map(|stock| stock.code).collect(),
    };
    let detailed = args.code.is_some();

    if !args.json {
        println!("{}", banner());
    }
    for code in codes {
        let report = agent.analyze_code(&code, question, args.real_time).await?;
        if args.json {
            println!("{}", to_json(&report)?);
        } else {
            println!("{}", render_value_report(&report, detailed));
        }
    }
    Ok(())
}

async fn run_factors(args: FactorsArgs, agents: &Agents) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.input)?;
    let request: FundamentalRequest = serde_json::from_str(&raw)
        .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))?;

    let agent = &agents.fundamental;
    let analysis = agent.analyze(request).await?;

    if args.json {
        println!("{}", to_json(&analysis)?);
    } else {
        println!("{}", render_fundamental(&analysis));
    }

    if args.observe {
        if agent.add_to_observation(&analysis) {
            println!("已加入观察池: {}", analysis.stock_code);
        } else {
            println!("观察池中已存在或写入失败: {}", analysis.stock_code);
        }
    }
    Ok(())
}

fn run_pool(command: PoolCommand, agents: &Agents) -> Result<(), AppError> {
    let agent = &agents.fundamental;
    match command {
        PoolCommand::List => println!("{}", render_pool(&agent.observations())),
        PoolCommand::Remove { code } => {
            if agent.remove_observation(&code) {
                println!("已移除: {code}");
            } else {
                println!("观察池中没有: {code}");
            }
        }
        PoolCommand::Clear => {
            if agent.clear_observations() {
                println!("观察池已清空");
            } else {
                println!("观察池清空失败");
            }
        }
    }
    Ok(())
}

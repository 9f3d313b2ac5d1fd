use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lucky::config::AppConfig;
use lucky::job::{DescribeBuilder, try_feeling_lucky_job};
use lucky::output;
use lucky::query::{self, SearchType, rules::BUILTIN_RULES};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lucky")]
#[command(about = "Feeling-lucky query expansion for code search")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to config.json in the app data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parse tree of a query as JSON
    Parse {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Print the basic queries a query plans to
    Plan {
        #[command(flatten)]
        query: QueryArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
        color: ColorMode,
    },
    /// Print the feeling-lucky job for a query
    Expand {
        #[command(flatten)]
        query: QueryArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
        color: ColorMode,
    },
    /// List built-in rules
    Rules,
}

#[derive(clap::Args)]
struct QueryArgs {
    /// Search query
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    query: Vec<String>,

    /// How to interpret bare patterns (literal or regex)
    #[arg(short = 't', long = "type")]
    search_type: Option<SearchType>,
}

impl QueryArgs {
    fn text(&self) -> String {
        self.query.join(" ")
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn enabled(self) -> bool {
        match self {
            ColorMode::Auto => std::io::stdout().is_terminal(),
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    match cli.command {
        Commands::Parse { query: args } => {
            let search_type = args.search_type.unwrap_or(config.default_search_type);
            let text = args.text();
            let nodes = query::parse(&text, search_type)
                .with_context(|| format!("Failed to parse query `{}`", text))?;
            print_json(&nodes)?;
        }
        Commands::Plan { query: args, json, color } => {
            let search_type = args.search_type.unwrap_or(config.default_search_type);
            let text = args.text();
            let plan = query::pipeline(&text, search_type)
                .with_context(|| format!("Failed to plan query `{}`", text))?;
            if json {
                print_json(&plan)?;
            } else {
                output::print_plan(&plan, color.enabled())?;
            }
        }
        Commands::Expand { query: args, json, color } => {
            let search_type = args.search_type.unwrap_or(config.default_search_type);
            let text = args.text();
            let plan = query::pipeline(&text, search_type)
                .with_context(|| format!("Failed to plan query `{}`", text))?;
            let rules = config.rule_set()?;
            let inputs = config.search_inputs(&text, search_type);

            let job = try_feeling_lucky_job(&DescribeBuilder, &inputs, &plan, &rules)
                .with_context(|| format!("Failed to expand query `{}`", text))?;
            if json {
                print_json(&job)?;
            } else {
                output::print_job_tree(&job, color.enabled())?;
            }
        }
        Commands::Rules => {
            for (name, description) in BUILTIN_RULES {
                let enabled = config
                    .rule_chains
                    .iter()
                    .any(|chain| chain.iter().any(|n| n == name));
                println!(
                    "{:<18} {:<10} {}",
                    name,
                    if enabled { "enabled" } else { "-" },
                    description
                );
            }
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("LUCKY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

pub mod auth;
pub mod context;
pub mod export;
pub mod generate;
pub mod plans;
pub mod schema;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lifeplan")]
#[command(
    author,
    version,
    about = "Turn your monthly numbers and habits into a plan, saved locally and in the cloud"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(
        short,
        long,
        global = true,
        default_value = "lifeplan.yaml",
        env = "LIFEPLAN_CONFIG"
    )]
    pub config: PathBuf,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a plan from your inputs and print it
    Generate(GenerateArgs),

    /// Generate a plan and save it
    Save(GenerateArgs),

    /// List saved plans, newest first
    List(ListArgs),

    /// Print one saved plan
    Show(PlanArgs),

    /// Pick a saved plan as the starting point of the next `generate`
    Load(PlanArgs),

    /// Delete a saved plan
    Delete(DeleteArgs),

    /// Export a saved plan as a paginated text document
    Export(ExportArgs),

    /// Sign in and pull your cloud plans
    Login(CredentialArgs),

    /// Create an account
    Signup(CredentialArgs),

    /// Sign out and forget this account's plans on this machine
    Logout,

    /// Show who is signed in and what is cached
    Status,

    /// Join the waitlist for the PRO version
    Waitlist(WaitlistArgs),

    /// Print JSON Schema for config validation
    Schema(SchemaArgs),
}

#[derive(Args, Clone, Default)]
pub struct GenerateArgs {
    /// Plan name (used when saving)
    #[arg(long)]
    pub name: Option<String>,

    /// Monthly income; anything non-numeric counts as 0
    #[arg(long, value_parser = parse_amount_arg)]
    pub ingresos: Option<f64>,

    /// Monthly expenses; anything non-numeric counts as 0
    #[arg(long, value_parser = parse_amount_arg)]
    pub gastos: Option<f64>,

    /// Main goal
    #[arg(long)]
    pub metas: Option<String>,

    /// When you have time available
    #[arg(long)]
    pub horario: Option<String>,

    /// Area to improve
    #[arg(long)]
    pub area: Option<String>,

    /// Perceived chaos: bajo|medio|alto (or low|medium|high)
    #[arg(long)]
    pub caos: Option<crate::template::ChaosLevel>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ListArgs {
    /// Every plan in the cloud, not just the recent ones
    #[arg(long)]
    pub all: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct PlanArgs {
    /// Plan id (a unique prefix is enough)
    pub id: String,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct DeleteArgs {
    /// Plan id (a unique prefix is enough)
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Clone)]
pub struct ExportArgs {
    /// Plan id (a unique prefix is enough)
    pub id: String,

    /// Directory to write the document into
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Args, Clone)]
pub struct CredentialArgs {
    #[arg(long)]
    pub email: String,

    /// Read from stdin when not given
    #[arg(long, env = "LIFEPLAN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Clone)]
pub struct WaitlistArgs {
    #[arg(long)]
    pub email: String,

    /// Where the sign-up came from
    #[arg(long, default_value = "cli")]
    pub source: String,
}

#[derive(Args, Clone)]
pub struct SchemaArgs {
    /// Write the schema to this file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

fn parse_amount_arg(raw: &str) -> Result<f64, String> {
    Ok(crate::template::parse_amount(raw))
}

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cache;
mod cli;
mod config;
mod error;
mod export;
mod plan;
mod session;
mod store;
mod sync;
mod template;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing - only show logs with --verbose
    let filter = if cli.verbose {
        EnvFilter::new("lifeplan=debug")
    } else {
        EnvFilter::new("lifeplan=warn")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_path();
    match cli.command {
        Commands::Generate(args) => cli::generate::execute(config, args, false).await,
        Commands::Save(args) => cli::generate::execute(config, args, true).await,
        Commands::List(args) => cli::plans::list(config, args).await,
        Commands::Show(args) => cli::plans::show(config, args).await,
        Commands::Load(args) => cli::plans::load(config, args).await,
        Commands::Delete(args) => cli::plans::delete(config, args).await,
        Commands::Export(args) => cli::export::execute(config, args).await,
        Commands::Login(args) => cli::auth::login(config, args).await,
        Commands::Signup(args) => cli::auth::signup(config, args).await,
        Commands::Logout => cli::auth::logout(config).await,
        Commands::Status => cli::auth::status(config).await,
        Commands::Waitlist(args) => cli::auth::waitlist(config, args).await,
        Commands::Schema(args) => cli::schema::execute(args.out),
    }
}

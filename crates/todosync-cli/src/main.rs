use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use todosync_core::session::RehydrateOutcome;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{account, auth, context, status, todos};

#[derive(Parser)]
#[command(name = "todosync")]
#[command(about = "todosync - command-line client for the todo service", long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "TODOSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Session file to use instead of the default location
    #[arg(long, global = true, env = "TODOSYNC_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register(auth::CredentialArgs),
    /// Log in and store the session
    Login(auth::CredentialArgs),
    /// Log out and forget the stored session
    Logout,
    /// Show the logged-in user's profile
    Whoami,
    /// Exchange the stored token for a fresh one
    Refresh,
    /// Show the local session and configuration
    Status,
    /// Manage todos
    Todos {
        #[command(subcommand)]
        action: todos::TodoAction,
    },
    /// Manage the account
    Account {
        #[command(subcommand)]
        action: account::AccountAction,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "todosync=debug,warn"
    } else {
        "todosync=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loaded = context::load(cli.config, cli.session_file)?;
    let ctx = &loaded.ctx;
    let mut navigation = ctx.subscribe_navigation();
    if ctx.start() == RehydrateOutcome::Expired {
        eprintln!("🔑 The stored session expired. Run `todosync login` to sign in again.");
    }

    let result = match cli.command {
        Commands::Register(args) => auth::register(ctx, args).await,
        Commands::Login(args) => auth::login(ctx, args).await,
        Commands::Logout => auth::logout(ctx).await,
        Commands::Whoami => auth::whoami(ctx).await,
        Commands::Refresh => auth::refresh(ctx).await,
        Commands::Status => status::run(&loaded),
        Commands::Todos { action } => todos::run(ctx, action).await,
        Commands::Account { action } => account::run(ctx, action).await,
    };

    ctx.shutdown().await;
    context::report(ctx, &mut navigation, result.is_ok());
    result
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use selene_launcher::commands;
use selene_launcher::core::config::LauncherConfig;
use selene_launcher::core::error::LauncherResult;
use selene_launcher::core::launch::LaunchOptions;
use selene_launcher::core::state::{AppContext, ReleaseChannel};

#[derive(Parser)]
#[command(name = "selene-launcher")]
#[command(about = "Selene Launcher - sign in, update and play Selene", long_about = None)]
struct Cli {
    /// Keep all launcher data under this directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in through the browser
    Login,
    /// Forget the stored tokens
    Logout,
    /// Show session, settings and runtime state
    Status,
    /// Check the release channel for the latest version
    Update {
        #[arg(long)]
        channel: Option<ReleaseChannel>,
    },
    /// Download the game files of a version (latest by default)
    Download { version: Option<String> },
    /// Download and install the Java runtime
    Runtime,
    /// Bring a server's content bundles up to date
    SyncBundles {
        server: String,
        /// Bearer issued by the server for its bundle endpoints
        #[arg(long)]
        join_token: Option<String>,
    },
    /// List the public servers
    Servers,
    /// Start an already downloaded version
    Launch {
        #[arg(long)]
        version: Option<String>,
        #[command(flatten)]
        args: LaunchArgs,
    },
    /// Update, download, sync bundles and launch in one go
    Play {
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        join_token: Option<String>,
        #[command(flatten)]
        args: LaunchArgs,
    },
}

#[derive(clap::Args)]
struct LaunchArgs {
    /// Extra argument for the Java runtime (repeatable)
    #[arg(long = "runtime-arg", allow_hyphen_values = true)]
    runtime_args: Vec<String>,
    /// Arguments passed to the game
    #[arg(last = true)]
    program_args: Vec<String>,
}

impl From<LaunchArgs> for LaunchOptions {
    fn from(args: LaunchArgs) -> Self {
        LaunchOptions {
            runtime_args: args.runtime_args,
            program_args: args.program_args,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    selene_launcher::init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> LauncherResult<()> {
    let mut config = LauncherConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    let mut ctx = AppContext::initialize(config).await?;

    match cli.command {
        Commands::Login => commands::login(&mut ctx).await,
        Commands::Logout => commands::logout(&mut ctx).await,
        Commands::Status => commands::status(&mut ctx).await,
        Commands::Update { channel } => commands::update(&mut ctx, channel).await.map(|_| ()),
        Commands::Download { version } => commands::download(&mut ctx, version).await.map(|_| ()),
        Commands::Runtime => commands::runtime(&mut ctx).await,
        Commands::SyncBundles { server, join_token } => {
            commands::sync_bundles(&mut ctx, &server, join_token).await
        }
        Commands::Servers => commands::servers(&mut ctx).await,
        Commands::Launch { version, args } => {
            commands::launch(&mut ctx, version, args.into()).await
        }
        Commands::Play {
            server,
            join_token,
            args,
        } => commands::play(&mut ctx, server, join_token, args.into()).await,
    }
}

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use harmonyhub::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Print debug logs
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in to Jamendo and cache the track listing
    Auth,

    /// Open the Jamendo account sign-up page
    Signup,

    /// Show sign-in state and cache status
    Status,

    /// Forget the stored tokens
    Logout,

    /// Handle cached tracks
    Tracks(TracksOptions),

    /// Show a single cached track
    Track(TrackOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
#[command(
    about = "Handle cached tracks",
    args_conflicts_with_subcommands = true // disallow mixing --search with subcommands
)]
pub struct TracksOptions {
    /// Only show tracks whose name or artist contains this text
    #[clap(long)]
    pub search: Option<String>,

    /// Subcommands under `tracks` (e.g., `update`)
    #[command(subcommand)]
    pub command: Option<TracksSubcommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TracksSubcommand {
    /// Renew the token if needed and refresh the cache from Jamendo
    Update,
}

#[derive(Parser, Debug, Clone)]
pub struct TrackOptions {
    /// Track id
    id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn init_logging(verbose: bool) {
    let mut clog = colog::default_builder();
    clog.filter(
        None,
        if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        },
    );
    clog.init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let settings = match config::Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration: {}", e),
    };

    let startup = match &cli.command {
        Command::Status => cli::Startup::Renew,
        _ => cli::Startup::Offline,
    };

    let orchestrator = match cli::connect(&settings, startup).await {
        Ok(orchestrator) => orchestrator,
        Err(e) => error!("Cannot open local data in {}: {}", settings.data_dir.display(), e),
    };

    match cli.command {
        Command::Auth => cli::auth(&settings, orchestrator).await,
        Command::Signup => cli::signup(orchestrator).await,
        Command::Status => cli::status(orchestrator).await,
        Command::Logout => cli::logout(orchestrator).await,
        Command::Tracks(opt) => match opt.command {
            Some(TracksSubcommand::Update) => cli::update_tracks(orchestrator).await,
            None => cli::list_tracks(orchestrator, opt.search).await,
        },
        Command::Track(opt) => cli::show_track(orchestrator, &opt.id).await,
        Command::Completions(_) => {}
    }
}

use anyhow::Result;
use haven::app;
use haven::cli::{Cli, Commands};
use haven::config::Config;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_with_version();
    init_logging(cli.quiet, cli.verbose);

    match cli.command {
        None | Some(Commands::Chat) => {
            let config = load_config(cli.config.as_deref())?;
            app::run_chat(config, cli.quiet).await?;
        }
        Some(Commands::Classify { text, json }) => {
            app::run_classify(&text, json)?;
        }
        Some(Commands::Tracks { emotion, limit }) => {
            let config = load_config(cli.config.as_deref())?;
            app::run_tracks(&config, emotion, limit)?;
        }
        Some(Commands::Scripts) => {
            app::run_scripts();
        }
        Some(Commands::Visualize { emotion }) => {
            let config = load_config(cli.config.as_deref())?;
            app::run_visualize(config, emotion, cli.quiet).await?;
        }
        Some(Commands::Prefs) => {
            let config = load_config(cli.config.as_deref())?;
            app::run_prefs(&config)?;
        }
        Some(Commands::Config) => {
            let config = load_config(cli.config.as_deref())?;
            app::run_config(&config)?;
        }
        #[cfg(feature = "cpal-audio")]
        Some(Commands::Devices) => {
            app::run_devices()?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command_with_version(),
                "haven",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Route logs to stderr. `HAVEN_LOG` takes precedence over `-v`/`-q`.
fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var("HAVEN_LOG")
        .from_env_lossy();

    let initialized = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
    if initialized.is_err() {
        eprintln!("haven: logging was already initialized");
    }
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config), which must exist
/// 2. Default config path (~/.config/haven/config.toml)
/// 3. Built-in defaults
///
/// Environment overrides apply on top of all three.
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path())?,
    };
    Ok(config.with_env_overrides())
}

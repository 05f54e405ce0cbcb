use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// packsync - package sync tool
///
/// Archive declared targets into versioned packages, publish them to a remote
/// catalog, and fetch version-constrained packages back.
///
/// Examples:
///   packsync create app.json          # Build app_v<ver>.zip and upload it
///   packsync update packages.json     # Download and extract requested packages
///   packsync list                     # Show the remote catalog
#[derive(Parser, Debug)]
#[command(author, version = env!("PACKSYNC_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (also via PACKSYNC_CONFIG)
    #[arg(
        long = "config",
        short = 'c',
        env = "PACKSYNC_CONFIG",
        value_name = "PATH",
        global = true
    )]
    pub config: Option<PathBuf>,

    /// Log progress at info level (RUST_LOG still takes precedence)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Archive a package's targets and upload the archive
    Create(CreateArgs),

    /// Download and extract every package listed in a batch file
    Update(UpdateArgs),

    /// List the archives in the remote catalog
    List,
}

#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    /// Package spec: {"name", "ver", "targets": [{"path", "exclude"}]}
    #[arg(value_name = "SPEC.json")]
    pub spec: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Batch file: {"packages": [{"name", "ver"}]}
    #[arg(value_name = "PACKAGES.json")]
    pub packages: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    let runtime = packsync::runtime::RealRuntime;

    match cli.command {
        Commands::Create(args) => packsync::commands::create(runtime, cli.config, &args.spec)?,
        Commands::Update(args) => {
            packsync::commands::update(runtime, cli.config, &args.packages)?
        }
        Commands::List => packsync::commands::list(runtime, cli.config)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_create_parsing() {
        let cli = Cli::try_parse_from(["packsync", "create", "app.json"]).unwrap();
        match cli.command {
            Commands::Create(args) => assert_eq!(args.spec, PathBuf::from("app.json")),
            _ => panic!("Expected Create command"),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_update_parsing() {
        let cli = Cli::try_parse_from(["packsync", "update", "packages.json", "-v"]).unwrap();
        match cli.command {
            Commands::Update(args) => assert_eq!(args.packages, PathBuf::from("packages.json")),
            _ => panic!("Expected Update command"),
        }
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_global_config_parsing() {
        let cli =
            Cli::try_parse_from(["packsync", "--config", "/etc/packsync.json", "list"]).unwrap();
        assert!(matches!(cli.command, Commands::List));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/packsync.json")));
    }

    #[test]
    fn test_cli_update_requires_file() {
        assert!(Cli::try_parse_from(["packsync", "update"]).is_err());
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["packsync", "app.json"]).is_err());
    }
}

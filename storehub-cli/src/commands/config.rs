use crate::config::ConfigLoader;
use anyhow::Result;
use clap::{Args, Subcommand};
use storehub_core::SessionPolicy;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (merged, secret masked)
    Show,
    /// Show configuration file paths
    Path,
    /// Check that the configuration would start a server
    Check,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(),
        ConfigCommands::Path => show_paths(),
        ConfigCommands::Check => check_config(),
    }
}

fn show_config() -> Result<()> {
    let config = ConfigLoader::load()?;
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("{}", toml_str);
    Ok(())
}

fn show_paths() -> Result<()> {
    println!("User config:    {:?}", ConfigLoader::user_config_path());
    println!("Project config: {:?}", ConfigLoader::project_config_path());
    Ok(())
}

fn check_config() -> Result<()> {
    let config = ConfigLoader::load()?;
    let policy = SessionPolicy::from_config(&config.session)?;
    config.auth_config().validate()?;

    println!("Configuration OK: {:?}", policy);
    Ok(())
}

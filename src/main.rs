use std::path::PathBuf;
use std::sync::LazyLock;

use clap::Parser;

mod commands;
mod config;
mod error;
mod http;
mod servicenow;
mod sync;
mod terraform;

use anyhow::Result;
use commands::clone_varset::CloneVarsetCommand;
use commands::config::model::ConfigCommand;
use commands::create_action::CreateActionCommand;
use commands::create_varset::CreateVarsetCommand;
use commands::get_varsets::GetVarsetsCommand;
use commands::import_vars::ImportVarsCommand;
use commands::setup_logging;
use commands::sync_action::SyncActionCommand;
use commands::update_varset_var::UpdateVarsetVarCommand;
use config::VarsyncConfig;
use dirs::{config_dir, home_dir, state_dir};

/// Configuration file path following the XDG Base Directory specification
/// (~/.config/varsync/config.toml)
static CONFIG_FILE: LazyLock<PathBuf> = LazyLock::new(|| {
    config_dir()
        .unwrap_or_else(|| {
            home_dir()
                .expect("HOME directory must be set to run varsync")
                .join(".config")
        })
        .join("varsync")
        .join("config.toml")
});

/// Get the state directory path using XDG Base Directory specification
/// Used for logs
pub fn get_state_dir() -> PathBuf {
    state_dir()
        .unwrap_or_else(|| {
            home_dir()
                .expect("HOME directory must be set to run varsync")
                .join(".local")
                .join("state")
        })
        .join("varsync")
}

#[derive(Parser)]
#[clap(name = "varsync", bin_name = "varsync", version, about)]
struct VarsyncApp {
    /// Configuration file (default: ~/.config/varsync/config.toml)
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,
    /// Write a debug log to the state directory at this level
    #[clap(long, global = true, env = "VARSYNC_LOG")]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: VarsyncCommand,
}

#[derive(Parser)]
enum VarsyncCommand {
    CloneVarset(CloneVarsetCommand),
    CreateAction(CreateActionCommand),
    CreateVarset(CreateVarsetCommand),
    GetVarsets(GetVarsetsCommand),
    SyncAction(SyncActionCommand),
    ImportVars(ImportVarsCommand),
    UpdateVarsetVar(UpdateVarsetVarCommand),
    #[clap(subcommand)]
    Config(ConfigCommand),
}

impl VarsyncApp {
    pub async fn run(&self) -> Result<()> {
        if let Some(log_level) = &self.log_level {
            setup_logging(log_level)?;
        }

        let config = VarsyncConfig::from_file(self.config.as_ref())?;
        match &self.command {
            VarsyncCommand::CloneVarset(cmd) => cmd.run(&config).await,
            VarsyncCommand::CreateAction(cmd) => cmd.run(&config).await,
            VarsyncCommand::CreateVarset(cmd) => cmd.run(&config).await,
            VarsyncCommand::GetVarsets(cmd) => cmd.run(&config).await,
            VarsyncCommand::SyncAction(cmd) => cmd.run(&config).await,
            VarsyncCommand::ImportVars(cmd) => cmd.run(&config).await,
            VarsyncCommand::UpdateVarsetVar(cmd) => cmd.run(&config).await,
            VarsyncCommand::Config(cmd) => cmd.run(&config),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let app = VarsyncApp::parse();
    if let Err(e) = app.run().await {
        log::error!("{e:#}");
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

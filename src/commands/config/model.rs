use anyhow::Result;
use clap::Parser;

use crate::config::VarsyncConfig;

#[derive(Parser, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration with secrets redacted
    #[clap(alias = "ls")]
    Show(ShowCommand),
}

impl ConfigCommand {
    pub fn run(&self, config: &VarsyncConfig) -> Result<()> {
        match self {
            ConfigCommand::Show(cmd) => cmd.run(config),
        }
    }
}

#[derive(Parser, Debug)]
pub struct ShowCommand {
    /// Also print the path the configuration was read from
    #[clap(short, long)]
    pub path: bool,
}

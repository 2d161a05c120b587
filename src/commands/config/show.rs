use anyhow::Result;

use super::model::ShowCommand;
use crate::config::VarsyncConfig;

impl ShowCommand {
    pub fn run(&self, config: &VarsyncConfig) -> Result<()> {
        if self.path {
            match &config.path {
                Some(path) if path.exists() => println!("# {}", path.display()),
                Some(path) => println!("# {} (not found, using defaults)", path.display()),
                None => {}
            }
        }

        let rendered = config.to_redacted_string()?;
        if rendered.trim().is_empty() {
            println!("⚠️ No configuration found; every option has to come from flags or the environment.");
        } else {
            print!("{rendered}");
        }
        Ok(())
    }
}

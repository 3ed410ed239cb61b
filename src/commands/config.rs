//! Config command handler.

use usershare::Result;
use usershare::config::UsershareConfig;
use usershare::storage::STORE_FILE_NAME;

/// Config command: prints the effective configuration as TOML.
pub fn cmd_config(config: &UsershareConfig) -> Result<()> {
    println!("# Effective configuration");
    println!("# Store file: {}", config.data_dir.join(STORE_FILE_NAME).display());
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}

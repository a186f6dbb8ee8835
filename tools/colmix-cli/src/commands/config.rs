//! Show or initialize the configuration file.

use colmix_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig, init: bool) -> anyhow::Result<()> {
    let path = config_file_path();
    println!("Config file: {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);

    if init {
        config.save()?;
        println!("Configuration written to: {}", path.display());
    }
    Ok(())
}

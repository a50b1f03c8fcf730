//! Config commands

use crate::config::Config;
use crate::ConfigCommands;

pub async fn handle(action: ConfigCommands, mut config: Config) -> Result<(), String> {
    match action {
        ConfigCommands::Set { key, value } => {
            match key.as_str() {
                "store_url" => config.store_url = Some(value),
                "policy_user" => config.policy_user = Some(value),
                "default_format" => config.default_format = Some(value),
                other => return Err(format!("unknown configuration key: {}", other)),
            }
            config.save()?;
            println!("Saved.");
        }
        ConfigCommands::Get { key } => {
            let value = match key.as_str() {
                "store_url" => config.store_url,
                "policy_user" => config.policy_user,
                "default_format" => config.default_format,
                other => return Err(format!("unknown configuration key: {}", other)),
            };
            println!("{}", value.unwrap_or_default());
        }
        ConfigCommands::List => {
            println!("store_url      = {}", config.store_url.unwrap_or_default());
            println!("policy_user    = {}", config.policy_user.unwrap_or_default());
            println!(
                "default_format = {}",
                config.default_format.unwrap_or_default()
            );
        }
        ConfigCommands::Init => {
            Config::default().save()?;
            println!("Initialized configuration file.");
        }
    }
    Ok(())
}

//! Environment commands

use crate::output::OutputFormat;
use crate::EnvironmentCommands;
use vcluster_client::{Caller, ClientApi, ClientError, Result};
use vcluster_model::Environment;

pub async fn handle(
    action: EnvironmentCommands,
    api: &ClientApi,
    caller: &Caller,
    format: OutputFormat,
) -> Result<()> {
    match action {
        EnvironmentCommands::Create {
            name,
            owner,
            package,
            command,
            required_os,
        } => {
            let mut environment = Environment::new(&name, owner);
            environment.packagelist = package;
            environment.command = command;
            environment.required_os = required_os;
            api.store_environment(&mut environment, caller).await?;
            println!("Created environment: {}", name);
        }
        EnvironmentCommands::List => {
            let environments = api.list_environments().await?;
            format.print(&environments);
        }
        EnvironmentCommands::Get { name } => {
            let environment = api
                .get_environment(&name)
                .await?
                .ok_or(ClientError::EntityMissing(name))?;
            format.print(&environment);
        }
        EnvironmentCommands::Delete { name } => {
            api.delete_environment(&name, caller).await?;
            println!("Deleted environment: {}", name);
        }
    }
    Ok(())
}

//! Allocation commands

use crate::output::OutputFormat;
use crate::AllocationCommands;
use vcluster_client::{Caller, ClientApi, ClientError, Result};
use vcluster_model::Allocation;

pub async fn handle(
    action: AllocationCommands,
    api: &ClientApi,
    caller: &Caller,
    format: OutputFormat,
) -> Result<()> {
    match action {
        AllocationCommands::Create {
            name,
            owner,
            resource,
            accountname,
        } => {
            let mut allocation = Allocation::new(&name, owner, resource, accountname);
            api.store_allocation(&mut allocation, caller).await?;
            println!("Created allocation: {}", name);
        }
        AllocationCommands::List => {
            let allocations = api.list_allocations().await?;
            format.print(&allocations);
        }
        AllocationCommands::Get { name } => {
            let allocation = api
                .get_allocation(&name)
                .await?
                .ok_or(ClientError::EntityMissing(name))?;
            format.print(&allocation);
        }
        AllocationCommands::Delete { name } => {
            api.delete_allocation(&name, caller).await?;
            println!("Deleted allocation: {}", name);
        }
        AllocationCommands::Pubtoken { name } => match api.allocation_pub_token(&name).await? {
            Some(token) => println!("{}", token),
            None => println!("No public token attached to {}", name),
        },
    }
    Ok(())
}

//! Resource commands

use crate::output::OutputFormat;
use crate::ResourceCommands;
use vcluster_client::{Caller, ClientApi, ClientError, Result};
use vcluster_model::Resource;

pub async fn handle(
    action: ResourceCommands,
    api: &ClientApi,
    caller: &Caller,
    format: OutputFormat,
) -> Result<()> {
    match action {
        ResourceCommands::Create {
            name,
            owner,
            accesstype,
            accessmethod,
            accessflavor,
            accesshost,
            accessport,
        } => {
            let mut resource = Resource::new(
                &name,
                owner,
                accesstype,
                accessmethod,
                accessflavor,
                accesshost,
                accessport,
            );
            api.store_resource(&mut resource, caller).await?;
            println!("Created resource: {}", name);
        }
        ResourceCommands::List => {
            let resources = api.list_resources().await?;
            format.print(&resources);
        }
        ResourceCommands::Get { name } => {
            let resource = api
                .get_resource(&name)
                .await?
                .ok_or(ClientError::EntityMissing(name))?;
            format.print(&resource);
        }
        ResourceCommands::Delete { name } => {
            api.delete_resource(&name, caller).await?;
            println!("Deleted resource: {}", name);
        }
    }
    Ok(())
}

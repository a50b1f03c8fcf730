//! Nodeset commands

use crate::output::OutputFormat;
use crate::NodesetCommands;
use vcluster_client::{Caller, ClientApi, ClientError, Result};
use vcluster_model::Nodeset;

pub async fn handle(
    action: NodesetCommands,
    api: &ClientApi,
    caller: &Caller,
    format: OutputFormat,
) -> Result<()> {
    match action {
        NodesetCommands::Create {
            name,
            owner,
            node_number,
            app_type,
            app_role,
        } => {
            let mut nodeset = Nodeset::new(&name, owner, node_number, app_type, app_role.into());
            api.store_nodeset(&mut nodeset, caller).await?;
            println!("Created nodeset: {}", name);
        }
        NodesetCommands::List => {
            let nodesets = api.list_nodesets().await?;
            format.print(&nodesets);
        }
        NodesetCommands::Get { name } => {
            let nodeset = api
                .get_nodeset(&name)
                .await?
                .ok_or(ClientError::EntityMissing(name))?;
            format.print(&nodeset);
        }
        NodesetCommands::Delete { name } => {
            api.delete_nodeset(&name, caller).await?;
            println!("Deleted nodeset: {}", name);
        }
    }
    Ok(())
}

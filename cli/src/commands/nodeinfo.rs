//! Nodeinfo commands

use crate::output::OutputFormat;
use crate::NodeinfoCommands;
use vcluster_client::{Caller, ClientApi, ClientError, Result};
use vcluster_model::Nodeinfo;

pub async fn handle(
    action: NodeinfoCommands,
    api: &ClientApi,
    caller: &Caller,
    format: OutputFormat,
) -> Result<()> {
    match action {
        NodeinfoCommands::Create {
            name,
            owner,
            cores,
            memory_mb,
            storage_mb,
            native_os,
        } => {
            let mut nodeinfo = Nodeinfo::new(&name, owner);
            nodeinfo.cores = cores;
            nodeinfo.memory_mb = memory_mb;
            nodeinfo.storage_mb = storage_mb;
            nodeinfo.native_os = native_os;
            api.store_nodeinfo(&mut nodeinfo, caller).await?;
            println!("Created nodeinfo: {}", name);
        }
        NodeinfoCommands::List => {
            let nodeinfos = api.list_nodeinfos().await?;
            format.print(&nodeinfos);
        }
        NodeinfoCommands::Get { name } => {
            let nodeinfo = api
                .get_nodeinfo(&name)
                .await?
                .ok_or(ClientError::EntityMissing(name))?;
            format.print(&nodeinfo);
        }
        NodeinfoCommands::Delete { name } => {
            api.delete_nodeinfo(&name, caller).await?;
            println!("Deleted nodeinfo: {}", name);
        }
    }
    Ok(())
}

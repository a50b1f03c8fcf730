//! Cluster commands

use crate::output::OutputFormat;
use crate::ClusterCommands;
use vcluster_client::{Caller, ClientApi, ClientError, Result};
use vcluster_model::Cluster;

pub async fn handle(
    action: ClusterCommands,
    api: &ClientApi,
    caller: &Caller,
    format: OutputFormat,
) -> Result<()> {
    match action {
        ClusterCommands::Create {
            name,
            owner,
            nodeset,
        } => {
            let mut cluster = Cluster::new(&name, owner, &nodeset);
            api.store_cluster(&mut cluster, caller).await?;
            println!("Created cluster: {}", name);
        }
        ClusterCommands::List => {
            let clusters = api.list_clusters(caller).await?;
            format.print(&clusters);
        }
        ClusterCommands::Get { name } => {
            let cluster = api
                .get_cluster(&name)
                .await?
                .ok_or(ClientError::EntityMissing(name))?;
            format.print(&cluster);
        }
        ClusterCommands::Delete { name } => {
            api.delete_cluster(&name, caller).await?;
            println!("Deleted cluster: {}", name);
        }
        ClusterCommands::AddNodeset { nodeset, cluster } => {
            api.add_nodeset_to_cluster(&nodeset, &cluster, caller).await?;
            println!("Added nodeset {} to cluster {}", nodeset, cluster);
        }
        ClusterCommands::RemoveNodeset { nodeset, cluster } => {
            api.remove_nodeset_from_cluster(&nodeset, &cluster, caller)
                .await?;
            println!("Removed nodeset {} from cluster {}", nodeset, cluster);
        }
    }
    Ok(())
}

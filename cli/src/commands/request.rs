//! Request commands

use crate::output::OutputFormat;
use crate::RequestCommands;
use vcluster_client::{Caller, ClientApi, ClientError, Result};
use vcluster_model::Request;

pub async fn handle(
    action: RequestCommands,
    api: &ClientApi,
    caller: &Caller,
    format: OutputFormat,
) -> Result<()> {
    match action {
        RequestCommands::Create {
            name,
            owner,
            project,
            cluster,
            allocation,
            environment,
        } => {
            let mut request = Request::new(&name, owner, project, cluster, &allocation, &environment);
            api.store_request(&mut request, caller).await?;
            println!("Created request: {}", name);
        }
        RequestCommands::List => {
            let requests = api.list_requests().await?;
            format.print(&requests);
        }
        RequestCommands::Get { name } => {
            let request = api
                .get_request(&name)
                .await?
                .ok_or(ClientError::EntityMissing(name))?;
            format.print(&request);
        }
        RequestCommands::Delete { name } => {
            api.delete_request(&name, caller).await?;
            println!("Deleted request: {}", name);
        }
        RequestCommands::Terminate { name } => {
            api.terminate_request(&name, caller).await?;
            println!("Termination requested for: {}", name);
        }
        RequestCommands::Status { name } => {
            let (statusraw, statusinfo) = api.request_status(&name).await?;
            println!("statusraw:  {}", statusraw.as_deref().unwrap_or("-"));
            println!("statusinfo: {}", statusinfo.as_deref().unwrap_or("-"));
        }
        RequestCommands::State { name } => {
            let (state, reason) = api.request_state(&name).await?;
            println!("state:  {}", state);
            println!("reason: {}", reason.as_deref().unwrap_or("-"));
        }
        RequestCommands::Conf { name, kind } => {
            let conf = api.conf_string(kind.into(), &name).await?;
            print!("{}", conf);
        }
    }
    Ok(())
}

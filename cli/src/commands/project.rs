//! Project commands

use crate::output::OutputFormat;
use crate::ProjectCommands;
use vcluster_client::{Caller, ClientApi, ClientError, Result};
use vcluster_model::Project;

pub async fn handle(
    action: ProjectCommands,
    api: &ClientApi,
    caller: &Caller,
    format: OutputFormat,
) -> Result<()> {
    match action {
        ProjectCommands::Create { name, owner, member } => {
            let mut project = Project::new(&name, owner, &member);
            api.store_project(&mut project, caller).await?;
            println!("Created project: {}", name);
        }
        ProjectCommands::List { owner, member } => {
            let projects = match (owner, member) {
                (Some(owner), _) => api.projects_of_owner(&owner).await?,
                (None, Some(member)) => api.projects_of_user(&member).await?,
                (None, None) => api.list_projects().await?,
            };
            format.print(&projects);
        }
        ProjectCommands::Get { name } => {
            let project = api
                .get_project(&name)
                .await?
                .ok_or(ClientError::EntityMissing(name))?;
            format.print(&project);
        }
        ProjectCommands::Delete { name } => {
            api.delete_project(&name, caller).await?;
            println!("Deleted project: {}", name);
        }
        ProjectCommands::AddUser { user, project } => {
            api.add_user_to_project(&user, &project, caller).await?;
            println!("Added {} to project {}", user, project);
        }
        ProjectCommands::RemoveUser { user, project } => {
            api.remove_user_from_project(&user, &project, caller).await?;
            println!("Removed {} from project {}", user, project);
        }
        ProjectCommands::AddAllocation {
            allocation,
            project,
        } => {
            api.add_allocation_to_project(&allocation, &project, caller)
                .await?;
            println!("Attached allocation {} to project {}", allocation, project);
        }
        ProjectCommands::RemoveAllocation {
            allocation,
            project,
        } => {
            api.remove_allocation_from_project(&allocation, &project, caller)
                .await?;
            println!(
                "Detached allocation {} from project {}",
                allocation, project
            );
        }
    }
    Ok(())
}

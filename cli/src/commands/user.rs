//! User commands

use crate::output::OutputFormat;
use crate::UserCommands;
use vcluster_client::{Caller, ClientApi, ClientError, Result};
use vcluster_model::User;

pub async fn handle(
    action: UserCommands,
    api: &ClientApi,
    caller: &Caller,
    format: OutputFormat,
) -> Result<()> {
    match action {
        UserCommands::Create {
            name,
            first,
            last,
            email,
            organization,
        } => {
            let mut user = User::new(&name, first, last, email, organization);
            api.store_user(&mut user, caller).await?;
            println!("Created user: {}", name);
        }
        UserCommands::List => {
            let users = api.list_users().await?;
            format.print(&users);
        }
        UserCommands::Get { name } => {
            let user = api
                .get_user(&name)
                .await?
                .ok_or(ClientError::EntityMissing(name))?;
            format.print(&user);
        }
        UserCommands::Delete { name } => {
            api.delete_user(&name, caller).await?;
            println!("Deleted user: {}", name);
        }
    }
    Ok(())
}

//! Pairing commands

use crate::PairingCommands;
use vcluster_client::{ClientApi, Result};

pub async fn handle(action: PairingCommands, api: &ClientApi) -> Result<()> {
    match action {
        PairingCommands::Request { common_name } => {
            let code = api.request_pairing(&common_name).await?;
            println!("Pairing code: {}", code);
            println!("Retrieve credentials with: vcluster pairing retrieve {}", code);
        }
        PairingCommands::Retrieve { code } => {
            let (cert, key) = api.get_pairing(&code).await?;
            print!("{}", cert);
            print!("{}", key);
        }
    }
    Ok(())
}

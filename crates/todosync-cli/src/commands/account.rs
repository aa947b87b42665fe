use anyhow::{Context, Result};
use clap::Subcommand;
use todosync_application::AppContext;
use todosync_core::user::ProfileUpdate;

use super::auth::display_name;

#[derive(Subcommand)]
pub enum AccountAction {
    /// Change the username or password
    Update {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Permanently delete the account
    Delete {
        /// Current password, required to confirm
        #[arg(long, env = "TODOSYNC_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

pub async fn run(ctx: &AppContext, action: AccountAction) -> Result<()> {
    match action {
        AccountAction::Update { username, password } => {
            let update = ProfileUpdate { username, password };
            let profile = ctx
                .auth()
                .update_profile(&update)
                .await
                .context("Profile update failed")?;
            println!("Profile of {} updated", display_name(&profile));
        }
        AccountAction::Delete { password } => {
            ctx.auth()
                .delete_account(&password)
                .await
                .context("Account deletion failed")?;
            println!("Account deleted");
        }
    }
    Ok(())
}

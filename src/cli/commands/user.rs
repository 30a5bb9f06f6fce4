//! Create-user command handler

use crate::config::Config;
use crate::services::Registration;
use crate::state::SharedState;

pub async fn cmd_create_user(config: Config, registration: Registration) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let user = state.auth_service.create_user(registration).await?;

    println!(
        "Created user '{}' (id {}, role {:?})",
        user.username,
        user.id,
        user.role()
    );
    Ok(())
}

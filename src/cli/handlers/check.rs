//! Check command handler
//!
//! Validates the loaded configuration, then connects to the database and the
//! cache backend and pings both.

use tracing::info;

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::state::AppState;

pub struct CheckCommandHandler {
    config: Settings,
}

impl CheckCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub async fn execute(self) -> AppResult<()> {
        self.config.validate()?;
        println!("✓ Configuration is valid");

        let state = AppState::new(self.config).await?;
        state.check_database().await?;
        println!("✓ Database connection is healthy");

        state.check_cache().await?;
        println!(
            "✓ Cache backend ({}) is reachable, default TTL {}s",
            state.settings.cache.backend.as_str(),
            state.cache.default_ttl()
        );

        info!("Deployment check passed");
        Ok(())
    }
}

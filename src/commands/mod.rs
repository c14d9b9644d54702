pub mod ask;
pub mod history;
pub mod repl;

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use lingxi::{
    AesGcmSecurity, CoreConfig, DialogueCore, OfflineActions, PermissionLevel, SecurityCapability,
};

/// Build the core the CLI commands share: default config, offline actions,
/// AES cipher keyed from the environment.
pub fn build_core() -> Result<DialogueCore> {
    let config = CoreConfig::default();

    let passphrase = match std::env::var("LINGXI_SECRET_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => {
            warn!("LINGXI_SECRET_KEY not set, using the built-in development key");
            "lingxi-dev-key".to_string()
        }
    };

    let security: Arc<dyn SecurityCapability> =
        Arc::new(AesGcmSecurity::new(&passphrase, PermissionLevel::User));

    DialogueCore::new(config, Box::new(OfflineActions::new()), security)
}

//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the bundled content template on first start
//! - Fail fast when the template cannot be read

use crate::error::LanderError;
use crate::http::AppState;

/// Prepare live documents before the listener opens.
pub async fn bootstrap(state: &AppState) -> Result<(), LanderError> {
    let installed = state.content.bootstrap().await?;
    if !installed {
        tracing::debug!(
            live = %state.content.live_path().display(),
            "Content document already present"
        );
    }
    Ok(())
}

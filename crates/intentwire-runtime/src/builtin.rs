//! Built-in handlers.
//!
//! A small standard set installed by explicit registration during
//! startup composition. Applications are expected to register their own
//! handlers alongside these.

use crate::handler::text_param;
use crate::registry::HandlerRegistry;
use intentwire_core::ParamValue;

/// Echo the first text parameter back (ping/pong).
pub const ECHO: &str = "ECHO";

/// Confirm a bootstrap with version and mode parameters.
pub const BOOT: &str = "BOOT";

/// Report host platform information.
pub const STATUS: &str = "STATUS";

/// Install the built-in handlers into a registry.
pub fn register_builtins(registry: &HandlerRegistry) {
    registry.register_fn(ECHO, |params| {
        let message = text_param(params, 0)?;
        Ok(ParamValue::from(format!("ECHO: {message}")))
    });

    registry.register_fn(BOOT, |params| {
        let version = text_param(params, 0)?;
        let mode = text_param(params, 1)?;
        Ok(ParamValue::from(format!(
            "runtime online: version={version} mode={mode}"
        )))
    });

    registry.register_fn(STATUS, |_params| {
        Ok(ParamValue::from(format!(
            "system ok: {} {}",
            std::env::consts::OS,
            std::env::consts::ARCH
        )))
    });
}

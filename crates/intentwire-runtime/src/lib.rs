//! # intentwire-runtime
//!
//! The dispatch engine for intentwire packets.
//!
//! A [`Runtime`] consumes a [`Packet`], verifies its signature, checks
//! the sender against its authorized set, and dispatches each intent
//! through a [`HandlerRegistry`], producing one [`ExecutionResult`] per
//! intent. Security gates fail the whole packet; intent failures are
//! isolated.
//!
//! ```no_run
//! use std::sync::Arc;
//! use intentwire_core::{Identity, Intent, PacketBuilder};
//! use intentwire_runtime::{builtin, HandlerRegistry, Runtime};
//!
//! # async fn demo() -> Result<(), intentwire_core::CoreError> {
//! let identity = Identity::generate();
//!
//! let registry = Arc::new(HandlerRegistry::new());
//! builtin::register_builtins(&registry);
//!
//! let runtime = Runtime::new([identity.sender_id()], registry);
//!
//! let packet = PacketBuilder::new(identity.sender_id(), 1)
//!     .intent(Intent::new(builtin::ECHO).with_param("hi"))
//!     .sign(&identity)?;
//!
//! let results = runtime.execute(&packet).await;
//! assert!(results[0].success);
//! # Ok(())
//! # }
//! ```

pub mod builtin;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod registry;

pub use dispatch::{ExecutionResult, Runtime, RuntimeConfig};
pub use error::DispatchError;
pub use handler::{FnHandler, HandlerError, IntentHandler};
pub use registry::HandlerRegistry;

// Re-export the core surface so applications can depend on one crate.
pub use intentwire_core::{
    Identity, Intent, Packet, PacketBuilder, PacketDigest, PacketSignature, ParamValue, SenderId,
};

//! Session registry for Snatch.
//!
//! The registry is the only place that knows which connection sits in
//! which room. It creates rooms on first join, routes commands and chat to
//! the right room actor, and shuts rooms down when their last active
//! player leaves.
//!
//! # How it fits in the stack
//!
//! ```text
//! Connection handler (above)  ← one task per socket
//!     ↕
//! Session registry (this crate)  ← connection id → room binding
//!     ↕
//! Room actors (below)  ← one task per room
//! ```

mod error;
mod registry;

pub use error::SessionError;
pub use registry::{Binding, SessionRegistry};

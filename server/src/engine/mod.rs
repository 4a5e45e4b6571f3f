//! The relay core: pool/membership state, message fan-out, reaction
//! synchronization, and the admin/analytics surface over them.

pub mod admin;
pub mod analytics;
pub mod error;
pub mod events;
pub mod pool;
pub mod reactions;
pub mod registry;
pub mod relay;

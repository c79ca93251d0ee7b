//! Fotodrop infra – in-process infrastructure for the upload pipeline.
//!
//! Explicitly constructed, lifetime-scoped components: the typed event
//! bus, the temporary staging area, the live progress broadcaster, and
//! in-memory implementations of the repository contracts. Tests build
//! isolated instances; nothing here is a process-wide singleton.

mod broadcaster;
mod event_bus;
mod memory;
mod staging;

pub use broadcaster::{ConnectionId, ProgressBroadcaster, ProgressFrame, CONNECTION_BUFFER};
pub use event_bus::{EventBus, DEFAULT_BUS_CAPACITY};
pub use memory::{InMemoryPhotoRepository, InMemoryUploadJobRepository};
pub use staging::StagingArea;

//! DeviceHub operations: discovery, creation and mutation of drivers,
//! devices and tags, plus live tag reads.
//!
//! Flow of every operation:
//! ```text
//!   args ─► resolve (fresh fetch + scan) ─► mutate / read ─► normalize ─► envelope
//! ```
//! `DeviceHub` holds no catalog state of its own. It can be shared freely
//! between concurrent calls.

pub mod args;
pub mod envelope;
pub mod listing;
pub mod mutation;
pub mod normalize;
pub mod resolve;
pub mod values;

use std::fmt;
use std::sync::Arc;

use crate::hub::{CatalogGateway, InMemoryHub, LiveValueSource};

pub use args::{
    CreateDeviceArgs, CreateTagArgs, DeleteTagArgs, DeviceTagsArgs, ListAllTagsArgs,
    ListDevicesArgs, ReadTagValueArgs, UpdateTagArgs,
};
pub use envelope::{Envelope, FailureReason};
pub use mutation::{TagPatch, DEVICE_NEXT_STEPS};
pub use normalize::{normalize, Attributes, FieldSpec, NormalizedRecord};
pub use resolve::{TagSelector, TagTargets};

/// Entry point for the DeviceHub operations.
#[derive(Clone)]
pub struct DeviceHub {
    catalog: Arc<dyn CatalogGateway>,
    live: Arc<dyn LiveValueSource>,
}

impl DeviceHub {
    pub fn new(catalog: Arc<dyn CatalogGateway>, live: Arc<dyn LiveValueSource>) -> Self {
        Self { catalog, live }
    }

    /// Catalog and live values both served by one in-memory hub.
    pub fn in_memory(hub: Arc<InMemoryHub>) -> Self {
        Self {
            catalog: hub.clone(),
            live: hub,
        }
    }
}

impl fmt::Debug for DeviceHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceHub").finish_non_exhaustive()
    }
}

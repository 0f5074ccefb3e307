//! TCP+msgpack IPC transport layer.
//!
//! Length-prefixed msgpack frames carrying `{id, service, method, body, meta}`
//! requests into the DeviceHub operations and the tool catalog.

pub mod codec;
pub mod handlers;
pub mod router;
pub mod server;

pub use router::{route_request, IpcRequest, ServiceContext};
pub use server::IpcServer;

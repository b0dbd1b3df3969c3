//! Camera fleet model
//!
//! Descriptors and the inventory collaborator that supplies them.

pub mod descriptor;
pub mod inventory;

pub use descriptor::{CameraDescriptor, CameraId};
pub use inventory::{CameraInventory, JsonFileInventory, StaticInventory};

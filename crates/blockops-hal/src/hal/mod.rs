//! HAL trait definitions and implementations.
//!
//! This module defines the executor traits the facade is built on and provides
//! both real (LinuxHal) and fake (FakeHal) implementations.

pub mod command;
pub mod fake_hal;
pub mod identity_ops;
pub mod linux_hal;
pub mod mount_options;
pub mod process_ops;

pub use command::CommandSpec;
pub use fake_hal::{FakeHal, FakeResponse, Operation};
pub use identity_ops::{IdentityOps, UserIdentity};
pub use linux_hal::LinuxHal;
pub use mount_options::MountOptions;
pub use process_ops::ProcessOps;

/// Complete HAL combining all system operation traits.
pub trait SystemHal: ProcessOps + IdentityOps + Send + Sync {}

/// Automatically implement SystemHal for any type implementing all required traits.
impl<T> SystemHal for T where T: ProcessOps + IdentityOps + Send + Sync {}

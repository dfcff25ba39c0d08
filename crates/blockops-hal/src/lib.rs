//! Block device and filesystem administration.
//!
//! Every operation is a single external command run through a [`ProcessOps`]
//! executor, so callers can swap [`LinuxHal`] for [`FakeHal`] in tests
//! without root privileges or real hardware.

pub mod config;
pub mod device_ops;
pub mod hal;
pub mod parse;

pub use blockops_error::{DeviceError, DeviceResult, HalError, HalResult};
pub use config::DeviceOpsConfig;
pub use device_ops::{DeviceOps, UMOUNT_NOT_MOUNTED};
pub use hal::*;

//! Built-in kernels: `HELLO` and `INSTALLER`.
//!
//! Small reference programs used by the tests and the demo binary.

pub mod hello;
pub mod installer;

pub use hello::{hello_world, HelloWorld, HELLO_NAME};
pub use installer::{installer, Installer, INSTALLER_NAME, INSTALLER_SIZE_OCTETS, TARGET_DEVICE};

//! Type mapping metadata
//!
//! This crate provides:
//! - The [`TypeMapping`] trait through which the compiler asks how members are
//!   named and whether they are exposed
//! - Type metadata (constructor shape, property list)
//! - A builder-configured registry implementation
//! - A thread-safe read-through metadata cache

pub mod cache;
pub mod metadata;
pub mod provider;
pub mod registry;

pub use cache::*;
pub use metadata::*;
pub use provider::*;
pub use registry::*;

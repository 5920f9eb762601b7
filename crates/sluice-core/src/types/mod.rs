//! Type system for Sluice
//!
//! This module contains:
//! - Value types (runtime values and declared catalog types)
//! - Field definitions

pub mod schema;
pub mod value;

pub use schema::{find_field, Field};
pub use value::{Value, ValueType};

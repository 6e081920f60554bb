//! Component resolution: the explicit name-to-factory table.

pub mod registry;

//! Schedule extraction, layout and rendering

pub mod batch;
pub mod provider;
pub mod timeline;

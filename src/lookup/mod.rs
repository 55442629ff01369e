//! CDN membership lookup

pub mod engine;

pub use engine::LookupEngine;

//! HTML fragments rendered directly by the gateway.

pub mod style;

pub use style::StyleTag;

//! Helper functions for the build pipeline
//!
//! Stylesheet compression and URL rewriting over rendered HTML.

pub mod css;
mod url;

pub use url::*;

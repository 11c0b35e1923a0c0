//! Output generation for the published feed artifact.
//!
//! # Submodules
//!
//! - [`rss`]: serializes a `FeedDocument` to RSS 2.0, reads it back, and
//!   replaces the output file atomically
//!
//! # Output Structure
//!
//! ```text
//! public/
//! └── feed.xml   # overwritten in full on every successful run
//! ```

pub mod rss;

//! Incremental artifact extraction
//!
//! The streaming core: tag extraction over the growing response buffer,
//! exact-match patch application, and the per-session reducer that ties the
//! two together.

pub mod extractor;
pub mod patch;
pub mod reducer;

//! API data models
//!
//! This module contains the wire structures for the widget chat endpoint.

pub mod chat;
pub mod delta;

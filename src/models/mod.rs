//! API data models
//!
//! This module contains data structures for the Responses API.

pub mod responses;

// src/repository/mod.rs

//! Persistence for the question bank and attempt history.
//!
//! Every function takes the pool explicitly; multi-row writes run in their own
//! transaction.

pub mod attempts;
pub mod questions;

// src/handlers/mod.rs

pub mod attempts;
pub mod subjects;

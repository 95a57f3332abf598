// src/models/mod.rs

pub mod quiz;
pub mod result;
pub mod student;
pub mod violation;

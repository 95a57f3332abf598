// src/store/mod.rs

pub mod quizzes;
pub mod results;
pub mod sessions;
pub mod violations;

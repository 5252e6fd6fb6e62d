// src/models/mod.rs

pub mod exam;
pub mod feedback;
pub mod history;
pub mod user;

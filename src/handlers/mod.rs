// src/handlers/mod.rs
pub mod catalog;
pub mod drawing;
pub mod users;

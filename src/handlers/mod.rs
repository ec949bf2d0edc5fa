//! HTTP handlers

pub mod health;
pub mod controls;
pub mod extract;
pub mod sessions;

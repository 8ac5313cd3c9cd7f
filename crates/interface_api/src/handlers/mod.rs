//! Request handlers

pub mod audit;
pub mod bills;
pub mod health;
pub mod multi_farmer;
pub mod settings;

pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod drive;
pub mod global;
pub mod lifecycle;
pub mod listing;
pub mod logging;

#[cfg(test)]
mod tests;

pub mod app;
pub mod cli;
pub mod config;
pub mod filter;
pub mod loader;
pub mod meta;
pub mod output;
pub mod page;
pub mod render;
pub mod snapshot;

#[cfg(test)]
mod tests;

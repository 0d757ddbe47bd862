//! Command implementations

pub mod build;
pub mod completions;
pub mod list;
pub mod update_recipe;

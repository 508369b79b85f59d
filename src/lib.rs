//! Bubble tree: classify flat parent-linked items into a forest of
//! root, internal and leaf nodes, and navigate it.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;

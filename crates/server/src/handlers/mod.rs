//! HTTP request handlers.

pub mod common;
pub mod download;
pub mod tree;
pub mod uploads;

pub use common::*;
pub use download::*;
pub use tree::*;
pub use uploads::*;

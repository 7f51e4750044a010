//! HTTP Route Handlers

pub mod importance;
pub mod options;
pub mod predict;

//! Terminal output

pub mod presenter;

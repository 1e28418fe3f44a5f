//! Shared test utilities

#![allow(dead_code)]

mod upstream;

pub use upstream::*;

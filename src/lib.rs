// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod convert;
pub mod decoder;
pub mod progress;
pub mod repair;
pub mod rewriter;
pub mod scanner;
pub mod tables;

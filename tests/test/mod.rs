#![allow(dead_code)]

pub mod assertions;
pub mod chart;
pub mod prelude;

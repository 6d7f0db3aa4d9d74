pub use super::assertions::*;
pub use super::chart::{search, values_from, TestChart};

pub use airflow_chart_tests::{ChartValues, Error, RenderOptions};
pub use indoc::indoc;
pub use rstest::rstest;
pub use serde_json::{json, Value};
pub use spectral::prelude::*;

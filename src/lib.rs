//! Rendering of the Airflow chart's persistent volume claims
//!
//! The chart is rendered from user supplied values in the same way as
//! `helm template` does and the resulting documents can be inspected with
//! path queries:
//!
//! ```
//! use airflow_chart_tests::{query, render_chart, Chart, ChartValues, RenderOptions};
//! use serde_json::json;
//!
//! let chart = Chart::airflow()?;
//! let values = ChartValues::from_yaml("dags: {persistence: {enabled: true, size: 1G}}")?;
//! let options = RenderOptions::new()
//!     .values(values)
//!     .show_only(["templates/dags-persistent-volume-claim.yaml"]);
//!
//! let documents = render_chart(&chart, &options)?;
//!
//! assert_eq!(documents.len(), 1);
//! assert_eq!(
//!     query(&documents[0], "spec.resources.requests.storage")?,
//!     Some(&json!("1G"))
//! );
//! # Ok::<(), airflow_chart_tests::Error>(())
//! ```

pub mod chart;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod placeholder;
pub mod query;
pub mod template;
pub mod values;

pub use chart::{render_chart, Chart, ChartMetadata, ReleaseContext, RenderOptions};
pub use error::{Error, Result};
pub use query::{query, search};
pub use values::ChartValues;

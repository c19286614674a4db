//! LUMIN Core - shared library for LUMIN.AI GitHub automation
//!
//! This crate holds everything that does not talk to GitHub: configuration
//! and secrets, the label taxonomy, markdown extractors, the documentation
//! index and the CI check runner.

pub mod ci;
pub mod config;
pub mod docs;
pub mod error;
pub mod extract;
pub mod secrets;
pub mod taxonomy;

pub use ci::{run_subprocess_check, CiCheck, CiReport, CiSummary};
pub use config::{AutomationConfig, Config, GitHubConfig};
pub use docs::{DocIndex, DocSection};
pub use error::{Error, Result};
pub use extract::{EpicSpec, IssueSpec, MilestoneSpec};
pub use secrets::Secrets;
pub use taxonomy::{LabelCategory, LabelCorrection, LabelDef, Taxonomy, Violation};

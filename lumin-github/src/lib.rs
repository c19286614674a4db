//! LUMIN GitHub - GitHub integration for LUMIN.AI automation
//!
//! This crate provides REST and GraphQL access to one repository, the
//! creators for issues, epics, labels and milestones, the Projects V2 board
//! synchronizer, the label audit and the setup validator.

pub mod api;
pub mod audit;
pub mod cleanup;
mod client;
pub mod create;
pub mod docs;
mod error;
pub mod graphql;
pub mod issues;
pub mod labels;
pub mod milestones;
pub mod project;
pub mod setup;

#[cfg(test)]
mod stub;

pub use api::{GitHubApi, StateFilter};
pub use audit::{correct_repository, validate_repository, AuditReport};
pub use client::{parse_github_url, GitHubClient};
pub use create::{create_epics, create_issue, create_issues, BatchReport, CreateOptions};
pub use error::{Error, Result};
pub use issues::{Comment, Issue, IssueState, IssueUpdate, NewIssue};
pub use labels::{create_taxonomy_labels, ensure_labels, Label, NewLabel};
pub use milestones::{create_milestones, Milestone, NewMilestone};
pub use project::{
    issues_to_sync, project_item_count, sync_issues, AttachOutcome, ProjectBoard, SyncCandidate,
};
pub use setup::{SetupReport, SetupValidator, ValidationResult};

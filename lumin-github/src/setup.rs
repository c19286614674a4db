//! Setup validation for the board automation
//!
//! Every check is independent and always produces a [`ValidationResult`];
//! failures never abort the run. Failed checks may carry shell lines that fix
//! them, and [`SetupReport::setup_script`] strings those together. A fix that
//! cannot be automated is a `# ` comment line so the script still runs.

use std::collections::{BTreeSet, HashMap};
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::graphql::{self, Nodes};
use crate::project::{ProjectBoard, ProjectField};
use crate::{GitHubApi, Result};

const CLI_AUTH_TIMEOUT: Duration = Duration::from_secs(10);

const TOKEN_SCOPES_NOTE: &str = "# Token needs the repo, project and write:packages scopes";
const CHECK_CLI_NOTE: &str = "# Check the GitHub CLI installation, then run: gh auth login";

/// Fields fetched when checking the board schema
const FIELD_SCAN: u32 = 50;

pub const REQUIRED_LABELS: &[&str] = &[
    "project",
    "ux-design",
    "data-science",
    "deep-learning",
    "web-development",
    "roadmap",
];

const PRIORITY_OPTIONS: &[&str] = &["high", "medium", "low"];

const TRACK_OPTIONS: &[&str] = &[
    "project",
    "ux-design",
    "data-science",
    "deep-learning",
    "web-development",
    "other",
];

/// Outcome of one setup check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    /// Shell lines that fix a failed check: commands, or `# ` notes
    pub fix_instructions: Option<String>,
    pub critical: bool,
}

impl ValidationResult {
    fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: message.into(),
            fix_instructions: None,
            critical: true,
        }
    }

    fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            passed: false,
            ..Self::pass(name, message)
        }
    }

    fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix_instructions = Some(fix.into());
        self
    }

    fn non_critical(mut self) -> Self {
        self.critical = false;
        self
    }
}

/// All setup checks of one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetupReport {
    pub results: Vec<ValidationResult>,
}

impl SetupReport {
    /// True only when every check passed
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn critical_failures(&self) -> usize {
        self.results.iter().filter(|r| !r.passed && r.critical).count()
    }

    /// Log every result and the verdict
    pub fn log_summary(&self) {
        for result in &self.results {
            if result.passed {
                info!(check = %result.name, "{}", result.message);
            } else {
                warn!(check = %result.name, critical = result.critical, "{}", result.message);
                if let Some(fix) = &result.fix_instructions {
                    info!(check = %result.name, "Fix: {}", fix);
                }
            }
        }

        if self.passed() {
            info!("All validations passed; project is ready for automation");
        } else {
            warn!(
                critical = self.critical_failures(),
                "Setup validation failed; fix the issues above before running automation"
            );
        }
    }

    /// Bash script running the fix of every failed check
    pub fn setup_script(&self) -> String {
        let mut lines = vec![
            "#!/bin/bash".to_string(),
            "# Auto-generated setup script for LUMIN.AI project".to_string(),
            "# Run this script to fix validation issues".to_string(),
            String::new(),
            "set -e".to_string(),
            String::new(),
            "echo '🔧 Setting up LUMIN.AI project...'".to_string(),
            String::new(),
        ];

        for result in self.results.iter().filter(|r| !r.passed) {
            if let Some(fix) = &result.fix_instructions {
                lines.push(format!("# Fix: {}", result.name));
                lines.push(format!("echo 'Fixing {}...'", result.name));
                lines.push(fix.clone());
                lines.push(String::new());
            }
        }

        lines.push("echo '✅ Setup complete! Run validation again to verify.'".to_string());
        lines.push(String::new());
        lines.join("\n")
    }

    /// Write [`Self::setup_script`] to `path` as an executable file
    pub fn write_setup_script(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(lumin_core::Error::from)?;
        }
        std::fs::write(path, self.setup_script()).map_err(lumin_core::Error::from)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
                .map_err(lumin_core::Error::from)?;
        }

        info!(path = %path.display(), "Generated setup script");
        Ok(())
    }
}

#[derive(Deserialize)]
struct RepositoryData<T> {
    repository: T,
}

#[derive(Deserialize)]
struct IssueCountData {
    issues: TotalCount,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalCount {
    total_count: u64,
}

#[derive(Deserialize)]
struct LabelsData {
    labels: Nodes<LabelName>,
}

#[derive(Deserialize)]
struct LabelName {
    name: String,
}

/// Runs the setup checks against one repository and board
pub struct SetupValidator<'a> {
    api: &'a dyn GitHubApi,
    project: String,
    gh_program: String,
}

impl<'a> SetupValidator<'a> {
    pub fn new(api: &'a dyn GitHubApi, project: impl Into<String>) -> Self {
        Self {
            api,
            project: project.into(),
            gh_program: "gh".to_string(),
        }
    }

    /// Use another executable in place of `gh`
    pub fn with_gh_program(mut self, program: impl Into<String>) -> Self {
        self.gh_program = program.into();
        self
    }

    /// Run every check
    pub async fn run(&self) -> SetupReport {
        info!(project = %self.project, "Starting project setup validation");

        let mut results = vec![
            check_cli_auth(&self.gh_program).await,
            self.check_token().await,
        ];

        let board = match ProjectBoard::find(self.api, &self.project).await {
            Ok(board) => {
                results.push(ValidationResult::pass(
                    "Projects V2 Board Existence",
                    format!("Project '{}' found (ID: {})", board.title, board.id),
                ));
                Some(board)
            }
            Err(e) => {
                debug!(error = %e, "Project lookup failed");
                results.push(
                    ValidationResult::fail(
                        "Projects V2 Board Existence",
                        format!("Project '{}' not found", self.project),
                    )
                    .with_fix(format!(
                        "gh project create --owner {} --title '{}'",
                        self.api.owner(),
                        self.project
                    )),
                );
                None
            }
        };

        results.push(self.check_issues().await);
        results.push(self.check_labels().await);

        match board {
            Some(board) => match board.fields(self.api, FIELD_SCAN).await {
                Ok(fields) => results.extend(check_fields(&fields)),
                Err(e) => results.push(ValidationResult::fail(
                    "Project Fields Validation",
                    format!("Failed to fetch project fields: {}", e),
                )),
            },
            None => results.push(ValidationResult::fail(
                "Project Fields Validation",
                "Cannot validate fields - project not found",
            )),
        }

        SetupReport { results }
    }

    async fn check_token(&self) -> ValidationResult {
        const NAME: &str = "GitHub Token Permissions";
        match self.api.graphql(graphql::VIEWER, json!({})).await {
            Ok(data) if data.get("viewer").is_some_and(|v| !v.is_null()) => {
                ValidationResult::pass(NAME, "GitHub token has valid permissions")
            }
            Ok(_) => ValidationResult::fail(NAME, "GitHub token lacks required permissions")
                .with_fix(TOKEN_SCOPES_NOTE),
            Err(e) => ValidationResult::fail(NAME, format!("Error validating token: {}", e))
                .with_fix(TOKEN_SCOPES_NOTE),
        }
    }

    async fn check_issues(&self) -> ValidationResult {
        const NAME: &str = "Repository Issues";
        let result: Result<RepositoryData<IssueCountData>> = graphql::query(
            self.api,
            graphql::OPEN_ISSUE_COUNT,
            json!({ "owner": self.api.owner(), "repo": self.api.repo() }),
        )
        .await;

        match result.map(|d| d.repository.issues.total_count) {
            Ok(0) => ValidationResult::fail(NAME, "No open issues found")
                .with_fix("# Populate the repository: lumin issues create issues.json"),
            Ok(n) => ValidationResult::pass(NAME, format!("Found {} open issues", n)),
            Err(e) => ValidationResult::fail(NAME, format!("Error checking issues: {}", e)),
        }
    }

    async fn check_labels(&self) -> ValidationResult {
        const NAME: &str = "Track Labels";
        let result: Result<RepositoryData<LabelsData>> = graphql::query(
            self.api,
            graphql::REPO_LABELS,
            json!({ "owner": self.api.owner(), "repo": self.api.repo() }),
        )
        .await;

        let existing: BTreeSet<String> = match result {
            Ok(data) => data
                .repository
                .labels
                .into_vec()
                .into_iter()
                .map(|l| l.name.to_lowercase())
                .collect(),
            Err(e) => return ValidationResult::fail(NAME, format!("Error checking labels: {}", e)),
        };

        let missing: Vec<&str> = REQUIRED_LABELS
            .iter()
            .copied()
            .filter(|l| !existing.contains(*l))
            .collect();
        if missing.is_empty() {
            return ValidationResult::pass(
                NAME,
                format!("All required track labels found: {}", REQUIRED_LABELS.join(", ")),
            );
        }

        ValidationResult::fail(NAME, format!("Missing track labels: {}", missing.join(", ")))
            .with_fix(
                missing
                    .iter()
                    .map(|label| {
                        format!("gh label create {} --repo {}/{}", label, self.api.owner(), self.api.repo())
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
    }
}

/// `gh auth status`, bounded by a timeout
pub async fn check_cli_auth(program: &str) -> ValidationResult {
    const NAME: &str = "GitHub CLI Authentication";
    let mut command = Command::new(program);
    command
        .args(["auth", "status"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match tokio::time::timeout(CLI_AUTH_TIMEOUT, command.output()).await {
        Ok(Ok(output)) if output.status.success() => {
            ValidationResult::pass(NAME, "GitHub CLI is authenticated")
        }
        Ok(Ok(_)) => ValidationResult::fail(NAME, "GitHub CLI is not authenticated")
            .with_fix("gh auth login --with-token <<< \"$GITHUB_TOKEN\""),
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
            ValidationResult::fail("GitHub CLI Installation", "GitHub CLI is not installed")
                .with_fix("# Install GitHub CLI: https://cli.github.com/")
        }
        Ok(Err(e)) => {
            ValidationResult::fail(NAME, format!("Error checking GitHub CLI auth: {}", e))
                .with_fix(CHECK_CLI_NOTE)
        }
        Err(_) => ValidationResult::fail(
            NAME,
            format!("GitHub CLI auth check timed out after {:?}", CLI_AUTH_TIMEOUT),
        )
        .with_fix(CHECK_CLI_NOTE),
    }
}

enum FieldRule {
    Number,
    SingleSelect(&'static [&'static str]),
    Exists,
}

const REQUIRED_FIELDS: &[(&str, FieldRule)] = &[
    ("Week", FieldRule::Number),
    ("Priority", FieldRule::SingleSelect(PRIORITY_OPTIONS)),
    ("Track", FieldRule::SingleSelect(TRACK_OPTIONS)),
    ("Status", FieldRule::Exists),
];

/// Check the board's fields against the schema the automation writes to
pub fn check_fields(fields: &[ProjectField]) -> Vec<ValidationResult> {
    let by_name: HashMap<&str, &ProjectField> =
        fields.iter().map(|f| (f.name.as_str(), f)).collect();

    REQUIRED_FIELDS
        .iter()
        .map(|(name, rule)| {
            let Some(field) = by_name.get(name) else {
                return ValidationResult::fail(
                    format!("Field '{}' Existence", name),
                    format!("Required field '{}' is missing", name),
                );
            };

            match rule {
                FieldRule::Exists => ValidationResult::pass(
                    format!("Field '{}' Existence", name),
                    format!("Field '{}' exists (options not checked)", name),
                )
                .non_critical(),
                FieldRule::Number if field.data_type.as_deref() != Some("NUMBER") => {
                    ValidationResult::fail(
                        format!("Field '{}' Type", name),
                        format!("Field '{}' has wrong type. Expected NUMBER", name),
                    )
                }
                FieldRule::SingleSelect(_) if !field.is_single_select() => ValidationResult::fail(
                    format!("Field '{}' Type", name),
                    format!("Field '{}' has wrong type. Expected SINGLE_SELECT", name),
                ),
                FieldRule::SingleSelect(expected) => {
                    let missing: Vec<&str> = expected
                        .iter()
                        .copied()
                        .filter(|o| field.option(o).is_none())
                        .collect();
                    if missing.is_empty() {
                        ValidationResult::pass(
                            format!("Field '{}'", name),
                            format!("Field '{}' is configured correctly", name),
                        )
                        .non_critical()
                    } else {
                        ValidationResult::fail(
                            format!("Field '{}' Options", name),
                            format!("Field '{}' is missing options: {}", name, missing.join(", ")),
                        )
                    }
                }
                FieldRule::Number => ValidationResult::pass(
                    format!("Field '{}'", name),
                    format!("Field '{}' is configured correctly", name),
                )
                .non_critical(),
            }
        })
        .collect()
}

//! In-memory [`GitHubApi`] for unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::issues::{Comment, Issue, IssueState, IssueUpdate, NewIssue};
use crate::labels::{Label, NewLabel};
use crate::milestones::{Milestone, NewMilestone};
use crate::{Error, GitHubApi, Result, StateFilter};

#[derive(Default)]
struct State {
    issues: Vec<Issue>,
    labels: Vec<Label>,
    milestones: Vec<Milestone>,
    comments: HashMap<u64, Vec<Comment>>,
    graphql_responses: VecDeque<Result<Value>>,
    graphql_calls: Vec<(String, Value)>,
    created_issues: Vec<NewIssue>,
    created_labels: Vec<NewLabel>,
    created_milestones: Vec<NewMilestone>,
    updates: Vec<(u64, IssueUpdate)>,
    locked: Vec<u64>,
    searches: Vec<String>,
    calls: Vec<&'static str>,
    writes: usize,
    failing_title: Option<String>,
    failing_lock: bool,
    next_comment_id: u64,
}

pub(crate) struct StubApi {
    state: Mutex<State>,
}

pub(crate) fn issue(number: u64, title: &str, labels: &[&str]) -> Issue {
    Issue {
        number,
        node_id: format!("I_{}", number),
        title: title.to_string(),
        body: String::new(),
        state: IssueState::Open,
        labels: labels.iter().map(|l| l.to_string()).collect(),
        milestone: None,
        is_pull_request: false,
    }
}

impl StubApi {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub(crate) fn with_labels(self, names: &[&str]) -> Self {
        self.state().labels.extend(names.iter().map(|n| Label {
            name: n.to_string(),
            color: "ededed".to_string(),
            description: None,
        }));
        self
    }

    /// Milestones numbered from 1 in the given order
    pub(crate) fn with_milestones(self, titles: &[&str]) -> Self {
        {
            let mut state = self.state();
            for title in titles {
                let number = state.milestones.len() as u64 + 1;
                state.milestones.push(Milestone {
                    number,
                    title: title.to_string(),
                    description: None,
                    due_on: None,
                    state: "open".to_string(),
                });
            }
        }
        self
    }

    pub(crate) fn with_issues(self, issues: Vec<Issue>) -> Self {
        self.state().issues.extend(issues);
        self
    }

    pub(crate) fn with_comment(self, number: u64, body: &str) -> Self {
        {
            let mut state = self.state();
            state.next_comment_id += 1;
            let id = state.next_comment_id;
            state.comments.entry(number).or_default().push(Comment {
                id,
                body: body.to_string(),
            });
        }
        self
    }

    /// Creating an issue with this title fails
    pub(crate) fn failing_issue_title(self, title: &str) -> Self {
        self.state().failing_title = Some(title.to_string());
        self
    }

    pub(crate) fn failing_lock(self) -> Self {
        self.state().failing_lock = true;
        self
    }

    pub(crate) fn push_graphql(&self, data: Value) {
        self.state().graphql_responses.push_back(Ok(data));
    }

    pub(crate) fn push_graphql_error(&self, message: &str) {
        self.state()
            .graphql_responses
            .push_back(Err(Error::GraphQL(message.to_string())));
    }

    pub(crate) fn graphql_calls(&self) -> Vec<(String, Value)> {
        self.state().graphql_calls.clone()
    }

    pub(crate) fn created_issues(&self) -> Vec<NewIssue> {
        self.state().created_issues.clone()
    }

    pub(crate) fn created_labels(&self) -> Vec<NewLabel> {
        self.state().created_labels.clone()
    }

    pub(crate) fn created_milestones(&self) -> Vec<NewMilestone> {
        self.state().created_milestones.clone()
    }

    pub(crate) fn milestone_titles(&self) -> Vec<String> {
        self.state().milestones.iter().map(|m| m.title.clone()).collect()
    }

    pub(crate) fn updates(&self) -> Vec<(u64, IssueUpdate)> {
        self.state().updates.clone()
    }

    pub(crate) fn locked(&self) -> Vec<u64> {
        self.state().locked.clone()
    }

    pub(crate) fn searches(&self) -> Vec<String> {
        self.state().searches.clone()
    }

    pub(crate) fn comments_on(&self, number: u64) -> Vec<String> {
        self.state()
            .comments
            .get(&number)
            .map(|c| c.iter().map(|c| c.body.clone()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn write_count(&self) -> usize {
        self.state().writes
    }

    pub(crate) fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub(crate) fn calls_to(&self, name: &str) -> usize {
        self.state().calls.iter().filter(|c| **c == name).count()
    }

    fn record(&self, call: &'static str, write: bool) {
        let mut state = self.state();
        state.calls.push(call);
        if write {
            state.writes += 1;
        }
    }
}

fn matches_state(state: IssueState, filter: StateFilter) -> bool {
    match filter {
        StateFilter::All => true,
        StateFilter::Open => state == IssueState::Open,
        StateFilter::Closed => state == IssueState::Closed,
    }
}

#[async_trait]
impl GitHubApi for StubApi {
    fn owner(&self) -> &str {
        "lumin"
    }

    fn repo(&self) -> &str {
        "lumin-ai"
    }

    async fn list_issues(&self, filter: StateFilter) -> Result<Vec<Issue>> {
        self.record("list_issues", false);
        Ok(self
            .state()
            .issues
            .iter()
            .filter(|i| matches_state(i.state, filter))
            .cloned()
            .collect())
    }

    async fn create_issue(&self, new: &NewIssue) -> Result<Issue> {
        self.record("create_issue", true);
        let mut state = self.state();
        if state.failing_title.as_deref() == Some(new.title.as_str()) {
            return Err(Error::Status {
                status: 422,
                body: "Validation Failed".to_string(),
            });
        }

        let number = state.issues.iter().map(|i| i.number).max().unwrap_or(0) + 1;
        let milestone = new.milestone.and_then(|n| {
            state
                .milestones
                .iter()
                .find(|m| m.number == n)
                .map(|m| m.title.clone())
        });
        let created = Issue {
            number,
            node_id: format!("I_{}", number),
            title: new.title.clone(),
            body: new.body.clone(),
            state: IssueState::Open,
            labels: new.labels.clone(),
            milestone,
            is_pull_request: false,
        };
        state.issues.push(created.clone());
        state.created_issues.push(new.clone());
        Ok(created)
    }

    async fn update_issue(&self, number: u64, update: &IssueUpdate) -> Result<Issue> {
        self.record("update_issue", true);
        let mut state = self.state();
        state.updates.push((number, update.clone()));
        let issue = state
            .issues
            .iter_mut()
            .find(|i| i.number == number)
            .ok_or_else(|| Error::NotFound(format!("issue #{}", number)))?;

        if let Some(title) = &update.title {
            issue.title = title.clone();
        }
        if let Some(body) = &update.body {
            issue.body = body.clone();
        }
        if let Some(s) = update.state {
            issue.state = s;
        }
        if let Some(labels) = &update.labels {
            issue.labels = labels.clone();
        }
        Ok(issue.clone())
    }

    async fn lock_issue(&self, number: u64) -> Result<()> {
        self.record("lock_issue", true);
        let mut state = self.state();
        if state.failing_lock {
            return Err(Error::Status {
                status: 403,
                body: "Resource not accessible".to_string(),
            });
        }
        state.locked.push(number);
        Ok(())
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<Comment>> {
        self.record("list_comments", false);
        Ok(self.state().comments.get(&number).cloned().unwrap_or_default())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<Comment> {
        self.record("create_comment", true);
        let mut state = self.state();
        state.next_comment_id += 1;
        let comment = Comment {
            id: state.next_comment_id,
            body: body.to_string(),
        };
        state.comments.entry(number).or_default().push(comment.clone());
        Ok(comment)
    }

    /// Open issues; the query is only recorded
    async fn search_issues(&self, query: &str) -> Result<Vec<Issue>> {
        self.record("search_issues", false);
        let mut state = self.state();
        state.searches.push(query.to_string());
        Ok(state
            .issues
            .iter()
            .filter(|i| i.state == IssueState::Open)
            .cloned()
            .collect())
    }

    async fn list_labels(&self) -> Result<Vec<Label>> {
        self.record("list_labels", false);
        Ok(self.state().labels.clone())
    }

    async fn create_label(&self, label: &NewLabel) -> Result<Label> {
        self.record("create_label", true);
        let mut state = self.state();
        let created = Label {
            name: label.name.clone(),
            color: label.color.clone(),
            description: label.description.clone(),
        };
        state.labels.push(created.clone());
        state.created_labels.push(label.clone());
        Ok(created)
    }

    async fn list_milestones(&self, _filter: StateFilter) -> Result<Vec<Milestone>> {
        self.record("list_milestones", false);
        Ok(self.state().milestones.clone())
    }

    async fn create_milestone(&self, milestone: &NewMilestone) -> Result<Milestone> {
        self.record("create_milestone", true);
        let mut state = self.state();
        let created = Milestone {
            number: state.milestones.len() as u64 + 1,
            title: milestone.title.clone(),
            description: milestone.description.clone(),
            due_on: None,
            state: "open".to_string(),
        };
        state.milestones.push(created.clone());
        state.created_milestones.push(milestone.clone());
        Ok(created)
    }

    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let mutation = query.trim_start().starts_with("mutation");
        self.record("graphql", mutation);
        let mut state = self.state();
        state.graphql_calls.push((query.to_string(), variables));
        state
            .graphql_responses
            .pop_front()
            .unwrap_or_else(|| Err(Error::Other("no stubbed GraphQL response".to_string())))
    }
}

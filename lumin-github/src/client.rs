//! GitHub API client using octocrab for REST and reqwest for GraphQL

use async_trait::async_trait;
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::api::{GitHubApi, StateFilter};
use crate::error::{from_octocrab, from_status};
use crate::graphql::GraphQLResponse;
use crate::issues::{Comment, Issue, IssueUpdate, NewIssue};
use crate::labels::{Label, NewLabel};
use crate::milestones::{Milestone, NewMilestone};
use crate::{Error, Result};

const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: usize = 100;

/// GitHub API client for one repository
pub struct GitHubClient {
    client: Octocrab,
    http: reqwest::Client,
    graphql_url: String,
    token: String,
    owner: String,
    repo: String,
}

#[derive(Serialize)]
struct PageQuery<'a> {
    state: &'a str,
    per_page: usize,
    page: u32,
}

#[derive(Serialize)]
struct PerPage {
    per_page: usize,
    page: u32,
}

#[derive(Serialize)]
struct SearchQuery<'a> {
    q: &'a str,
    per_page: usize,
}

#[derive(Deserialize)]
struct SearchResults {
    items: Vec<Issue>,
}

impl GitHubClient {
    /// Create a client for `owner/repo` authenticated with `token`
    pub fn new(token: &str, owner: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        Self::with_base_url(token, owner, repo, DEFAULT_API_URL)
    }

    /// Create a client against a different API root (GitHub Enterprise, tests)
    pub fn with_base_url(
        token: &str,
        owner: impl Into<String>,
        repo: impl Into<String>,
        base_url: &str,
    ) -> Result<Self> {
        let owner = owner.into();
        let repo = repo.into();
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(Error::Auth("GitHub token is empty".to_string()));
        }

        let base_url = base_url.trim_end_matches('/');
        let client = Octocrab::builder()
            .base_uri(base_url)
            .map_err(|e| Error::Other(format!("Invalid API URL {}: {}", base_url, e)))?
            .personal_token(token.clone())
            .add_header(
                "X-GitHub-Api-Version".parse().map_err(|_| {
                    Error::Other("Invalid header name".to_string())
                })?,
                API_VERSION.to_string(),
            )
            .add_retry_config(RetryConfig::None)
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("lumin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(owner = %owner, repo = %repo, "Created GitHub client");

        Ok(Self {
            client,
            http,
            graphql_url: format!("{}/graphql", base_url),
            token,
            owner,
            repo,
        })
    }

    /// Create a client from a repository reference
    ///
    /// Supports formats:
    /// - owner/repo
    /// - https://github.com/owner/repo
    /// - git@github.com:owner/repo.git
    pub fn from_url(token: &str, url: &str) -> Result<Self> {
        let (owner, repo) = parse_github_url(url)?;
        Self::new(token, owner, repo)
    }

    fn route(&self, tail: &str) -> String {
        format!("/repos/{}/{}{}", self.owner, self.repo, tail)
    }

    async fn get_pages<T>(&self, tail: &str, state: Option<StateFilter>, what: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        let route = self.route(tail);
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let items: Vec<T> = match state {
                Some(state) => {
                    let params = PageQuery {
                        state: state.as_str(),
                        per_page: PAGE_SIZE,
                        page,
                    };
                    self.client.get(&route, Some(&params)).await
                }
                None => {
                    let params = PerPage {
                        per_page: PAGE_SIZE,
                        page,
                    };
                    self.client.get(&route, Some(&params)).await
                }
            }
            .map_err(|e| from_octocrab(e, what))?;

            let short = items.len() < PAGE_SIZE;
            all.extend(items);
            if short {
                break;
            }
            page += 1;
        }
        debug!(route = %route, count = all.len(), "Fetched all pages");
        Ok(all)
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn repo(&self) -> &str {
        &self.repo
    }

    async fn list_issues(&self, state: StateFilter) -> Result<Vec<Issue>> {
        let issues: Vec<Issue> = self
            .get_pages("/issues", Some(state), "repository issues")
            .await?;
        info!(count = issues.len(), state = state.as_str(), "Fetched issues");
        Ok(issues)
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue> {
        debug!(title = %issue.title, "Creating issue");
        self.client
            .post(self.route("/issues"), Some(issue))
            .await
            .map_err(|e| from_octocrab(e, format!("repository {}/{}", self.owner, self.repo)))
    }

    async fn update_issue(&self, number: u64, update: &IssueUpdate) -> Result<Issue> {
        debug!(number, "Updating issue");
        self.client
            .patch(self.route(&format!("/issues/{}", number)), Some(update))
            .await
            .map_err(|e| from_octocrab(e, format!("issue #{}", number)))
    }

    async fn lock_issue(&self, number: u64) -> Result<()> {
        debug!(number, "Locking issue");
        self.client
            .issues(&self.owner, &self.repo)
            .lock(number, octocrab::params::LockReason::Resolved)
            .await
            .map_err(|e| from_octocrab(e, format!("issue #{}", number)))?;
        Ok(())
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<Comment>> {
        self.get_pages(
            &format!("/issues/{}/comments", number),
            None,
            &format!("issue #{}", number),
        )
        .await
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<Comment> {
        self.client
            .post(
                self.route(&format!("/issues/{}/comments", number)),
                Some(&json!({ "body": body })),
            )
            .await
            .map_err(|e| from_octocrab(e, format!("issue #{}", number)))
    }

    async fn search_issues(&self, query: &str) -> Result<Vec<Issue>> {
        let q = format!("repo:{}/{} {}", self.owner, self.repo, query);
        let params = SearchQuery {
            q: &q,
            per_page: PAGE_SIZE,
        };
        let results: SearchResults = self
            .client
            .get("/search/issues", Some(&params))
            .await
            .map_err(|e| from_octocrab(e, "search results"))?;
        info!(count = results.items.len(), query = %q, "Searched issues");
        Ok(results.items)
    }

    async fn list_labels(&self) -> Result<Vec<Label>> {
        self.get_pages("/labels", None, "repository labels").await
    }

    async fn create_label(&self, label: &NewLabel) -> Result<Label> {
        self.client
            .post(self.route("/labels"), Some(label))
            .await
            .map_err(|e| from_octocrab(e, format!("label {}", label.name)))
    }

    async fn list_milestones(&self, state: StateFilter) -> Result<Vec<Milestone>> {
        self.get_pages("/milestones", Some(state), "repository milestones")
            .await
    }

    async fn create_milestone(&self, milestone: &NewMilestone) -> Result<Milestone> {
        self.client
            .post(self.route("/milestones"), Some(milestone))
            .await
            .map_err(|e| from_octocrab(e, format!("milestone {}", milestone.title)))
    }

    async fn graphql(&self, query: &str, variables: serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .http
            .post(&self.graphql_url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            return Err(from_status(status, body));
        }

        let envelope: GraphQLResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse GraphQL response: {}", e)))?;
        envelope.into_data()
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("graphql_url", &self.graphql_url)
            .finish_non_exhaustive()
    }
}

/// Parse a repository reference into owner and repo
pub fn parse_github_url(url: &str) -> Result<(String, String)> {
    let invalid = || {
        Error::Parse(format!(
            "Invalid repository format: {}. Expected owner/repo",
            url
        ))
    };

    if !url.contains("://") && !url.starts_with("git@") {
        let (owner, repo) = url.split_once('/').ok_or_else(invalid)?;
        let repo = repo.trim_end_matches(".git");
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(invalid());
        }
        return Ok((owner.to_string(), repo.to_string()));
    }

    // https://github.com/owner/repo
    if url.starts_with("https://") || url.starts_with("http://") {
        let parsed = url::Url::parse(url).map_err(|e| Error::Parse(e.to_string()))?;
        let path = parsed.path().trim_start_matches('/').trim_end_matches(".git");
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() >= 2 && !parts[0].is_empty() && !parts[1].is_empty() {
            return Ok((parts[0].to_string(), parts[1].to_string()));
        }
        return Err(Error::Parse(format!("Invalid GitHub URL path: {}", path)));
    }

    // git@github.com:owner/repo.git
    if let Some((_, path)) = url.split_once(':') {
        let path = path.trim_end_matches(".git");
        if let Some((owner, repo)) = path.split_once('/') {
            if !owner.is_empty() && !repo.is_empty() {
                return Ok((owner.to_string(), repo.to_string()));
            }
        }
    }
    Err(Error::Parse(format!("Invalid SSH URL: {}", url)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::with_base_url("test-token", "uelkerd", "lumin-ai", &server.uri()).unwrap()
    }

    fn issue_json(number: u64, title: &str) -> serde_json::Value {
        json!({
            "number": number,
            "node_id": format!("I_{}", number),
            "title": title,
            "body": "",
            "state": "open",
            "labels": []
        })
    }

    #[test]
    fn test_parse_shorthand() {
        let (owner, repo) = parse_github_url("owner/repo").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_https_url_with_git_suffix() {
        let (owner, repo) = parse_github_url("https://github.com/owner/repo.git").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_ssh_url() {
        let (owner, repo) = parse_github_url("git@github.com:owner/repo.git").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_github_url("invalid").is_err());
        assert!(parse_github_url("a/b/c").is_err());
    }

    #[tokio::test]
    async fn test_empty_token_rejected() {
        assert!(matches!(
            GitHubClient::new("  ", "o", "r"),
            Err(Error::Auth(_))
        ));
    }

    #[tokio::test]
    async fn test_debug_hides_token() {
        let client = GitHubClient::new("secret-token", "o", "r").unwrap();
        assert!(!format!("{:?}", client).contains("secret-token"));
    }

    #[tokio::test]
    async fn test_list_issues_pages_until_short_page() {
        let server = MockServer::start().await;
        let first: Vec<_> = (1..=100).map(|n| issue_json(n, "x")).collect();
        Mock::given(method("GET"))
            .and(path("/repos/uelkerd/lumin-ai/issues"))
            .and(query_param("page", "1"))
            .and(query_param("state", "all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(first))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/uelkerd/lumin-ai/issues"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![issue_json(101, "last")]))
            .mount(&server)
            .await;

        let issues = client(&server).list_issues(StateFilter::All).await.unwrap();
        assert_eq!(issues.len(), 101);
        assert_eq!(issues[100].title, "last");
    }

    #[tokio::test]
    async fn test_rest_get_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/uelkerd/lumin-ai/labels"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"message": "Server Error"})),
            )
            .mount(&server)
            .await;

        assert!(client(&server).list_labels().await.is_err());
    }

    #[tokio::test]
    async fn test_rest_not_found_is_distinguished() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/repos/uelkerd/lumin-ai/issues/999"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Not Found",
                "documentation_url": "https://docs.github.com/rest"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .update_issue(999, &IssueUpdate::close())
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_rest_post_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/uelkerd/lumin-ai/issues"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "Validation Failed",
                "documentation_url": "https://docs.github.com/rest"
            })))
            .mount(&server)
            .await;

        let issue = NewIssue {
            title: "t".to_string(),
            body: "b".to_string(),
            ..Default::default()
        };
        assert!(client(&server).create_issue(&issue).await.is_err());
    }

    #[tokio::test]
    async fn test_create_issue_sends_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/uelkerd/lumin-ai/issues"))
            .and(body_partial_json(json!({"title": "New", "labels": ["project"], "milestone": 2})))
            .respond_with(ResponseTemplate::new(201).set_body_json(issue_json(5, "New")))
            .expect(1)
            .mount(&server)
            .await;

        let issue = NewIssue {
            title: "New".to_string(),
            body: "b".to_string(),
            labels: vec!["project".to_string()],
            milestone: Some(2),
            assignees: None,
        };
        let created = client(&server).create_issue(&issue).await.unwrap();
        assert_eq!(created.number, 5);
    }

    #[tokio::test]
    async fn test_graphql_sends_headers_and_returns_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("x-github-api-version", API_VERSION))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"viewer": {"login": "octocat"}}})),
            )
            .mount(&server)
            .await;

        let data = client(&server).graphql("query { viewer { login } }", json!({})).await.unwrap();
        assert_eq!(data["viewer"]["login"], "octocat");
    }

    #[tokio::test]
    async fn test_graphql_non_2xx_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client(&server).graphql("query { viewer { login } }", json!({})).await;
        assert!(matches!(err, Err(Error::Status { status: 502, .. })));
    }

    #[tokio::test]
    async fn test_graphql_bad_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
            .mount(&server)
            .await;

        let err = client(&server).graphql("query { viewer { login } }", json!({})).await;
        assert!(matches!(err, Err(Error::Auth(_))));
    }

    #[tokio::test]
    async fn test_graphql_envelope_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{"message": "Field 'nope' doesn't exist"}]
            })))
            .mount(&server)
            .await;

        let err = client(&server).graphql("query { nope }", json!({})).await;
        assert!(matches!(err, Err(Error::GraphQL(_))));
    }
}

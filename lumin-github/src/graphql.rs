//! GraphQL documents and typed decoding
//!
//! Every document is a constant with `$variables`; nothing is interpolated.
//! Callers decode `data` into a per-query struct through [`query`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::{Error, GitHubApi, Result};

/// Boards of a repository (first 100)
pub const FIND_PROJECTS: &str = r#"
query($owner: String!, $repo: String!) {
  repository(owner: $owner, name: $repo) {
    projectsV2(first: 100) {
      nodes {
        id
        title
        number
      }
    }
  }
}
"#;

/// Field definitions of a board
pub const PROJECT_FIELDS: &str = r#"
query($project: ID!, $first: Int!) {
  node(id: $project) {
    ... on ProjectV2 {
      fields(first: $first) {
        nodes {
          __typename
          ... on ProjectV2Field {
            id
            name
            dataType
          }
          ... on ProjectV2SingleSelectField {
            id
            name
            dataType
            options {
              id
              name
            }
          }
          ... on ProjectV2IterationField {
            id
            name
            dataType
          }
        }
      }
    }
  }
}
"#;

pub const ADD_PROJECT_ITEM: &str = r#"
mutation($project: ID!, $content: ID!) {
  addProjectV2ItemById(input: {projectId: $project, contentId: $content}) {
    item {
      id
    }
  }
}
"#;

pub const SET_SINGLE_SELECT: &str = r#"
mutation($project: ID!, $item: ID!, $field: ID!, $option: String!) {
  updateProjectV2ItemFieldValue(input: {
    projectId: $project
    itemId: $item
    fieldId: $field
    value: {singleSelectOptionId: $option}
  }) {
    projectV2Item {
      id
    }
  }
}
"#;

/// Open issues newest first, with their board placements
pub const OPEN_ISSUES: &str = r#"
query($owner: String!, $repo: String!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    issues(first: 100, after: $cursor, states: OPEN, orderBy: {field: CREATED_AT, direction: DESC}) {
      pageInfo {
        hasNextPage
        endCursor
      }
      nodes {
        id
        number
        title
        projectItems(first: 1) {
          edges {
            node {
              project {
                id
              }
            }
          }
        }
      }
    }
  }
}
"#;

pub const VIEWER: &str = r#"
query {
  viewer {
    login
  }
}
"#;

pub const OPEN_ISSUE_COUNT: &str = r#"
query($owner: String!, $repo: String!) {
  repository(owner: $owner, name: $repo) {
    issues(states: OPEN) {
      totalCount
    }
  }
}
"#;

pub const REPO_LABELS: &str = r#"
query($owner: String!, $repo: String!) {
  repository(owner: $owner, name: $repo) {
    labels(first: 100) {
      nodes {
        name
      }
    }
  }
}
"#;

pub const PROJECT_ITEM_COUNT: &str = r#"
query($project: ID!) {
  node(id: $project) {
    ... on ProjectV2 {
      items(first: 1) {
        totalCount
      }
    }
  }
}
"#;

/// Response envelope of the GraphQL endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct GraphQLResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQLError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl<T> GraphQLResponse<T> {
    /// `data` if there were no errors
    pub(crate) fn into_data(self) -> Result<T> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
            if errors.iter().any(|e| e.kind.as_deref() == Some("RATE_LIMITED")) {
                return Err(Error::RateLimited(messages.join(", ")));
            }
            return Err(Error::GraphQL(messages.join(", ")));
        }
        self.data
            .ok_or_else(|| Error::Parse("GraphQL response missing data".to_string()))
    }
}

/// Run a document and decode its `data` into `T`
pub async fn query<T: DeserializeOwned>(
    api: &dyn GitHubApi,
    document: &str,
    variables: serde_json::Value,
) -> Result<T> {
    debug!(?variables, "Running GraphQL query");
    let data = api.graphql(document, variables).await?;
    serde_json::from_value(data)
        .map_err(|e| Error::Parse(format!("Unexpected GraphQL response shape: {}", e)))
}

/// `{ nodes: [...] }`
#[derive(Debug, Deserialize)]
pub(crate) struct Nodes<T> {
    pub nodes: Vec<Option<T>>,
}

impl<T> Nodes<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        self.nodes.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_errors_win() {
        let response: GraphQLResponse<serde_json::Value> = serde_json::from_value(json!({
            "data": null,
            "errors": [{"message": "Could not resolve to a ProjectV2"}]
        }))
        .unwrap();

        match response.into_data() {
            Err(Error::GraphQL(msg)) => assert!(msg.contains("Could not resolve")),
            other => panic!("expected GraphQL error, got {:?}", other),
        }
    }

    #[test]
    fn test_envelope_rate_limited() {
        let response: GraphQLResponse<serde_json::Value> = serde_json::from_value(json!({
            "errors": [{"type": "RATE_LIMITED", "message": "API rate limit exceeded"}]
        }))
        .unwrap();
        assert!(matches!(response.into_data(), Err(Error::RateLimited(_))));
    }

    #[test]
    fn test_envelope_missing_data() {
        let response: GraphQLResponse<serde_json::Value> =
            serde_json::from_value(json!({})).unwrap();
        assert!(matches!(response.into_data(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_nodes_skip_nulls() {
        let nodes: Nodes<String> = serde_json::from_value(json!({"nodes": ["a", null, "b"]})).unwrap();
        assert_eq!(nodes.into_vec(), vec!["a", "b"]);
    }
}

//! [`ObjectStoreClient`] over the GitHub Git Data API.
//!
//! GitHub's ref update has no expected-old parameter. The compare-and-swap
//! comes from its fast-forward check instead: every commit this client
//! creates has exactly one parent, the head its caller read, so a
//! `force: false` update succeeds only while the ref still equals that head.

use std::time::Duration;

use async_trait::async_trait;
use quill_store::{ObjectStoreClient, Primitive, RefUpdate, StoreError, StoreResult, TreeOverlay};
use quill_types::ObjectId;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::config::{GitHubConfig, API_VERSION};
use crate::error::GitHubError;

#[derive(Deserialize)]
struct Sha {
    sha: String,
}

#[derive(Deserialize)]
struct RefResponse {
    object: Sha,
}

#[derive(Deserialize)]
struct CommitResponse {
    tree: Sha,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Shared `reqwest` client carrying the GitHub headers.
pub(crate) fn http_client(config: &GitHubConfig) -> Result<reqwest::Client, GitHubError> {
    let missing = config.missing();
    if !missing.is_empty() {
        return Err(GitHubError::MissingSettings(missing.join(", ")));
    }
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);
    headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token.trim()))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?)
}

/// The `message` GitHub puts in error bodies, or the raw body.
pub(crate) async fn error_message(resp: Response) -> String {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.message,
        Err(_) if text.trim().is_empty() => status.to_string(),
        Err(_) => text,
    }
}

/// Whether a failed status is worth retrying.
pub(crate) fn is_transient_status(status: StatusCode, message: &str) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && message.to_ascii_lowercase().contains("rate limit"))
}

fn classify(op: Primitive, status: StatusCode, message: &str) -> StoreError {
    let reason = format!("{status}: {message}");
    if is_transient_status(status, message) {
        StoreError::transient(op, reason)
    } else {
        StoreError::invalid(op, reason)
    }
}

fn object_id(op: Primitive, sha: &str) -> StoreResult<ObjectId> {
    ObjectId::from_hex(sha).map_err(|e| StoreError::protocol(op, e))
}

pub struct GitHubClient {
    http: reqwest::Client,
    repo_url: String,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, GitHubError> {
        Ok(Self {
            http: http_client(config)?,
            repo_url: config.repo_url(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/git/{path}", self.repo_url)
    }

    async fn send(&self, op: Primitive, req: RequestBuilder) -> StoreResult<Response> {
        tracing::debug!(operation = %op, "github request");
        req.send()
            .await
            .map_err(|e| StoreError::transient(op, e))
    }

    async fn call<T: DeserializeOwned>(&self, op: Primitive, req: RequestBuilder) -> StoreResult<T> {
        let resp = self.send(op, req).await?;
        let status = resp.status();
        if !status.is_success() {
            let message = error_message(resp).await;
            return Err(classify(op, status, &message));
        }
        resp.json::<T>()
            .await
            .map_err(|e| StoreError::protocol(op, e))
    }
}

#[async_trait]
impl ObjectStoreClient for GitHubClient {
    async fn get_ref(&self, branch: &str) -> StoreResult<ObjectId> {
        let op = Primitive::GetRef;
        let body: RefResponse = self
            .call(op, self.http.get(self.url(&format!("ref/heads/{branch}"))))
            .await?;
        object_id(op, &body.object.sha)
    }

    async fn create_blob(&self, content: &[u8]) -> StoreResult<ObjectId> {
        let op = Primitive::CreateBlob;
        let text = std::str::from_utf8(content)
            .map_err(|_| StoreError::invalid(op, "blob content is not UTF-8"))?;
        let body: Sha = self
            .call(
                op,
                self.http
                    .post(self.url("blobs"))
                    .json(&json!({ "content": text, "encoding": "utf-8" })),
            )
            .await?;
        object_id(op, &body.sha)
    }

    async fn get_tree(&self, commit: &ObjectId) -> StoreResult<ObjectId> {
        let op = Primitive::GetTree;
        let body: CommitResponse = self
            .call(op, self.http.get(self.url(&format!("commits/{commit}"))))
            .await?;
        object_id(op, &body.tree.sha)
    }

    async fn create_tree(&self, base: &ObjectId, entries: &[TreeOverlay]) -> StoreResult<ObjectId> {
        let op = Primitive::CreateTree;
        let tree: Vec<_> = entries
            .iter()
            .map(|e| {
                json!({
                    "path": e.path,
                    "mode": "100644",
                    "type": "blob",
                    "sha": e.blob.as_str(),
                })
            })
            .collect();
        let body: Sha = self
            .call(
                op,
                self.http
                    .post(self.url("trees"))
                    .json(&json!({ "base_tree": base.as_str(), "tree": tree })),
            )
            .await?;
        object_id(op, &body.sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &ObjectId,
        parent: &ObjectId,
    ) -> StoreResult<ObjectId> {
        let op = Primitive::CreateCommit;
        let body: Sha = self
            .call(
                op,
                self.http.post(self.url("commits")).json(&json!({
                    "message": message,
                    "tree": tree.as_str(),
                    "parents": [parent.as_str()],
                })),
            )
            .await?;
        object_id(op, &body.sha)
    }

    // `expected_old` is never sent: GitHub has no conditional ref update.
    // With `new`'s only parent equal to `expected_old`, refusing non fast
    // forwards rejects exactly the moved-ref case.
    async fn update_ref(
        &self,
        branch: &str,
        new: &ObjectId,
        _expected_old: &ObjectId,
    ) -> StoreResult<RefUpdate> {
        let op = Primitive::UpdateRef;
        let req = self
            .http
            .patch(self.url(&format!("refs/heads/{branch}")))
            .json(&json!({ "sha": new.as_str(), "force": false }));
        let resp = self.send(op, req).await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(RefUpdate::Updated);
        }
        let message = error_message(resp).await;
        let conflict = status == StatusCode::CONFLICT
            || (status == StatusCode::UNPROCESSABLE_ENTITY
                && message.to_ascii_lowercase().contains("fast forward"));
        if conflict {
            tracing::debug!(branch, status = %status, "ref moved underneath us");
            return Ok(RefUpdate::Conflict);
        }
        Err(classify(op, status, &message))
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;

    use super::*;

    const HEAD: &str = "1111111111111111111111111111111111111111";
    const BLOB: &str = "2222222222222222222222222222222222222222";
    const TREE: &str = "3333333333333333333333333333333333333333";
    const NEW_TREE: &str = "4444444444444444444444444444444444444444";
    const COMMIT: &str = "5555555555555555555555555555555555555555";

    fn config(server: &MockServer) -> GitHubConfig {
        GitHubConfig {
            api_base: server.base_url(),
            owner: "acme".into(),
            repo: "site".into(),
            token: "t0ken".into(),
            user_agent: "quill-test".into(),
            ..Default::default()
        }
    }

    fn id(hex: &str) -> ObjectId {
        ObjectId::from_hex(hex).unwrap()
    }

    #[test]
    fn refuses_incomplete_config() {
        let err = GitHubClient::new(&GitHubConfig::default()).err().unwrap();
        assert!(err.to_string().contains("owner, repo, token"));
    }

    #[tokio::test]
    async fn get_ref_sends_github_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/acme/site/git/ref/heads/main")
                    .header("authorization", "Bearer t0ken")
                    .header("accept", "application/vnd.github+json")
                    .header("user-agent", "quill-test")
                    .header("x-github-api-version", API_VERSION);
                then.status(200)
                    .json_body(serde_json::json!({"ref": "refs/heads/main", "object": {"sha": HEAD, "type": "commit"}}));
            })
            .await;

        let client = GitHubClient::new(&config(&server)).unwrap();
        assert_eq!(client.get_ref("main").await.unwrap(), id(HEAD));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn full_commit_sequence_against_the_api() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/repos/acme/site/git/blobs")
                    .json_body(serde_json::json!({"content": "{}", "encoding": "utf-8"}));
                then.status(201).json_body(serde_json::json!({"sha": BLOB}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/repos/acme/site/git/commits/{HEAD}"));
                then.status(200)
                    .json_body(serde_json::json!({"sha": HEAD, "tree": {"sha": TREE}}));
            })
            .await;
        let tree_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/repos/acme/site/git/trees")
                    .json_body(serde_json::json!({
                        "base_tree": TREE,
                        "tree": [{"path": "_data/resumes/r1.json", "mode": "100644", "type": "blob", "sha": BLOB}]
                    }));
                then.status(201).json_body(serde_json::json!({"sha": NEW_TREE}));
            })
            .await;
        let commit_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/repos/acme/site/git/commits")
                    .json_body(serde_json::json!({
                        "message": "Add resume r1",
                        "tree": NEW_TREE,
                        "parents": [HEAD]
                    }));
                then.status(201).json_body(serde_json::json!({"sha": COMMIT}));
            })
            .await;
        let ref_mock = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/repos/acme/site/git/refs/heads/main")
                    .json_body(serde_json::json!({"sha": COMMIT, "force": false}));
                then.status(200)
                    .json_body(serde_json::json!({"object": {"sha": COMMIT}}));
            })
            .await;

        let client = GitHubClient::new(&config(&server)).unwrap();
        let blob = client.create_blob(b"{}").await.unwrap();
        assert_eq!(blob, id(BLOB));
        let base = client.get_tree(&id(HEAD)).await.unwrap();
        assert_eq!(base, id(TREE));
        let tree = client
            .create_tree(&base, &[TreeOverlay::new("_data/resumes/r1.json", blob)])
            .await
            .unwrap();
        let commit = client
            .create_commit("Add resume r1", &tree, &id(HEAD))
            .await
            .unwrap();
        assert_eq!(commit, id(COMMIT));
        let outcome = client.update_ref("main", &commit, &id(HEAD)).await.unwrap();
        assert_eq!(outcome, RefUpdate::Updated);

        tree_mock.assert_async().await;
        commit_mock.assert_async().await;
        ref_mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_fast_forward_is_a_conflict() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PATCH).path("/repos/acme/site/git/refs/heads/main");
                then.status(422)
                    .json_body(serde_json::json!({"message": "Update is not a fast forward"}));
            })
            .await;
        let client = GitHubClient::new(&config(&server)).unwrap();
        let outcome = client
            .update_ref("main", &id(COMMIT), &id(HEAD))
            .await
            .unwrap();
        assert_eq!(outcome, RefUpdate::Conflict);
    }

    #[tokio::test]
    async fn http_409_is_a_conflict() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PATCH).path("/repos/acme/site/git/refs/heads/main");
                then.status(409)
                    .json_body(serde_json::json!({"message": "Reference update failed"}));
            })
            .await;
        let client = GitHubClient::new(&config(&server)).unwrap();
        let outcome = client
            .update_ref("main", &id(COMMIT), &id(HEAD))
            .await
            .unwrap();
        assert!(outcome.is_conflict());
    }

    #[tokio::test]
    async fn other_422_is_invalid_request() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PATCH).path("/repos/acme/site/git/refs/heads/main");
                then.status(422)
                    .json_body(serde_json::json!({"message": "Object does not exist"}));
            })
            .await;
        let client = GitHubClient::new(&config(&server)).unwrap();
        let err = client
            .update_ref("main", &id(COMMIT), &id(HEAD))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRequest { .. }));
        assert!(err.to_string().contains("Object does not exist"));
    }

    #[tokio::test]
    async fn status_mapping() {
        let server = MockServer::start_async().await;
        for (branch, status, message) in [
            ("five", 502, "Bad Gateway"),
            ("rate", 429, "slow down"),
            ("secondary", 403, "You have exceeded a secondary rate limit"),
            ("gone", 404, "Not Found"),
            ("denied", 403, "Resource not accessible by integration"),
        ] {
            server
                .mock_async(|when, then| {
                    when.method(GET)
                        .path(format!("/repos/acme/site/git/ref/heads/{branch}"));
                    then.status(status)
                        .json_body(serde_json::json!({"message": message}));
                })
                .await;
        }
        let client = GitHubClient::new(&config(&server)).unwrap();
        for (branch, transient) in [
            ("five", true),
            ("rate", true),
            ("secondary", true),
            ("gone", false),
            ("denied", false),
        ] {
            let err = client.get_ref(branch).await.unwrap_err();
            assert_eq!(
                matches!(err, StoreError::Transient { .. }),
                transient,
                "{branch}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_a_protocol_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/repos/acme/site/git/blobs");
                then.status(201).body("<html>oops</html>");
            })
            .await;
        let client = GitHubClient::new(&config(&server)).unwrap();
        let err = client.create_blob(b"x").await.unwrap_err();
        assert!(matches!(err, StoreError::Protocol { .. }));
    }

    #[tokio::test]
    async fn unreachable_server_is_transient() {
        let config = GitHubConfig {
            api_base: "http://127.0.0.1:1".into(),
            owner: "acme".into(),
            repo: "site".into(),
            token: "t".into(),
            ..Default::default()
        };
        let client = GitHubClient::new(&config).unwrap();
        let err = client.get_ref("main").await.unwrap_err();
        assert!(matches!(err, StoreError::Transient { .. }));
    }

    #[tokio::test]
    async fn non_utf8_blob_is_rejected_locally() {
        let server = MockServer::start_async().await;
        let client = GitHubClient::new(&config(&server)).unwrap();
        let err = client.create_blob(&[0xff, 0xfe]).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidRequest { .. }));
    }
}

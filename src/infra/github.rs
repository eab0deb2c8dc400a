use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder,
    header::{ACCEPT, AUTHORIZATION, USER_AGENT},
};
use serde::{Deserialize, Serialize};

use crate::domain::commit::Commit;
use crate::domain::pull_request::{PullRequest, Repository};
use crate::error::{AppError, AppResult};
use crate::services::HostingService;

const API_BASE_URL: &str = "https://api.github.com";
const PAGE_SIZE: usize = 100;

pub struct GithubClient {
    http: Client,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            token,
        }
    }

    fn token(&self) -> AppResult<&str> {
        self.token.as_deref().ok_or_else(|| {
            AppError::Configuration("GitHub access token not configured".to_string())
        })
    }

    fn request(&self, builder: RequestBuilder) -> AppResult<RequestBuilder> {
        let token = self.token()?;
        Ok(builder
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, "autopr"))
    }

    async fn execute(&self, builder: RequestBuilder) -> AppResult<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|err| AppError::Hosting(format!("failed to call GitHub: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::Hosting(format!(
                "GitHub responded with {status}: {}",
                error_detail(&body)
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl HostingService for GithubClient {
    async fn find_repository(&self, name: &str) -> AppResult<Repository> {
        let mut page = 1u32;
        loop {
            let url = format!("{API_BASE_URL}/user/repos");
            let request = self
                .request(self.http.get(url))?
                .query(&[("per_page", PAGE_SIZE as u32), ("page", page)]);
            let response = self.execute(request).await?;
            let repositories: Vec<RepositoryPayload> =
                response.json().await.map_err(parse_error)?;

            let count = repositories.len();
            if let Some(repository) = repositories.into_iter().find(|repo| repo.name == name) {
                return Ok(repository.into_domain());
            }
            if count < PAGE_SIZE {
                return Err(AppError::Hosting(format!("repository not found [{name}]")));
            }
            page += 1;
        }
    }

    async fn create_pull_request(
        &self,
        repository: &Repository,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> AppResult<PullRequest> {
        let url = format!("{API_BASE_URL}/repos/{}/pulls", repository.full_name);
        let request = self.request(self.http.post(url))?.json(&CreatePullRequestPayload {
            title,
            body,
            head,
            base,
        });
        let response = self.execute(request).await?;
        let payload: PullRequestPayload = response.json().await.map_err(parse_error)?;
        Ok(payload.into_domain())
    }

    async fn list_open_pull_requests(
        &self,
        repository: &Repository,
        base: &str,
        head: &str,
    ) -> AppResult<Vec<PullRequest>> {
        let url = format!("{API_BASE_URL}/repos/{}/pulls", repository.full_name);
        let filter_head = format!("{}:{head}", repository.owner);
        let request = self.request(self.http.get(url))?.query(&[
            ("state", "open"),
            ("base", base),
            ("head", filter_head.as_str()),
            ("sort", "created"),
            ("direction", "desc"),
        ]);
        let response = self.execute(request).await?;
        let payload: Vec<PullRequestPayload> = response.json().await.map_err(parse_error)?;
        Ok(payload
            .into_iter()
            .map(PullRequestPayload::into_domain)
            .collect())
    }

    async fn commits(
        &self,
        repository: &Repository,
        pull_request: &PullRequest,
    ) -> AppResult<Vec<Commit>> {
        let url = format!(
            "{API_BASE_URL}/repos/{}/pulls/{}/commits",
            repository.full_name, pull_request.number
        );
        let request = self
            .request(self.http.get(url))?
            .query(&[("per_page", PAGE_SIZE as u32)]);
        let response = self.execute(request).await?;
        let payload: Vec<CommitPayload> = response.json().await.map_err(parse_error)?;

        // GitHub lists pull-request commits oldest first; the trait contract
        // is newest first.
        let mut commits: Vec<Commit> = payload
            .into_iter()
            .map(CommitPayload::into_domain)
            .collect();
        commits.reverse();
        Ok(commits)
    }

    async fn edit_pull_request(
        &self,
        repository: &Repository,
        pull_request: &PullRequest,
        title: &str,
        body: &str,
    ) -> AppResult<PullRequest> {
        let url = format!(
            "{API_BASE_URL}/repos/{}/pulls/{}",
            repository.full_name, pull_request.number
        );
        let request = self
            .request(self.http.patch(url))?
            .json(&EditPullRequestPayload { title, body });
        let response = self.execute(request).await?;
        let payload: PullRequestPayload = response.json().await.map_err(parse_error)?;
        Ok(payload.into_domain())
    }
}

fn parse_error(err: reqwest::Error) -> AppError {
    AppError::Hosting(format!("failed to parse GitHub response: {err}"))
}

/// First error's message-or-code when GitHub returns a structured error body,
/// otherwise the top-level message, otherwise the raw body.
fn error_detail(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return body.to_string();
    };
    if let Some(first) = parsed.errors.first() {
        if let Some(detail) = first.message.clone().or_else(|| first.code.clone()) {
            return detail;
        }
    }
    parsed.message.unwrap_or_else(|| body.to_string())
}

#[derive(Serialize)]
struct CreatePullRequestPayload<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

#[derive(Serialize)]
struct EditPullRequestPayload<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct RepositoryPayload {
    name: String,
    full_name: String,
    owner: OwnerPayload,
}

#[derive(Deserialize)]
struct OwnerPayload {
    login: String,
}

impl RepositoryPayload {
    fn into_domain(self) -> Repository {
        Repository {
            name: self.name,
            full_name: self.full_name,
            owner: self.owner.login,
        }
    }
}

#[derive(Deserialize)]
struct PullRequestPayload {
    number: u64,
    title: String,
    body: Option<String>,
    html_url: String,
    head: BranchRefPayload,
    base: BranchRefPayload,
}

#[derive(Deserialize)]
struct BranchRefPayload {
    #[serde(rename = "ref")]
    name: String,
}

impl PullRequestPayload {
    fn into_domain(self) -> PullRequest {
        PullRequest {
            number: self.number,
            title: self.title,
            body: self.body.unwrap_or_default(),
            base: self.base.name,
            head: self.head.name,
            html_url: self.html_url,
        }
    }
}

#[derive(Deserialize)]
struct CommitPayload {
    commit: CommitDetailPayload,
}

#[derive(Deserialize)]
struct CommitDetailPayload {
    message: String,
}

impl CommitPayload {
    fn into_domain(self) -> Commit {
        Commit {
            message: self.commit.message,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Deserialize)]
struct ErrorEntry {
    message: Option<String>,
    code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_the_first_error_entry() {
        let body = r#"{"message":"Validation Failed","errors":[{"message":"A pull request already exists for acme:staging."}]}"#;
        assert_eq!(
            error_detail(body),
            "A pull request already exists for acme:staging."
        );
    }

    #[test]
    fn falls_back_to_the_error_code() {
        let body = r#"{"message":"Validation Failed","errors":[{"code":"custom"}]}"#;
        assert_eq!(error_detail(body), "custom");
    }

    #[test]
    fn falls_back_to_the_top_level_message() {
        let body = r#"{"message":"Not Found"}"#;
        assert_eq!(error_detail(body), "Not Found");
    }

    #[test]
    fn passes_unstructured_bodies_through() {
        assert_eq!(error_detail("gateway timeout"), "gateway timeout");
    }
}

use async_trait::async_trait;

use crate::domain::commit::Commit;
use crate::domain::pull_request::{PullRequest, Repository};
use crate::error::AppResult;

#[async_trait]
pub trait HostingService: Send + Sync {
    /// Resolve a repository of the authenticated user by bare name.
    async fn find_repository(&self, name: &str) -> AppResult<Repository>;

    async fn create_pull_request(
        &self,
        repository: &Repository,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> AppResult<PullRequest>;

    /// Open pull requests for the base/head pair, most recently created first.
    async fn list_open_pull_requests(
        &self,
        repository: &Repository,
        base: &str,
        head: &str,
    ) -> AppResult<Vec<PullRequest>>;

    /// Commits of the pull request, newest first. Implementations must
    /// normalize whatever order the API returns to satisfy this.
    async fn commits(
        &self,
        repository: &Repository,
        pull_request: &PullRequest,
    ) -> AppResult<Vec<Commit>>;

    async fn edit_pull_request(
        &self,
        repository: &Repository,
        pull_request: &PullRequest,
        title: &str,
        body: &str,
    ) -> AppResult<PullRequest>;
}

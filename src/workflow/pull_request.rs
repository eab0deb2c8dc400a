use std::collections::HashSet;

use crate::context::AppContext;
use crate::domain::commit::Commit;
use crate::domain::pull_request::{PullRequest, Repository};
use crate::domain::ticket::TicketReference;
use crate::error::{AppError, AppResult};

const DEPLOY_RESULTS_BASE_URL: &str = "https://s3.console.aws.amazon.com/s3/buckets/deploy-logs";

#[derive(Debug)]
pub struct PullRequestOutcome {
    pub repository: Repository,
    pub pull_request: PullRequest,
}

/// Create a pull request from the configured head into the configured base,
/// or reuse the most recent open one when an equivalent already exists, then
/// rewrite its title and body from its commit history.
pub async fn create_or_find_pull_request(ctx: &AppContext) -> AppResult<PullRequestOutcome> {
    let config = &ctx.config;
    let repository = ctx.hosting.find_repository(&config.repository).await?;
    let title = automated_title(&config.from_branch, config.deploy_sequence, config.hotfix);

    let pull_request = match ctx
        .hosting
        .create_pull_request(
            &repository,
            &config.into_branch,
            &config.from_branch,
            title,
            "",
        )
        .await
    {
        Ok(pull_request) => pull_request,
        Err(AppError::Hosting(detail)) => {
            // Creation conflicts (and any other API refusal) fall back to the
            // newest matching open pull request; reused ones get the same
            // rewrite pass a fresh one would.
            let mut existing = ctx
                .hosting
                .list_open_pull_requests(&repository, &config.into_branch, &config.from_branch)
                .await?;
            if existing.is_empty() {
                return Err(AppError::Hosting(format!(
                    "pull request not created for {}: {detail}",
                    config.from_branch
                )));
            }
            existing.remove(0)
        }
        Err(err) => return Err(err),
    };

    let pull_request =
        rewrite_from_commits(ctx, &repository, pull_request, !config.deploy_sequence).await?;

    Ok(PullRequestOutcome {
        repository,
        pull_request,
    })
}

fn automated_title(head: &str, deploy_sequence: bool, hotfix: bool) -> &'static str {
    if deploy_sequence {
        if head == "staging" && !hotfix {
            "Automated deploy"
        } else {
            "Automated HOTFIX deploy"
        }
    } else {
        "Automated PR"
    }
}

/// Rewrite the pull request's title and body from its commit messages. The
/// body only ever grows: the built lines are appended below the existing text.
pub async fn rewrite_from_commits(
    ctx: &AppContext,
    repository: &Repository,
    pull_request: PullRequest,
    title_from_commit: bool,
) -> AppResult<PullRequest> {
    let commits = ctx.hosting.commits(repository, &pull_request).await?;
    let aggregation = aggregate(&commits, &ctx.config.tracker_base_url);

    let title = if title_from_commit {
        aggregation
            .title
            // No ticket reference anywhere: the oldest commit names the PR.
            .or_else(|| commits.last().map(|commit| commit.message.clone()))
            .unwrap_or_else(|| pull_request.title.clone())
    } else {
        pull_request.title.clone()
    };

    let mut built = String::new();
    for line in aggregation.lines.into_reversed() {
        built.push_str(&line);
        built.push('\n');
    }
    if let Some(execution_url) = &ctx.config.deploy_execution_url {
        let results_path = ctx.config.deploy_results_path.as_deref().unwrap_or_default();
        built.push_str(&format!(
            "Acceptance Checker: {execution_url}\nResults: {DEPLOY_RESULTS_BASE_URL}/{results_path}/\n"
        ));
    }

    let body = format!("{}\n{built}", pull_request.body);
    ctx.hosting
        .edit_pull_request(repository, &pull_request, &title, &body)
        .await
}

struct Aggregation {
    title: Option<String>,
    lines: LineSet,
}

/// One pass over the messages, newest first. The first ticket match names the
/// pull request; every ticket id contributes its tracker URL once; anything
/// that is neither a merge message nor a ticket reference passes through raw.
fn aggregate(commits: &[Commit], tracker_base_url: &str) -> Aggregation {
    let mut title = None;
    let mut lines = LineSet::new();

    for commit in commits {
        if commit.is_merge_message() {
            continue;
        }
        match TicketReference::search(&commit.message) {
            Some(ticket) => {
                if title.is_none() {
                    title = Some(ticket.title());
                }
                if let Some(url) = ticket.browse_url(tracker_base_url) {
                    lines.insert(url);
                }
            }
            None => lines.insert(commit.message.clone()),
        }
    }

    Aggregation { title, lines }
}

/// Deduplicating line collection that keeps first-occurrence order, so the
/// reversal below is deterministic (oldest first in the final body).
struct LineSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl LineSet {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            ordered: Vec::new(),
        }
    }

    fn insert(&mut self, line: String) {
        if self.seen.insert(line.clone()) {
            self.ordered.push(line);
        }
    }

    fn into_reversed(self) -> Vec<String> {
        let mut lines = self.ordered;
        lines.reverse();
        lines
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::config::AppConfig;
    use crate::services::{HostingService, Notification, NotifierService};

    const TRACKER: &str = "https://oversee.atlassian.net";

    fn commit(message: &str) -> Commit {
        Commit {
            message: message.to_string(),
        }
    }

    fn sample_repository() -> Repository {
        Repository {
            name: "sample".to_string(),
            full_name: "acme/sample".to_string(),
            owner: "acme".to_string(),
        }
    }

    fn sample_pull_request(title: &str, body: &str) -> PullRequest {
        PullRequest {
            number: 1,
            title: title.to_string(),
            body: body.to_string(),
            base: "master".to_string(),
            head: "staging".to_string(),
            html_url: "https://github.com/acme/sample/pull/1".to_string(),
        }
    }

    fn test_config() -> AppConfig {
        AppConfig {
            repository: "sample".to_string(),
            from_branch: "staging".to_string(),
            into_branch: "master".to_string(),
            hotfix: false,
            deploy_sequence: false,
            github_token: None,
            tracker_base_url: TRACKER.to_string(),
            webhook_url: None,
            webhook_channel: "dev".to_string(),
            deploy_execution_url: None,
            deploy_results_path: None,
        }
    }

    #[derive(Default)]
    struct StubHosting {
        commits: Vec<Commit>,
        create_error: Option<String>,
        existing: Vec<PullRequest>,
        edits: Mutex<Vec<(String, String)>>,
    }

    impl StubHosting {
        fn with_commits(commits: Vec<Commit>) -> Self {
            Self {
                commits,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl HostingService for StubHosting {
        async fn find_repository(&self, name: &str) -> AppResult<Repository> {
            Ok(Repository {
                name: name.to_string(),
                full_name: format!("acme/{name}"),
                owner: "acme".to_string(),
            })
        }

        async fn create_pull_request(
            &self,
            _repository: &Repository,
            base: &str,
            head: &str,
            title: &str,
            body: &str,
        ) -> AppResult<PullRequest> {
            if let Some(detail) = &self.create_error {
                return Err(AppError::Hosting(detail.clone()));
            }
            Ok(PullRequest {
                number: 1,
                title: title.to_string(),
                body: body.to_string(),
                base: base.to_string(),
                head: head.to_string(),
                html_url: "https://github.com/acme/sample/pull/1".to_string(),
            })
        }

        async fn list_open_pull_requests(
            &self,
            _repository: &Repository,
            _base: &str,
            _head: &str,
        ) -> AppResult<Vec<PullRequest>> {
            Ok(self.existing.clone())
        }

        async fn commits(
            &self,
            _repository: &Repository,
            _pull_request: &PullRequest,
        ) -> AppResult<Vec<Commit>> {
            Ok(self.commits.clone())
        }

        async fn edit_pull_request(
            &self,
            _repository: &Repository,
            pull_request: &PullRequest,
            title: &str,
            body: &str,
        ) -> AppResult<PullRequest> {
            self.edits
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
            Ok(PullRequest {
                title: title.to_string(),
                body: body.to_string(),
                ..pull_request.clone()
            })
        }
    }

    struct NullNotifier;

    #[async_trait]
    impl NotifierService for NullNotifier {
        async fn send(&self, _notification: &Notification) -> AppResult<()> {
            Ok(())
        }
    }

    fn context(hosting: Arc<StubHosting>, config: AppConfig) -> AppContext {
        AppContext::new(config, hosting, Arc::new(NullNotifier))
    }

    #[test]
    fn picks_automated_titles() {
        assert_eq!(automated_title("staging", true, false), "Automated deploy");
        assert_eq!(
            automated_title("hotfix/login", true, false),
            "Automated HOTFIX deploy"
        );
        assert_eq!(
            automated_title("staging", true, true),
            "Automated HOTFIX deploy"
        );
        assert_eq!(automated_title("feature/x", false, false), "Automated PR");
    }

    #[test]
    fn merge_only_messages_produce_no_body_lines() {
        let commits = vec![
            commit("Merge pull request #3 from acme/staging"),
            commit("Merge remote-tracking branch 'origin/master'"),
            commit("Merge branch 'master' into staging"),
        ];
        let aggregation = aggregate(&commits, TRACKER);
        assert!(aggregation.title.is_none());
        assert!(aggregation.lines.into_reversed().is_empty());
    }

    #[test]
    fn deduplicates_repeated_ticket_urls() {
        let commits = vec![
            commit("FF-7 tweak copy"),
            commit("FF-7 tweak copy again"),
            commit("FF 7 another pass"),
        ];
        let aggregation = aggregate(&commits, TRACKER);
        assert_eq!(
            aggregation.lines.into_reversed(),
            vec!["https://oversee.atlassian.net/browse/FF-7".to_string()]
        );
    }

    #[test]
    fn derives_title_and_ordered_body_from_commits() {
        // Newest first, as the hosting service returns them.
        let commits = vec![
            commit("FF-12 add login"),
            commit("Merge pull request #3"),
            commit("fix typo"),
        ];
        let aggregation = aggregate(&commits, TRACKER);
        assert_eq!(aggregation.title.as_deref(), Some("FF-12 add login"));
        assert_eq!(
            aggregation.lines.into_reversed(),
            vec![
                "fix typo".to_string(),
                "https://oversee.atlassian.net/browse/FF-12".to_string(),
            ]
        );
    }

    #[test]
    fn ticket_match_without_task_id_adds_no_url() {
        let commits = vec![commit("FF polish the dashboard")];
        let aggregation = aggregate(&commits, TRACKER);
        assert_eq!(aggregation.title.as_deref(), Some("FF- polish the dashboard"));
        assert!(aggregation.lines.into_reversed().is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_oldest_commit_title() {
        let hosting = Arc::new(StubHosting::with_commits(vec![
            commit("fix typo"),
            commit("initial import"),
        ]));
        let ctx = context(hosting, test_config());

        let updated = rewrite_from_commits(
            &ctx,
            &sample_repository(),
            sample_pull_request("Automated PR", ""),
            true,
        )
        .await
        .unwrap();

        assert_eq!(updated.title, "initial import");
    }

    #[tokio::test]
    async fn keeps_existing_title_without_commits() {
        let hosting = Arc::new(StubHosting::with_commits(Vec::new()));
        let ctx = context(hosting, test_config());

        let updated = rewrite_from_commits(
            &ctx,
            &sample_repository(),
            sample_pull_request("Automated PR", ""),
            true,
        )
        .await
        .unwrap();

        assert_eq!(updated.title, "Automated PR");
    }

    #[tokio::test]
    async fn deploy_sequence_keeps_the_automated_title() {
        let hosting = Arc::new(StubHosting::with_commits(vec![commit("FF-12 add login")]));
        let ctx = context(hosting, test_config());

        let updated = rewrite_from_commits(
            &ctx,
            &sample_repository(),
            sample_pull_request("Automated deploy", ""),
            false,
        )
        .await
        .unwrap();

        assert_eq!(updated.title, "Automated deploy");
        assert!(updated.body.contains("https://oversee.atlassian.net/browse/FF-12"));
    }

    #[tokio::test]
    async fn appends_deploy_log_lines() {
        let hosting = Arc::new(StubHosting::with_commits(vec![commit("FF-12 add login")]));
        let mut config = test_config();
        config.deploy_execution_url = Some("https://ci.example.com/run/42".to_string());
        config.deploy_results_path = Some("acceptance/42".to_string());
        let ctx = context(hosting, config);

        let updated = rewrite_from_commits(
            &ctx,
            &sample_repository(),
            sample_pull_request("Automated deploy", ""),
            false,
        )
        .await
        .unwrap();

        assert!(updated.body.ends_with(
            "Acceptance Checker: https://ci.example.com/run/42\n\
             Results: https://s3.console.aws.amazon.com/s3/buckets/deploy-logs/acceptance/42/\n"
        ));
    }

    #[tokio::test]
    async fn rewrite_keeps_existing_body_lines() {
        let hosting = Arc::new(StubHosting::with_commits(vec![commit("FF-12 add login")]));
        let ctx = context(hosting, test_config());
        let existing_body = "https://oversee.atlassian.net/browse/FF-9";

        let updated = rewrite_from_commits(
            &ctx,
            &sample_repository(),
            sample_pull_request("FF-9 add signup", existing_body),
            true,
        )
        .await
        .unwrap();

        assert!(updated.body.starts_with(existing_body));
        assert!(updated.body.contains("https://oversee.atlassian.net/browse/FF-12"));
    }

    #[tokio::test]
    async fn creates_pull_request_with_derived_title() {
        let hosting = Arc::new(StubHosting::with_commits(vec![commit("FF-12 add login")]));
        let ctx = context(hosting.clone(), test_config());

        let outcome = create_or_find_pull_request(&ctx).await.unwrap();

        assert_eq!(outcome.pull_request.title, "FF-12 add login");
        let edits = hosting.edits.lock().unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].0, "FF-12 add login");
    }

    #[tokio::test]
    async fn reuses_most_recent_open_pull_request_on_conflict() {
        let mut newest = sample_pull_request("FF-9 add signup", "");
        newest.number = 7;
        let mut older = sample_pull_request("FF-5 add logout", "");
        older.number = 5;

        let hosting = Arc::new(StubHosting {
            commits: vec![commit("FF-12 add login")],
            create_error: Some("A pull request already exists for acme:staging.".to_string()),
            existing: vec![newest, older],
            edits: Mutex::new(Vec::new()),
        });
        let ctx = context(hosting, test_config());

        let outcome = create_or_find_pull_request(&ctx).await.unwrap();

        assert_eq!(outcome.pull_request.number, 7);
        assert_eq!(outcome.pull_request.title, "FF-12 add login");
    }

    #[tokio::test]
    async fn surfaces_the_creation_error_without_a_fallback_match() {
        let hosting = Arc::new(StubHosting {
            create_error: Some("Validation Failed".to_string()),
            ..StubHosting::default()
        });
        let ctx = context(hosting, test_config());

        let err = create_or_find_pull_request(&ctx).await.unwrap_err();

        match err {
            AppError::Hosting(detail) => {
                assert!(detail.contains("staging"));
                assert!(detail.contains("Validation Failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

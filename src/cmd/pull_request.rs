use crate::context::AppContext;
use crate::error::AppResult;
use crate::workflow::pull_request::{PullRequestOutcome, create_or_find_pull_request};

pub async fn run(ctx: &AppContext) -> AppResult<PullRequestOutcome> {
    create_or_find_pull_request(ctx).await
}

//! GitHub API helpers for annotating pull requests with gap reports.

use anyhow::{bail, Context as _, Result};
use serde::Deserialize;

/// Hidden marker identifying the comment covgap owns on a PR.
const COMMENT_MARKER: &str = "<!-- covgap-report -->";

/// Resolved GitHub Actions context, read from environment variables.
pub struct Context {
    token: String,
    repo: String,
    pr_number: u64,
    pub sha: Option<String>,
}

impl Context {
    /// Build a context from standard GitHub Actions environment variables
    /// (`GITHUB_TOKEN`, `GITHUB_REPOSITORY`, `GITHUB_REF`, `GITHUB_SHA`).
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("GITHUB_TOKEN")
            .context("GITHUB_TOKEN environment variable is required")?;
        let repo = std::env::var("GITHUB_REPOSITORY")
            .context("GITHUB_REPOSITORY environment variable is required")?;
        let pr_number =
            pr_number_from_ref().context("could not determine PR number from GITHUB_REF")?;
        let sha = std::env::var("GITHUB_SHA").ok();
        Ok(Self {
            token,
            repo,
            pr_number,
            sha,
        })
    }

    /// Fetch the unified diff for the pull request.
    pub fn fetch_diff(&self) -> Result<String> {
        eprintln!(
            "Fetching diff for {}/pull/{} ...",
            self.repo, self.pr_number
        );
        let url = format!(
            "https://api.github.com/repos/{}/pulls/{}",
            self.repo, self.pr_number
        );
        let resp = self
            .request("GET", &url)
            .set("Accept", "application/vnd.github.v3.diff")
            .call()
            .context("Failed to fetch PR diff from GitHub")?;
        resp.into_string()
            .context("Failed to read PR diff response body")
    }

    /// Create or update the covgap comment on the pull request.
    pub fn post_comment(&self, body: &str) -> Result<()> {
        let tagged = format!("{COMMENT_MARKER}\n{body}");

        match self.find_existing_comment()? {
            Some(comment_id) => {
                let url = format!(
                    "https://api.github.com/repos/{}/issues/comments/{}",
                    self.repo, comment_id
                );
                self.send_comment("PATCH", &url, &tagged)?;
            }
            None => {
                let url = format!(
                    "https://api.github.com/repos/{}/issues/{}/comments",
                    self.repo, self.pr_number
                );
                self.send_comment("POST", &url, &tagged)?;
            }
        }

        eprintln!("Comment posted to {}/pull/{}", self.repo, self.pr_number);
        Ok(())
    }

    /// A request with the common GitHub REST API headers applied.
    fn request(&self, method: &str, url: &str) -> ureq::Request {
        ureq::request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "covgap")
            .set("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Find an existing covgap comment on the PR, by its hidden marker.
    fn find_existing_comment(&self) -> Result<Option<u64>> {
        let mut page = 1u32;
        loop {
            let url = format!(
                "https://api.github.com/repos/{}/issues/{}/comments?per_page=100&page={}",
                self.repo, self.pr_number, page
            );
            let resp = self
                .request("GET", &url)
                .call()
                .context("Failed to list PR comments")?;

            let comments: Vec<Comment> =
                resp.into_json().context("Failed to parse comments JSON")?;
            if comments.is_empty() {
                return Ok(None);
            }
            if let Some(found) = comments.iter().find(|c| {
                c.body
                    .as_deref()
                    .is_some_and(|body| body.contains(COMMENT_MARKER))
            }) {
                return Ok(Some(found.id));
            }
            page += 1;
        }
    }

    fn send_comment(&self, method: &str, url: &str, body: &str) -> Result<()> {
        match self
            .request(method, url)
            .send_json(serde_json::json!({ "body": body }))
        {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, resp)) => {
                let detail = resp.into_string().unwrap_or_default();
                bail!("GitHub API error posting comment (HTTP {code}): {detail}")
            }
            Err(e) => bail!("Failed to post comment: {e}"),
        }
    }
}

#[derive(Deserialize)]
struct Comment {
    id: u64,
    body: Option<String>,
}

/// Extract the PR number from GITHUB_REF (e.g. "refs/pull/42/merge" → 42).
fn pr_number_from_ref() -> Option<u64> {
    let github_ref = std::env::var("GITHUB_REF").ok()?;
    let mut parts = github_ref.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("refs"), Some("pull"), Some(number)) => number.parse().ok(),
        _ => None,
    }
}

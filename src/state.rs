use std::{sync::Arc, time::Duration};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    config::Config,
    database::{self, DbPool},
    docs::{DocsError, DocsIndex},
    Result,
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// The git checkout the bot runs from, used to link to command sources.
#[derive(Debug)]
pub struct Repo {
    pub url: String,
    pub revision: String,
}

impl Repo {
    fn discover() -> std::result::Result<Self, git2::Error> {
        let repo = git2::Repository::discover(".")?;
        let remote = repo.find_remote("origin")?;
        let url = remote
            .url()
            .ok_or_else(|| git2::Error::from_str("Repository remote URL is invalid UTF-8"))?;
        let revision = repo.head()?.peel_to_commit()?.id().to_string();
        Ok(Self {
            url: web_url(url),
            revision,
        })
    }
}

/// Turns a clone URL (`git@host:owner/repo.git`, `https://host/owner/repo.git`) into a browsable one.
fn web_url(remote: &str) -> String {
    let url = match remote.strip_prefix("git@") {
        Some(rest) => format!("https://{}", rest.replacen(':', "/", 1)),
        None => remote.to_string(),
    };
    url.trim_end_matches(".git").to_string()
}

// Shared state
#[derive(Debug)]
pub struct Data {
    pub config: Config,
    pub http: reqwest::Client,
    pub db: DbPool,
    pub repo: Option<Repo>,
    docs: RwLock<Option<Arc<DocsIndex>>>,
}

impl Data {
    pub fn new(config: Config) -> Result<Self> {
        let repo = match Repo::discover() {
            Ok(repo) => Some(repo),
            Err(e) => {
                warn!("Could not open a git repository; source links will be unavailable. Detailed error:\n{e}");
                None
            }
        };

        let db = database::open_pool(&config.database_url, &config.langs_path)?;
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Data {
            config,
            http,
            db,
            repo,
            docs: RwLock::new(None),
        })
    }

    pub async fn docs_cached(&self) -> bool {
        self.docs.read().await.is_some()
    }

    /// The documentation index, built on first use.
    pub async fn docs_index(&self) -> std::result::Result<Arc<DocsIndex>, DocsError> {
        if let Some(index) = self.docs.read().await.as_ref() {
            return Ok(Arc::clone(index));
        }
        self.refresh_docs().await
    }

    pub async fn refresh_docs(&self) -> std::result::Result<Arc<DocsIndex>, DocsError> {
        let index = Arc::new(
            DocsIndex::build(&self.http, &self.config.docs_url, &self.config.docs_pages).await?,
        );
        *self.docs.write().await = Some(Arc::clone(&index));
        info!("documentation index refreshed");
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("git@github.com:owner/utilitybot.git", "https://github.com/owner/utilitybot")]
    #[case("https://github.com/owner/utilitybot.git", "https://github.com/owner/utilitybot")]
    #[case("https://github.com/owner/utilitybot", "https://github.com/owner/utilitybot")]
    fn clone_urls_become_browsable(#[case] remote: &str, #[case] expected: &str) {
        assert_eq!(web_url(remote), expected);
    }

    // the error handler formats `FrameworkError<Data, _>` with `{:?}`
    #[test]
    fn shared_state_can_be_debug_printed() {
        fn debug_printable<T: std::fmt::Debug>() {}
        debug_printable::<Data>();

        let repo = Repo {
            url: "https://github.com/owner/utilitybot".into(),
            revision: "abc123".into(),
        };
        assert!(format!("{repo:?}").contains("abc123"));
    }
}

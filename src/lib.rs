pub mod browser_profile;
pub mod browser_setup;
pub mod config;
pub mod content_saver;
pub mod content_store;
pub mod crawl_engine;
pub mod page_driver;
pub mod resolver;
pub mod utils;

use tokio_util::sync::CancellationToken;

pub use browser_setup::{download_managed_browser, launch_browser, resolve_browser_executable};
pub use config::HarvestConfig;
pub use content_saver::persist_dataset;
pub use content_store::{AuthorRow, ContentRow, ContentStore, SqliteContentStore};
pub use crawl_engine::{
    CrawlError, CrawlPhase, CrawlResult, HarvestRecord, Orchestrator, RunOutcome, WorkItem,
    compute_delay, determine_phase,
};
pub use page_driver::{ChromiumDriver, DriverError, PageDriver, PageElement};
pub use resolver::{Metadata, MetadataResolver, OEmbedResolver};
pub use utils::{InvalidUrlError, UserAgentPool, sanitize_url};

/// Run one harvest tick with the production collaborators
///
/// Opens the SQLite store, picks a user agent for the run, and drives the
/// orchestrator with a Chromium session that is only launched when needed.
pub async fn harvest(config: HarvestConfig, cancel: CancellationToken) -> CrawlResult<RunOutcome> {
    let agents = match config.user_agents_path() {
        Some(path) => UserAgentPool::load(path)?,
        None => UserAgentPool::default(),
    };
    let user_agent = agents.pick();
    log::debug!(target: "channelscout::crawl", "Using user agent {user_agent}");

    let store = SqliteContentStore::connect(config.database_url()).await?;
    let resolver = OEmbedResolver::new(&user_agent)?;
    let fetcher = crawl_engine::HttpRobotsFetcher::new(&user_agent)?;

    let mut orchestrator = Orchestrator::new(&config, store, resolver, fetcher, user_agent.clone());
    orchestrator
        .run(|| ChromiumDriver::launch(&config, &user_agent), &cancel)
        .await
}

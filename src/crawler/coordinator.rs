//! Scrape coordinator - per-site orchestration
//!
//! One run takes a seed URL through these steps:
//! - A quick single-shot check that decides whether the site needs a browser
//! - Link discovery
//! - Sequential, paced extraction of every discovered product URL
//! - Progress updates and item delivery to the collaborator API
//! - Renderer teardown, on every exit path

use crate::config::Config;
use crate::crawler::pacing::human_delay;
use crate::discovery::LinkDiscoverer;
use crate::extract::{extract_product, ProductRecord};
use crate::fetch::{default_transports, looks_like_bot_block, FetchClient, Transport, TransportFactory};
use crate::output::ScrapeSummary;
use crate::render::{needs_browser_rendering, BrowserManager, PageLoader, RenderLease, Renderer};
use crate::report::{Phase, Reporter, ScrapeProgress};
use crate::url::{extract_domain, parse_site_url};
use crate::HarvestError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

/// Scrapes simple products from storefronts
///
/// A `Scraper` may run several sites concurrently. The plain HTTP transport
/// and the renderer are shared between runs; each run gets its own
/// [`FetchClient`], so challenge cookies never cross sites.
pub struct Scraper {
    config: Arc<Config>,
    primary: Arc<dyn Transport>,
    escalation_factory: TransportFactory,
    renderer: Option<Arc<dyn Renderer>>,
    report_client: reqwest::Client,
}

impl Scraper {
    /// Creates a scraper with the reqwest transports and, if rendering is
    /// enabled, a lazily launched Chromium
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let (primary, escalation_factory) = default_transports(&config.fetch)?;

        let renderer: Option<Arc<dyn Renderer>> = if config.render.enabled {
            Some(Arc::new(BrowserManager::new(config.render.clone())))
        } else {
            None
        };

        let report_client = reqwest::Client::builder().build()?;

        Ok(Self {
            config: Arc::new(config),
            primary,
            escalation_factory,
            renderer,
            report_client,
        })
    }

    /// Replaces the renderer; `None` disables rendering
    pub fn with_renderer(mut self, renderer: Option<Arc<dyn Renderer>>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replaces the plain transport and the escalation factory
    pub fn with_transports(
        mut self,
        primary: Arc<dyn Transport>,
        escalation_factory: TransportFactory,
    ) -> Self {
        self.primary = primary;
        self.escalation_factory = escalation_factory;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scrapes one site and returns its simple products
    ///
    /// Never fails once started: unreachable pages are skipped and
    /// collaborator errors are logged. An unparsable URL yields no records.
    pub async fn scrape_site(
        &self,
        url: &str,
        api_base_url: Option<&str>,
        agent_token: Option<&str>,
    ) -> Vec<ProductRecord> {
        self.scrape_site_with_cancel(url, api_base_url, agent_token, CancellationToken::new())
            .await
    }

    /// Like [`Scraper::scrape_site`], stopping between product URLs once
    /// `cancel` fires
    pub async fn scrape_site_with_cancel(
        &self,
        url: &str,
        api_base_url: Option<&str>,
        agent_token: Option<&str>,
        cancel: CancellationToken,
    ) -> Vec<ProductRecord> {
        let base = match parse_site_url(url) {
            Ok(base) => base,
            Err(e) => {
                tracing::error!("Cannot scrape {}: {}", url, e);
                return Vec::new();
            }
        };

        let site = extract_domain(&base).unwrap_or_else(|| base.to_string());
        let span = tracing::info_span!("scrape", site = %site);

        self.run(base, api_base_url, agent_token, cancel)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        base: Url,
        api_base_url: Option<&str>,
        agent_token: Option<&str>,
        cancel: CancellationToken,
    ) -> Vec<ProductRecord> {
        tracing::info!("Starting scrape for {}", base);

        let mut summary = ScrapeSummary::start(base.as_str());
        let reporter = Reporter::with_client(
            self.report_client.clone(),
            api_base_url,
            agent_token,
            &self.config.reporter,
        );

        let fetch = Arc::new(FetchClient::with_transports(
            &self.config.fetch,
            self.primary.clone(),
            self.escalation_factory.clone(),
        ));

        let lease = match &self.renderer {
            Some(renderer) => Some(RenderLease::acquire(renderer.clone()).await),
            None => None,
        };
        let loader = PageLoader::new(
            fetch,
            lease.as_ref().map(RenderLease::renderer),
            self.config.render.timeout(),
        );

        let records = self
            .scrape_with_loader(&base, &loader, &reporter, &cancel, &mut summary)
            .await;

        if let Some(lease) = lease {
            lease.release().await;
        }

        summary.finish();
        summary.log(reporter.is_active());

        records
    }

    async fn scrape_with_loader(
        &self,
        base: &Url,
        loader: &PageLoader,
        reporter: &Reporter,
        cancel: &CancellationToken,
        summary: &mut ScrapeSummary,
    ) -> Vec<ProductRecord> {
        let mut records = Vec::new();

        if cancel.is_cancelled() {
            summary.cancelled = true;
            reporter
                .report_progress(
                    &ScrapeProgress::new(Phase::Error).message("Cancelled before discovery"),
                )
                .await;
            return records;
        }

        let site_render_mode = self.detect_render_mode(base, loader).await;

        let discoverer = LinkDiscoverer::new(loader, &self.config.fetch, &self.config.discovery);
        let outcome = discoverer
            .discover_product_links(base, site_render_mode)
            .await;

        let render_mode = outcome.rendered;
        let links: Vec<String> = outcome.links.into_iter().collect();
        let total = links.len();
        summary.discovered = total;
        summary.render_mode = render_mode;

        reporter
            .report_progress(
                &ScrapeProgress::new(Phase::Discovery)
                    .discovered(total)
                    .total(total)
                    .message(format!("Discovered {} products", total)),
            )
            .await;

        if total == 0 {
            log_no_products(loader.can_render());
        }

        reporter
            .report_progress(
                &ScrapeProgress::new(Phase::Scraping)
                    .discovered(total)
                    .sent(0)
                    .total(total)
                    .message(format!("Starting to scrape {} products", total)),
            )
            .await;

        let integrated = reporter.is_active();
        let product_timeout = self.config.fetch.product_timeout();

        for (index, link) in links.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                let imported = imported_count(integrated, summary);
                reporter
                    .report_progress(
                        &ScrapeProgress::new(Phase::Error)
                            .discovered(total)
                            .sent(imported)
                            .created(imported)
                            .total(total)
                            .message(format!(
                                "Cancelled after {} of {} products",
                                summary.processed(),
                                total
                            )),
                    )
                    .await;
                return records;
            }

            tracing::info!("Processing {}/{}: {}", index + 1, total, link);

            match extract_product(loader, link, product_timeout, render_mode).await {
                Ok(record) => {
                    let label: String = record.name.chars().take(50).collect();
                    tracing::info!("Scraped: {}", label);

                    if integrated && reporter.deliver_item(&record).await {
                        summary.sent += 1;
                    }
                    summary.scraped += 1;
                    records.push(record);
                }
                Err(reason) => {
                    tracing::debug!("No record for {}: {:?}", link, reason);
                    summary.skipped += 1;
                }
            }

            let imported = imported_count(integrated, summary);
            reporter
                .report_progress(
                    &ScrapeProgress::new(Phase::Importing)
                        .discovered(total)
                        .sent(imported)
                        .created(imported)
                        .total(total)
                        .message(format!(
                            "Imported {} of {} products ({} skipped)",
                            imported, total, summary.skipped
                        )),
                )
                .await;

            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = human_delay(&self.config.pacing) => {}
            }
        }

        let imported = imported_count(integrated, summary);
        reporter
            .report_progress(
                &ScrapeProgress::new(Phase::Complete)
                    .discovered(total)
                    .sent(imported)
                    .created(imported)
                    .total(total)
                    .message(format!(
                        "Completed: {} products imported, {} skipped",
                        imported, summary.skipped
                    )),
            )
            .await;

        records
    }

    /// Single-shot check of the base URL deciding the site's render mode
    ///
    /// Any failure, non-200 answer, block page or script-rendered body
    /// switches the run to the browser. Skipped without a renderer.
    async fn detect_render_mode(&self, base: &Url, loader: &PageLoader) -> bool {
        if !loader.can_render() {
            return false;
        }

        tracing::info!("Quick check: testing if site is JavaScript-rendered...");

        let timeout = self.config.fetch.site_check_timeout();
        match loader.fetch_client().fetch_once(base.as_str(), timeout).await {
            Some(result) if result.is_ok() => {
                if needs_browser_rendering(&result.body, base.as_str()) {
                    tracing::info!("Detected JavaScript-rendered site, using browser rendering");
                    true
                } else if looks_like_bot_block(&result) {
                    tracing::info!("Bot protection detected, using browser rendering");
                    true
                } else {
                    false
                }
            }
            Some(result) => {
                tracing::info!(
                    "Site answered {}, may be blocking requests; using browser rendering",
                    result.status_code
                );
                true
            }
            None => {
                tracing::info!("Quick check failed, using browser rendering");
                true
            }
        }
    }
}

fn imported_count(integrated: bool, summary: &ScrapeSummary) -> usize {
    if integrated {
        summary.sent
    } else {
        summary.scraped
    }
}

fn log_no_products(can_render: bool) {
    tracing::warn!("No products found");
    if can_render {
        tracing::warn!("The site may use a JavaScript framework that is not supported yet");
    } else {
        tracing::warn!("The site may need browser rendering, which is disabled");
    }
    tracing::warn!("The site may be blocking automated access");
    tracing::warn!("Try a direct category or product listing page URL instead");
}

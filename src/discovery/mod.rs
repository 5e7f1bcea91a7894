//! Product link discovery
//!
//! Turns one seed URL into a set of candidate product URLs through ordered,
//! short-circuiting tiers:
//! 1. Sitemaps (`/sitemap.xml` and friends, descending into product indexes)
//! 2. Conventional category paths probed for a listing page
//! 3. Selector cascade on the listing page, following pagination
//! 4. Browser-rendered selector cascade on the home page
//! 5. Static selector cascade on the home page

mod category;
mod listing;
mod sitemap;

pub use category::CATEGORY_PATHS;
pub use listing::{extract_listing_links, ListingPage, LISTING_SELECTORS, NEXT_PAGE_SELECTORS};
pub use sitemap::{parse_sitemap, SitemapDocument, SITEMAP_SEEDS};

use crate::config::{DiscoveryConfig, FetchConfig};
use crate::fetch::FetchOptions;
use crate::render::PageLoader;
use crate::url::{is_www_alias, same_origin};
use std::collections::{hash_set, HashSet, VecDeque};
use url::Url;

/// Absolute product URLs found for one site
///
/// Entries are compared by exact string equality after resolution, and
/// only URLs sharing the scope page's origin are admitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverySet {
    links: HashSet<String>,
}

impl DiscoverySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `link` if its origin matches `scope`; returns true if it was new
    pub fn insert_same_origin(&mut self, link: &Url, scope: &Url) -> bool {
        if !same_origin(link, scope) {
            return false;
        }
        self.links.insert(link.to_string())
    }

    pub fn extend(&mut self, other: DiscoverySet) {
        self.links.extend(other.links);
    }

    pub fn contains(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, String> {
        self.links.iter()
    }
}

impl IntoIterator for DiscoverySet {
    type Item = String;
    type IntoIter = hash_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.into_iter()
    }
}

/// Result of one discovery call
#[derive(Debug)]
pub struct DiscoveryOutcome {
    pub links: DiscoverySet,
    /// Listing page chosen by the category probe (the base URL otherwise)
    pub listing_url: Url,
    /// True if the links came from browser-rendered pages
    pub rendered: bool,
}

/// Runs the discovery tiers for one site
pub struct LinkDiscoverer<'a> {
    loader: &'a PageLoader,
    fetch_config: &'a FetchConfig,
    max_sitemaps: usize,
}

impl<'a> LinkDiscoverer<'a> {
    pub fn new(
        loader: &'a PageLoader,
        fetch_config: &'a FetchConfig,
        discovery_config: &DiscoveryConfig,
    ) -> Self {
        Self {
            loader,
            fetch_config,
            max_sitemaps: discovery_config.max_sitemaps,
        }
    }

    /// Discovers candidate product URLs for the site at `base`
    ///
    /// In `render_mode` the static tiers are skipped and the home page is
    /// rendered straight away.
    pub async fn discover_product_links(&self, base: &Url, render_mode: bool) -> DiscoveryOutcome {
        let mut listing_url = base.clone();
        let mut rendered = render_mode;
        let mut tried_base = false;

        let mut links = if render_mode {
            tracing::info!("Rendering {} in browser to find product links", base);
            tried_base = true;
            self.listing_links(base, true).await
        } else {
            tracing::info!("Method 1: Trying sitemap...");
            let mut links = self.sitemap_links(base).await;

            if links.is_empty() {
                tracing::info!("Method 2: Searching for product pages...");
                listing_url = self.detect_category_page(base).await;
                tried_base = listing_url == *base;
                links = self.listing_links(&listing_url, false).await;
            }

            if links.is_empty() && self.loader.can_render() {
                tracing::info!("Method 3: Trying browser rendering as fallback...");
                rendered = true;
                tried_base = true;
                links = self.listing_links(base, true).await;
            }

            links
        };

        if links.is_empty() && listing_url != *base && !tried_base {
            tracing::info!("Method 4: Trying homepage...");
            links = self.listing_links(base, rendered).await;
        }

        tracing::info!("Found {} product links", links.len());

        DiscoveryOutcome {
            links,
            listing_url,
            rendered,
        }
    }

    /// Sitemap tier
    ///
    /// Works through a FIFO queue seeded with the well-known locations;
    /// sitemap indexes add their product child sitemaps to the queue. At
    /// most `max_sitemaps` documents are fetched. Returns as soon as one
    /// document contributes product URLs.
    ///
    /// Everything is scoped to the origin of `base`. A seed that redirects
    /// to the `www` alias of the site adds that origin too; child sitemaps
    /// and entries on any other origin are dropped.
    pub async fn sitemap_links(&self, base: &Url) -> DiscoverySet {
        let mut queue: VecDeque<Url> = SITEMAP_SEEDS
            .iter()
            .filter_map(|seed| base.join(seed).ok())
            .collect();
        let seeds: HashSet<String> = queue.iter().map(Url::to_string).collect();
        let mut scopes: Vec<Url> = vec![base.clone()];
        let mut visited: HashSet<String> = HashSet::new();
        let mut links = DiscoverySet::new();

        while let Some(sitemap_url) = queue.pop_front() {
            if visited.contains(sitemap_url.as_str()) {
                continue;
            }
            if visited.len() >= self.max_sitemaps {
                tracing::warn!(
                    "Sitemap limit of {} reached, {} left unvisited",
                    self.max_sitemaps,
                    queue.len() + 1
                );
                break;
            }
            visited.insert(sitemap_url.to_string());

            tracing::info!("Checking sitemap: {}", sitemap_url);
            let options = FetchOptions::get(self.fetch_config.sitemap_timeout());
            let Some(result) = self.loader.fetch_client().fetch(sitemap_url.as_str(), options).await
            else {
                continue;
            };
            if !result.is_ok() {
                continue;
            }

            let served_from = Url::parse(&result.final_url).unwrap_or_else(|_| sitemap_url.clone());
            if seeds.contains(sitemap_url.as_str())
                && !in_scope(&scopes, &served_from)
                && is_www_alias(base, &served_from)
            {
                tracing::debug!("Sitemap {} served from {}", sitemap_url, served_from);
                scopes.push(served_from.clone());
            }
            if !in_scope(&scopes, &served_from) {
                tracing::debug!("Ignoring sitemap {} redirected off-site", sitemap_url);
                continue;
            }

            let document = match parse_sitemap(&result.body) {
                Ok(document) => document,
                Err(e) => {
                    tracing::debug!("Unparseable sitemap {}: {}", sitemap_url, e);
                    continue;
                }
            };

            for child in document.product_children() {
                match Url::parse(child).or_else(|_| served_from.join(child)) {
                    Ok(child_url) if !in_scope(&scopes, &child_url) => {
                        tracing::debug!("Skipping off-site child sitemap {}", child_url)
                    }
                    Ok(child_url) if !visited.contains(child_url.as_str()) => {
                        queue.push_back(child_url)
                    }
                    Ok(_) => {}
                    Err(e) => tracing::debug!("Skipping child sitemap {}: {}", child, e),
                }
            }

            for loc in document
                .page_urls
                .iter()
                .filter(|loc| crate::url::is_sitemap_product_url(loc))
            {
                let Ok(link) = Url::parse(loc).or_else(|_| served_from.join(loc)) else {
                    continue;
                };
                if let Some(scope) = scopes.iter().find(|scope| same_origin(scope, &link)) {
                    links.insert_same_origin(&link, scope);
                }
            }

            if !links.is_empty() {
                tracing::info!("Found {} products in sitemap", links.len());
                return links;
            }
        }

        links
    }

    /// Category tier: first conventional path answering 200 with "product" in it
    pub async fn detect_category_page(&self, base: &Url) -> Url {
        for path in CATEGORY_PATHS {
            let Ok(candidate) = base.join(path) else {
                continue;
            };

            let options = FetchOptions::get(self.fetch_config.probe_timeout())
                .without_escalation()
                .with_referer(base.as_str());

            if let Some(result) = self.loader.fetch_client().fetch(candidate.as_str(), options).await {
                if result.is_ok() && result.body.to_lowercase().contains("product") {
                    tracing::info!("Found product page: {}", candidate);
                    return candidate;
                }
            }
        }

        tracing::info!("No specific product page found, trying homepage...");
        base.clone()
    }

    /// Selector-cascade tier on `listing`, following "next page" links
    ///
    /// Pagination depth is unbounded, but a page already visited in this
    /// call is never fetched again.
    pub async fn listing_links(&self, listing: &Url, render_mode: bool) -> DiscoverySet {
        let mut links = DiscoverySet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut next = Some(listing.clone());

        while let Some(page_url) = next.take() {
            if !visited.insert(page_url.to_string()) {
                tracing::debug!("Pagination returned to {}, stopping", page_url);
                break;
            }

            let options = FetchOptions::get(self.fetch_config.page_timeout());
            let Some(body) = self
                .loader
                .load_with_mode(page_url.as_str(), options, render_mode)
                .await
            else {
                tracing::warn!("Could not load listing page {}", page_url);
                break;
            };

            let page = extract_listing_links(&body, &page_url);
            tracing::debug!("{} product links on {}", page.links.len(), page_url);
            links.extend(page.links);
            next = page.next_page;
        }

        links
    }
}

fn in_scope(scopes: &[Url], url: &Url) -> bool {
    scopes.iter().any(|scope| same_origin(scope, url))
}

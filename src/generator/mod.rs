//! Generator module - writes pre-rendered pages to the public directory

use anyhow::Result;
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tera::Context;

use crate::cache::{self, CacheDb, Freshness};
use crate::content::ContentDetail;
use crate::helpers::{full_url_for, is_valid_uid, post_path, Helpers};
use crate::pages::{self, DetailState, NotFoundCause};
use crate::source::SourceSpec;
use crate::templates::{PostData, SiteData, TemplateRenderer};
use crate::Site;

/// Route of the home page
pub const INDEX_ROUTE: &str = "/";

/// Output file of a post, relative to the public dir
pub fn post_output(uid: &str) -> String {
    format!("post/{}/index.html", uid)
}

/// Result of generating a single post
#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome {
    /// Page written; carries the rendered HTML
    Written(String),
    /// Nothing written. A `Missing` post has its old page removed, an
    /// `Unavailable` one keeps it.
    NotFound(NotFoundCause),
}

/// Summary of a full generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub posts: usize,
    pub missing: usize,
    pub unavailable: usize,
}

/// Static site generator using Tera templates
pub struct Generator {
    site: Site,
    spec: SourceSpec,
    renderer: TemplateRenderer,
    helpers: Helpers,
    site_data: SiteData,
    config_hash: u64,
    manifest: Mutex<CacheDb>,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site, spec: SourceSpec) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;
        let config_hash = cache::hash_config(&site.config_path())?;

        let mut manifest = CacheDb::load(&site.base_dir);
        if manifest.config_hash != config_hash {
            if !manifest.routes.is_empty() {
                tracing::info!("Site config changed, every page is stale");
            }
            manifest.expire_all(config_hash);
        }

        Ok(Self {
            site: site.clone(),
            spec,
            renderer,
            helpers: Helpers::new(&site.config),
            site_data: SiteData::from_config(&site.config),
            config_hash,
            manifest: Mutex::new(manifest),
        })
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    pub fn helpers(&self) -> &Helpers {
        &self.helpers
    }

    /// Generate the home page, every known post and the 404 page
    pub async fn generate(&self) -> Result<GenerateStats> {
        fs::create_dir_all(&self.site.public_dir)?;

        self.generate_index().await?;

        let uids = pages::static_paths(&self.spec, &self.site.config).await;
        tracing::info!("Pre-rendering {} posts", uids.len());

        let mut stats = GenerateStats::default();
        for uid in &uids {
            match self.generate_post(uid).await? {
                PostOutcome::Written(_) => stats.posts += 1,
                PostOutcome::NotFound(NotFoundCause::Missing) => stats.missing += 1,
                PostOutcome::NotFound(NotFoundCause::Unavailable) => stats.unavailable += 1,
            }
        }

        let not_found = self.render_not_found(false)?;
        self.write_page("404.html", &not_found)?;

        self.save_manifest()?;
        Ok(stats)
    }

    /// Generate the home page with the first page of posts
    pub async fn generate_index(&self) -> Result<String> {
        let props = pages::index_props(&self.spec, &self.site.config).await;

        let existing = self.site.public_dir.join("index.html");
        if props.props.posts_pagination.results.is_empty() && existing.exists() {
            tracing::warn!("Listing came back empty, keeping previous home page");
            return Ok(fs::read_to_string(existing)?);
        }

        let mut context = self.create_base_context();
        context.insert("listing", &props.props.posts_pagination);
        let html = self.renderer.render("index.html", &context)?;

        self.write_page("index.html", &html)?;
        self.record(INDEX_ROUTE, "index.html", props.revalidate);
        Ok(html)
    }

    /// Generate a single post page
    pub async fn generate_post(&self, uid: &str) -> Result<PostOutcome> {
        let props = pages::post_props(&self.spec, &self.site.config, uid).await;
        let route = post_path(uid);
        let output = post_output(uid);

        match props.props {
            DetailState::Resolved(detail) => {
                let html = self.render_post(&detail)?;
                self.write_page(&output, &html)?;
                self.record(&route, &output, props.revalidate);
                tracing::debug!("Generated {}", route);
                Ok(PostOutcome::Written(html))
            }
            DetailState::NotFound(NotFoundCause::Missing) => {
                if is_valid_uid(uid) {
                    self.remove_page(&route, &output)?;
                }
                Ok(PostOutcome::NotFound(NotFoundCause::Missing))
            }
            // post_props never yields Pending
            DetailState::NotFound(NotFoundCause::Unavailable) | DetailState::Pending => {
                tracing::warn!("Keeping previous version of {}", route);
                Ok(PostOutcome::NotFound(NotFoundCause::Unavailable))
            }
        }
    }

    /// Render a resolved post
    pub fn render_post(&self, detail: &ContentDetail) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert(
            "post",
            &PostData::new(detail, &self.helpers, self.site.config.words_per_minute),
        );
        context.insert(
            "canonical",
            &full_url_for(&self.site.config, &post_path(&detail.uid)),
        );
        self.renderer.render("post.html", &context)
    }

    /// Render the loading indicator shown while a post is generated
    pub fn render_loading(&self) -> Result<String> {
        self.renderer
            .render("loading.html", &self.create_base_context())
    }

    /// Render the not-found page
    pub fn render_not_found(&self, unavailable: bool) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("unavailable", &unavailable);
        self.renderer.render("404.html", &context)
    }

    /// Freshness of a route right now
    pub fn freshness(&self, route: &str) -> Freshness {
        let now = chrono::Utc::now().timestamp();
        self.manifest().freshness(route, now, self.config_hash)
    }

    /// Persist the manifest
    pub fn save_manifest(&self) -> Result<()> {
        let manifest = self.manifest().clone();
        manifest.save(&self.site.base_dir)
    }

    fn manifest(&self) -> MutexGuard<'_, CacheDb> {
        self.manifest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, route: &str, output: &str, revalidate: u64) {
        let now = chrono::Utc::now().timestamp();
        self.manifest().record(route, output, revalidate, now);
    }

    fn write_page(&self, output: &str, html: &str) -> Result<()> {
        let path = self.site.public_dir.join(output);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, html)?;
        Ok(())
    }

    fn remove_page(&self, route: &str, output: &str) -> Result<()> {
        let path = self.site.public_dir.join(output);
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::info!("Removed {}", route);
            if let Some(parent) = path.parent() {
                // Leaves the directory alone if anything else lives there
                let _ = fs::remove_dir(parent);
            }
        }
        self.manifest().remove(route);
        Ok(())
    }

    /// Create base context with site data
    fn create_base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site_data);
        let now = chrono::Utc::now().with_timezone(&self.helpers.tz());
        context.insert("current_year", &now.format("%Y").to_string());
        context
    }
}

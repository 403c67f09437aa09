//! Family-tree slide generation.
//!
//! Turns a flat list of people into an ordered deck of couple slides
//! (depth-first from the generation-0 roots), derives filter tags from the
//! data, and serves both over a small HTTP API.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod family_names;
pub mod filter;
pub mod formatting;
pub mod lineage;
pub mod models;
pub mod people;
pub mod slides;
pub mod tags;
pub mod validation;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::{Mutex, RwLock};

pub use cache::SlideQueryCache;
pub use config::Config;
pub use dataset::Dataset;
pub use filter::{categorize_tags, filter_slides, CategorizedTags};
pub use models::{Couple, Person, ResolvedFamilySlide, TagDefinition, TagType};
pub use slides::{generate_resolved_slides, generate_resolved_slides_from_people, SlideOptions};
pub use tags::{generate_tags_from_people, TagCatalog};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub dataset: Arc<RwLock<Arc<Dataset>>>,
    pub cache: Arc<Mutex<SlideQueryCache>>,
}

impl AppState {
    pub fn new(config: Config, dataset: Dataset) -> Self {
        let cache = SlideQueryCache::with_capacity(config.cache_capacity);
        Self {
            config,
            dataset: Arc::new(RwLock::new(Arc::new(dataset))),
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    /// Current dataset; stays valid across a concurrent reload.
    pub async fn snapshot(&self) -> Arc<Dataset> {
        self.dataset.read().await.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(api::healthz))
        .route("/v1/slides", get(api::list_slides))
        .route("/v1/slides/{identifier}", get(api::get_slide))
        .route("/v1/tags", get(api::list_tags))
        .route("/v1/tags/{tag_type}", get(api::tags_by_type))
        .route("/v1/validation", get(api::validation_report))
        .route("/v1/admin/reload", post(api::reload))
        .with_state(state)
}

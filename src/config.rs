use std::{env, fs, net::SocketAddr, path::PathBuf};

use anyhow::Result;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dataset::DatasetSettings,
    family_names::{FamilyNamePolicy, DEFAULT_DEPRIORITIZED_FAMILY},
    lineage::DEFAULT_ROOT_LABEL,
    slides::SlideOptions,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub people_path: PathBuf,
    pub root_label: String,
    pub deprioritized_family: Option<String>,
    pub annotate_tags: bool,
    pub cache_capacity: usize,
    pub admin_key: String,
    pub admin_key_is_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            people_path: PathBuf::from("data/people.json"),
            root_label: DEFAULT_ROOT_LABEL.to_string(),
            deprioritized_family: Some(DEFAULT_DEPRIORITIZED_FAMILY.to_string()),
            annotate_tags: true,
            cache_capacity: 64,
            admin_key: format!("fallback-{}", Uuid::new_v4()),
            admin_key_is_fallback: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let bind_raw =
            env::var("FAMILY_SLIDES_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_normalized = bind_raw
            .trim()
            .trim_matches('"')
            .trim_matches('\'')
            .to_string();
        let bind_addr = bind_normalized
            .parse::<SocketAddr>()
            .unwrap_or(defaults.bind_addr);

        let people_path = env::var("FAMILY_SLIDES_PEOPLE_PATH")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.people_path);

        let root_label = env::var("FAMILY_SLIDES_ROOT_LABEL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.root_label);

        // Set but empty disables the preference entirely.
        let deprioritized_family = match env::var("FAMILY_SLIDES_DEPRIORITIZED_FAMILY") {
            Ok(v) if v.trim().is_empty() => None,
            Ok(v) => Some(v.trim().to_string()),
            Err(_) => defaults.deprioritized_family,
        };

        let annotate_tags = env::var("FAMILY_SLIDES_ANNOTATE_TAGS")
            .ok()
            .map(|v| parse_flag(&v))
            .unwrap_or(defaults.annotate_tags);

        let cache_capacity = env::var("FAMILY_SLIDES_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(defaults.cache_capacity);

        let (admin_key, admin_key_is_fallback) = resolve_admin_key();

        Ok(Self {
            bind_addr,
            people_path,
            root_label,
            deprioritized_family,
            annotate_tags,
            cache_capacity,
            admin_key,
            admin_key_is_fallback,
        })
    }

    pub fn dataset_settings(&self) -> DatasetSettings {
        DatasetSettings {
            slide_options: SlideOptions {
                root_label: self.root_label.clone(),
                family_names: FamilyNamePolicy::new(self.deprioritized_family.clone()),
            },
            annotate_tags: self.annotate_tags,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn resolve_admin_key() -> (String, bool) {
    if let Ok(value) = env::var("FAMILY_SLIDES_ADMIN_KEY") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return (trimmed.to_string(), false);
        }
    }

    if let Ok(key_file) = env::var("FAMILY_SLIDES_ADMIN_KEY_FILE") {
        match fs::read_to_string(&key_file) {
            Ok(raw) => {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return (trimmed.to_string(), false);
                }
                warn!(
                    key_file = %key_file,
                    "FAMILY_SLIDES_ADMIN_KEY_FILE is empty, falling back to generated key"
                );
            }
            Err(err) => {
                warn!(
                    key_file = %key_file,
                    error = %err,
                    "Failed reading FAMILY_SLIDES_ADMIN_KEY_FILE, falling back to generated key"
                );
            }
        }
    } else {
        warn!("FAMILY_SLIDES_ADMIN_KEY not set, falling back to generated key");
    }

    (format!("fallback-{}", Uuid::new_v4()), true)
}

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::fs;
use tracing::{info, warn};

use crate::{
    error::DatasetError,
    family_names::format_family_name_for_slide,
    formatting::{format_couple_names, slide_id, unique_locations},
    models::{Person, ResolvedFamilySlide, SlidePayload},
    slides::{generate_resolved_slides, SlideOptions},
    tags::{annotate_people_tags, TagCatalog},
    validation::{validate, ValidationReport},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetSettings {
    pub slide_options: SlideOptions,
    pub annotate_tags: bool,
}

#[derive(Debug, Deserialize)]
struct WrappedPeople {
    people: Vec<Person>,
}

/// Parse a people file holding either a bare list or `{ "people": [...] }`.
///
/// The shape is picked from the first non-whitespace byte so serde's
/// field, line and column survive into the error.
pub fn parse_people(raw: &str) -> Result<Vec<Person>, serde_json::Error> {
    match raw.trim_start().as_bytes().first() {
        Some(b'{') => serde_json::from_str::<WrappedPeople>(raw).map(|file| file.people),
        _ => serde_json::from_str(raw),
    }
}

pub async fn read_people(path: &Path) -> Result<Vec<Person>, DatasetError> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_people(&raw).map_err(|source| DatasetError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// People plus everything derived from them, for one load of the data file.
///
/// Immutable once built; a reload builds a new one with a higher version.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
    pub people: Vec<Person>,
    pub slides: Vec<ResolvedFamilySlide>,
    pub catalog: TagCatalog,
    pub report: ValidationReport,
    pub settings: DatasetSettings,
}

impl Dataset {
    pub fn build(people: Vec<Person>, settings: DatasetSettings, version: u64) -> Self {
        let people = if settings.annotate_tags {
            annotate_people_tags(&people)
        } else {
            people
        };
        let slides = generate_resolved_slides(&people, &settings.slide_options);
        let catalog = TagCatalog::from_people(&people);
        let report = validate(&people, &slides);

        info!(
            version,
            people = people.len(),
            slides = slides.len(),
            tags = catalog.tags().len(),
            critical_issues = report.critical_count(),
            warnings = report.warning_count(),
            "Family dataset built"
        );
        if report.critical_count() > 0 {
            warn!(
                version,
                duplicate_ids = report.issues.duplicate_ids.len(),
                invalid_spouses = report.issues.invalid_spouse_references.len(),
                invalid_children = report.issues.invalid_child_references.len(),
                invalid_parents = report.issues.invalid_parent_references.len(),
                "Family dataset has critical integrity issues"
            );
        }
        if !report.issues.descent_cycles.is_empty() {
            warn!(
                version,
                cycles = report.issues.descent_cycles.len(),
                "Family dataset contains descent cycles"
            );
        }

        Self {
            version,
            loaded_at: Utc::now(),
            people,
            slides,
            catalog,
            report,
            settings,
        }
    }

    /// Slide at `index` with the display fields the front end renders.
    pub fn payload(&self, index: usize) -> Option<SlidePayload> {
        let slide = self.slides.get(index)?;
        let partner1 = &slide.couple.partner1;
        let partner2 = slide.couple.partner2.as_ref();
        Some(SlidePayload {
            index,
            slide_id: slide_id(&partner1.id),
            couple_names: format_couple_names(partner1, partner2),
            family_name_display: format_family_name_for_slide(
                partner1,
                partner2,
                &self.settings.slide_options.family_names,
            ),
            locations: unique_locations(partner1, partner2),
            slide: slide.clone(),
        })
    }
}

pub async fn load(
    path: &Path,
    settings: DatasetSettings,
    version: u64,
) -> Result<Dataset, DatasetError> {
    let people = read_people(path).await?;
    info!(path = %path.display(), people = people.len(), "People file read");
    Ok(Dataset::build(people, settings, version))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[serde(other)]
    Other,
}

/// One individual in the hand-maintained dataset.
///
/// Relational fields (`spouse_id`, `children_ids`, `parent_ids`) hold IDs of
/// other records and are resolved through [`crate::people::PeopleIndex`].
/// Dangling references are tolerated everywhere.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub honorific: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deceased: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_siblings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spouse_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_ids: Vec<String>,
}

impl Person {
    pub fn is_root(&self) -> bool {
        self.generation == Some(0)
    }

    pub fn is_male(&self) -> bool {
        self.gender == Some(Gender::Male)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Spouse reference, ignoring blank IDs.
    pub fn spouse_ref(&self) -> Option<&str> {
        self.spouse_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Explicit `familyName`, ignoring blank values.
    pub fn explicit_family_name(&self) -> Option<&str> {
        self.family_name.as_deref().filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Couple {
    pub partner1: Person,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner2: Option<Person>,
}

impl Couple {
    pub fn partners(&self) -> impl Iterator<Item = &Person> {
        std::iter::once(&self.partner1).chain(self.partner2.as_ref())
    }

    pub fn contains(&self, person_id: &str) -> bool {
        self.partners().any(|p| p.id == person_id)
    }
}

/// A couple plus their children, derived from the people list on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFamilySlide {
    pub couple: Couple,
    pub children: Vec<Person>,
    pub child_index: String,
    pub family_name: String,
    pub breadcrumb: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    Location,
    Generation,
    Family,
    Custom,
}

impl TagType {
    pub const ALL: [TagType; 4] = [
        TagType::Location,
        TagType::Generation,
        TagType::Family,
        TagType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Generation => "generation",
            Self::Family => "family",
            Self::Custom => "custom",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }

    /// Location, generation and family tags are AND-combined filters.
    pub fn is_filter(&self) -> bool {
        !matches!(self, Self::Custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDefinition {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub tag_type: TagType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TagDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>, tag_type: TagType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tag_type,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTags {
    pub tags: Vec<TagDefinition>,
    pub tag_labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlidePayload {
    pub index: usize,
    pub slide_id: String,
    pub couple_names: String,
    pub family_name_display: String,
    pub locations: Vec<String>,
    #[serde(flatten)]
    pub slide: ResolvedFamilySlide,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlidesResponse {
    pub dataset_version: u64,
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub matched: usize,
    pub params: BTreeMap<String, String>,
    pub slides: Vec<SlidePayload>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideLookupResponse {
    pub dataset_version: u64,
    pub slide: SlidePayload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadResponse {
    pub dataset_version: u64,
    pub loaded_at: DateTime<Utc>,
    pub people: usize,
    pub slides: usize,
    pub tags: usize,
    pub critical_issues: usize,
}

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::{
    family_names::FAMILY_TAG_PREFIX,
    models::{GeneratedTags, Person, TagDefinition, TagType},
};

pub const LOCATION_TAG_PREFIX: &str = "LOCATION_";
pub const GENERATION_TAG_PREFIX: &str = "GENERATION_";

/// Hand-maintained tags that no person field can produce.
pub fn custom_tags() -> Vec<TagDefinition> {
    vec![
        TagDefinition::new("NYC-Wedding", "NYC Wedding", TagType::Custom),
        TagDefinition::new("WGK", "WGK", TagType::Custom),
    ]
}

/// `"Mumbai, Maharashtra"` → `"Mumbai"`.
pub fn extract_city(location: &str) -> Option<String> {
    let city = location.split(',').next()?.trim();
    (!city.is_empty()).then(|| city.to_string())
}

/// Uppercase, whitespace runs to `_`, everything outside `[A-Z0-9_]` dropped.
fn tag_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_space = false;
    for ch in raw.to_uppercase().chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_' {
            out.push(ch);
        }
    }
    out
}

pub fn location_tag_id(city: &str) -> String {
    format!("{LOCATION_TAG_PREFIX}{}", tag_segment(city))
}

pub fn generation_tag_id(generation: i64) -> String {
    format!("{GENERATION_TAG_PREFIX}{generation}")
}

pub fn family_tag_id(family_name: &str) -> String {
    format!("{FAMILY_TAG_PREFIX}{}", tag_segment(family_name))
}

pub fn generation_label(generation: i64) -> String {
    match generation {
        0 => "Great-Grandparents".to_string(),
        1 => "Grandparents".to_string(),
        2 => "Aunts and Uncles".to_string(),
        3 => "Cousins".to_string(),
        4 => "Nieces and Nephews".to_string(),
        5 => "Next Generation".to_string(),
        n => format!("Generation {n}"),
    }
}

/// `FAMILY_VAN_DYKE` → `Van Dyke`. Every underscore-separated word is title-cased.
pub fn family_label_from_tag(tag: &str) -> Option<String> {
    let rest = tag.strip_prefix(FAMILY_TAG_PREFIX)?.to_lowercase();
    let label = rest
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    (!label.trim().is_empty()).then_some(label)
}

fn is_generated_prefix(tag: &str) -> bool {
    tag.starts_with(LOCATION_TAG_PREFIX)
        || tag.starts_with(GENERATION_TAG_PREFIX)
        || tag.starts_with(FAMILY_TAG_PREFIX)
}

/// Family names a person belongs to, from `familyName` and `FAMILY_*` tags.
fn family_names_of(person: &Person) -> impl Iterator<Item = String> + '_ {
    person
        .explicit_family_name()
        .map(ToString::to_string)
        .into_iter()
        .chain(person.tags.iter().filter_map(|tag| family_label_from_tag(tag)))
}

/// Derive location, generation, family and custom tag definitions from the people list.
///
/// Output order is locations (by city), generations (ascending), families
/// (by name), data-only custom tags (by ID), then the static custom list.
/// Static entries replace data-derived ones with the same ID.
pub fn generate_tags_from_people(people: &[Person]) -> GeneratedTags {
    let mut cities: BTreeSet<String> = BTreeSet::new();
    let mut full_location: HashMap<String, String> = HashMap::new();
    let mut generations: BTreeSet<i64> = BTreeSet::new();
    let mut families: BTreeSet<String> = BTreeSet::new();
    let mut custom: BTreeSet<&str> = BTreeSet::new();

    for person in people {
        if let Some(location) = person.location.as_deref() {
            if let Some(city) = extract_city(location) {
                full_location
                    .entry(city.clone())
                    .or_insert_with(|| location.to_string());
                cities.insert(city);
            }
        }
        if let Some(generation) = person.generation {
            generations.insert(generation);
        }
        families.extend(family_names_of(person));
        custom.extend(
            person
                .tags
                .iter()
                .map(String::as_str)
                .filter(|tag| !tag.is_empty() && !is_generated_prefix(tag)),
        );
    }

    let mut tags: Vec<TagDefinition> = Vec::new();
    let mut emitted: HashSet<String> = HashSet::new();

    for city in &cities {
        let id = location_tag_id(city);
        if !emitted.insert(id.clone()) {
            continue;
        }
        let mut tag = TagDefinition::new(id, city.clone(), TagType::Location);
        if let Some(full) = full_location.get(city).filter(|full| *full != city) {
            tag = tag.with_description(full.clone());
        }
        tags.push(tag);
    }

    for generation in &generations {
        let id = generation_tag_id(*generation);
        emitted.insert(id.clone());
        tags.push(
            TagDefinition::new(id, generation_label(*generation), TagType::Generation)
                .with_description(format!("Generation level {generation}")),
        );
    }

    for family in &families {
        let id = family_tag_id(family);
        if !emitted.insert(id.clone()) {
            continue;
        }
        tags.push(TagDefinition::new(id, family.clone(), TagType::Family));
    }

    let statics = custom_tags();
    let static_ids: HashSet<&str> = statics.iter().map(|t| t.id.as_str()).collect();
    for tag in custom {
        let shadowed = static_ids.contains(tag)
            || tags.iter().any(|t| t.id == tag || t.label == tag);
        if shadowed {
            continue;
        }
        tags.push(TagDefinition::new(tag, tag, TagType::Custom));
    }
    tags.extend(statics);

    let tag_labels: BTreeMap<String, String> = tags
        .iter()
        .map(|t| (t.id.clone(), t.label.clone()))
        .collect();

    GeneratedTags { tags, tag_labels }
}

/// Copy of `people` with derived location, generation and family tag IDs added.
///
/// Tags on each person come out de-duplicated and sorted.
pub fn annotate_people_tags(people: &[Person]) -> Vec<Person> {
    people
        .iter()
        .map(|person| {
            let mut tags: BTreeSet<String> = person.tags.iter().cloned().collect();
            if let Some(city) = person.location.as_deref().and_then(extract_city) {
                tags.insert(location_tag_id(&city));
            }
            if let Some(generation) = person.generation {
                tags.insert(generation_tag_id(generation));
            }
            for family in family_names_of(person) {
                tags.insert(family_tag_id(&family));
            }
            Person {
                tags: tags.into_iter().collect(),
                ..person.clone()
            }
        })
        .collect()
}

/// Tag definitions with lookups by ID and by type.
///
/// The `TagType` recorded at generation time is the only classification
/// consumers should use.
#[derive(Debug, Clone, Default)]
pub struct TagCatalog {
    generated: GeneratedTags,
    by_id: HashMap<String, usize>,
}

impl TagCatalog {
    pub fn from_people(people: &[Person]) -> Self {
        Self::from_generated(generate_tags_from_people(people))
    }

    pub fn from_generated(generated: GeneratedTags) -> Self {
        let mut by_id = HashMap::new();
        for (idx, tag) in generated.tags.iter().enumerate() {
            by_id.entry(tag.id.clone()).or_insert(idx);
        }
        Self { generated, by_id }
    }

    pub fn generated(&self) -> &GeneratedTags {
        &self.generated
    }

    pub fn tags(&self) -> &[TagDefinition] {
        &self.generated.tags
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.generated.tag_labels
    }

    pub fn get(&self, id: &str) -> Option<&TagDefinition> {
        self.by_id.get(id).and_then(|idx| self.generated.tags.get(*idx))
    }

    /// Display label, falling back to the ID itself.
    pub fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.generated
            .tag_labels
            .get(id)
            .map(String::as_str)
            .unwrap_or(id)
    }

    pub fn type_of(&self, id: &str) -> Option<TagType> {
        self.get(id).map(|t| t.tag_type)
    }

    pub fn by_type(&self, tag_type: TagType) -> impl Iterator<Item = &TagDefinition> {
        self.generated
            .tags
            .iter()
            .filter(move |t| t.tag_type == tag_type)
    }

    pub fn ids_of(&self, tag_type: TagType) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.by_type(tag_type)
            .map(|t| t.id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

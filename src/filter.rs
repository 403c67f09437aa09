use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    models::{Person, ResolvedFamilySlide, TagType},
    tags::TagCatalog,
};

pub const LOCATION_PARAM: &str = "location";
pub const GENERATION_PARAM: &str = "generation";
pub const FAMILY_PARAM: &str = "family";
pub const TAGS_PARAM: &str = "tags";

/// Selected tags split by filter category.
///
/// Holds at most one tag per filter category: when several of the same
/// category are selected, the first one wins and the rest are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedTags {
    pub location: Option<String>,
    pub generation: Option<String>,
    pub family: Option<String>,
    pub custom: Vec<String>,
}

impl CategorizedTags {
    pub fn is_empty(&self) -> bool {
        self.location.is_none()
            && self.generation.is_none()
            && self.family.is_none()
            && self.custom.is_empty()
    }

    /// Flatten back to a selection list, filters first.
    pub fn selected(&self) -> Vec<String> {
        self.location
            .iter()
            .chain(&self.generation)
            .chain(&self.family)
            .chain(&self.custom)
            .cloned()
            .collect()
    }
}

pub fn categorize_tags(selected: &[String], catalog: &TagCatalog) -> CategorizedTags {
    let first_of = |tag_type: TagType| {
        selected
            .iter()
            .find(|tag| catalog.type_of(tag) == Some(tag_type))
            .cloned()
    };

    CategorizedTags {
        location: first_of(TagType::Location),
        generation: first_of(TagType::Generation),
        family: first_of(TagType::Family),
        custom: selected
            .iter()
            .filter(|tag| catalog.type_of(tag) == Some(TagType::Custom))
            .cloned()
            .collect(),
    }
}

/// [`categorize_tags`] against tags generated from `people`.
pub fn categorize_tags_for_people(selected: &[String], people: &[Person]) -> CategorizedTags {
    categorize_tags(selected, &TagCatalog::from_people(people))
}

/// Encode categorized tags as key/value filter state, on top of `extra`.
pub fn build_tag_params(
    tags: &CategorizedTags,
    extra: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut params = extra.clone();

    if let Some(location) = &tags.location {
        params.insert(LOCATION_PARAM.to_string(), location.clone());
    }
    if let Some(generation) = &tags.generation {
        params.insert(GENERATION_PARAM.to_string(), generation.clone());
    }
    if let Some(family) = &tags.family {
        params.insert(FAMILY_PARAM.to_string(), family.clone());
    }
    if !tags.custom.is_empty() {
        params.insert(TAGS_PARAM.to_string(), tags.custom.join(","));
    }

    params
}

/// Inverse of [`build_tag_params`]: the selected tag IDs encoded in `params`.
///
/// Reads the single-valued category keys first, then the comma-separated
/// `tags` list, skipping blanks and repeats.
pub fn selected_tags_from_params(params: &BTreeMap<String, String>) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();

    for key in [LOCATION_PARAM, GENERATION_PARAM, FAMILY_PARAM] {
        if let Some(value) = params.get(key).filter(|v| !v.is_empty()) {
            selected.push(value.clone());
        }
    }

    if let Some(list) = params.get(TAGS_PARAM) {
        for tag in list.split(',') {
            if tag.trim().is_empty() || selected.iter().any(|s| s == tag) {
                continue;
            }
            selected.push(tag.to_string());
        }
    }

    selected
}

/// Split a selection into AND-combined filter tags and OR-combined custom tags.
///
/// Unlike [`categorize_tags`], every selected filter tag is kept.
pub fn separate_filter_and_custom_tags(
    selected: &[String],
    catalog: &TagCatalog,
) -> (Vec<String>, Vec<String>) {
    let mut filters = Vec::new();
    let mut custom = Vec::new();
    for tag in selected {
        match catalog.type_of(tag) {
            Some(TagType::Custom) => custom.push(tag.clone()),
            Some(_) => filters.push(tag.clone()),
            None => {}
        }
    }
    (filters, custom)
}

/// Whether either partner carries `tag`.
///
/// Deceased partners never match location tags.
fn slide_has_tag(slide: &ResolvedFamilySlide, tag: &str, is_location: bool) -> bool {
    slide
        .couple
        .partners()
        .any(|p| p.has_tag(tag) && !(is_location && p.deceased))
}

pub fn slide_matches(
    slide: &ResolvedFamilySlide,
    filters: &[String],
    custom: &[String],
    catalog: &TagCatalog,
) -> bool {
    let matches_filters = filters.iter().all(|tag| {
        let is_location = catalog.type_of(tag) == Some(TagType::Location);
        slide_has_tag(slide, tag, is_location)
    });
    let matches_custom =
        custom.is_empty() || custom.iter().any(|tag| slide_has_tag(slide, tag, false));
    matches_filters && matches_custom
}

/// Slides matching the selection; all of them when nothing is selected.
pub fn filter_slides<'s>(
    slides: &'s [ResolvedFamilySlide],
    selected: &[String],
    catalog: &TagCatalog,
) -> Vec<(usize, &'s ResolvedFamilySlide)> {
    let (filters, custom) = separate_filter_and_custom_tags(selected, catalog);
    slides
        .iter()
        .enumerate()
        .filter(|(_, slide)| selected.is_empty() || slide_matches(slide, &filters, &custom, catalog))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::Couple,
        people::fixtures::{family, person},
        slides::generate_resolved_slides_from_people,
        tags::annotate_people_tags,
    };

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn slide(partner1: Person, partner2: Option<Person>) -> ResolvedFamilySlide {
        ResolvedFamilySlide {
            couple: Couple { partner1, partner2 },
            children: Vec::new(),
            child_index: "Child 1 / 1".into(),
            family_name: "Test".into(),
            breadcrumb: Vec::new(),
        }
    }

    fn catalog_people() -> Vec<Person> {
        let mut a = person("a", "A", 1);
        a.location = Some("Mumbai, Maharashtra".into());
        a.tags = strings(&["NYC-Wedding"]);
        let mut b = person("b", "B", 2);
        b.location = Some("Pune, Maharashtra".into());
        b.family_name = Some("Joshi".into());
        annotate_people_tags(&[a, b])
    }

    #[test]
    fn categorize_keeps_first_per_category() {
        let catalog = TagCatalog::from_people(&catalog_people());
        let selected = strings(&[
            "LOCATION_PUNE",
            "GENERATION_1",
            "LOCATION_MUMBAI",
            "WGK",
            "NYC-Wedding",
            "not-a-tag",
        ]);
        let categorized = categorize_tags(&selected, &catalog);
        assert_eq!(categorized.location.as_deref(), Some("LOCATION_PUNE"));
        assert_eq!(categorized.generation.as_deref(), Some("GENERATION_1"));
        assert_eq!(categorized.family, None);
        assert_eq!(categorized.custom, strings(&["WGK", "NYC-Wedding"]));
    }

    #[test]
    fn categorize_for_people_builds_its_own_catalog() {
        let categorized =
            categorize_tags_for_people(&strings(&["FAMILY_JOSHI"]), &catalog_people());
        assert_eq!(categorized.family.as_deref(), Some("FAMILY_JOSHI"));
        assert!(categorized.custom.is_empty());
    }

    #[test]
    fn params_round_trip_through_selection() {
        let categorized = CategorizedTags {
            location: Some("LOCATION_MUMBAI".into()),
            generation: None,
            family: Some("FAMILY_JOSHI".into()),
            custom: strings(&["NYC-Wedding", "WGK"]),
        };
        let mut extra = BTreeMap::new();
        extra.insert("from".to_string(), "ravi".to_string());
        let params = build_tag_params(&categorized, &extra);
        assert_eq!(params["location"], "LOCATION_MUMBAI");
        assert_eq!(params["family"], "FAMILY_JOSHI");
        assert_eq!(params["tags"], "NYC-Wedding,WGK");
        assert_eq!(params["from"], "ravi");
        assert!(!params.contains_key("generation"));

        assert_eq!(selected_tags_from_params(&params), categorized.selected());
    }

    #[test]
    fn selection_from_params_skips_blanks_and_repeats() {
        let mut params = BTreeMap::new();
        params.insert("location".to_string(), "LOCATION_PUNE".to_string());
        params.insert("tags".to_string(), "WGK,, ,LOCATION_PUNE,WGK".to_string());
        assert_eq!(selected_tags_from_params(&params), strings(&["LOCATION_PUNE", "WGK"]));
        assert!(selected_tags_from_params(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn filters_and_while_custom_tags_or() {
        let catalog = TagCatalog::from_people(&catalog_people());
        let mut p1 = person("x", "X", 1);
        p1.tags = strings(&["LOCATION_MUMBAI", "GENERATION_1", "NYC-Wedding"]);
        let mut p2 = person("y", "Y", 1);
        p2.tags = strings(&["LOCATION_MUMBAI", "GENERATION_1"]);
        let mut p3 = person("z", "Z", 1);
        p3.tags = strings(&["GENERATION_1", "NYC-Wedding"]);

        let slides = vec![slide(p1, None), slide(p2, None), slide(p3, None)];
        let selected = strings(&["LOCATION_MUMBAI", "GENERATION_1", "NYC-Wedding"]);
        let matched: Vec<_> = filter_slides(&slides, &selected, &catalog)
            .iter()
            .map(|(idx, _)| *idx)
            .collect();
        assert_eq!(matched, vec![0]);

        let either_custom = strings(&["WGK", "NYC-Wedding"]);
        let matched: Vec<_> = filter_slides(&slides, &either_custom, &catalog)
            .iter()
            .map(|(idx, _)| *idx)
            .collect();
        assert_eq!(matched, vec![0, 2]);
    }

    #[test]
    fn deceased_partner_does_not_match_location() {
        let catalog = TagCatalog::from_people(&catalog_people());
        let mut gone = person("g", "G", 1);
        gone.deceased = true;
        gone.tags = strings(&["LOCATION_MUMBAI", "GENERATION_1"]);
        let mut living = person("l", "L", 1);
        living.tags = strings(&["LOCATION_MUMBAI"]);

        let only_deceased = vec![slide(gone.clone(), None)];
        assert!(filter_slides(&only_deceased, &strings(&["LOCATION_MUMBAI"]), &catalog).is_empty());
        // Non-location tags still match a deceased partner.
        assert_eq!(filter_slides(&only_deceased, &strings(&["GENERATION_1"]), &catalog).len(), 1);

        let with_living = vec![slide(gone, Some(living))];
        assert_eq!(filter_slides(&with_living, &strings(&["LOCATION_MUMBAI"]), &catalog).len(), 1);
    }

    #[test]
    fn filter_tags_may_match_different_partners() {
        let catalog = TagCatalog::from_people(&catalog_people());
        let mut a = person("a", "A", 1);
        a.tags = strings(&["LOCATION_MUMBAI"]);
        let mut b = person("b", "B", 2);
        b.tags = strings(&["GENERATION_2"]);
        let slides = vec![slide(a, Some(b))];
        let selected = strings(&["LOCATION_MUMBAI", "GENERATION_2"]);
        assert_eq!(filter_slides(&slides, &selected, &catalog).len(), 1);
    }

    #[test]
    fn no_selection_returns_everything() {
        let people = annotate_people_tags(&family());
        let catalog = TagCatalog::from_people(&people);
        let slides = generate_resolved_slides_from_people(&people);
        assert_eq!(filter_slides(&slides, &[], &catalog).len(), slides.len());
    }

    #[test]
    fn family_dataset_location_filter() {
        let people = annotate_people_tags(&family());
        let catalog = TagCatalog::from_people(&people);
        let slides = generate_resolved_slides_from_people(&people);

        let mumbai: Vec<_> = filter_slides(&slides, &strings(&["LOCATION_MUMBAI"]), &catalog)
            .iter()
            .map(|(_, s)| s.couple.partner1.id.clone())
            .collect();
        assert_eq!(mumbai, vec!["ravi"]);

        // Govind is deceased, so his Pune location does not match.
        assert!(filter_slides(&slides, &strings(&["LOCATION_PUNE"]), &catalog).is_empty());
    }
}

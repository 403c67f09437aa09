use std::collections::HashSet;

use crate::{
    family_names::{derive_family_name_for_slide, FamilyNamePolicy},
    lineage::{build_breadcrumb, calculate_child_index, DEFAULT_ROOT_LABEL},
    models::{Couple, Person, ResolvedFamilySlide},
    people::{build_index, PeopleIndex},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideOptions {
    pub root_label: String,
    pub family_names: FamilyNamePolicy,
}

impl Default for SlideOptions {
    fn default() -> Self {
        Self {
            root_label: DEFAULT_ROOT_LABEL.to_string(),
            family_names: FamilyNamePolicy::default(),
        }
    }
}

/// Heuristic: generation-0 people and anyone with parent links are descendants.
///
/// A married-in spouse who was given `parent_ids` is misclassified.
pub fn is_in_bloodline(person: &Person) -> bool {
    person.is_root() || !person.parent_ids.is_empty()
}

/// Order `person` and their spouse so the blood relative comes first.
///
/// When both or neither qualify, `person` (the one the traversal reached
/// first) stays partner1.
pub fn resolve_partners<'a>(
    person: &'a Person,
    spouse: Option<&'a Person>,
) -> (&'a Person, Option<&'a Person>) {
    match spouse {
        Some(spouse) if !is_in_bloodline(person) && is_in_bloodline(spouse) => {
            (spouse, Some(person))
        }
        spouse => (person, spouse),
    }
}

/// Pre-order depth-first walk from every generation-0 person, in input order.
///
/// Children are visited in `children_ids` order. Already visited IDs are
/// skipped, so reconverging lines and malformed cycles terminate. People not
/// reachable from a root are never returned.
pub fn depth_first_traversal<'a>(people: &'a [Person], index: &PeopleIndex<'a>) -> Vec<&'a Person> {
    let mut order = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();

    for root in people.iter().filter(|p| p.is_root()) {
        // Explicit stack; children pushed in reverse to keep list order.
        let mut stack = vec![index.get(&root.id).unwrap_or(root)];
        while let Some(person) = stack.pop() {
            if !visited.insert(person.id.as_str()) {
                continue;
            }
            order.push(person);
            for child_id in person.children_ids.iter().rev() {
                if let Some(child) = index.get(child_id) {
                    if !visited.contains(child.id.as_str()) {
                        stack.push(child);
                    }
                }
            }
        }
    }

    order
}

fn qualifies_for_slide(person: &Person) -> bool {
    person.spouse_ref().is_some() || !person.children_ids.is_empty() || person.is_root()
}

/// Union of both partners' children, partner1's order first.
fn merge_children(
    partner1: &Person,
    partner2: Option<&Person>,
    index: &PeopleIndex<'_>,
) -> Vec<Person> {
    let mut seen = HashSet::new();
    let mut children = Vec::new();

    let lists = std::iter::once(partner1).chain(partner2);
    for parent in lists {
        for child in index.children_of(parent) {
            if seen.insert(child.id.as_str()) {
                children.push(child.clone());
            }
        }
    }

    children
}

/// Couple-plus-children slides in traversal order, using default options.
pub fn generate_resolved_slides_from_people(people: &[Person]) -> Vec<ResolvedFamilySlide> {
    generate_resolved_slides(people, &SlideOptions::default())
}

pub fn generate_resolved_slides(
    people: &[Person],
    options: &SlideOptions,
) -> Vec<ResolvedFamilySlide> {
    let index = build_index(people);
    let mut processed: HashSet<&str> = HashSet::new();
    let mut slides = Vec::new();

    for person in depth_first_traversal(people, &index) {
        if processed.contains(person.id.as_str()) || !qualifies_for_slide(person) {
            continue;
        }

        let spouse = index.spouse_of(person);
        let (partner1, partner2) = resolve_partners(person, spouse);

        processed.insert(partner1.id.as_str());
        if let Some(p2) = partner2 {
            processed.insert(p2.id.as_str());
        }

        slides.push(ResolvedFamilySlide {
            children: merge_children(partner1, partner2, &index),
            child_index: calculate_child_index(partner1, &index, &options.root_label),
            family_name: derive_family_name_for_slide(partner1, partner2, &options.family_names),
            breadcrumb: build_breadcrumb(partner1, &index),
            couple: Couple {
                partner1: partner1.clone(),
                partner2: partner2.cloned(),
            },
        });
    }

    slides
}

pub fn find_slide_by_person_id<'s>(
    slides: &'s [ResolvedFamilySlide],
    person_id: &str,
) -> Option<(usize, &'s ResolvedFamilySlide)> {
    slides
        .iter()
        .enumerate()
        .find(|(_, slide)| slide.couple.contains(person_id))
}

pub fn find_slide_by_name<'s>(
    slides: &'s [ResolvedFamilySlide],
    name: &str,
) -> Option<(usize, &'s ResolvedFamilySlide)> {
    slides
        .iter()
        .enumerate()
        .find(|(_, slide)| slide.couple.partners().any(|p| p.name == name))
}

/// Slide containing `identifier`, tried as a person ID first and then as a name.
pub fn find_slide_index(slides: &[ResolvedFamilySlide], identifier: &str) -> Option<usize> {
    find_slide_by_person_id(slides, identifier)
        .or_else(|| find_slide_by_name(slides, identifier))
        .map(|(idx, _)| idx)
}

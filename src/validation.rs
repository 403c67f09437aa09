use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::{
    lineage::sibling_total,
    models::{Person, ResolvedFamilySlide},
    people::{build_index, PeopleIndex},
    slides::depth_first_traversal,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRef {
    pub id: String,
    pub name: String,
}

impl From<&Person> for PersonRef {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id.clone(),
            name: person.name.clone(),
        }
    }
}

/// A relational field pointing at an ID that is not in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingReference {
    pub person: PersonRef,
    pub missing_id: String,
}

/// `person` should reference `expected_id` but does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingBacklink {
    pub person: PersonRef,
    pub expected_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideMissingPeople {
    pub partner1: PersonRef,
    pub missing_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildIndexMismatch {
    pub person: PersonRef,
    pub child_index: String,
    pub expected_total: usize,
    pub actual_siblings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildrenMissingFromSlide {
    pub person: PersonRef,
    pub missing_children_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub total_people: usize,
    pub total_slides: usize,
    pub people_with_spouse: usize,
    pub people_with_children: usize,
    pub people_with_parents: usize,
    pub people_with_family_name: usize,
    pub people_with_tags: usize,
    pub unique_family_names: usize,
    pub unique_tags: usize,
    pub generations: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssues {
    pub duplicate_ids: Vec<String>,
    pub invalid_spouse_references: Vec<DanglingReference>,
    pub invalid_child_references: Vec<DanglingReference>,
    pub invalid_parent_references: Vec<DanglingReference>,
    pub asymmetric_spouses: Vec<MissingBacklink>,
    pub missing_parent_links: Vec<MissingBacklink>,
    pub missing_child_links: Vec<MissingBacklink>,
    pub missing_family_names: Vec<PersonRef>,
    pub orphaned_people: Vec<PersonRef>,
    pub unreachable_people: Vec<PersonRef>,
    pub people_not_in_slides: Vec<PersonRef>,
    pub slides_with_missing_people: Vec<SlideMissingPeople>,
    pub child_index_mismatches: Vec<ChildIndexMismatch>,
    pub children_missing_from_slides: Vec<ChildrenMissingFromSlide>,
    pub descent_cycles: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub stats: ValidationStats,
    pub issues: ValidationIssues,
    pub critical_issues: usize,
}

impl ValidationReport {
    /// Duplicate IDs, dangling references and slides naming unknown people.
    pub fn critical_count(&self) -> usize {
        let issues = &self.issues;
        issues.duplicate_ids.len()
            + issues.invalid_spouse_references.len()
            + issues.invalid_child_references.len()
            + issues.invalid_parent_references.len()
            + issues.slides_with_missing_people.len()
    }

    pub fn warning_count(&self) -> usize {
        let issues = &self.issues;
        issues.asymmetric_spouses.len()
            + issues.missing_parent_links.len()
            + issues.missing_child_links.len()
            + issues.missing_family_names.len()
            + issues.orphaned_people.len()
            + issues.unreachable_people.len()
            + issues.people_not_in_slides.len()
            + issues.child_index_mismatches.len()
            + issues.children_missing_from_slides.len()
            + issues.descent_cycles.len()
    }

    pub fn is_clean(&self) -> bool {
        self.critical_count() == 0 && self.warning_count() == 0
    }
}

/// Check referential integrity of `people` and consistency of `slides` built from them.
pub fn validate(people: &[Person], slides: &[ResolvedFamilySlide]) -> ValidationReport {
    let index = build_index(people);
    let mut issues = ValidationIssues {
        duplicate_ids: duplicate_ids(people),
        ..ValidationIssues::default()
    };

    for person in people {
        check_person_links(person, &index, &mut issues);

        if person.explicit_family_name().is_none() {
            issues.missing_family_names.push(person.into());
        }

        let isolated = person.parent_ids.is_empty()
            && person.spouse_ref().is_none()
            && person.children_ids.is_empty()
            && !person.is_root();
        if isolated {
            issues.orphaned_people.push(person.into());
        }
    }

    let reachable: HashSet<&str> = depth_first_traversal(people, &index)
        .into_iter()
        .map(|p| p.id.as_str())
        .collect();
    issues.unreachable_people = people
        .iter()
        .filter(|p| !reachable.contains(p.id.as_str()))
        .map(PersonRef::from)
        .collect();

    let in_slides = check_slides(slides, &index, &mut issues);
    issues.people_not_in_slides = people
        .iter()
        .filter(|p| !in_slides.contains(p.id.as_str()))
        .map(PersonRef::from)
        .collect();

    issues.descent_cycles = find_descent_cycles(people, &index);

    let mut report = ValidationReport {
        stats: collect_stats(people, slides.len()),
        issues,
        critical_issues: 0,
    };
    report.critical_issues = report.critical_count();
    report
}

fn duplicate_ids(people: &[Person]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for person in people {
        let count = counts.entry(person.id.as_str()).or_insert(0);
        if *count == 0 {
            order.push(person.id.as_str());
        }
        *count += 1;
    }
    order
        .into_iter()
        .filter(|id| counts.get(id).copied().unwrap_or(0) > 1)
        .map(ToString::to_string)
        .collect()
}

fn check_person_links(person: &Person, index: &PeopleIndex<'_>, issues: &mut ValidationIssues) {
    if let Some(spouse_id) = person.spouse_ref() {
        match index.get(spouse_id) {
            None => issues.invalid_spouse_references.push(DanglingReference {
                person: person.into(),
                missing_id: spouse_id.to_string(),
            }),
            Some(spouse) if spouse.spouse_ref() != Some(person.id.as_str()) => {
                issues.asymmetric_spouses.push(MissingBacklink {
                    person: spouse.into(),
                    expected_id: person.id.clone(),
                });
            }
            Some(_) => {}
        }
    }

    for child_id in &person.children_ids {
        match index.get(child_id) {
            None => issues.invalid_child_references.push(DanglingReference {
                person: person.into(),
                missing_id: child_id.clone(),
            }),
            Some(child) if !child.parent_ids.contains(&person.id) => {
                issues.missing_parent_links.push(MissingBacklink {
                    person: child.into(),
                    expected_id: person.id.clone(),
                });
            }
            Some(_) => {}
        }
    }

    for parent_id in &person.parent_ids {
        match index.get(parent_id) {
            None => issues.invalid_parent_references.push(DanglingReference {
                person: person.into(),
                missing_id: parent_id.clone(),
            }),
            Some(parent) if !parent.children_ids.contains(&person.id) => {
                issues.missing_child_links.push(MissingBacklink {
                    person: parent.into(),
                    expected_id: person.id.clone(),
                });
            }
            Some(_) => {}
        }
    }
}

/// Record slide-level issues and return the IDs of everyone a slide shows.
fn check_slides<'s>(
    slides: &'s [ResolvedFamilySlide],
    index: &PeopleIndex<'_>,
    issues: &mut ValidationIssues,
) -> HashSet<&'s str> {
    let mut in_slides = HashSet::new();

    for slide in slides {
        let partner1 = &slide.couple.partner1;
        let shown = slide.couple.partners().chain(slide.children.iter());
        let mut missing_ids = Vec::new();
        for person in shown {
            if index.contains(&person.id) {
                in_slides.insert(person.id.as_str());
            } else {
                missing_ids.push(person.id.clone());
            }
        }
        if !missing_ids.is_empty() {
            issues.slides_with_missing_people.push(SlideMissingPeople {
                partner1: partner1.into(),
                missing_ids,
            });
        }

        if let Some(expected_total) = sibling_total(&slide.child_index) {
            let actual_siblings = partner1
                .parent_ids
                .first()
                .and_then(|id| index.get(id))
                .map(|parent| parent.children_ids.len())
                .unwrap_or(0);
            if actual_siblings != expected_total {
                issues.child_index_mismatches.push(ChildIndexMismatch {
                    person: partner1.into(),
                    child_index: slide.child_index.clone(),
                    expected_total,
                    actual_siblings,
                });
            }
        }

        let slide_children: HashSet<&str> =
            slide.children.iter().map(|c| c.id.as_str()).collect();
        let missing_children_ids: Vec<String> = partner1
            .children_ids
            .iter()
            .filter(|id| !slide_children.contains(id.as_str()))
            .cloned()
            .collect();
        if !missing_children_ids.is_empty() {
            issues
                .children_missing_from_slides
                .push(ChildrenMissingFromSlide {
                    person: partner1.into(),
                    missing_children_ids,
                });
        }
    }

    in_slides
}

/// Every loop in the `children_ids` graph, each reported once as a path of IDs.
///
/// Colour-marking depth-first search: meeting a node still on the stack
/// closes a cycle.
pub fn find_descent_cycles(people: &[Person], index: &PeopleIndex<'_>) -> Vec<Vec<String>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        OnStack,
        Done,
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut cycles = Vec::new();

    for start in people {
        if marks.contains_key(start.id.as_str()) {
            continue;
        }

        // (person, next child position)
        let mut stack: Vec<(&Person, usize)> = vec![(start, 0)];
        marks.insert(start.id.as_str(), Mark::OnStack);

        while let Some(top) = stack.last_mut() {
            let (person, pos) = *top;
            top.1 += 1;
            let Some(child_id) = person.children_ids.get(pos) else {
                marks.insert(person.id.as_str(), Mark::Done);
                stack.pop();
                continue;
            };

            let Some(child) = index.get(child_id) else {
                continue;
            };
            match marks.get(child.id.as_str()) {
                None => {
                    marks.insert(child.id.as_str(), Mark::OnStack);
                    stack.push((child, 0));
                }
                Some(Mark::OnStack) => {
                    let from = stack
                        .iter()
                        .position(|(p, _)| p.id == child.id)
                        .unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[from..].iter().map(|(p, _)| p.id.clone()).collect();
                    cycle.push(child.id.clone());
                    cycles.push(cycle);
                }
                Some(Mark::Done) => {}
            }
        }
    }

    cycles
}

fn collect_stats(people: &[Person], total_slides: usize) -> ValidationStats {
    let family_names: BTreeSet<&str> = people
        .iter()
        .filter_map(|p| p.explicit_family_name())
        .collect();
    let tags: BTreeSet<&str> = people
        .iter()
        .flat_map(|p| p.tags.iter().map(String::as_str))
        .collect();
    let generations: BTreeSet<i64> = people.iter().filter_map(|p| p.generation).collect();

    ValidationStats {
        total_people: people.len(),
        total_slides,
        people_with_spouse: people.iter().filter(|p| p.spouse_ref().is_some()).count(),
        people_with_children: people.iter().filter(|p| !p.children_ids.is_empty()).count(),
        people_with_parents: people.iter().filter(|p| !p.parent_ids.is_empty()).count(),
        people_with_family_name: people
            .iter()
            .filter(|p| p.explicit_family_name().is_some())
            .count(),
        people_with_tags: people.iter().filter(|p| !p.tags.is_empty()).count(),
        unique_family_names: family_names.len(),
        unique_tags: tags.len(),
        generations: generations.into_iter().collect(),
    }
}

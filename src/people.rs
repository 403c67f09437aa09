use std::collections::HashMap;

use tracing::warn;

use crate::models::Person;

/// O(1) lookup from person ID to record.
///
/// Borrowing view over the input slice. Duplicate IDs resolve to the last
/// record with that ID; detecting them is left to [`crate::validation`].
#[derive(Debug, Clone, Default)]
pub struct PeopleIndex<'a> {
    by_id: HashMap<&'a str, &'a Person>,
}

impl<'a> PeopleIndex<'a> {
    pub fn build(people: &'a [Person]) -> Self {
        let by_id = people.iter().map(|p| (p.id.as_str(), p)).collect();
        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&'a Person> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Resolve `person`'s spouse, warning when the reference dangles.
    pub fn spouse_of(&self, person: &Person) -> Option<&'a Person> {
        let spouse_id = person.spouse_ref()?;
        let spouse = self.get(spouse_id);
        if spouse.is_none() {
            warn!(
                person_id = %person.id,
                person = %person.name,
                spouse_id = %spouse_id,
                "spouse reference not found"
            );
        }
        spouse
    }

    /// Resolve `person`'s children in list order, skipping dangling IDs.
    pub fn children_of(&self, person: &Person) -> Vec<&'a Person> {
        person
            .children_ids
            .iter()
            .filter_map(|child_id| {
                let child = self.get(child_id);
                if child.is_none() {
                    warn!(
                        person_id = %person.id,
                        person = %person.name,
                        child_id = %child_id,
                        "child reference not found"
                    );
                }
                child
            })
            .collect()
    }

    /// The parent used for ordinal and breadcrumb computation.
    ///
    /// Looks at the first two `parent_ids`. When both resolve, the one with
    /// the lower generation wins; ties or unknown generations keep the first.
    /// When only one resolves, that one is used.
    pub fn effective_parent(&self, person: &Person) -> Option<&'a Person> {
        let mut resolved = person.parent_ids.iter().take(2).map(|parent_id| {
            let parent = self.get(parent_id);
            if parent.is_none() {
                warn!(
                    person_id = %person.id,
                    person = %person.name,
                    parent_id = %parent_id,
                    "parent reference not found"
                );
            }
            parent
        });
        let first = resolved.next().flatten();
        let second = resolved.next().flatten();

        match (first, second) {
            (Some(a), Some(b)) => match (a.generation, b.generation) {
                (Some(ga), Some(gb)) if gb < ga => Some(b),
                _ => Some(a),
            },
            (a, b) => a.or(b),
        }
    }
}

/// Build the ID lookup for a people list.
pub fn build_index(people: &[Person]) -> PeopleIndex<'_> {
    PeopleIndex::build(people)
}

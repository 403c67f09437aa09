use std::collections::HashSet;

use tracing::warn;

use crate::{models::Person, people::PeopleIndex};

pub const DEFAULT_ROOT_LABEL: &str = "Great-Grandfather";
pub const UNKNOWN_CHILD_INDEX: &str = "Unknown";

/// Ancestor names from the generation-0 root down to `person`.
///
/// Walks effective-parent links upward and stops at generation 0, at a
/// broken link, or when a parent chain loops back on itself. The starting
/// person is always the last entry.
pub fn build_breadcrumb(person: &Person, index: &PeopleIndex<'_>) -> Vec<String> {
    let mut path = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(person);

    while let Some(p) = current {
        if !seen.insert(p.id.as_str()) {
            warn!(person_id = %person.id, loop_at = %p.id, "parent chain loops, breadcrumb truncated");
            break;
        }
        path.push(display_name(p));
        if p.is_root() {
            break;
        }
        current = index.effective_parent(p);
    }

    path.reverse();
    path
}

/// Ordinal of `person` among its effective parent's children, e.g. `Child 2 / 4`.
///
/// Generation-0 people get `root_label`. Broken parent links give `Unknown`.
pub fn calculate_child_index(person: &Person, index: &PeopleIndex<'_>, root_label: &str) -> String {
    if person.is_root() {
        return root_label.to_string();
    }

    let Some(parent) = index.effective_parent(person) else {
        return UNKNOWN_CHILD_INDEX.to_string();
    };

    if parent.children_ids.is_empty() {
        return UNKNOWN_CHILD_INDEX.to_string();
    }

    match parent.children_ids.iter().position(|id| id == &person.id) {
        Some(pos) => format!("Child {} / {}", pos + 1, parent.children_ids.len()),
        None => {
            warn!(
                person_id = %person.id,
                person = %person.name,
                parent_id = %parent.id,
                "person missing from parent's children list"
            );
            UNKNOWN_CHILD_INDEX.to_string()
        }
    }
}

/// Sibling total encoded in a `Child n / total` label.
pub fn sibling_total(child_index: &str) -> Option<usize> {
    let (_, total) = child_index.split_once('/')?;
    total.trim().parse().ok()
}

fn display_name(person: &Person) -> String {
    if person.name.is_empty() {
        "Unknown".to_string()
    } else {
        person.name.clone()
    }
}

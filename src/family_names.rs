use crate::models::Person;

pub const FAMILY_TAG_PREFIX: &str = "FAMILY_";
pub const UNKNOWN_FAMILY: &str = "Unknown Family";
pub const DEFAULT_DEPRIORITIZED_FAMILY: &str = "Kanetkar";

/// Which family name loses when a person carries several `FAMILY_*` tags.
///
/// The dataset tags married-in people with both their birth family and the
/// family they joined; the joined one is usually the less informative label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyNamePolicy {
    pub deprioritized: Option<String>,
}

impl Default for FamilyNamePolicy {
    fn default() -> Self {
        Self {
            deprioritized: Some(DEFAULT_DEPRIORITIZED_FAMILY.to_string()),
        }
    }
}

impl FamilyNamePolicy {
    pub fn new(deprioritized: Option<String>) -> Self {
        Self {
            deprioritized: deprioritized.filter(|name| !name.trim().is_empty()),
        }
    }

    fn is_deprioritized(&self, name: &str) -> bool {
        self.deprioritized.as_deref() == Some(name)
    }
}

/// `FAMILY_WADEGAONKAR` → `Wadegaonkar`. Only the first letter is raised.
pub fn extract_family_name_from_tag(tag: &str) -> Option<String> {
    let rest = tag.strip_prefix(FAMILY_TAG_PREFIX)?.to_lowercase();
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// Family name carried in a person's `FAMILY_*` tags.
pub fn family_name_from_tags(person: &Person, policy: &FamilyNamePolicy) -> Option<String> {
    let names: Vec<String> = person
        .tags
        .iter()
        .filter_map(|tag| extract_family_name_from_tag(tag))
        .collect();

    let preferred = names.iter().position(|name| !policy.is_deprioritized(name));
    let pick = preferred.unwrap_or(0);
    names.into_iter().nth(pick)
}

/// Explicit `familyName`, else the tag-derived one.
pub fn resolve_family_name(person: &Person, policy: &FamilyNamePolicy) -> Option<String> {
    person
        .explicit_family_name()
        .map(ToString::to_string)
        .or_else(|| family_name_from_tags(person, policy))
}

/// Family name for a slide, following the male partner when there is one.
pub fn derive_family_name_for_slide(
    partner1: &Person,
    partner2: Option<&Person>,
    policy: &FamilyNamePolicy,
) -> String {
    if partner1.is_male() {
        if let Some(name) = resolve_family_name(partner1, policy) {
            return name;
        }
    }

    if let Some(p2) = partner2.filter(|p| p.is_male()) {
        if let Some(name) = resolve_family_name(p2, policy) {
            return name;
        }
    }

    resolve_family_name(partner1, policy).unwrap_or_else(|| UNKNOWN_FAMILY.to_string())
}

/// Display variant: `A + B` when both partners resolve to different names.
pub fn format_family_name_for_slide(
    partner1: &Person,
    partner2: Option<&Person>,
    policy: &FamilyNamePolicy,
) -> String {
    let first = resolve_family_name(partner1, policy);
    let second = partner2.and_then(|p| resolve_family_name(p, policy));

    match (first, second) {
        (Some(a), Some(b)) if a != b => format!("{a} + {b}"),
        (Some(a), _) => a,
        (None, Some(b)) => b,
        (None, None) => UNKNOWN_FAMILY.to_string(),
    }
}

use crate::models::Person;

pub const SLIDE_ID_PREFIX: &str = "slide-";
pub const SLIDE_HASH_PREFIX: &str = "#slide-";

const UNKNOWN_NAME: &str = "Unknown";

/// Name with honorific, `*` appended for deceased people.
pub fn format_name(person: &Person) -> String {
    if person.name.is_empty() {
        return UNKNOWN_NAME.to_string();
    }
    let full = format_name_with_honorific(person);
    if person.deceased {
        format!("{full}*")
    } else {
        full
    }
}

pub fn format_name_only(person: &Person) -> String {
    match (person.name.is_empty(), person.deceased) {
        (true, _) => UNKNOWN_NAME.to_string(),
        (false, true) => format!("{}*", person.name),
        (false, false) => person.name.clone(),
    }
}

pub fn format_name_with_honorific(person: &Person) -> String {
    if person.name.is_empty() {
        return UNKNOWN_NAME.to_string();
    }
    match person.honorific.as_deref().filter(|h| !h.is_empty()) {
        Some(honorific) => format!("{} {honorific}", person.name),
        None => person.name.clone(),
    }
}

pub fn format_couple_names(partner1: &Person, partner2: Option<&Person>) -> String {
    match partner2 {
        Some(p2) => format!("{} + {}", format_name(partner1), format_name(p2)),
        None => format_name(partner1),
    }
}

/// Distinct non-empty locations of a couple, partner1 first.
pub fn unique_locations(partner1: &Person, partner2: Option<&Person>) -> Vec<String> {
    let mut locations: Vec<String> = Vec::new();
    for location in std::iter::once(partner1)
        .chain(partner2)
        .filter_map(|p| p.location.as_deref())
        .filter(|l| !l.is_empty())
    {
        if !locations.iter().any(|l| l == location) {
            locations.push(location.to_string());
        }
    }
    locations
}

pub fn slide_id(person_id: &str) -> String {
    format!("{SLIDE_ID_PREFIX}{person_id}")
}

pub fn slide_hash(person_id: &str) -> String {
    format!("{SLIDE_HASH_PREFIX}{person_id}")
}

pub fn person_id_from_hash(hash: &str) -> Option<&str> {
    hash.strip_prefix(SLIDE_HASH_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::people::fixtures::person;

    #[test]
    fn names_fall_back_to_unknown() {
        let nameless = person("n", "", 1);
        assert_eq!(format_name(&nameless), "Unknown");
        assert_eq!(format_name_only(&nameless), "Unknown");
        assert_eq!(format_name_with_honorific(&nameless), "Unknown");
    }

    #[test]
    fn honorific_and_deceased_marker() {
        let mut p = person("g", "Govind", 0);
        p.honorific = Some("ajoba".into());
        p.deceased = true;
        assert_eq!(format_name(&p), "Govind ajoba*");
        assert_eq!(format_name_only(&p), "Govind*");
        assert_eq!(format_name_with_honorific(&p), "Govind ajoba");
    }

    #[test]
    fn couple_names_and_locations() {
        let mut a = person("a", "Asha", 1);
        a.location = Some("Pune, Maharashtra".into());
        let mut b = person("b", "Bal", 1);
        b.location = Some("Pune, Maharashtra".into());
        assert_eq!(format_couple_names(&a, Some(&b)), "Asha + Bal");
        assert_eq!(format_couple_names(&a, None), "Asha");
        assert_eq!(unique_locations(&a, Some(&b)), vec!["Pune, Maharashtra"]);
        b.location = Some(String::new());
        assert_eq!(unique_locations(&a, Some(&b)).len(), 1);
    }

    #[test]
    fn slide_anchors() {
        assert_eq!(slide_id("abc"), "slide-abc");
        assert_eq!(slide_hash("abc"), "#slide-abc");
        assert_eq!(person_id_from_hash("#slide-abc"), Some("abc"));
        assert_eq!(person_id_from_hash("#other"), None);
    }
}

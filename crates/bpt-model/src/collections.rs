use std::collections::{BTreeSet, HashSet};

/// Entries that occur more than once, sorted and reported once each
pub fn find_duplicates<'a, I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();
    for item in items {
        if !seen.insert(item) {
            duplicates.insert(item.to_string());
        }
    }
    duplicates.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_each_duplicate_once() {
        let dups = find_duplicates(["b", "a", "b", "c", "b", "a"]);
        assert_eq!(dups, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn unique_input_has_no_duplicates() {
        assert!(find_duplicates(["a", "b"]).is_empty());
    }
}

use std::collections::HashSet;
use std::hash::Hash;

/// Returns the first item that occurs more than once.
pub fn contains_duplicates<T: Hash + Eq + Clone>(items: &[T]) -> Option<T> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item) {
            return Some(item.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_contains_duplicates() {
        use super::contains_duplicates;

        assert_eq!(None, contains_duplicates::<String>(&[]));
        assert_eq!(None, contains_duplicates(&["a", "b", "c"]));
        assert_eq!(Some("b"), contains_duplicates(&["a", "b", "c", "b"]));
    }
}

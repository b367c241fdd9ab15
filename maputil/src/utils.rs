/// The file stem of a path, or the whole input if it has none.
pub fn basename<I: AsRef<str>>(path: I) -> String {
    let path = path.as_ref();
    std::path::Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Uppercases the first character and lowercases the rest.
pub fn capitalize(x: &str) -> String {
    let mut chars = x.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_capitalize() {
        use super::capitalize;

        assert_eq!("Name", capitalize("name"));
        assert_eq!("Bicycle_parking", capitalize("BICYCLE_PARKING"));
        assert_eq!("", capitalize(""));
    }

    #[test]
    fn test_basename() {
        use super::basename;

        assert_eq!("highways", basename("data/highways.geojson"));
        assert_eq!("polygon", basename("polygon"));
    }
}

use regex::Regex;

/// Whether a site-config key matches a URL.
///
/// Keys containing `*` are wildcard patterns: literal parts are escaped and
/// every `*` matches one or more characters (lazily). Other keys match when the
/// URL contains them. Neither form is anchored.
pub fn pattern_matches(pattern: &str, url: &str) -> bool {
    if !pattern.contains('*') {
        return url.contains(pattern);
    }

    let source = pattern.split('*').map(regex::escape).collect::<Vec<_>>().join(".+?");
    match Regex::new(&source) {
        Ok(re) => re.is_match(url),
        Err(e) => {
            tracing::warn!("site-config pattern {pattern} skipped: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("github.com/*/*/issues/", "https://github.com/a/b/issues/12", true)]
    #[case("github.com/*/*/issues/", "https://github.com/a/issues/12", false)]
    #[case("example.com", "https://www.example.com/story", true)]
    #[case("example.com", "https://example.org/story", false)]
    #[case("*.medium.com", "https://blog.medium.com/p/1", true)]
    #[case("a.b/*", "https://axb/c", false)]
    fn test_pattern_matches(#[case] pattern: &str, #[case] url: &str, #[case] expected: bool) {
        assert_eq!(pattern_matches(pattern, url), expected);
    }
}

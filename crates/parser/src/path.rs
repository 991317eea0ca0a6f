//! Resource path normalization
//!
//! Paths are compared in normalized form: leading and trailing slashes are
//! stripped and the remainder is split into segments. `/` normalizes to no
//! segments at all.

/// Split a path into normalized segments, checking its syntax
///
/// Each segment is either a literal (`[A-Za-z0-9._~-]+`) or a parameter
/// token `{name}` / greedy `{name+}` occupying the whole segment.
pub fn normalize_path(path: &str) -> Result<Vec<String>, String> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    for segment in trimmed.split('/') {
        if segment.is_empty() {
            return Err(format!("path '{}' contains an empty segment", path));
        }
        check_segment(segment).map_err(|reason| format!("path '{}': {}", path, reason))?;
        segments.push(segment.to_string());
    }

    // A greedy parameter swallows the rest of the path
    if let Some(pos) = segments.iter().position(|s| s.ends_with("+}")) {
        if pos + 1 != segments.len() {
            return Err(format!(
                "path '{}': greedy parameter '{}' must be the last segment",
                path, segments[pos]
            ));
        }
    }

    Ok(segments)
}

/// Names of the `{param}` tokens in normalized segments
pub fn path_parameters(segments: &[String]) -> Vec<String> {
    segments
        .iter()
        .filter_map(|segment| {
            segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .map(|name| name.trim_end_matches('+').to_string())
        })
        .collect()
}

fn check_segment(segment: &str) -> Result<(), String> {
    let opens = segment.matches('{').count();
    let closes = segment.matches('}').count();

    if opens == 0 && closes == 0 {
        if let Some(c) = segment.chars().find(|c| !is_literal_char(*c)) {
            return Err(format!("invalid character '{}' in segment '{}'", c, segment));
        }
        return Ok(());
    }

    if opens != 1 || closes != 1 || !segment.starts_with('{') || !segment.ends_with('}') {
        return Err(format!(
            "unbalanced parameter token in segment '{}'",
            segment
        ));
    }

    let name = &segment[1..segment.len() - 1];
    let name = name.strip_suffix('+').unwrap_or(name);
    if name.is_empty() {
        return Err(format!("empty parameter name in segment '{}'", segment));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '.' || *c == '-'))
    {
        return Err(format!(
            "invalid character '{}' in parameter '{}'",
            c, segment
        ));
    }

    Ok(())
}

fn is_literal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '~' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path() {
        assert_eq!(normalize_path("/").unwrap(), Vec::<String>::new());
        assert_eq!(normalize_path("").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_strips_leading_and_trailing_slashes() {
        assert_eq!(normalize_path("/users/{id}/").unwrap(), vec!["users", "{id}"]);
        assert_eq!(normalize_path("users").unwrap(), vec!["users"]);
    }

    #[test]
    fn test_rejects_empty_segment() {
        assert!(normalize_path("/a//b").is_err());
    }

    #[test]
    fn test_rejects_unbalanced_tokens() {
        assert!(normalize_path("/users/{id").is_err());
        assert!(normalize_path("/users/id}").is_err());
        assert!(normalize_path("/users/{a}{b}").is_err());
        assert!(normalize_path("/users/x{id}").is_err());
        assert!(normalize_path("/users/{}").is_err());
    }

    #[test]
    fn test_rejects_invalid_characters() {
        assert!(normalize_path("/users?x=1").is_err());
        assert!(normalize_path("/a b").is_err());
    }

    #[test]
    fn test_greedy_parameter_must_be_last() {
        assert!(normalize_path("/files/{proxy+}").is_ok());
        assert!(normalize_path("/files/{proxy+}/meta").is_err());
    }

    #[test]
    fn test_path_parameters() {
        let segments = normalize_path("/buckets/{bucket}/objects/{key+}").unwrap();
        assert_eq!(path_parameters(&segments), vec!["bucket", "key"]);
    }
}

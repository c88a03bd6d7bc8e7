use std::collections::HashMap;

/// Normalize a URL path: leading slash, no empty segments, no trailing slash.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// URL pattern with `{name}` segments, e.g. `/users/{id}/orders`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = normalize_path(pattern)
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                match segment
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
                {
                    Some(name) if !name.is_empty() => Segment::Variable(name.to_string()),
                    _ => Segment::Literal(segment.to_string()),
                }
            })
            .collect();
        Self { segments }
    }

    pub fn is_dynamic(&self) -> bool {
        self.variable_count() > 0
    }

    pub fn variable_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Variable(_)))
            .count()
    }

    /// Match `path` and return the extracted variables.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let normalized = normalize_path(path);
        let parts: Vec<&str> = normalized
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut variables = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Variable(name) => {
                    variables.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("users/"), "/users");
        assert_eq!(normalize_path("//users//{id}/"), "/users/{id}");
    }

    #[test]
    fn test_pattern_extracts_variables() {
        let pattern = PathPattern::parse("/users/{id}/orders/{order}");
        assert!(pattern.is_dynamic());
        assert_eq!(pattern.variable_count(), 2);

        let variables = pattern.matches("/users/42/orders/7/").unwrap();
        assert_eq!(variables["id"], "42");
        assert_eq!(variables["order"], "7");
    }

    #[test]
    fn test_pattern_rejects_other_paths() {
        let pattern = PathPattern::parse("/users/{id}");
        assert!(pattern.matches("/users").is_none());
        assert!(pattern.matches("/users/1/orders").is_none());
        assert!(pattern.matches("/orders/1").is_none());
    }

    #[test]
    fn test_static_pattern() {
        let pattern = PathPattern::parse("/health");
        assert!(!pattern.is_dynamic());
        assert_eq!(pattern.matches("/health"), Some(HashMap::new()));
    }
}

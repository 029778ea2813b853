//! Ignore pattern matching for local-directory imports
//!
//! Patterns come from the project ignore file, one per line. Matching is
//! deliberately coarse rather than full ignore-file glob semantics:
//! extension wildcards, exact names, and first-segment checks for patterns
//! containing `/`. Negation lines (`!...`) are parsed out and never applied.

/// Ordered ignore patterns for one local-directory import.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<String>,
}

impl IgnoreRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw ignore-file text. Blank lines and `#` comments are dropped;
    /// `!` negation lines are dropped entirely (unsupported by design).
    pub fn parse(text: &str) -> Self {
        let mut patterns = Vec::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if trimmed.starts_with('!') {
                continue;
            }
            patterns.push(trimmed.to_string());
        }
        Self { patterns }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether a candidate entry should be skipped during traversal.
    ///
    /// `name` is the entry's final segment, `relative_path` its slash-
    /// separated path below the granted root. Any match means ignored:
    ///
    /// 1. `.git` is always ignored, rules or no rules.
    /// 2. `*.<ext>` matches a name ending in `.<ext>`.
    /// 3. A pattern without `/` matches the name exactly.
    /// 4. A pattern with `/` matches when its first non-wildcard segment
    ///    equals the candidate's first path segment. Coarse top-level
    ///    exclusion only; `.vscode/settings.json` behaves like `.vscode/*`.
    pub fn is_ignored(&self, name: &str, relative_path: &str) -> bool {
        if name == ".git" || relative_path.starts_with(".git/") {
            return true;
        }

        for pattern in &self.patterns {
            if pattern.starts_with("*.") {
                // "*.log" -> ".log"
                let suffix = &pattern[1..];
                if name.ends_with(suffix) {
                    return true;
                }
            }

            if pattern == name {
                return true;
            }

            if pattern.contains('/') {
                let pattern_head = pattern
                    .split('/')
                    .find(|segment| !segment.is_empty() && *segment != "*");
                let path_head = relative_path.split('/').find(|segment| !segment.is_empty());
                if let (Some(pattern_head), Some(path_head)) = (pattern_head, path_head) {
                    if pattern_head == path_head {
                        return true;
                    }
                }
            }
        }

        false
    }
}

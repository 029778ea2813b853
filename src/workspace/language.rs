//! Extension to language-tag mapping
//!
//! The tag is advisory only: the editor widget uses it for highlighting,
//! nothing in the engine branches on it.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static LANGUAGE_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("js", "javascript"),
        ("jsx", "javascript"),
        ("ts", "typescript"),
        ("tsx", "typescript"),
        ("py", "python"),
        ("go", "go"),
        ("rs", "rust"),
        ("html", "html"),
        ("css", "css"),
        ("scss", "scss"),
        ("json", "json"),
        ("md", "markdown"),
        ("xml", "xml"),
        ("yaml", "yaml"),
        ("yml", "yaml"),
        ("sh", "shell"),
        ("txt", "plaintext"),
    ])
});

/// Language tag for a path, by lowercased extension. Unknown extensions and
/// extension-less names fall back to `plaintext`.
pub fn language_for_path(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or_default().to_lowercase();
    LANGUAGE_MAP.get(ext.as_str()).copied().unwrap_or("plaintext")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(language_for_path("src/App.jsx"), "javascript");
        assert_eq!(language_for_path("main.rs"), "rust");
        assert_eq!(language_for_path("config.YML"), "yaml");
    }

    #[test]
    fn test_unknown_falls_back_to_plaintext() {
        assert_eq!(language_for_path("LICENSE"), "plaintext");
        assert_eq!(language_for_path("data.xyz"), "plaintext");
    }
}

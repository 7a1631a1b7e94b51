//! File-extension based language detection.

use std::collections::HashMap;
use std::path::Path;

/// Language reported for files nothing else matches.
pub const PLAIN_TEXT: &str = "plaintext";

/// Maps lower-cased file extensions to language names.
#[derive(Debug, Clone, Default)]
pub struct LanguageMap {
    overrides: HashMap<String, String>,
}

impl LanguageMap {
    /// Builds a map with user overrides on top of the built-in table.
    /// Override keys are matched case-insensitively.
    pub fn new(overrides: &HashMap<String, String>) -> Self {
        Self {
            overrides: overrides
                .iter()
                .map(|(ext, lang)| (ext.trim_start_matches('.').to_lowercase(), lang.clone()))
                .collect(),
        }
    }

    /// Detects the language of a path from its extension.
    pub fn detect(&self, path: &Path) -> String {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.for_extension(ext))
            .unwrap_or(PLAIN_TEXT)
            .to_string()
    }

    /// Looks up an extension without the leading dot.
    pub fn for_extension(&self, ext: &str) -> &str {
        let ext = ext.to_lowercase();
        if let Some(lang) = self.overrides.get(&ext) {
            return lang;
        }
        builtin(&ext).unwrap_or(PLAIN_TEXT)
    }
}

fn builtin(ext: &str) -> Option<&'static str> {
    Some(match ext {
        "rs" => "rust",
        "py" => "python",
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "html" | "htm" => "html",
        "css" => "css",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "md" | "markdown" => "markdown",
        "c" | "h" => "c",
        "cpp" | "hpp" | "cc" | "cxx" => "cpp",
        "go" => "go",
        "java" => "java",
        "rb" => "ruby",
        "sh" | "bash" | "zsh" => "shell",
        "txt" => PLAIN_TEXT,
        _ => return None,
    })
}

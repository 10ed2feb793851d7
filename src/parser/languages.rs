use tree_sitter::Language;

/// Source file extensions the scanner and watcher pick up.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// True when `ext` is one of [`SOURCE_EXTENSIONS`].
pub fn is_source_extension(ext: &str) -> bool {
    SOURCE_EXTENSIONS.contains(&ext)
}

/// Grammar family for a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    TypeScript,
    Tsx,
    JavaScript,
}

impl Grammar {
    /// Pick the grammar for a file extension, or `None` if the extension is not supported.
    ///
    /// `.ts` and `.tsx` MUST use different grammars: the TypeScript grammar cannot
    /// parse JSX, and the TSX grammar breaks angle-bracket type assertions (`<T>expr`).
    /// The JavaScript grammar handles JSX natively.
    pub fn for_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "mts" | "cts" => Some(Grammar::TypeScript),
            "tsx" => Some(Grammar::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(Grammar::JavaScript),
            _ => None,
        }
    }

    pub fn language(&self) -> Language {
        match self {
            Grammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Grammar::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Grammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

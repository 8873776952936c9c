//! Language detection for untagged pastes.
//!
//! Primary strategy is the syntect grammar set, probed on distinctive
//! first-line tokens (shebangs, doctypes, processing instructions) and, when
//! a filename hint is available, on the file extension. Grammar names map
//! onto the whitelist; a grammar with no whitelisted counterpart collapses
//! to the default. Content that the grammar probe cannot place falls through
//! to a heuristic ladder.

use std::sync::OnceLock;
use syntect::parsing::SyntaxSet;

/// Syntax type assigned when nothing else matches.
pub const DEFAULT_SYNTAX_TYPE: &str = "plaintext";

/// Closed set of accepted `syntax_type` values.
pub const VALID_SYNTAX_TYPES: &[&str] = &[
    "plaintext",
    "text",
    "markdown",
    "json",
    "xml",
    "html",
    "css",
    "javascript",
    "typescript",
    "python",
    "go",
    "golang",
    "java",
    "c",
    "cpp",
    "csharp",
    "ruby",
    "php",
    "rust",
    "swift",
    "kotlin",
    "scala",
    "sql",
    "bash",
    "shell",
    "powershell",
    "yaml",
    "toml",
    "ini",
    "dockerfile",
    "makefile",
    "nginx",
    "apache",
    "lua",
    "perl",
    "r",
    "matlab",
    "latex",
    "diff",
    "graphql",
    "protobuf",
    "haskell",
    "elixir",
    "erlang",
    "clojure",
    "lisp",
    "vim",
    "assembly",
];

/// Whether a normalized `syntax_type` is acceptable. Empty means "detect".
pub fn is_valid_syntax_type(syntax_type: &str) -> bool {
    syntax_type.is_empty() || VALID_SYNTAX_TYPES.contains(&syntax_type)
}

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

/// Detect the language of `content`, always returning a whitelist member.
pub fn detect_language(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return DEFAULT_SYNTAX_TYPE.to_string();
    }

    // Primary: grammar classifier on the first line.
    if let Some(first_line) = trimmed.lines().next() {
        if let Some(syntax) = syntax_set().find_syntax_by_first_line(first_line) {
            return map_syntax_name(&syntax.name);
        }
    }

    detect_by_patterns(trimmed)
}

/// Detection with a filename hint: the grammar set's extension table wins
/// when it maps cleanly, then a few extensions its default bundle lacks,
/// then content detection takes over.
pub fn detect_language_with_filename(filename: &str, content: &str) -> String {
    let basename = filename
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_lowercase();

    if basename == "dockerfile" {
        return "dockerfile".to_string();
    }
    if basename == "makefile" {
        return "makefile".to_string();
    }

    if let Some(ext) = basename
        .rsplit('.')
        .next()
        .filter(|_| basename.contains('.'))
    {
        if let Some(syntax) = syntax_set().find_syntax_by_extension(ext) {
            let mapped = map_syntax_name(&syntax.name);
            if mapped != DEFAULT_SYNTAX_TYPE {
                return mapped;
            }
        }

        let mapped = match ext {
            "ts" | "tsx" => "typescript",
            "toml" => "toml",
            "ini" | "cfg" => "ini",
            "swift" => "swift",
            "kt" | "kts" => "kotlin",
            "ps1" => "powershell",
            "ex" | "exs" => "elixir",
            "graphql" | "gql" => "graphql",
            "proto" => "protobuf",
            "vim" => "vim",
            _ => "",
        };
        if !mapped.is_empty() {
            return mapped.to_string();
        }
    }

    detect_language(content)
}

// Grammar names onto whitelist tags. A recognized grammar with no
// counterpart here (and no lowercase whitelist match) yields the default
// rather than falling through to the heuristics.
fn map_syntax_name(name: &str) -> String {
    let mapped = match name {
        "Python" => "python",
        "JavaScript" | "JavaScript (Babel)" => "javascript",
        "TypeScript" => "typescript",
        "Go" => "go",
        "Java" => "java",
        "C" => "c",
        "C++" => "cpp",
        "C#" => "csharp",
        "Ruby" => "ruby",
        "PHP" => "php",
        "Rust" => "rust",
        "Scala" => "scala",
        "SQL" => "sql",
        "Bourne Again Shell (bash)" | "Shell-Unix-Generic" | "Shell Script" => "bash",
        "YAML" => "yaml",
        "Makefile" => "makefile",
        "Lua" => "lua",
        "Perl" => "perl",
        "R" => "r",
        "LaTeX" | "TeX" => "latex",
        "Diff" => "diff",
        "Haskell" | "Literate Haskell" => "haskell",
        "Erlang" => "erlang",
        "Clojure" => "clojure",
        "Lisp" => "lisp",
        "HTML" => "html",
        "CSS" => "css",
        "JSON" => "json",
        "XML" => "xml",
        "Markdown" | "MultiMarkdown" => "markdown",
        "Plain Text" => DEFAULT_SYNTAX_TYPE,
        _ => "",
    };
    if !mapped.is_empty() {
        return mapped.to_string();
    }

    let lowercase = name.to_lowercase();
    if VALID_SYNTAX_TYPES.contains(&lowercase.as_str()) {
        return lowercase;
    }

    DEFAULT_SYNTAX_TYPE.to_string()
}

fn detect_by_patterns(trimmed: &str) -> String {
    if let Some(lang) = detect_by_shebang(trimmed) {
        return lang.to_string();
    }

    let lower = trimmed.to_lowercase();
    let lines: Vec<&str> = trimmed.lines().collect();

    // JSON: quick structural check with serde validation
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
    {
        return "json".to_string();
    }

    // HTML before generic XML so we don't mis-classify
    if lower.contains("<!doctype html") || lower.contains("<html") || lower.contains("<body") {
        return "html".to_string();
    }

    if lower.starts_with("<?xml")
        || (trimmed.starts_with('<') && lower.contains("</") && !lower.contains("<html"))
    {
        return "xml".to_string();
    }

    let yaml_pairs = lines
        .iter()
        .filter(|l| {
            let t = l.trim();
            if t.is_empty() || t.starts_with('#') {
                return false;
            }
            (t.starts_with("- ") || t.contains(": ")) && !t.contains('{')
        })
        .count();
    if (lower.starts_with("---") || yaml_pairs >= 2) && !trimmed.contains('{') {
        return "yaml".to_string();
    }

    if lower.contains('{') && lower.contains('}') && lower.contains(':') && lower.contains(';') {
        let css_tokens = [
            "color:", "background", "margin", "padding", "font-", "display", "position", "flex",
            "grid",
        ];
        if css_tokens.iter().any(|token| lower.contains(token)) {
            return "css".to_string();
        }
    }

    let keyword_hits =
        |keywords: &[&str]| -> usize { keywords.iter().filter(|kw| lower.contains(*kw)).count() };

    // Specialised checks for languages with distinctive constructs
    if lower.contains("using system")
        || (lower.contains("namespace ") && lower.contains("class ") && lower.contains("console."))
    {
        return "csharp".to_string();
    }

    if lower.contains("std::")
        || lower.contains("using namespace std")
        || lower.contains("template <")
    {
        return "cpp".to_string();
    }

    if lower.contains("#include") && (lower.contains("int main") || lower.contains("printf")) {
        return "c".to_string();
    }

    let scored_languages: &[(&str, &[&str], usize)] = &[
        (
            "rust",
            &[
                "fn ", "impl", "crate::", "let ", "mut ", "pub ", "struct ", "enum", "match ",
                "trait",
            ],
            2,
        ),
        (
            "python",
            &[
                "def ", "import ", "from ", "class ", "self", "async def", "elif", "print(",
            ],
            2,
        ),
        (
            "javascript",
            &[
                "function", "const ", "let ", "=>", "console.", "document.", "export ", "import ",
            ],
            2,
        ),
        (
            "typescript",
            &[
                "interface ",
                " type ",
                ": string",
                ": number",
                "implements ",
                " enum ",
                "readonly ",
            ],
            2,
        ),
        (
            "go",
            &[
                "package ", "func ", "fmt.", "defer ", "go ", "chan", "select {",
            ],
            2,
        ),
        (
            "java",
            &[
                "public class",
                "import java.",
                "system.out",
                " implements ",
                " extends ",
                " void main",
            ],
            2,
        ),
        (
            "sql",
            &[
                "select ",
                "insert ",
                "update ",
                "delete ",
                " from ",
                " where ",
                " join ",
                "create table",
            ],
            2,
        ),
        (
            "latex",
            &[
                "\\begin{",
                "\\end{",
                "\\usepackage",
                "\\documentclass",
                "\\section",
            ],
            2,
        ),
    ];

    let mut best_match: Option<(&str, usize)> = None;
    for (lang, keywords, threshold) in scored_languages {
        let hits = keyword_hits(keywords);
        if hits >= *threshold {
            match best_match {
                Some((_, best_hits)) if best_hits >= hits => {}
                _ => best_match = Some((*lang, hits)),
            }
        }
    }

    if let Some((lang, _)) = best_match {
        return lang.to_string();
    }

    DEFAULT_SYNTAX_TYPE.to_string()
}

fn detect_by_shebang(content: &str) -> Option<&'static str> {
    if !content.starts_with("#!") {
        return None;
    }

    let first_line = content.lines().next().unwrap_or_default();
    if first_line.contains("python") {
        Some("python")
    } else if first_line.contains("bash") || first_line.contains("/sh") {
        Some("bash")
    } else if first_line.contains("node") {
        Some("javascript")
    } else if first_line.contains("ruby") {
        Some("ruby")
    } else if first_line.contains("perl") {
        Some("perl")
    } else if first_line.contains("php") {
        Some("php")
    } else {
        None
    }
}

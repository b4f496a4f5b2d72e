//! PHP `use` declaration extractor.
//!
//! Works on the whole file text without comment stripping. Each of the three
//! statement kinds (`use function`, `use const`, plain `use`) has its own
//! statement-boundary pattern; the plain pattern leaves statements starting
//! with a kind keyword to the other two. Grouped declarations
//! (`use A\{B, function c, const D}`) expand against their shared prefix, and
//! a per-item kind keyword overrides the statement kind for that item.
use std::sync::LazyLock;

use regex::Regex;

use crate::extraction::patterns::boundary_captures;
use crate::extraction::LanguageExtractor;
use crate::types::FileImportList;

static USE_FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|;|<\?php)\s*use\s+function\s+([^;]+);").expect("use function pattern is valid")
});

static USE_CONST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|;|<\?php)\s*use\s+const\s+([^;]+);").expect("use const pattern is valid")
});

static USE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|;|<\?php)\s*use\s+([^;]+);").expect("use pattern is valid")
});

/// `Prefix\{items}`
static GROUP_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^{\s]+)\s*\{([^}]+)\}").expect("group pattern is valid")
});

/// One item of a group: optional kind keyword, name, optional alias.
static GROUP_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(const|function)\s+)?([^;\s,]+)(?:\s+as\s+[^\s,;]+)?\s*$")
        .expect("group item pattern is valid")
});

/// One item of an ungrouped list, alias consumed.
static SIMPLE_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([^;\s,]+)\s*(?:as\s+[^\s,;]+)?").expect("list item pattern is valid")
});

/// Statement-level kind of a `use` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UseKind {
    Class,
    Function,
    Const,
}

impl UseKind {
    fn suffix(self) -> &'static str {
        match self {
            UseKind::Class => "",
            UseKind::Function => ":FUNCTION",
            UseKind::Const => ":CONST",
        }
    }

    fn from_keyword(keyword: &str) -> Option<UseKind> {
        match keyword {
            "function" => Some(UseKind::Function),
            "const" => Some(UseKind::Const),
            _ => None,
        }
    }
}

/// Extracts namespaces, functions and constants imported by `use` in `.php` files.
pub struct PhpExtractor;

impl LanguageExtractor for PhpExtractor {
    fn extensions(&self) -> &[&str] {
        &["php"]
    }

    fn language_name(&self) -> &str {
        "PHP"
    }

    fn extract(&self, _file_path: &str, source: &str) -> Option<FileImportList> {
        if !source.contains("use") {
            return Some(Vec::new());
        }

        let mut statements: Vec<(usize, UseKind, String)> = Vec::new();
        for (offset, list) in boundary_captures(&USE_FUNCTION_RE, source) {
            statements.push((offset, UseKind::Function, list));
        }
        for (offset, list) in boundary_captures(&USE_CONST_RE, source) {
            statements.push((offset, UseKind::Const, list));
        }
        for (offset, list) in boundary_captures(&USE_RE, source) {
            if !Self::starts_with_kind_keyword(&list) {
                statements.push((offset, UseKind::Class, list));
            }
        }
        statements.sort_by_key(|(offset, _, _)| *offset);

        let imports = statements
            .iter()
            .flat_map(|(_, kind, list)| Self::expand_list(list, *kind))
            .collect();
        Some(imports)
    }
}

impl PhpExtractor {
    /// Whether a plain `use` item list actually belongs to `use function`/`use const`.
    fn starts_with_kind_keyword(list: &str) -> bool {
        let mut words = list.split_whitespace();
        matches!(words.next(), Some("function" | "const")) && words.next().is_some()
    }

    /// Expands the item list of one `use` statement into identifiers.
    fn expand_list(list: &str, kind: UseKind) -> Vec<String> {
        if list.contains('{') {
            return Self::expand_group(list, kind);
        }
        SIMPLE_ITEM_RE
            .captures_iter(list)
            .filter_map(|caps| caps.get(1))
            .map(|name| format!("{}{}", Self::normalize(name.as_str()), kind.suffix()))
            .collect()
    }

    /// Expands `Prefix\{A, function b as c, const D}`.
    fn expand_group(list: &str, kind: UseKind) -> Vec<String> {
        let Some(group) = GROUP_SPLIT_RE.captures(list) else {
            return Vec::new();
        };
        let prefix = &group[1];
        group[2]
            .split(',')
            .filter_map(|item| GROUP_ITEM_RE.captures(item))
            .map(|item| {
                let item_kind = item
                    .get(1)
                    .and_then(|keyword| UseKind::from_keyword(keyword.as_str()))
                    .unwrap_or(kind);
                let name = Self::normalize(&format!("{}{}", prefix, &item[2]));
                format!("{}{}", name, item_kind.suffix())
            })
            .collect()
    }

    /// Rewrites namespace separators to forward slashes.
    fn normalize(name: &str) -> String {
        name.replace('\\', "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> Vec<String> {
        PhpExtractor.extract("a.php", source).unwrap()
    }

    #[test]
    fn test_statements_in_source_order() {
        let source = "<?php\nuse function A\\f;\nuse B\\C;\nuse const D\\E;\n";
        assert_eq!(extract(source), vec!["A/f:FUNCTION", "B/C", "D/E:CONST"]);
    }

    #[test]
    fn test_ungrouped_list_with_alias() {
        let source = "<?php use Foo\\Bar as Baz, Qux\\Quux;";
        assert_eq!(extract(source), vec!["Foo/Bar", "Qux/Quux"]);
    }

    #[test]
    fn test_group_inherits_statement_kind() {
        let source = "<?php use function Util\\{first, last as final};";
        assert_eq!(extract(source), vec!["Util/first:FUNCTION", "Util/last:FUNCTION"]);
    }

    #[test]
    fn test_unclosed_group_contributes_nothing() {
        assert!(extract("<?php use App\\{Model, View;").is_empty());
    }

    #[test]
    fn test_closure_use_is_not_an_import() {
        let source = "<?php\n$f = function () use ($x) { return $x; };\n";
        assert!(extract(source).is_empty());
    }

    #[test]
    fn test_namespace_named_like_keyword_prefix() {
        assert_eq!(extract("<?php use constants\\Foo;"), vec!["constants/Foo"]);
    }
}

//! Ruby `require` extractor.
use std::sync::LazyLock;

use regex::Regex;

use crate::extraction::patterns::{all_captures, in_source_order};
use crate::extraction::LanguageExtractor;
use crate::types::FileImportList;

static REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\brequire\s*\(?\s*["']([^"']+)["']"#).expect("require pattern is valid")
});

static REQUIRE_RELATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\brequire_relative\s*\(?\s*["']([^"']+)["']"#)
        .expect("require_relative pattern is valid")
});

/// Line that opens an embedded documentation block.
const BLOCK_COMMENT_BEGIN: &str = "=begin";
/// Line that closes an embedded documentation block.
const BLOCK_COMMENT_END: &str = "=end";

/// Extracts `require` and `require_relative` targets from `.rb` files.
///
/// `require_relative` targets are prefixed with `./`.
pub struct RubyExtractor;

impl LanguageExtractor for RubyExtractor {
    fn extensions(&self) -> &[&str] {
        &["rb"]
    }

    fn language_name(&self) -> &str {
        "Ruby"
    }

    fn extract(&self, _file_path: &str, source: &str) -> Option<FileImportList> {
        let mut imports = Vec::new();
        let mut in_block_comment = false;
        for line in source.lines() {
            if in_block_comment {
                if line == BLOCK_COMMENT_END {
                    in_block_comment = false;
                }
                continue;
            }
            if line == BLOCK_COMMENT_BEGIN {
                in_block_comment = true;
                continue;
            }
            if !line.contains("require") {
                continue;
            }

            let mut found = all_captures(&REQUIRE_RE, line);
            found.extend(
                all_captures(&REQUIRE_RELATIVE_RE, line)
                    .into_iter()
                    .map(|(offset, target)| (offset, format!("./{target}"))),
            );
            imports.extend(in_source_order(found));
        }
        Some(imports)
    }
}

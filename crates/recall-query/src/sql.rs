// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cleanup of model-generated query text.

use std::sync::LazyLock;

use regex::Regex;

/// Opening or closing code fence, with an optional language tag.
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)```[ \t]*(?:sqlite|postgresql|postgres|mysql|t-sql|tsql|sql)?").unwrap()
});

/// Removes markdown code fences and surrounding whitespace.
///
/// No other validation is applied; the result is executed verbatim.
pub fn strip_code_fences(text: &str) -> String {
    FENCE.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_only_trimmed() {
        assert_eq!(strip_code_fences("  SELECT 1\n"), "SELECT 1");
    }

    #[test]
    fn fenced_block_with_language_tag() {
        let text = "```sql\nSELECT title FROM sessions WHERE id = 3;\n```";
        assert_eq!(
            strip_code_fences(text),
            "SELECT title FROM sessions WHERE id = 3;"
        );
    }

    #[test]
    fn uppercase_and_bare_fences() {
        assert_eq!(strip_code_fences("```SQL\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_code_fences("```\nSELECT 2\n```"), "SELECT 2");
        assert_eq!(strip_code_fences("```sqlite SELECT 3```"), "SELECT 3");
    }

    #[test]
    fn column_names_starting_with_a_tag_survive() {
        let text = "SELECT sql_text FROM queries";
        assert_eq!(strip_code_fences(text), text);
    }
}

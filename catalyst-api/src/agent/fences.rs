//! Markdown code-fence stripping for LLM output

/// Remove a surrounding ``` fence and a leading language tag
///
/// When the trimmed content starts with ``` and spans more than two lines, the
/// first and last lines are dropped. A leading `tag` left on the remaining
/// content is removed too.
pub fn strip_code_fence(raw: &str, tag: &str) -> String {
    let content = raw.trim();
    if !content.starts_with("```") {
        return content.to_string();
    }

    let lines: Vec<&str> = content.split('\n').collect();
    if lines.len() <= 2 {
        return content.to_string();
    }

    let inner = lines[1..lines.len() - 1].join("\n");
    match inner.strip_prefix(tag) {
        Some(rest) => rest.trim().to_string(),
        None => inner.trim().to_string(),
    }
}

/// First 500 characters, for error reports
pub fn snippet(content: &str) -> String {
    content.chars().take(500).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_content_is_trimmed() {
        assert_eq!(strip_code_fence("  {\"a\": 1}\n", "json"), "{\"a\": 1}");
    }

    #[test]
    fn test_tagged_fence_removed() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fence(raw, "json"), "{\"a\": 1}");
    }

    #[test]
    fn test_bare_fence_with_tag_on_next_line() {
        let raw = "```\nmermaid\ngraph TD\n    A --> B\n```";
        assert_eq!(strip_code_fence(raw, "mermaid"), "graph TD\n    A --> B");
    }

    #[test]
    fn test_two_line_fence_left_alone() {
        let raw = "```json\n```";
        assert_eq!(strip_code_fence(raw, "json"), raw);
    }

    #[test]
    fn test_snippet_is_bounded() {
        let long = "x".repeat(1200);
        assert_eq!(snippet(&long).len(), 500);
        assert_eq!(snippet("short"), "short");
    }
}

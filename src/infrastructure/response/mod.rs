use once_cell::sync::Lazy;
use regex::Regex;

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap());

/// Opening fence with an optional language tag, e.g. "```typescript".
static OPENING_FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_+#.-]*[ \t]*\r?\n?").unwrap());

static CLOSING_FENCE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n?```\s*$").unwrap());

/// Removes reasoning artifacts some models leak into their answers.
pub fn clean_llm_response(response: &str) -> String {
    let cleaned = THINK_TAG_PATTERN.replace_all(response, "");
    let cleaned = REASONING_TAG_PATTERN.replace_all(&cleaned, "");
    cleaned.trim().to_string()
}

/// Strips a surrounding markdown code fence, keeping the body verbatim.
pub fn strip_code_fence(value: &str) -> String {
    let trimmed = value.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let without_open = OPENING_FENCE_PATTERN.replace(trimmed, "");
    let without_close = CLOSING_FENCE_PATTERN.replace(&without_open, "");
    without_close.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_think_tags() {
        let input = "<think>Some reasoning here</think>The actual response";
        assert_eq!(clean_llm_response(input), "The actual response");
    }

    #[test]
    fn test_clean_reasoning_tags() {
        let input = "<reasoning>Internal reasoning</reasoning>{\"a\":1}";
        assert_eq!(clean_llm_response(input), "{\"a\":1}");
    }

    #[test]
    fn test_strip_fence_with_language_tag() {
        let input = "```typescript\nimport { test } from '@playwright/test';\ntest('x', async () => {});\n```";
        assert_eq!(
            strip_code_fence(input),
            "import { test } from '@playwright/test';\ntest('x', async () => {});"
        );
    }

    #[test]
    fn test_strip_plain_fence() {
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_fence_leaves_unfenced_text() {
        let input = "def test_login():\n    assert True";
        assert_eq!(strip_code_fence(input), input);
    }
}

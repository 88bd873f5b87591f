/// Longest accepted prompt, in characters.
pub const MAX_PROMPT_CHARS: usize = 200;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("prompt is empty")]
    Empty,

    #[error("prompt is {len} characters; the limit is {max}")]
    TooLong { len: usize, max: usize },
}

/// Trim `prompt` and check it is non-empty and within [`MAX_PROMPT_CHARS`].
pub fn validate_prompt(prompt: &str) -> Result<&str, PromptError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(PromptError::Empty);
    }
    let len = trimmed.chars().count();
    if len > MAX_PROMPT_CHARS {
        return Err(PromptError::TooLong {
            len,
            max: MAX_PROMPT_CHARS,
        });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_and_trims() {
        assert_eq!(
            validate_prompt("  A farmer working in the field \n"),
            Ok("A farmer working in the field")
        );
    }

    #[test]
    fn test_rejects_blank() {
        assert_eq!(validate_prompt(""), Err(PromptError::Empty));
        assert_eq!(validate_prompt(" \t\n"), Err(PromptError::Empty));
    }

    #[test]
    fn test_limit_counts_characters_not_bytes() {
        // 200 multi-byte characters are within the limit
        let telugu = "అ".repeat(MAX_PROMPT_CHARS);
        assert!(validate_prompt(&telugu).is_ok());

        let long = "a".repeat(MAX_PROMPT_CHARS + 1);
        assert_eq!(
            validate_prompt(&long),
            Err(PromptError::TooLong { len: 201, max: 200 })
        );
    }
}

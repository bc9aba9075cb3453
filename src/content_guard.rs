// ============================================================================
// Content Guard
// ============================================================================
//
// Case-insensitive substring screening of message content. The match is not
// tokenized: a banned term inside a longer word still matches, which is
// deliberately over-broad.
//
// Callers run the global check first and the recipient check second, so a
// message that trips both always reports the global violation.
//
// ============================================================================

use replied_types::RecipientPolicy;

/// Process-wide banned terms, lowercase
pub const BANNED_TERMS: &[&str] = &["badword1", "badword2", "spamlink", "offensive"];

#[derive(Debug, Clone)]
pub struct ContentGuard {
    banned_terms: Vec<String>,
}

impl Default for ContentGuard {
    fn default() -> Self {
        Self::new(BANNED_TERMS.iter().copied())
    }
}

impl ContentGuard {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            banned_terms: terms
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn is_globally_prohibited(&self, text: &str) -> bool {
        contains_any(&text.to_lowercase(), &self.banned_terms)
    }

    /// Checks the recipient's own phrase list. Empty phrases never match.
    pub fn is_policy_blocked(&self, text: &str, policy: &RecipientPolicy) -> bool {
        let lowered = text.to_lowercase();
        policy
            .blocked_phrases
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .any(|p| lowered.contains(&p.to_lowercase()))
    }
}

fn contains_any(lowered: &str, terms: &[String]) -> bool {
    terms.iter().any(|t| lowered.contains(t.as_str()))
}

//! Utterance complexity analysis.
//!
//! A cheap lexical profile of an utterance used to derive NLU confidence:
//! short, plain utterances score near 0, long utterances with negation,
//! pronouns, or temporal references score toward 1.

const NEGATION_WORDS: &[&str] = &["not", "no", "never", "don't", "doesn't", "won't", "can't"];
const PRONOUNS: &[&str] = &["it", "they", "them", "that", "this", "those", "these"];
const TEMPORAL_WORDS: &[&str] = &[
    "yesterday",
    "today",
    "tomorrow",
    "before",
    "after",
    "earlier",
    "later",
    "next",
    "last",
];

/// Lexical profile of one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceComplexity {
    pub word_count: usize,
    pub sentence_count: usize,
    pub has_question: bool,
    pub has_negation: bool,
    pub has_pronouns: bool,
    pub has_temporal_refs: bool,
    /// 0.0 (simple) to 1.0 (complex).
    pub complexity_score: f64,
}

fn contains_word(tokens: &[String], vocabulary: &[&str]) -> bool {
    tokens.iter().any(|t| vocabulary.contains(&t.as_str()))
}

/// Profile an utterance.
pub fn analyze_complexity(utterance: &str) -> UtteranceComplexity {
    let tokens: Vec<String> = utterance
        .split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect();

    let word_count = tokens.len();
    let sentence_count = utterance
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1);
    let has_question = utterance.contains('?');
    let has_negation = contains_word(&tokens, NEGATION_WORDS);
    let has_pronouns = contains_word(&tokens, PRONOUNS);
    let has_temporal_refs = contains_word(&tokens, TEMPORAL_WORDS);

    let mut score = (word_count as f64 / 20.0).min(1.0) * 0.3;
    if sentence_count > 1 {
        score += 0.1;
    }
    if has_question {
        score += 0.1;
    }
    if has_negation {
        score += 0.15;
    }
    if has_pronouns {
        score += 0.2;
    }
    if has_temporal_refs {
        score += 0.15;
    }

    UtteranceComplexity {
        word_count,
        sentence_count,
        has_question,
        has_negation,
        has_pronouns,
        has_temporal_refs,
        complexity_score: score.min(1.0),
    }
}

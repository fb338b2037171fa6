//! Free-text intent routing.
//!
//! Classification is a fixed, ordered rule table over the case-folded
//! utterance — no model, no state. Each rule owns a keyword set disjoint
//! from the rules after it, the first match wins, and `Unknown` is the
//! total catch-all. Conversation context is read-only and consulted for
//! exactly one thing: a bare numeric reply refining the previous patient
//! query's limit.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::session::{ConversationTurn, Role};

/// The classified purpose of an utterance, with extracted arguments.
/// Exactly one intent is selected per utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    ListTools,
    GetPatients {
        name_filter: Option<String>,
        limit: Option<u32>,
    },
    Greeting {
        name: Option<String>,
    },
    Help,
    Unknown {
        utterance: String,
    },
}

/// Opening tokens that can start a greeting.
const GREETING_WORDS: [&str; 7] = ["hello", "hi", "hey", "yo", "howdy", "greetings", "good"];

/// Second token completing a "good ..." greeting.
const GOOD_PARTS: [&str; 3] = ["morning", "afternoon", "evening"];

/// Tokens that may follow a greeting without being a name.
const GREETING_FILLERS: [&str; 7] = ["there", "everyone", "all", "folks", "friend", "again", "team"];

/// Help-rule phrases (checked as substrings of the folded utterance).
const HELP_PHRASES: [&str; 5] = [
    "help",
    "what can you do",
    "how do i",
    "how does this work",
    "command",
];

/// Patient-query keywords (stemmed where plural forms matter).
const PATIENT_KEYWORDS: [&str; 8] = [
    "patient",
    "diagnos",
    "medication",
    "medicine",
    "allerg",
    "admitted",
    "department",
    "condition",
];

/// Tokens that disqualify the word after "named"/"called" from being a name.
const NAME_STOPWORDS: [&str; 5] = ["is", "are", "the", "a", "an"];

/// Classify one utterance.
///
/// `recent_turns` is the conversation so far, oldest first, *excluding*
/// the utterance being routed. Rule order is part of the contract:
/// Greeting → Help → ListTools → GetPatients → bare-number refinement →
/// Unknown.
pub fn route(utterance: &str, recent_turns: &[ConversationTurn]) -> Intent {
    let folded = utterance.trim().to_lowercase();

    if let Some(name) = match_greeting(utterance.trim(), &folded) {
        return Intent::Greeting { name };
    }

    if HELP_PHRASES.iter().any(|phrase| folded.contains(phrase)) {
        return Intent::Help;
    }

    if folded.contains("tool") {
        return Intent::ListTools;
    }

    if PATIENT_KEYWORDS.iter().any(|kw| folded.contains(kw)) {
        return Intent::GetPatients {
            name_filter: extract_name(utterance),
            limit: extract_limit(&folded),
        };
    }

    // A lone number right after a patient query refines its limit.
    if let Some(limit) = bare_integer(&folded) {
        if let Some(previous) = last_user_turn(recent_turns) {
            if let Intent::GetPatients { name_filter, .. } = route(&previous.text, &[]) {
                return Intent::GetPatients {
                    name_filter,
                    limit: Some(limit),
                };
            }
        }
    }

    Intent::Unknown {
        utterance: utterance.to_string(),
    }
}

// ═══════════════════════════════════════════
// Rule helpers
// ═══════════════════════════════════════════

/// Greeting rule: the whole utterance must be greeting words, fillers,
/// and at most one name token — "hello there" greets, "hello, show me
/// patients" does not, so the patient rule still sees it.
///
/// Returns `Some(name)` on match (name taken from the original-case
/// utterance).
fn match_greeting(original: &str, folded: &str) -> Option<Option<String>> {
    let folded_tokens: Vec<&str> = folded.split_whitespace().map(trim_punctuation).collect();
    let first = *folded_tokens.first()?;
    if !GREETING_WORDS.contains(&first) {
        return None;
    }

    // "good" alone isn't a greeting; "good morning" is.
    let mut rest = 1;
    if first == "good" {
        match folded_tokens.get(1) {
            Some(part) if GOOD_PARTS.contains(part) => rest = 2,
            _ => return None,
        }
    }

    let original_tokens: Vec<&str> = original.split_whitespace().collect();
    let mut name: Option<String> = None;
    for (token, folded_token) in original_tokens[rest..]
        .iter()
        .zip(folded_tokens[rest..].iter())
    {
        if folded_token.is_empty() || GREETING_FILLERS.contains(folded_token) {
            continue;
        }
        let candidate = trim_punctuation(token);
        if name.is_none() && candidate.chars().all(char::is_alphabetic) && !candidate.is_empty() {
            name = Some(candidate.to_string());
        } else {
            // A second name-like token, or anything non-alphabetic:
            // this is a sentence, not a greeting.
            return None;
        }
    }

    Some(name)
}

/// Name filter: a quoted token, or the token after "named"/"called"/
/// "name is". Case is preserved from the original utterance.
fn extract_name(utterance: &str) -> Option<String> {
    static QUOTED: OnceLock<Regex> = OnceLock::new();
    static KEYWORD: OnceLock<Regex> = OnceLock::new();

    let quoted = QUOTED.get_or_init(|| Regex::new(r#""([^"]+)"|'([^']+)'"#).expect("quoted regex"));
    if let Some(captures) = quoted.captures(utterance) {
        let name = captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str().trim().to_string())?;
        if !name.is_empty() {
            return Some(name);
        }
    }

    let keyword = KEYWORD.get_or_init(|| {
        Regex::new(r"(?i)\b(?:named|called|name\s+is)\s+(\S+)").expect("name keyword regex")
    });
    let raw = keyword.captures(utterance)?.get(1)?.as_str();
    let candidate = trim_punctuation(raw);
    if candidate.is_empty() || NAME_STOPWORDS.contains(&candidate.to_lowercase().as_str()) {
        return None;
    }
    Some(candidate.to_string())
}

/// Limit: the first standalone integer token in the utterance.
fn extract_limit(folded: &str) -> Option<u32> {
    static INTEGER: OnceLock<Regex> = OnceLock::new();
    let integer = INTEGER.get_or_init(|| Regex::new(r"\b(\d{1,9})\b").expect("integer regex"));
    integer
        .captures(folded)?
        .get(1)?
        .as_str()
        .parse::<u32>()
        .ok()
}

/// `Some(n)` when the utterance is nothing but one integer.
fn bare_integer(folded: &str) -> Option<u32> {
    let trimmed = folded.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        trimmed.parse::<u32>().ok()
    } else {
        None
    }
}

fn last_user_turn(turns: &[ConversationTurn]) -> Option<&ConversationTurn> {
    turns.iter().rev().find(|turn| turn.role == Role::User)
}

fn trim_punctuation(token: &str) -> &str {
    token.trim_matches(|c: char| c.is_ascii_punctuation())
}

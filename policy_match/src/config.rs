// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// A single recorded position of one candidate on one policy statement.
///
/// Many records share the same candidate and the same topic. Records are
/// immutable once handed to the store.
#[derive(PartialEq, Debug, Clone)]
pub struct StanceRecord {
    pub candidate: String,
    pub topic: String,
    pub statement: String,
    /// -2 = strongly oppose .. +2 = strongly support.
    pub stance: i64,
    /// A supporting quote from the manifesto, if one was recorded.
    pub quote: Option<String>,
    /// A portrait file reference, if one was recorded.
    pub photo: Option<String>,
}

/// The answer a user gave on a single policy statement.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Answer {
    Agree,
    Neutral,
    Disagree,
}

impl Answer {
    pub fn value(&self) -> i64 {
        match self {
            Answer::Agree => 1,
            Answer::Neutral => 0,
            Answer::Disagree => -1,
        }
    }
}

/// How important a topic is to the user.
///
/// The numeric weights are fixed and part of the scoring contract.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Importance {
    NotAtAll,
    Slightly,
    Moderately,
    Very,
    Vital,
}

impl Importance {
    pub fn weight(&self) -> u64 {
        match self {
            Importance::NotAtAll => 0,
            Importance::Slightly => 2,
            Importance::Moderately => 5,
            Importance::Very => 8,
            Importance::Vital => 10,
        }
    }
}

/// The weight applied to an answered statement that no selected topic
/// claims. This can only happen when the topic selection and the stance
/// data get out of sync; the original system relied on this not being an
/// error, so it is kept as an explicit fallback.
pub const UNCLAIMED_STATEMENT_WEIGHT: u64 = 1;

/// Everything one user submitted in one pass: which topics count, how
/// much each counts, and the answers given.
///
/// This is deliberately a plain value passed into every engine call, so
/// that each user interaction is a fresh, pure computation over the
/// latest snapshot.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Session {
    pub selected_topics: Vec<String>,
    pub importance: HashMap<String, Importance>,
    pub answers: HashMap<String, Answer>,
}

impl Session {
    /// The scoring weight for a statement belonging to the given topic.
    ///
    /// Selected and weighted topics use their importance weight. Anything
    /// else falls back to [UNCLAIMED_STATEMENT_WEIGHT].
    pub fn statement_weight(&self, topic: &str) -> u64 {
        if self.selected_topics.iter().any(|t| t == topic) {
            if let Some(imp) = self.importance.get(topic) {
                return imp.weight();
            }
        }
        UNCLAIMED_STATEMENT_WEIGHT
    }
}

// ******** Output data structures *********

/// One candidate's overall match against the user's weighted answers.
#[derive(PartialEq, Debug, Clone)]
pub struct MatchResult {
    pub candidate: String,
    /// Rounded to one decimal. 0 by convention when nothing was scorable.
    /// Disagreement can drive this negative.
    pub match_percent: f64,
}

/// How strongly a suggested candidate aligns with a topic overall.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Alignment {
    /// Mean stance of at least 1.0 over the topic's statements.
    Strong,
    /// Mean stance above the inclusion threshold but below 1.0.
    Moderate,
}

/// A candidate generally aligned with one topic, independent of the
/// user's answers.
#[derive(PartialEq, Debug, Clone)]
pub struct TopicSuggestion {
    pub candidate: String,
    /// Mean stance over the topic's statements, rounded to two decimals.
    pub mean_stance: f64,
    pub alignment: Alignment,
    /// Set when the user marked the topic Vital but the candidate is only
    /// partially aligned (mean below 1.0).
    pub vital_mismatch: bool,
}

/// Errors raised while building a stance store.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MatchErrors {
    EmptyStore,
    StanceOutOfRange { candidate: String, stance: i64 },
}

impl Error for MatchErrors {}

impl Display for MatchErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchErrors::EmptyStore => write!(f, "no stance records provided"),
            MatchErrors::StanceOutOfRange { candidate, stance } => write!(
                f,
                "stance score {} for candidate {} is outside [-2, 2]",
                stance, candidate
            ),
        }
    }
}

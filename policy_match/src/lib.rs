mod config;
pub mod builder;
use log::{debug, info, warn};

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

pub use crate::config::*;

// **** Scoring constants ****

/// The maximum magnitude one answered statement can contribute per unit
/// of weight. The true ceiling of |user_val * stance| is 2, but the
/// original normalizer assumed 4 and all published percentages depend on
/// it. Do not change.
const SCORE_CEILING_PER_WEIGHT: i64 = 4;

/// The display cut applied to the ranked list.
pub const TOP_MATCHES: usize = 10;

/// The display cut applied to per-topic suggestions.
pub const TOP_SUGGESTIONS: usize = 3;

/// Minimum mean stance (strict) for a candidate to be suggested on a topic.
const SUGGESTION_THRESHOLD: f64 = 0.5;

/// Mean stance at which a suggestion counts as strong alignment.
const STRONG_ALIGNMENT: f64 = 1.0;

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// An immutable, queryable collection of stance records.
///
/// Built once from the loaded records; derives the candidate roster and
/// the topic catalog (both in first-seen order) at construction time.
/// All queries after that are read-only, so a store can be shared across
/// sessions.
#[derive(PartialEq, Debug, Clone)]
pub struct StanceStore {
    records: Vec<StanceRecord>,
    // First-seen orders. Ranking ties and suggestion ties are broken by
    // the candidate order, so it has to be stable.
    candidates: Vec<String>,
    topics: Vec<String>,
    statements_by_topic: HashMap<String, Vec<String>>,
    records_by_candidate: HashMap<String, Vec<usize>>,
}

impl StanceStore {
    /// Builds a store, validating every stance value.
    ///
    /// Topic membership is derived from the explicit topic column of each
    /// record. Duplicate statements within a topic are kept once, at
    /// their first position.
    pub fn from_records(records: Vec<StanceRecord>) -> Result<StanceStore, MatchErrors> {
        if records.is_empty() {
            return Err(MatchErrors::EmptyStore);
        }
        let mut candidates: Vec<String> = Vec::new();
        let mut topics: Vec<String> = Vec::new();
        let mut statements_by_topic: HashMap<String, Vec<String>> = HashMap::new();
        let mut records_by_candidate: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, r) in records.iter().enumerate() {
            if r.stance < -2 || r.stance > 2 {
                return Err(MatchErrors::StanceOutOfRange {
                    candidate: r.candidate.clone(),
                    stance: r.stance,
                });
            }
            if !candidates.contains(&r.candidate) {
                candidates.push(r.candidate.clone());
            }
            if !topics.contains(&r.topic) {
                topics.push(r.topic.clone());
            }
            let stmts = statements_by_topic.entry(r.topic.clone()).or_default();
            if !stmts.contains(&r.statement) {
                stmts.push(r.statement.clone());
            }
            records_by_candidate
                .entry(r.candidate.clone())
                .or_default()
                .push(idx);
        }

        info!(
            "StanceStore: loaded {} records, {} candidates, {} topics",
            records.len(),
            candidates.len(),
            topics.len()
        );
        Ok(StanceStore {
            records,
            candidates,
            topics,
            statements_by_topic,
            records_by_candidate,
        })
    }

    /// Candidate names in first-seen order.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Topic names in first-seen order.
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// The distinct statements of one topic, in first-seen order.
    /// Unknown topics yield an empty slice.
    pub fn statements_for_topic(&self, topic: &str) -> &[String] {
        self.statements_by_topic
            .get(topic)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All records of one candidate, in record order.
    pub fn records_for_candidate<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = &'a StanceRecord> {
        let idxs = self
            .records_by_candidate
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        idxs.iter().map(move |&i| &self.records[i])
    }

    /// The non-empty quotes of one candidate, restricted to the given
    /// statement set, in record order.
    pub fn quotes_for<'a>(
        &'a self,
        name: &str,
        statements: &HashSet<String>,
    ) -> Vec<(&'a str, &'a str)> {
        self.records_for_candidate(name)
            .filter(|r| statements.contains(&r.statement))
            .filter_map(|r| match r.quote.as_deref() {
                Some(q) if !q.is_empty() => Some((r.statement.as_str(), q)),
                _ => None,
            })
            .collect()
    }
}

/// Computes every candidate's match percentage against the session and
/// returns the ranked list, best match first.
///
/// A statement contributes only when the user answered it. Its weight is
/// the importance weight of its topic when that topic is selected, and
/// [UNCLAIMED_STATEMENT_WEIGHT] otherwise. A candidate with nothing
/// scorable gets 0 by convention. Ties keep the candidate first-seen
/// order.
pub fn compute_matches(store: &StanceStore, session: &Session) -> Vec<MatchResult> {
    if session.selected_topics.is_empty() {
        warn!("compute_matches: no topics selected, all matches will be 0");
    }

    let mut results: Vec<MatchResult> = Vec::new();
    for name in store.candidates() {
        let mut score: i64 = 0;
        let mut max_score: i64 = 0;
        for r in store.records_for_candidate(name) {
            let answer = match session.answers.get(&r.statement) {
                Some(a) => a,
                None => continue,
            };
            let weight = session.statement_weight(&r.topic) as i64;
            score += answer.value() * r.stance * weight;
            max_score += SCORE_CEILING_PER_WEIGHT * weight;
        }
        let match_percent = if max_score > 0 {
            round1(100.0 * score as f64 / max_score as f64)
        } else {
            0.0
        };
        debug!(
            "compute_matches: {}: score {} / max {} -> {}",
            name, score, max_score, match_percent
        );
        results.push(MatchResult {
            candidate: name.clone(),
            match_percent,
        });
    }

    // Stable: equal percentages keep the first-seen candidate order.
    results.sort_by(|a, b| {
        b.match_percent
            .partial_cmp(&a.match_percent)
            .unwrap_or(Ordering::Equal)
    });
    results
}

/// Computes the "generally aligned" candidates for one topic.
///
/// The mean stance is taken over exactly the topic's statements and
/// ignores the user's answers entirely; only the Vital-mismatch flag
/// looks at the session. Candidates with a mean at or below the
/// inclusion threshold are dropped, the rest are ranked descending and
/// cut to [TOP_SUGGESTIONS].
pub fn compute_topic_suggestions(
    store: &StanceStore,
    topic: &str,
    session: &Session,
) -> Vec<TopicSuggestion> {
    let statements: HashSet<&str> = store
        .statements_for_topic(topic)
        .iter()
        .map(|s| s.as_str())
        .collect();
    if statements.is_empty() {
        debug!("compute_topic_suggestions: no statements for topic {}", topic);
        return Vec::new();
    }
    let topic_is_vital = session.importance.get(topic) == Some(&Importance::Vital);

    let mut suggestions: Vec<TopicSuggestion> = Vec::new();
    for name in store.candidates() {
        let stances: Vec<i64> = store
            .records_for_candidate(name)
            .filter(|r| statements.contains(r.statement.as_str()))
            .map(|r| r.stance)
            .collect();
        if stances.is_empty() {
            continue;
        }
        let raw_mean = stances.iter().sum::<i64>() as f64 / stances.len() as f64;
        // The inclusion threshold is applied to the raw mean; rounding is
        // display precision only.
        if raw_mean <= SUGGESTION_THRESHOLD {
            continue;
        }
        let mean = round2(raw_mean);
        let alignment = if mean >= STRONG_ALIGNMENT {
            Alignment::Strong
        } else {
            Alignment::Moderate
        };
        suggestions.push(TopicSuggestion {
            candidate: name.clone(),
            mean_stance: mean,
            alignment,
            vital_mismatch: topic_is_vital && mean < STRONG_ALIGNMENT,
        });
    }

    suggestions.sort_by(|a, b| {
        b.mean_stance
            .partial_cmp(&a.mean_stance)
            .unwrap_or(Ordering::Equal)
    });
    suggestions.truncate(TOP_SUGGESTIONS);
    debug!(
        "compute_topic_suggestions: {}: {} suggestions",
        topic,
        suggestions.len()
    );
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(candidate: &str, topic: &str, statement: &str, stance: i64) -> StanceRecord {
        StanceRecord {
            candidate: candidate.to_string(),
            topic: topic.to_string(),
            statement: statement.to_string(),
            stance,
            quote: None,
            photo: None,
        }
    }

    fn session_one_topic(topic: &str, importance: Importance) -> Session {
        Session {
            selected_topics: vec![topic.to_string()],
            importance: [(topic.to_string(), importance)].into_iter().collect(),
            answers: HashMap::new(),
        }
    }

    #[test]
    fn single_statement_full_agreement_is_half() {
        // user +1, stance +2, weight 10: 100 * 20 / 40 = 50.0
        let store = StanceStore::from_records(vec![rec("A", "Healthcare", "s1", 2)]).unwrap();
        let mut session = session_one_topic("Healthcare", Importance::Vital);
        session.answers.insert("s1".to_string(), Answer::Agree);
        let res = compute_matches(&store, &session);
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].match_percent, 50.0);
    }

    #[test]
    fn healthcare_end_to_end_ranking() {
        let store = StanceStore::from_records(vec![
            rec("B", "Healthcare", "Expand public health funding", -1),
            rec("A", "Healthcare", "Expand public health funding", 2),
        ])
        .unwrap();
        let mut session = session_one_topic("Healthcare", Importance::Vital);
        session
            .answers
            .insert("Expand public health funding".to_string(), Answer::Agree);
        let res = compute_matches(&store, &session);
        assert_eq!(res[0].candidate, "A");
        assert_eq!(res[0].match_percent, 50.0);
        assert_eq!(res[1].candidate, "B");
        assert_eq!(res[1].match_percent, -25.0);
    }

    #[test]
    fn compute_matches_is_idempotent() {
        let store = StanceStore::from_records(vec![
            rec("A", "Education", "s1", 1),
            rec("B", "Education", "s1", -2),
            rec("C", "Education", "s1", 2),
        ])
        .unwrap();
        let mut session = session_one_topic("Education", Importance::Moderately);
        session.answers.insert("s1".to_string(), Answer::Disagree);
        let first = compute_matches(&store, &session);
        let second = compute_matches(&store, &session);
        assert_eq!(first, second);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        // Identical stances: equal percentages, encounter order preserved.
        let store = StanceStore::from_records(vec![
            rec("Zoe", "Education", "s1", 1),
            rec("Abe", "Education", "s1", 1),
        ])
        .unwrap();
        let mut session = session_one_topic("Education", Importance::Very);
        session.answers.insert("s1".to_string(), Answer::Agree);
        let res = compute_matches(&store, &session);
        assert_eq!(res[0].candidate, "Zoe");
        assert_eq!(res[1].candidate, "Abe");
        assert_eq!(res[0].match_percent, res[1].match_percent);
    }

    #[test]
    fn unanswered_statements_do_not_contribute() {
        let store = StanceStore::from_records(vec![
            rec("A", "Healthcare", "s1", 2),
            rec("A", "Healthcare", "s2", -2),
        ])
        .unwrap();
        let mut session = session_one_topic("Healthcare", Importance::Vital);
        session.answers.insert("s1".to_string(), Answer::Agree);
        let res = compute_matches(&store, &session);
        // Only s1 scores: 20/40, s2 is silently absent.
        assert_eq!(res[0].match_percent, 50.0);
    }

    #[test]
    fn nothing_scorable_reports_zero() {
        let store = StanceStore::from_records(vec![rec("A", "Healthcare", "s1", 2)]).unwrap();
        let session = session_one_topic("Healthcare", Importance::Vital);
        let res = compute_matches(&store, &session);
        assert_eq!(res[0].match_percent, 0.0);
    }

    #[test]
    fn unclaimed_statement_falls_back_to_unit_weight() {
        // The statement is answered but its topic is unselected, so the
        // unclaimed fallback weight of 1 applies and the match still
        // computes instead of crashing.
        let store = StanceStore::from_records(vec![rec("A", "Healthcare", "s1", 2)]).unwrap();
        let mut session = Session::default();
        session.answers.insert("s1".to_string(), Answer::Agree);
        let res = compute_matches(&store, &session);
        assert_eq!(res[0].match_percent, 50.0);
    }

    #[test]
    fn not_at_all_important_topic_contributes_no_weight() {
        let store = StanceStore::from_records(vec![rec("A", "Taxation", "s1", 2)]).unwrap();
        let mut session = session_one_topic("Taxation", Importance::NotAtAll);
        session.answers.insert("s1".to_string(), Answer::Agree);
        let res = compute_matches(&store, &session);
        // weight 0 -> max_score 0 -> 0 by convention.
        assert_eq!(res[0].match_percent, 0.0);
    }

    #[test]
    fn suggestion_threshold_is_strict() {
        // A sits exactly on the threshold (mean 0.5) and is excluded.
        // B sits just above it (mean 0.67) and is included.
        let store = StanceStore::from_records(vec![
            rec("A", "Environment", "s1", 1),
            rec("A", "Environment", "s2", 0),
            rec("B", "Environment", "s1", 1),
            rec("B", "Environment", "s2", 1),
            rec("B", "Environment", "s3", 0),
        ])
        .unwrap();
        let session = session_one_topic("Environment", Importance::Moderately);
        let sugg = compute_topic_suggestions(&store, "Environment", &session);
        assert_eq!(sugg.len(), 1);
        assert_eq!(sugg[0].candidate, "B");
        assert_eq!(sugg[0].mean_stance, 0.67);
        assert_eq!(sugg[0].alignment, Alignment::Moderate);
    }

    #[test]
    fn suggestions_ranked_and_cut_to_three() {
        let store = StanceStore::from_records(vec![
            rec("A", "Environment", "s1", 1),
            rec("B", "Environment", "s1", 2),
            rec("C", "Environment", "s1", 1),
            rec("D", "Environment", "s1", 2),
        ])
        .unwrap();
        let session = session_one_topic("Environment", Importance::Slightly);
        let sugg = compute_topic_suggestions(&store, "Environment", &session);
        assert_eq!(sugg.len(), TOP_SUGGESTIONS);
        // Descending mean, ties by first-seen order.
        assert_eq!(sugg[0].candidate, "B");
        assert_eq!(sugg[1].candidate, "D");
        assert_eq!(sugg[2].candidate, "A");
        assert_eq!(sugg[0].alignment, Alignment::Strong);
    }

    #[test]
    fn vital_topic_flags_partial_alignment() {
        // Mean 0.9 under a Vital topic warns, mean 1.0 does not.
        let store = StanceStore::from_records(vec![
            rec("A", "Healthcare", "s1", 1),
            rec("A", "Healthcare", "s2", 1),
            rec("A", "Healthcare", "s3", 1),
            rec("A", "Healthcare", "s4", 1),
            rec("A", "Healthcare", "s5", 1),
            rec("A", "Healthcare", "s6", 1),
            rec("A", "Healthcare", "s7", 1),
            rec("A", "Healthcare", "s8", 1),
            rec("A", "Healthcare", "s9", 1),
            rec("A", "Healthcare", "s10", 0),
            rec("B", "Healthcare", "s1", 1),
        ])
        .unwrap();
        let session = session_one_topic("Healthcare", Importance::Vital);
        let sugg = compute_topic_suggestions(&store, "Healthcare", &session);
        let a = sugg.iter().find(|s| s.candidate == "A").unwrap();
        let b = sugg.iter().find(|s| s.candidate == "B").unwrap();
        assert_eq!(a.mean_stance, 0.9);
        assert!(a.vital_mismatch);
        assert_eq!(b.mean_stance, 1.0);
        assert!(!b.vital_mismatch);
    }

    #[test]
    fn unknown_topic_yields_no_suggestions() {
        let store = StanceStore::from_records(vec![rec("A", "Healthcare", "s1", 2)]).unwrap();
        let session = session_one_topic("Healthcare", Importance::Vital);
        assert!(compute_topic_suggestions(&store, "Space policy", &session).is_empty());
    }

    #[test]
    fn store_rejects_out_of_range_stance() {
        let res = StanceStore::from_records(vec![rec("A", "Healthcare", "s1", 3)]);
        assert_eq!(
            res,
            Err(MatchErrors::StanceOutOfRange {
                candidate: "A".to_string(),
                stance: 3
            })
        );
    }

    #[test]
    fn store_rejects_empty_input() {
        assert_eq!(
            StanceStore::from_records(Vec::new()),
            Err(MatchErrors::EmptyStore)
        );
    }

    #[test]
    fn quotes_restricted_to_statement_set() {
        let mut r1 = rec("A", "Healthcare", "s1", 2);
        r1.quote = Some("We will fund it.".to_string());
        let mut r2 = rec("A", "Education", "s2", 1);
        r2.quote = Some("Smaller classes.".to_string());
        let mut r3 = rec("A", "Healthcare", "s3", 1);
        r3.quote = Some("".to_string());
        let store = StanceStore::from_records(vec![r1, r2, r3]).unwrap();
        let wanted: HashSet<String> = ["s1".to_string(), "s3".to_string()].into_iter().collect();
        let quotes = store.quotes_for("A", &wanted);
        // s2 is outside the set, s3 has an empty quote.
        assert_eq!(quotes, vec![("s1", "We will fund it.")]);
    }

    #[test]
    fn statements_deduplicated_in_first_seen_order() {
        let store = StanceStore::from_records(vec![
            rec("A", "Healthcare", "s1", 1),
            rec("B", "Healthcare", "s2", 1),
            rec("B", "Healthcare", "s1", 0),
        ])
        .unwrap();
        assert_eq!(store.statements_for_topic("Healthcare"), ["s1", "s2"]);
    }
}

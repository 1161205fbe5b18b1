use log::{debug, info, warn};

use policy_match::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashSet;
use std::fs;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::quiz::config_reader::*;

pub mod io_csv;

#[derive(Debug, Snafu)]
pub enum QuizError {
    #[snafu(display("Error opening stance file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the stance file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} of the stance file is missing the {column} column"))]
    CsvMissingColumn { column: String, lineno: usize },
    #[snafu(display("Line {lineno}: stance_score {value:?} is not an integer in [-2, 2]"))]
    CsvInvalidStance { value: String, lineno: usize },
    #[snafu(display(""))]
    OpeningJson { source: std::io::Error },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Unknown importance label {label:?} for topic {topic}"))]
    UnknownImportance { label: String, topic: String },
    #[snafu(display("Unknown answer {label:?} for statement {statement:?}"))]
    UnknownAnswer { label: String, statement: String },
    #[snafu(display("The stance data could not be assembled into a store"))]
    BuildingStore { source: MatchErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type QuizResult<T> = Result<T, QuizError>;

pub mod config_reader {
    use crate::quiz::*;
    use std::collections::HashMap;

    /// The session file as written on disk: the selected topics, the
    /// importance label per topic and the answer label per statement.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct SessionConfig {
        #[serde(rename = "selectedTopics")]
        pub selected_topics: Vec<String>,
        pub importance: HashMap<String, String>,
        pub answers: HashMap<String, String>,
    }

    pub fn read_session_config(path: &str) -> QuizResult<SessionConfig> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
        let cfg: SessionConfig =
            serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        debug!("read_session_config: {:?}", cfg);
        Ok(cfg)
    }

    pub fn parse_importance(label: &str) -> Option<Importance> {
        match label {
            "Not at all important" => Some(Importance::NotAtAll),
            "Slightly important" => Some(Importance::Slightly),
            "Moderately important" => Some(Importance::Moderately),
            "Very important" => Some(Importance::Very),
            "Vital" => Some(Importance::Vital),
            _ => None,
        }
    }

    pub fn importance_label(imp: Importance) -> &'static str {
        match imp {
            Importance::NotAtAll => "Not at all important",
            Importance::Slightly => "Slightly important",
            Importance::Moderately => "Moderately important",
            Importance::Very => "Very important",
            Importance::Vital => "Vital",
        }
    }

    pub fn parse_answer(label: &str) -> Option<Answer> {
        match label {
            "Agree" => Some(Answer::Agree),
            "Neutral" => Some(Answer::Neutral),
            "Disagree" => Some(Answer::Disagree),
            _ => None,
        }
    }

    /// Turns the on-disk labels into a session, rejecting unknown labels.
    ///
    /// A selected topic without an importance entry is tolerated with a
    /// warning; the engine then treats its statements with the unclaimed
    /// fallback weight.
    pub fn validate_session(cfg: &SessionConfig) -> QuizResult<Session> {
        let mut importance: HashMap<String, Importance> = HashMap::new();
        for (topic, label) in cfg.importance.iter() {
            let imp = parse_importance(label).context(UnknownImportanceSnafu {
                label: label.clone(),
                topic: topic.clone(),
            })?;
            importance.insert(topic.clone(), imp);
        }
        let mut answers: HashMap<String, Answer> = HashMap::new();
        for (statement, label) in cfg.answers.iter() {
            let ans = parse_answer(label).context(UnknownAnswerSnafu {
                label: label.clone(),
                statement: statement.clone(),
            })?;
            answers.insert(statement.clone(), ans);
        }
        for topic in cfg.selected_topics.iter() {
            if !importance.contains_key(topic) {
                warn!(
                    "validate_session: selected topic {} has no importance label",
                    topic
                );
            }
        }
        if cfg.selected_topics.is_empty() {
            warn!("validate_session: no topics selected, all matches will be 0");
        }
        Ok(Session {
            selected_topics: cfg.selected_topics.clone(),
            importance,
            answers,
        })
    }

    pub fn read_summary(path: &str) -> QuizResult<JSValue> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
        let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        Ok(js)
    }
}

fn alignment_label(a: Alignment) -> &'static str {
    match a {
        Alignment::Strong => "strong",
        Alignment::Moderate => "moderate",
    }
}

/// The statements of all selected topics, used to restrict the quote
/// panels to what the user was actually asked about.
fn selected_statements(store: &StanceStore, session: &Session) -> HashSet<String> {
    session
        .selected_topics
        .iter()
        .flat_map(|t| store.statements_for_topic(t).iter().cloned())
        .collect()
}

fn results_to_json(
    store: &StanceStore,
    session: &Session,
    matches: &[MatchResult],
) -> Vec<JSValue> {
    let statements = selected_statements(store, session);
    let mut l: Vec<JSValue> = Vec::new();
    for m in matches.iter().take(TOP_MATCHES) {
        let quotes: Vec<JSValue> = store
            .quotes_for(&m.candidate, &statements)
            .iter()
            .map(|(statement, quote)| json!({"statement": statement, "quote": quote}))
            .collect();
        let photo: Option<&str> = store
            .records_for_candidate(&m.candidate)
            .find_map(|r| r.photo.as_deref());
        l.push(json!({
            "candidate": m.candidate,
            "matchPercent": m.match_percent,
            "photoPath": photo,
            "quotes": quotes,
        }));
    }
    l
}

fn topics_to_json(store: &StanceStore, session: &Session) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for topic in session.selected_topics.iter() {
        let suggestions = compute_topic_suggestions(store, topic, session);
        let mut sl: Vec<JSValue> = Vec::new();
        for s in suggestions.iter() {
            if s.vital_mismatch {
                warn!(
                    "{} may not fully align with your priority on {}",
                    s.candidate, topic
                );
            }
            sl.push(json!({
                "candidate": s.candidate,
                "meanStance": s.mean_stance,
                "alignment": alignment_label(s.alignment),
                "vitalMismatch": s.vital_mismatch,
            }));
        }
        l.push(json!({"topic": topic, "suggestions": sl}));
    }
    l
}

fn build_summary_js(store: &StanceStore, session: &Session, matches: &[MatchResult]) -> JSValue {
    let labels: JSValue = session
        .selected_topics
        .iter()
        .filter_map(|t| {
            session
                .importance
                .get(t)
                .map(|imp| (t.clone(), json!(importance_label(*imp))))
        })
        .collect::<serde_json::Map<String, JSValue>>()
        .into();
    json!({
        "config": {
            "selectedTopics": session.selected_topics,
            "importance": labels,
        },
        "results": results_to_json(store, session, matches),
        "topics": topics_to_json(store, session),
    })
}

/// Loads the stance data and the session, computes the ranked matches
/// and the per-topic suggestions, and assembles the summary.
pub fn compute_summary(data_path: &str, session_path: &str) -> QuizResult<JSValue> {
    let records = io_csv::read_stance_csv(data_path)?;
    let store = StanceStore::from_records(records).context(BuildingStoreSnafu {})?;

    let cfg = read_session_config(session_path)?;
    let session = validate_session(&cfg)?;
    for topic in session.selected_topics.iter() {
        if !store.topics().contains(topic) {
            warn!("selected topic {} has no stance data", topic);
        }
    }

    let matches = compute_matches(&store, &session);
    info!("computed {} candidate matches", matches.len());
    Ok(build_summary_js(&store, &session, &matches))
}

pub fn run_quiz(
    data_path: &str,
    session_path: &str,
    out_path: Option<String>,
    reference_path: Option<String>,
) -> QuizResult<()> {
    let summary = compute_summary(data_path, session_path)?;

    let pretty_js = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;
    println!("{}", pretty_js);

    if let Some(out) = out_path {
        fs::write(&out, &pretty_js).context(WritingSummarySnafu { path: out.clone() })?;
        info!("summary written to {}", out);
    }

    // The reference summary, if provided for comparison
    if let Some(reference) = reference_path {
        let summary_ref = read_summary(&reference)?;
        let pretty_js_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_ref != pretty_js {
            warn!("Found differences with the reference summary");
            print_diff(pretty_js_ref.as_str(), pretty_js.as_str(), "\n");
            whatever!("Difference detected between computed summary and reference summary");
        }
    }

    Ok(())
}

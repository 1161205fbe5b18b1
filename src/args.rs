use clap::Parser;

/// Ranks election candidates against a user's weighted policy answers.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The CSV file with the candidate stance records. Expected columns:
    /// name, topic, policy_statement, stance_score, quote, photo_path.
    #[clap(short, long, value_parser)]
    pub data: String,

    /// (file path) The session file in JSON format: the selected topics, their importance
    /// labels and the agree/neutral/disagree answers.
    #[clap(short, long, value_parser)]
    pub session: String,

    /// (file path or empty) If specified, the match summary will be written in JSON format
    /// to the given location in addition to being printed.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, manifquiz will check
    /// that the computed summary matches the reference and fail on any difference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

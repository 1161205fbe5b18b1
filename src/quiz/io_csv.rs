// Reading the flattened stance CSV.

use log::debug;
use policy_match::StanceRecord;
use snafu::prelude::*;

use crate::quiz::*;

const REQUIRED_COLUMNS: [&str; 4] = ["name", "topic", "policy_statement", "stance_score"];

/// Reads the stance file: one record per line, header row
/// `name,topic,policy_statement,stance_score,quote,photo_path`.
///
/// The quote and photo_path columns are optional; empty cells become
/// `None`. A missing required column or a stance that is not an integer
/// in [-2, 2] fails immediately with the offending line number.
pub fn read_stance_csv(path: &str) -> QuizResult<Vec<StanceRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;
    let headers = rdr.headers().context(OpeningCsvSnafu { path })?.clone();
    debug!("read_stance_csv: header: {:?}", headers);

    let col = |name: &str| headers.iter().position(|h| h == name);
    for required in REQUIRED_COLUMNS {
        if col(required).is_none() {
            return CsvMissingColumnSnafu {
                column: required,
                lineno: 1usize,
            }
            .fail();
        }
    }
    // Unwraps are safe, the presence check just ran.
    let name_idx = col("name").unwrap();
    let topic_idx = col("topic").unwrap();
    let statement_idx = col("policy_statement").unwrap();
    let stance_idx = col("stance_score").unwrap();
    let quote_idx = col("quote");
    let photo_idx = col("photo_path");

    let mut res: Vec<StanceRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header occupies line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_stance_csv: line {}: {:?}", lineno, line);

        let field = |column: &str, col_idx: usize| {
            line.get(col_idx).context(CsvMissingColumnSnafu {
                column: column.to_string(),
                lineno,
            })
        };
        let stance_raw = field("stance_score", stance_idx)?.trim();
        let stance: i64 = stance_raw
            .parse::<i64>()
            .ok()
            .filter(|s| (-2..=2).contains(s))
            .context(CsvInvalidStanceSnafu {
                value: stance_raw.to_string(),
                lineno,
            })?;
        let optional = |col_idx: Option<usize>| {
            col_idx
                .and_then(|i| line.get(i))
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };

        res.push(StanceRecord {
            candidate: field("name", name_idx)?.to_string(),
            topic: field("topic", topic_idx)?.to_string(),
            statement: field("policy_statement", statement_idx)?.to_string(),
            stance,
            quote: optional(quote_idx),
            photo: optional(photo_idx),
        });
    }
    Ok(res)
}

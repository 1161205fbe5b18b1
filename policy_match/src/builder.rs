pub use crate::config::*;
use crate::StanceStore;

/// A builder for assembling a stance store record by record.
///
/// Convenient for tests and for embedders that do not read from a file.
///
/// ```
/// use policy_match::builder::Builder;
/// # use policy_match::MatchErrors;
///
/// let store = Builder::new()
///     .record("Anna", "Healthcare", "Expand public health funding", 2)
///     .quote("We will fund it in year one.")
///     .record("Bob", "Healthcare", "Expand public health funding", -1)
///     .build()?;
///
/// assert_eq!(store.candidates(), ["Anna", "Bob"]);
/// # Ok::<(), MatchErrors>(())
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    records: Vec<StanceRecord>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            records: Vec::new(),
        }
    }

    /// Adds one stance record. The stance range is checked at build time.
    pub fn record(mut self, candidate: &str, topic: &str, statement: &str, stance: i64) -> Builder {
        self.records.push(StanceRecord {
            candidate: candidate.to_string(),
            topic: topic.to_string(),
            statement: statement.to_string(),
            stance,
            quote: None,
            photo: None,
        });
        self
    }

    /// Attaches a supporting quote to the most recently added record.
    /// Does nothing when no record was added yet.
    pub fn quote(mut self, quote: &str) -> Builder {
        if let Some(r) = self.records.last_mut() {
            r.quote = Some(quote.to_string());
        }
        self
    }

    /// Attaches a photo reference to the most recently added record.
    /// Does nothing when no record was added yet.
    pub fn photo(mut self, photo: &str) -> Builder {
        if let Some(r) = self.records.last_mut() {
            r.photo = Some(photo.to_string());
        }
        self
    }

    pub fn build(self) -> Result<StanceStore, MatchErrors> {
        StanceStore::from_records(self.records)
    }
}

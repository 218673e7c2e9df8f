use serde::{Deserialize, Serialize};

pub use error::{IndexError, IndexResult};

mod error;

/// One entry of a `revisions.txt` document.
///
/// `revision` carries the decimal rendering of the revision number;
/// Conan clients expect the string form on the wire even though every
/// consumer treats it as an integer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RevisionEntry {
    pub revision: String,
    /// ISO-8601 UTC instant of the addition, or empty for entries
    /// produced by an index rebuild.
    pub timestamp: String,
}

/// The `revisions.txt` document: a single `revisions` array.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RevisionsRecord {
    pub revisions: Vec<RevisionEntry>,
}

/// Response body for `GET /v1/search`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RecipeSearchResults {
    pub results: Vec<String>,
}

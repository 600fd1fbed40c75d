/// One status entry as read from the record store.
///
/// Fields hold the raw text; a missing value is an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// "Project: what was done"
    pub accomplishment: String,
    pub learning: String,
    /// "Project: what is planned"
    pub plan: String,
    /// Support needed, or something the author can teach
    pub support: String,
    pub insight: String,
    /// Blog link; only URLs are kept
    pub blog: String,
}

const ANNOTATION_SEPARATOR: &str = "\n---\n";

/// Log text of one job attempt plus worker-side annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobLog {
    text: String,
}

impl JobLog {
    /// Starts from the captured process output.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Appends a worker note after a separator line.
    pub fn annotate(&mut self, note: impl AsRef<str>) {
        self.text.push_str(ANNOTATION_SEPARATOR);
        self.text.push_str(note.as_ref());
    }

    /// Returns the log text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// Consumes the log into its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

//! Colored terminal output for command reports.

use console::{Style, Term};

/// Writes command reports to stderr, colored when the terminal supports it.
pub(crate) struct Output {
    term: Term,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    /// Plain progress line.
    pub(crate) fn info(&self, msg: &str) {
        self.line(&Style::new(), msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(&Style::new().green(), msg);
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.line(&Style::new().yellow(), msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(&Style::new().red(), msg);
    }

    /// Heading for a site or a result group.
    pub(crate) fn highlight(&self, msg: &str) {
        self.line(&Style::new().cyan().bold(), msg);
    }

    /// Indented `key: value` line under a heading, with the key dimmed.
    pub(crate) fn detail(&self, key: &str, value: &str) {
        let key = Style::new().dim().apply_to(format!("{key}:"));
        self.line(&Style::new(), &format!("  {key} {value}"));
    }

    // Output is best effort; a closed stderr must not fail the command
    fn line(&self, style: &Style, msg: &str) {
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }
}

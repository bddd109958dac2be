/// Numbered setup steps; steps whose prerequisite already passed are skipped
/// and never consume a number.
#[derive(Debug, Clone, Default)]
pub struct Remediation {
    title: String,
    steps: Vec<String>,
    notes: Vec<String>,
}

impl Remediation {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            steps: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn step_if(mut self, needed: bool, step: impl Into<String>) -> Self {
        if needed {
            self.steps.push(step.into());
        }
        self
    }

    /// Unnumbered trailing lines, e.g. an alternative to the steps above.
    pub fn note(mut self, line: impl Into<String>) -> Self {
        self.notes.push(line.into());
        self
    }

    pub fn render(&self) -> String {
        let mut lines = vec![self.title.clone()];
        for (idx, step) in self.steps.iter().enumerate() {
            lines.push(format!("  {}. {step}", idx + 1));
        }
        if !self.notes.is_empty() {
            lines.push(String::new());
            lines.extend(self.notes.iter().cloned());
        }
        lines.join("\n")
    }
}

//! Ordered log of import outcomes

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    Replaced,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Category,
    Component,
    Flavor,
    Variant,
    ComponentFlavor,
    ComponentVariant,
    File,
}

impl Subject {
    fn key(self) -> &'static str {
        match self {
            Subject::Category => "category",
            Subject::Component => "component",
            Subject::Flavor => "flavor",
            Subject::Variant => "variant",
            Subject::ComponentFlavor => "compflavor",
            Subject::ComponentVariant => "compvariant",
            Subject::File => "file",
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Subject::Category => "category",
            Subject::Component => "component",
            Subject::Flavor => "flavor",
            Subject::Variant => "variant",
            Subject::ComponentFlavor => "component <-> flavor relation",
            Subject::ComponentVariant => "component <-> variant relation",
            Subject::File => "file",
        }
    }
}

/// A single outcome: what happened, to what kind of record, and which one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportEvent {
    pub outcome: Outcome,
    pub subject: Subject,
    pub label: String,
}

impl ImportEvent {
    pub fn new(outcome: Outcome, subject: Subject, label: impl Into<String>) -> Self {
        Self {
            outcome,
            subject,
            label: label.into(),
        }
    }

    /// Stable result code for callers that localize messages
    /// (e.g. `newcategory`, `replacecompflavor`, `unchangedfile`)
    pub fn code(&self) -> String {
        let prefix = match self.outcome {
            Outcome::Created => "new",
            Outcome::Replaced => "replace",
            Outcome::Unchanged => "unchanged",
        };
        format!("{}{}", prefix, self.subject.key())
    }
}

impl fmt::Display for ImportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::Created => write!(f, "New {} \"{}\"", self.subject.noun(), self.label),
            Outcome::Replaced => write!(f, "Replace {} \"{}\"", self.subject.noun(), self.label),
            Outcome::Unchanged => {
                write!(f, "Unchanged {} \"{}\"", self.subject.noun(), self.label)
            }
        }
    }
}

/// Counts per outcome, for the closing summary line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub created: usize,
    pub replaced: usize,
    pub unchanged: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} replaced, {} unchanged",
            self.created, self.replaced, self.unchanged
        )
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ResultLog {
    events: Vec<ImportEvent>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ImportEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[ImportEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Outcome sequence, ignoring labels and ids
    pub fn outcomes(&self) -> Vec<(Outcome, Subject)> {
        self.events.iter().map(|e| (e.outcome, e.subject)).collect()
    }

    pub fn summary(&self) -> Summary {
        self.events
            .iter()
            .fold(Summary::default(), |mut summary, event| {
                match event.outcome {
                    Outcome::Created => summary.created += 1,
                    Outcome::Replaced => summary.replaced += 1,
                    Outcome::Unchanged => summary.unchanged += 1,
                }
                summary
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let event = ImportEvent::new(Outcome::Created, Subject::Category, "boxes");
        assert_eq!(event.code(), "newcategory");
        let event = ImportEvent::new(Outcome::Replaced, Subject::ComponentFlavor, "x - a");
        assert_eq!(event.code(), "replacecompflavor");
        let event = ImportEvent::new(Outcome::Unchanged, Subject::File, "/a.png");
        assert_eq!(event.code(), "unchangedfile");
    }

    #[test]
    fn test_display() {
        let event = ImportEvent::new(Outcome::Replaced, Subject::Component, "callout");
        assert_eq!(event.to_string(), "Replace component \"callout\"");
    }

    #[test]
    fn test_summary() {
        let mut log = ResultLog::new();
        log.push(ImportEvent::new(Outcome::Created, Subject::Flavor, "a"));
        log.push(ImportEvent::new(Outcome::Created, Subject::Flavor, "b"));
        log.push(ImportEvent::new(Outcome::Unchanged, Subject::File, "/c.png"));

        let summary = log.summary();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.to_string(), "2 created, 0 replaced, 1 unchanged");
    }

    #[test]
    fn test_serializes_as_list() {
        let mut log = ResultLog::new();
        log.push(ImportEvent::new(Outcome::Created, Subject::File, "/a.png"));
        let json = serde_json::to_string(&log).unwrap();
        assert_eq!(
            json,
            r#"[{"outcome":"created","subject":"file","label":"/a.png"}]"#
        );
    }
}

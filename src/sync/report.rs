use std::fmt::{Display, Formatter};

use strum::{Display as StrumDisplay, EnumIter, IntoEnumIterator};

/// What happened to one item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum OutcomeKind {
    Created,
    Updated,
    Unchanged,
    Failed,
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Created => OutcomeKind::Created,
            Outcome::Updated => OutcomeKind::Updated,
            Outcome::Unchanged => OutcomeKind::Unchanged,
            Outcome::Failed(_) => OutcomeKind::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub name: String,
    pub outcome: Outcome,
}

impl Display for ItemOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            Outcome::Created => write!(f, "➕ Created {}", self.name),
            Outcome::Updated => write!(f, "🔄 Updated {}", self.name),
            Outcome::Unchanged => write!(f, "✅ {} already up to date", self.name),
            Outcome::Failed(reason) => write!(f, "❌ Failed {}: {reason}", self.name),
        }
    }
}

/// Per-item results of a best-effort batch. Failures never stop the batch;
/// the caller inspects the report and picks the exit status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    /// Record an outcome and return the new entry.
    pub fn push(&mut self, name: impl Into<String>, outcome: Outcome) -> &ItemOutcome {
        let index = self.items.len();
        self.items.push(ItemOutcome {
            name: name.into(),
            outcome,
        });
        &self.items[index]
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.items
            .iter()
            .filter(|item| item.outcome.kind() == kind)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items
            .iter()
            .filter(|item| item.outcome.kind() == OutcomeKind::Failed)
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    #[cfg(test)]
    pub fn outcome_of(&self, name: &str) -> Option<&Outcome> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .map(|item| &item.outcome)
    }

    /// e.g. `3 created, 1 updated, 0 unchanged, 1 failed`
    pub fn summary(&self) -> String {
        OutcomeKind::iter()
            .map(|kind| format!("{} {kind}", self.count(kind)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Collapse the report into an error when any item failed.
    pub fn into_result(self) -> anyhow::Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(anyhow::anyhow!(
            "{} of {} items failed ({})",
            self.count(OutcomeKind::Failed),
            self.items.len(),
            self.summary()
        ))
    }
}

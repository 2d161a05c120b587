pub mod report;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};

pub use report::{BatchReport, Outcome};

/// A remote collection of named child records that can be reconciled
/// against a desired set: create when missing, patch when a tracked
/// attribute differs, leave alone otherwise.
#[async_trait]
pub trait UpsertTarget: Send + Sync {
    type Item: Send + Sync;
    type Record: Send + Sync;

    fn name<'a>(&self, item: &'a Self::Item) -> &'a str;

    /// Look up the existing record for `item`, if any.
    async fn lookup(&self, item: &Self::Item) -> Result<Option<Self::Record>>;

    /// Whether any tracked attribute of `record` differs from `item`.
    fn differs(&self, record: &Self::Record, item: &Self::Item) -> bool;

    async fn create(&self, item: &Self::Item) -> Result<()>;

    async fn update(&self, record: &Self::Record, item: &Self::Item) -> Result<()>;
}

async fn upsert_one<T: UpsertTarget>(target: &T, item: &T::Item) -> Result<Outcome> {
    match target.lookup(item).await? {
        None => {
            target.create(item).await?;
            Ok(Outcome::Created)
        }
        Some(record) if target.differs(&record, item) => {
            target.update(&record, item).await?;
            Ok(Outcome::Updated)
        }
        Some(_) => Ok(Outcome::Unchanged),
    }
}

/// Reconcile every item in order. A failing item is recorded and the loop
/// moves on; nothing already written is rolled back.
pub async fn upsert_all<T: UpsertTarget>(target: &T, items: &[T::Item]) -> BatchReport {
    let mut report = BatchReport::default();

    for item in items {
        let name = target.name(item);
        let outcome = match upsert_one(target, item).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Upsert of {name} failed: {e:#}");
                Outcome::Failed(format!("{e:#}"))
            }
        };
        debug!("{name}: {outcome:?}");
        println!("{}", report.push(name, outcome));
    }

    report
}

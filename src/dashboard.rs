use crate::backend::TableClient;
use crate::error::BackendError;
use crate::schema::RowRecord;
use crate::stat_card::StatCard;
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Supplies the statistics shown above the upload form.
pub trait StatsSource: Send + Sync {
    fn fetch(&self) -> Vec<StatCard>;

    /// Called once for every upload that committed all of its batches.
    fn import_completed(&self) {}
}

/// Counts the rows and completed imports reported through this process.
#[derive(Debug, Default)]
pub struct ImportTally {
    rows: AtomicU64,
    imports: AtomicU64,
}

impl ImportTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rows accepted by the table.
    pub fn record_rows(&self, rows: usize) {
        self.rows.fetch_add(rows as u64, Ordering::Relaxed);
    }

    pub fn rows(&self) -> u64 {
        self.rows.load(Ordering::Relaxed)
    }

    pub fn imports(&self) -> u64 {
        self.imports.load(Ordering::Relaxed)
    }
}

impl StatsSource for ImportTally {
    fn fetch(&self) -> Vec<StatCard> {
        vec![
            StatCard::new("Linhas importadas", self.rows() as f64),
            StatCard::new("Importações concluídas", self.imports() as f64),
        ]
    }

    fn import_completed(&self) {
        self.imports.fetch_add(1, Ordering::Relaxed);
    }
}

/// [`TableClient`] wrapper that adds every committed batch's rows to an [`ImportTally`].
pub struct TallyingClient<C> {
    inner: C,
    tally: Arc<ImportTally>,
}

impl<C> TallyingClient<C> {
    pub fn new(inner: C, tally: Arc<ImportTally>) -> Self {
        TallyingClient { inner, tally }
    }
}

#[async_trait]
impl<C: TableClient> TableClient for TallyingClient<C> {
    async fn insert(&self, table: &str, rows: &[RowRecord]) -> Result<(), BackendError> {
        self.inner.insert(table, rows).await?;
        self.tally.record_rows(rows.len());
        Ok(())
    }
}

/// Parent of the stat cards and the upload form.
///
/// Holds the last fetched cards; an upload's completion callback calls
/// [`Dashboard::import_completed`] so the cards follow the table.
pub struct Dashboard {
    source: Arc<dyn StatsSource>,
    cards: Vec<StatCard>,
    refreshes: u64,
}

impl Dashboard {
    pub fn new(source: Arc<dyn StatsSource>) -> Self {
        let cards = source.fetch();
        Dashboard {
            source,
            cards,
            refreshes: 0,
        }
    }

    pub fn refresh(&mut self) {
        self.cards = self.source.fetch();
        self.refreshes += 1;
        debug!("Dashboard refreshed ({} cards)", self.cards.len());
    }

    /// Tell the source an upload finished, then refresh.
    pub fn import_completed(&mut self) {
        self.source.import_completed();
        self.refresh();
    }

    pub fn cards(&self) -> &[StatCard] {
        &self.cards
    }

    /// Number of refreshes so far; clients re-fetch the cards when it changes.
    pub fn version(&self) -> u64 {
        self.refreshes
    }

    pub fn render_cards(&self) -> String {
        self.cards.iter().map(StatCard::render_html).collect()
    }
}

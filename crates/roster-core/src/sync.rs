//! Fetch, assemble, reconcile and commit in one step

use crate::assembler::RecordAssembler;
use crate::codec::InvestmentCodec;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::history::SyncHistory;
use crate::parser::parse_delimited;
use crate::reconcile::{reconcile, ReconcileReport};
use crate::source::TableSource;
use crate::store::{JsonFileStore, RecordStore};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, TryLockError};

/// What a sync trigger did
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// A new generation was committed
    Completed(ReconcileReport),
    /// Another sync was already running; nothing was done
    Coalesced,
}

/// Runs syncs against one store, one at a time
pub struct SyncService<S> {
    store: S,
    assembler: RecordAssembler,
    delimiter: u8,
    history_path: Option<PathBuf>,
    running: Mutex<()>,
}

impl<S: RecordStore> SyncService<S> {
    pub fn new(store: S, assembler: RecordAssembler, delimiter: u8) -> Self {
        Self {
            store,
            assembler,
            delimiter,
            history_path: None,
            running: Mutex::new(()),
        }
    }

    /// Append an entry to the history file after every completed sync
    pub fn with_history(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch both tables and commit the reconciled roster
    ///
    /// Both fetches must succeed before anything is written; a failure
    /// leaves the store untouched. A trigger that arrives while another
    /// sync is running returns [`SyncOutcome::Coalesced`] at once.
    pub fn sync(&self, metadata: &dyn TableSource, builds: &dyn TableSource) -> Result<SyncOutcome> {
        let _running = match self.running.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                log::info!("sync already in progress, skipping");
                return Ok(SyncOutcome::Coalesced);
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        log::info!("fetching {} and {}", metadata.name(), builds.name());
        let metadata_text = metadata.fetch()?;
        let builds_text = builds.fetch()?;

        let metadata_table = parse_delimited(&metadata_text, self.delimiter, metadata.name());
        let builds_table = parse_delimited(&builds_text, self.delimiter, builds.name());
        let fresh = self.assembler.assemble(&metadata_table, &builds_table);

        let previous = self.store.load()?;
        let result = reconcile(&fresh, &previous);
        self.store.save(&result.records)?;

        log::info!(
            "sync complete: {} merged, {} new, {} promoted, {} removed, {} local, {} with differences",
            result.report.merged,
            result.report.created,
            result.report.promoted.len(),
            result.report.removed,
            result.report.local_only,
            result.report.with_differences
        );

        // The new generation is committed; history is best effort from here
        if let Some(path) = &self.history_path {
            if let Err(e) = append_history(path, &result.report) {
                log::warn!("could not update sync history {}: {}", path.display(), e);
            }
        }

        Ok(SyncOutcome::Completed(result.report))
    }
}

fn append_history(path: &Path, report: &ReconcileReport) -> Result<()> {
    let mut history = SyncHistory::load(path)?;
    history.record(Utc::now(), report.clone());
    history.save(path)
}

impl SyncService<JsonFileStore> {
    /// Service over the JSON store, node dictionary and history named by
    /// `config`
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let assembler = RecordAssembler::new(InvestmentCodec::new(config.node_dictionary()));
        let service = Self::new(
            JsonFileStore::new(&config.store_path),
            assembler,
            config.delimiter_byte()?,
        );
        Ok(service.with_history(&config.history_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::parser::DEFAULT_DELIMITER;
    use crate::record::{HeroRecord, Lineage};
    use crate::source::StaticSource;
    use crate::store::MemoryStore;
    use std::sync::mpsc::{channel, Receiver, Sender};
    use tempfile::TempDir;

    const METADATA: &str = "h\nx\tx\tx\tThal\tТал\tx\tx\tx\tx\tx\tx\tx\tMaulers\tFALSE";
    const BUILDS: &str = "h\nx\tx\tx\tТал\tx\t\tx\t\tРанг\t\nx\tx\tx\tТал\tx\t309e60УСК\tx\tsolid\tA\t3";

    fn service(previous: Vec<HeroRecord>) -> SyncService<MemoryStore> {
        SyncService::new(
            MemoryStore::new(previous),
            RecordAssembler::default(),
            DEFAULT_DELIMITER,
        )
    }

    #[test]
    fn test_sync_commits_reconciled_roster() {
        let service = service(vec![HeroRecord::linked("Бруто", "Бруто")]);
        let outcome = service
            .sync(
                &StaticSource::new("meta", METADATA),
                &StaticSource::new("builds", BUILDS),
            )
            .unwrap();

        let SyncOutcome::Completed(report) = outcome else {
            panic!("expected a completed sync");
        };
        assert_eq!(report.created, 1);
        assert_eq!(report.removed, 1);

        let stored = service.store().load().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].key, "Тал");
        assert_eq!(stored[0].localized_name, "Thal");
        assert_eq!(stored[0].builds.len(), 1);
        assert_eq!(stored[1].lineage, Lineage::Removed);
    }

    #[test]
    fn test_failed_fetch_writes_nothing() {
        let previous = vec![HeroRecord::linked("Бруто", "Бруто")];
        let service = service(previous.clone());

        let err = service
            .sync(
                &StaticSource::new("meta", METADATA),
                &StaticSource::failing("builds", "offline"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));

        let err = service
            .sync(
                &StaticSource::failing("meta", "offline"),
                &StaticSource::new("builds", BUILDS),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));

        assert_eq!(service.store().save_count(), 0);
        assert_eq!(service.store().load().unwrap(), previous);
    }

    #[test]
    fn test_repeated_sync_is_stable() {
        let service = service(Vec::new());
        let meta = StaticSource::new("meta", METADATA);
        let builds = StaticSource::new("builds", BUILDS);

        service.sync(&meta, &builds).unwrap();
        let first = service.store().load().unwrap();
        service.sync(&meta, &builds).unwrap();
        assert_eq!(service.store().load().unwrap(), first);
    }

    /// Blocks inside `fetch` until released
    struct GateSource {
        entered: Sender<()>,
        release: Mutex<Receiver<()>>,
    }

    impl TableSource for GateSource {
        fn name(&self) -> &str {
            "gate"
        }

        fn fetch(&self) -> Result<String> {
            self.entered.send(()).ok();
            self.release.lock().unwrap().recv().ok();
            Ok(METADATA.to_string())
        }
    }

    #[test]
    fn test_concurrent_trigger_is_coalesced() {
        let service = service(Vec::new());
        let (entered_tx, entered_rx) = channel();
        let (release_tx, release_rx) = channel();
        let gate = GateSource {
            entered: entered_tx,
            release: Mutex::new(release_rx),
        };
        let builds = StaticSource::new("builds", BUILDS);

        std::thread::scope(|scope| {
            let first = scope.spawn(|| service.sync(&gate, &builds));

            entered_rx.recv().unwrap();
            let second = service
                .sync(&StaticSource::new("meta", METADATA), &builds)
                .unwrap();
            assert_eq!(second, SyncOutcome::Coalesced);

            release_tx.send(()).unwrap();
            let first = first.join().unwrap().unwrap();
            assert!(matches!(first, SyncOutcome::Completed(_)));
        });

        assert_eq!(service.store().save_count(), 1);
    }

    #[test]
    fn test_from_config_records_history() {
        let dir = TempDir::new().unwrap();
        let config = SyncConfig {
            store_path: dir.path().join("roster.json"),
            history_path: dir.path().join("history.json"),
            ..Default::default()
        };

        let service = SyncService::from_config(&config).unwrap();
        service
            .sync(
                &StaticSource::new("meta", METADATA),
                &StaticSource::new("builds", BUILDS),
            )
            .unwrap();

        let history = SyncHistory::load(&config.history_path).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.last().unwrap().report.created, 1);
        assert_eq!(service.store().load().unwrap().len(), 1);
    }

    #[test]
    fn test_history_failure_does_not_fail_committed_sync() {
        let dir = TempDir::new().unwrap();
        // A directory where the history file should be cannot be read
        let service = service(Vec::new()).with_history(dir.path());

        let outcome = service
            .sync(
                &StaticSource::new("meta", METADATA),
                &StaticSource::new("builds", BUILDS),
            )
            .unwrap();

        assert!(matches!(outcome, SyncOutcome::Completed(ref r) if r.created == 1));
        assert_eq!(service.store().save_count(), 1);
        assert_eq!(service.store().load().unwrap().len(), 1);
    }
}

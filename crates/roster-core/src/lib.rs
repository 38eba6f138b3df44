//! roster-core: Core library for keeping a hero roster in step with its
//! source spreadsheets
//!
//! This library provides functionality to:
//! - Parse the delimited exports of the metadata and builds sheets
//! - Decode the compact investment notation into build variants
//! - Join both tables into hero records
//! - Reconcile fresh records with the stored roster, keeping user edits and
//!   recording where the source disagrees
//! - Apply user edits, translate commentary and keep backups

pub mod assembler;
pub mod backup;
pub mod codec;
pub mod columns;
pub mod config;
pub mod diff;
pub mod edits;
pub mod error;
pub mod history;
pub mod nodes;
pub mod parser;
pub mod reconcile;
pub mod record;
pub mod source;
pub mod store;
pub mod sync;
pub mod table;
pub mod translate;

pub use assembler::{assemble_records, FreshRecords, RecordAssembler};
pub use backup::{find_backups, latest_backup, BackupEntry, BackupFile};
pub use codec::{decode_investment, InvestmentCodec};
pub use config::SyncConfig;
pub use diff::diff_records;
pub use edits::{
    accept_all, accept_field, add_local_hero, apply_edit, apply_edit_file, delete_hero, EditFile,
    EditReport, FieldEdit, KeyedEdit,
};
pub use error::{Error, Result};
pub use history::{HistoryEntry, SyncHistory};
pub use nodes::{EngravingNode, NodeDictionary};
pub use parser::{parse_delimited, parse_file, parse_tsv};
pub use reconcile::{reconcile, ReconcileReport, Reconciliation};
pub use record::{
    BuildVariant, DiffSet, HeroRecord, LifecycleStatus, Lineage, PortraitStatus, Tier,
    TrackedField,
};
pub use source::{convert_to_tsv_export_url, open_source, FileSource, HttpSource, TableSource};
pub use store::{JsonFileStore, MemoryStore, RecordStore};
pub use sync::{SyncOutcome, SyncService};
pub use table::{Row, Table};
pub use translate::{backfill_translations, TranslationCache, TranslationReport, Translator};

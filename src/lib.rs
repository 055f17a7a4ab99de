//! Sync business cards exported by ScanSnap Home (cp932 CSV + scanned images)
//! into a Lark Base table.

pub mod modules;

pub use modules::error::{ParseError, SyncError};
pub use modules::lark::{LarkClient, LarkRow, TableStore};
pub use modules::records::{parse_scansnap_csv, ScanRecord};
pub use modules::sync::SyncManager;
pub use modules::transformer::{clean_amount, date_to_timestamp, is_valid_email, is_valid_phone};

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::error::{Result, SyncError};

pub const CSV_PATH_ENV: &str = "SCANSNAP_CSV_PATH";
pub const IMAGE_DIR_ENV: &str = "SCANSNAP_IMAGE_DIR";
pub const FAILED_CSV_ENV: &str = "SCANSNAP_FAILED_CSV";
pub const APP_ID_ENV: &str = "LARK_APP_ID";
pub const APP_SECRET_ENV: &str = "LARK_APP_SECRET";
pub const BASE_ID_ENV: &str = "LARK_BASE_ID";
pub const TABLE_ID_ENV: &str = "LARK_TABLE_ID";

/// Everything a sync run needs, validated once at startup.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub app_id: String,
    pub app_secret: String,
    pub base_id: String,
    pub table_id: String,
    pub csv_path: PathBuf,
    pub image_dir: PathBuf,

    // optional: where to write the rows that could not be synced
    pub failed_csv: Option<PathBuf>,
}

#[derive(Debug, Parser)]
#[command(
    name = "scansnap_to_lark",
    version,
    author = "Devin (github.com/devin-git)",
    about = "Sync ScanSnap business card data to Lark Base"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sync all business cards from ScanSnap CSV to Lark Base
    Sync(SyncArgs),
}

// every value is optional here so that a missing one is reported by
// into_config rather than by clap
#[derive(Debug, Default, Args)]
pub struct SyncArgs {
    /// Path to ScanSnap CSV file
    #[arg(short = 'c', long = "csv", env = CSV_PATH_ENV)]
    pub csv: Option<String>,

    /// Directory containing scanned images
    #[arg(short = 'i', long = "images", env = IMAGE_DIR_ENV)]
    pub images: Option<String>,

    /// Lark App ID
    #[arg(long, env = APP_ID_ENV)]
    pub app_id: Option<String>,

    /// Lark App Secret
    #[arg(long, env = APP_SECRET_ENV, hide_env_values = true)]
    pub app_secret: Option<String>,

    /// Lark Base ID
    #[arg(long, env = BASE_ID_ENV)]
    pub base_id: Option<String>,

    /// Lark Table ID
    #[arg(long, env = TABLE_ID_ENV)]
    pub table_id: Option<String>,

    /// Write records that failed to sync to this CSV file
    #[arg(long, env = FAILED_CSV_ENV)]
    pub failed_csv: Option<PathBuf>,
}

impl SyncArgs {
    pub fn into_config(self) -> Result<SyncConfig> {
        let csv_path = required(self.csv, "CSV path", "--csv", CSV_PATH_ENV)?;
        let image_dir = required(self.images, "Image directory", "--images", IMAGE_DIR_ENV)?;
        let app_id = required(self.app_id, "Lark App ID", "--app-id", APP_ID_ENV)?;
        let app_secret = required(
            self.app_secret,
            "Lark App Secret",
            "--app-secret",
            APP_SECRET_ENV,
        )?;
        let base_id = required(self.base_id, "Lark Base ID", "--base-id", BASE_ID_ENV)?;
        let table_id = required(self.table_id, "Lark Table ID", "--table-id", TABLE_ID_ENV)?;

        Ok(SyncConfig {
            app_id,
            app_secret,
            base_id,
            table_id,
            csv_path: PathBuf::from(csv_path),
            image_dir: PathBuf::from(image_dir),
            failed_csv: self
                .failed_csv
                .filter(|path| !path.as_os_str().is_empty()),
        })
    }
}

fn required(value: Option<String>, what: &str, flag: &str, env: &str) -> Result<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| SyncError::Config(format!("{} is required ({} or {})", what, flag, env)))
}

use log::{error, info, warn};
use std::{io, path::PathBuf};

use super::config::SyncConfig;
use super::error::Result;
use super::lark::{LarkClient, LarkRow, TableStore};
use super::records::{parse_scansnap_csv, ScanRecord};
use super::transformer::{date_to_timestamp, is_valid_email, is_valid_phone};
use super::utility::FailedItemsWriter;

const FAILED_ERROR_COLUMN: &str = "error";

pub struct SyncManager<S: TableStore> {
    store: S,
    config: SyncConfig,
}

impl SyncManager<LarkClient> {
    pub fn new(config: SyncConfig) -> Result<SyncManager<LarkClient>> {
        let client = LarkClient::new(&config.app_id, &config.app_secret)?;
        Ok(SyncManager::with_store(config, client))
    }
}

impl<S: TableStore> SyncManager<S> {
    pub fn with_store(config: SyncConfig, store: S) -> SyncManager<S> {
        SyncManager { store, config }
    }

    /// Syncs every record of the configured CSV and returns how many made it.
    ///
    /// Only an unreadable CSV (or a failed-items file that cannot be created)
    /// stops the run. A record that fails is logged, counted and skipped.
    pub async fn sync_all(&self) -> Result<usize> {
        info!("Starting sync...");
        info!("Reading CSV from: {}", self.config.csv_path.display());

        let records = parse_scansnap_csv(&self.config.csv_path)?;
        info!("Found {} records", records.len());

        let failed_items = match &self.config.failed_csv {
            Some(path) => {
                let mut header = ScanRecord::field_names().to_vec();
                header.push(FAILED_ERROR_COLUMN);
                Some(FailedItemsWriter::create(path, &header)?)
            }
            None => None,
        };

        Ok(self.sync_records(&records, failed_items).await)
    }

    async fn sync_records<W: io::Write>(
        &self,
        records: &[ScanRecord],
        mut failed_items: Option<FailedItemsWriter<W>>,
    ) -> usize {
        let mut success_count = 0;
        let mut error_count = 0;

        for (i, record) in records.iter().enumerate() {
            info!(
                "Processing record {}/{}: {}",
                i + 1,
                records.len(),
                record.display_name()
            );

            match self.sync_record(record).await {
                Ok(_) => {
                    success_count += 1;
                    info!("✓ Successfully synced: {}", record.display_name());
                }
                Err(err) => {
                    error_count += 1;
                    error!("✗ Failed to sync {}: {}", record.display_name(), err);

                    if let Some(writer) = failed_items.as_mut() {
                        let message = err.to_string();
                        let mut row = record.values().to_vec();
                        row.push(&message);
                        // a broken report must not stop the remaining records
                        if let Err(e) = writer.save_row(&row) {
                            error!("{}, no more failed items will be saved", e);
                            failed_items = None;
                        }
                    }
                }
            }
        }

        let error_rate = if records.is_empty() {
            0.0
        } else {
            100.0 * error_count as f64 / records.len() as f64
        };
        info!("--- Sync Complete ---");
        info!("Success: {}", success_count);
        info!("Failed: {}", error_count);
        info!("Total: {} (error rate {:.2}%)", records.len(), error_rate);
        match &self.config.failed_csv {
            Some(path) if error_count > 0 && failed_items.is_some() => {
                info!("Failed items has been saved to {}", path.display())
            }
            Some(path) if error_count > 0 => {
                warn!("Failed items in {} are incomplete", path.display())
            }
            _ => {}
        }

        success_count
    }

    // upload the image (if any), then insert the row
    async fn sync_record(&self, record: &ScanRecord) -> Result<String> {
        warn_on_invalid_contacts(record);

        let file_token = match self.resolve_image(record) {
            Some(path) => {
                info!("  Uploading image: {}", record.image_path);
                let token = self.store.upload_image(&path).await?;
                info!("  ✓ Image uploaded: {}", token);
                Some(token)
            }
            None => None,
        };

        let scan_date = date_to_timestamp(&record.scan_date)?;
        let row = LarkRow::new(record, file_token, scan_date);

        info!("  Adding record to Lark Base...");
        let record_id = self
            .store
            .add_record(&self.config.base_id, &self.config.table_id, &row)
            .await?;
        info!("  ✓ Record added: {}", record_id);

        Ok(record_id)
    }

    // a missing image file is not an error, the card is synced without it
    fn resolve_image(&self, record: &ScanRecord) -> Option<PathBuf> {
        if record.image_path.is_empty() {
            return None;
        }

        let path = self.config.image_dir.join(&record.image_path);
        if path.exists() {
            Some(path)
        } else {
            warn!("  ! Image not found: {}", path.display());
            None
        }
    }
}

// malformed contacts are still synced as they are, just reported
fn warn_on_invalid_contacts(record: &ScanRecord) {
    if !record.email.is_empty() && !is_valid_email(&record.email) {
        warn!("  ! Unexpected email format: {}", record.email);
    }

    let phones = [
        ("phone", &record.phone),
        ("mobile", &record.mobile),
        ("fax", &record.fax),
    ];
    for (label, number) in phones {
        if !number.is_empty() && !is_valid_phone(number) {
            warn!("  ! Unexpected {} format: {}", label, number);
        }
    }
}

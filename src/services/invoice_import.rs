//! Bulk invoice creation from an uploaded CSV file.
//!
//! Expected columns, with an optional header row whose first cell mentions
//! "room":
//!
//! ```text
//! RoomNumber,ElectricityUnits,WaterUnits,BillingMonth,BillingYear,ElectricityRate,WaterRate
//! 201,100,50,1,2025,5.50,8.00
//! ```
//!
//! Structural problems (wrong extension, empty or non-UTF-8 file) reject the
//! whole upload. Everything else is recorded against its line and the import
//! moves on. Rows are processed one at a time in file order, so later rows
//! see invoices created by earlier ones.

use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;
use tracing::{error, info, instrument, warn, Instrument};
use utoipa::ToSchema;

use crate::entities::invoice;
use crate::errors::ServiceError;
use crate::metrics::BILLING_METRICS;
use crate::models::BillingPeriod;
use crate::repositories::Repositories;
use crate::services::fee_resolver::FeeOverrides;
use crate::services::invoice_assembler::{InvoiceAssembler, InvoiceDraft};
use crate::services::invoicing::{default_due_date, InvoicingService};
use crate::services::money;

const EXPECTED_COLUMNS: usize = 7;

/// Outcome of one import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImportResult {
    pub success_count: usize,
    pub failure_count: usize,
    pub total_processed: usize,
    /// One `"Line N: reason"` entry per rejected line, in file order
    pub errors: Vec<String>,
}

impl ImportResult {
    fn record(&mut self, line: u64, outcome: &LineOutcome) {
        match outcome {
            LineOutcome::Imported { .. } => self.success_count += 1,
            LineOutcome::Rejected { reason } => {
                self.failure_count += 1;
                self.errors.push(format!("Line {}: {}", line, reason));
            }
        }
        self.total_processed = self.success_count + self.failure_count;
    }
}

/// What happened to a single data line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Imported { invoice_id: i32 },
    Rejected { reason: String },
}

impl LineOutcome {
    fn rejected(reason: impl Into<String>) -> Self {
        LineOutcome::Rejected {
            reason: reason.into(),
        }
    }
}

/// A structurally valid data line.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvInvoiceRow {
    pub room_number: String,
    pub electricity_units: i32,
    pub water_units: i32,
    pub billing_month: u32,
    pub billing_year: i32,
    pub electricity_rate: Decimal,
    pub water_rate: Decimal,
}

fn parse_field<T: FromStr>(record: &StringRecord, index: usize, label: &str) -> Result<T, String> {
    let raw = record.get(index).unwrap_or_default();
    raw.parse::<T>()
        .map_err(|_| format!("Invalid {}: '{}'", label, raw))
}

fn parse_non_negative<T>(record: &StringRecord, index: usize, label: &str) -> Result<T, String>
where
    T: FromStr + PartialOrd + Default,
{
    let value: T = parse_field(record, index, label)?;
    if value < T::default() {
        return Err(format!("{} must not be negative", capitalize(label)));
    }
    Ok(value)
}

/// Rates must fit the stored rate columns.
fn parse_rate(record: &StringRecord, index: usize, label: &str) -> Result<Decimal, String> {
    let rate: Decimal = parse_non_negative(record, index, label)?;
    money::ensure_rate(&capitalize(label), Some(rate)).map_err(|err| err.reason())?;
    Ok(rate)
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Splits one record into its seven typed fields.
pub fn parse_row(record: &StringRecord) -> Result<CsvInvoiceRow, String> {
    if record.len() != EXPECTED_COLUMNS {
        return Err(format!(
            "Expected {} columns but found {}",
            EXPECTED_COLUMNS,
            record.len()
        ));
    }

    let room_number = record.get(0).unwrap_or_default().to_string();
    if room_number.is_empty() {
        return Err("Room number is missing".to_string());
    }

    Ok(CsvInvoiceRow {
        room_number,
        electricity_units: parse_non_negative(record, 1, "electricity units")?,
        water_units: parse_non_negative(record, 2, "water units")?,
        billing_month: parse_field(record, 3, "billing month")?,
        billing_year: parse_field(record, 4, "billing year")?,
        electricity_rate: parse_rate(record, 5, "electricity rate")?,
        water_rate: parse_rate(record, 6, "water rate")?,
    })
}

fn is_header(record: &StringRecord) -> bool {
    record
        .get(0)
        .map(|cell| cell.to_lowercase().contains("room"))
        .unwrap_or(false)
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

/// Rejects uploads that cannot be processed at all.
fn check_structure<'a>(
    file_name: &str,
    bytes: &'a [u8],
    max_bytes: usize,
) -> Result<&'a str, ServiceError> {
    let is_csv = Path::new(file_name)
        .extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(ServiceError::ValidationError(format!(
            "Only .csv files can be imported, got '{}'",
            file_name
        )));
    }
    if bytes.len() > max_bytes {
        return Err(ServiceError::PayloadTooLarge(format!(
            "File is {} bytes; the limit is {} bytes",
            bytes.len(),
            max_bytes
        )));
    }

    let text = std::str::from_utf8(bytes)
        .map_err(|_| ServiceError::ValidationError("File is not valid UTF-8 text".to_string()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "Uploaded file is empty".to_string(),
        ));
    }
    Ok(text)
}

#[derive(Clone)]
pub struct InvoiceImportService {
    repos: Repositories,
    assembler: InvoiceAssembler,
    payment_term_days: u32,
    max_bytes: usize,
}

impl InvoiceImportService {
    pub fn new(invoicing: &InvoicingService, max_bytes: usize) -> Self {
        Self {
            repos: invoicing.repositories().clone(),
            assembler: invoicing.assembler().clone(),
            payment_term_days: invoicing.settings().payment_term_days(),
            max_bytes,
        }
    }

    /// Imports every data line of `bytes`, isolating failures per line.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn import_file(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ImportResult, ServiceError> {
        let started = Instant::now();
        let text = check_structure(file_name, bytes, self.max_bytes)?;

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let mut result = ImportResult::default();
        let mut last_line = 0u64;
        let mut first_record = true;

        for record in reader.records() {
            let line_started = Instant::now();
            let (line, outcome) = match record {
                Ok(record) => {
                    let line = record.position().map(|p| p.line()).unwrap_or(last_line + 1);
                    last_line = line;
                    if is_blank(&record) {
                        continue;
                    }
                    if std::mem::take(&mut first_record) && is_header(&record) {
                        continue;
                    }
                    let outcome = match parse_row(&record) {
                        Ok(row) => self.import_row_isolated(row).await,
                        Err(reason) => LineOutcome::rejected(reason),
                    };
                    (line, outcome)
                }
                Err(err) => {
                    let line = err
                        .position()
                        .map(|p| p.line())
                        .unwrap_or(last_line + 1);
                    last_line = line;
                    first_record = false;
                    (line, LineOutcome::rejected(format!("Unreadable line: {}", err)))
                }
            };

            match &outcome {
                LineOutcome::Imported { invoice_id } => {
                    info!(line, invoice_id, "Imported invoice line");
                }
                LineOutcome::Rejected { reason } => {
                    warn!(line, %reason, "Rejected invoice line");
                }
            }
            BILLING_METRICS.record_import_line(
                matches!(outcome, LineOutcome::Imported { .. }),
                line_started.elapsed(),
            );
            result.record(line, &outcome);
        }

        BILLING_METRICS.record_import_file(started.elapsed());
        info!(
            file_name,
            success = result.success_count,
            failed = result.failure_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Invoice import finished"
        );
        Ok(result)
    }

    /// Runs [`Self::import_row`] on its own task so that even a panic ends
    /// up as a line error.
    async fn import_row_isolated(&self, row: CsvInvoiceRow) -> LineOutcome {
        let service = self.clone();
        let task = tokio::spawn(async move { service.import_row(&row).await }.in_current_span());
        match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "Invoice line task failed");
                LineOutcome::rejected("Unexpected error while importing line")
            }
        }
    }

    /// Creates the invoice for one parsed row.
    pub async fn import_row(&self, row: &CsvInvoiceRow) -> LineOutcome {
        match self.try_import_row(row).await {
            Ok(invoice) => LineOutcome::Imported {
                invoice_id: invoice.id,
            },
            Err(err) => LineOutcome::rejected(err.reason()),
        }
    }

    async fn try_import_row(&self, row: &CsvInvoiceRow) -> Result<invoice::Model, ServiceError> {
        let period = BillingPeriod::new(row.billing_year, row.billing_month)?;

        let room = self
            .repos
            .rooms
            .find_by_number(&row.room_number)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Room not found: {}", row.room_number)))?;

        if self.repos.invoices.exists_for_period(room.id, period).await? {
            return Err(ServiceError::Conflict(format!(
                "Invoice already exists for room {} in period {}",
                room.room_number, period
            )));
        }

        let issue_date = period.first_day();
        let lease = self
            .repos
            .leases
            .find_active_for_room_on(room.id, issue_date)
            .await?;
        let tenant_id = lease.as_ref().map(|l| l.tenant_id).or(room.tenant_id);
        if tenant_id.is_none() {
            return Err(ServiceError::ValidationError(format!(
                "Room {} has no tenant assigned",
                room.room_number
            )));
        }

        let draft = InvoiceDraft {
            room,
            lease,
            tenant_id,
            period,
            issue_date,
            due_date: Some(default_due_date(issue_date, self.payment_term_days)),
            overrides: FeeOverrides {
                electricity_units: Some(row.electricity_units),
                electricity_rate: Some(row.electricity_rate),
                water_units: Some(row.water_units),
                water_rate: Some(row.water_rate),
                include_common_fee: true,
                include_garbage_fee: true,
                ..Default::default()
            },
        };
        let invoice = self.assembler.assemble(&draft).await?;
        let saved = self.repos.invoices.insert(invoice).await?;
        BILLING_METRICS.record_invoice_created();
        Ok(saved)
    }
}

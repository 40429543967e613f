#![allow(dead_code)]

use async_trait::async_trait;
use corridas_dashboard::backend::TableClient;
use corridas_dashboard::batch::Progress;
use corridas_dashboard::error::BackendError;
use corridas_dashboard::schema::{RowRecord, SCHEMA};
use corridas_dashboard::upload::{self, SharedForm};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// One insert request seen by [`RecordingTable`].
#[derive(Debug, Clone)]
pub struct Call {
    pub table: String,
    pub rows: Vec<Value>,
    pub progress: Progress,
}

/// In-memory table that records every batch and can reject one of them.
pub struct RecordingTable {
    form: Option<SharedForm>,
    fail_batch: Option<(usize, String)>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingTable {
    pub fn accepting() -> Self {
        RecordingTable {
            form: None,
            fail_batch: None,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot `form`'s progress at the start of every insert.
    pub fn watching(mut self, form: &SharedForm) -> Self {
        self.form = Some(form.clone());
        self
    }

    /// Reject the 1-based batch `number` with `message`.
    pub fn failing_at(mut self, number: usize, message: &str) -> Self {
        self.fail_batch = Some((number, message.to_string()));
        self
    }

    /// Take `delay` to answer every insert.
    pub fn slowed_by(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls().iter().map(|call| call.rows.len()).collect()
    }
}

#[async_trait]
impl TableClient for RecordingTable {
    async fn insert(&self, table: &str, rows: &[RowRecord]) -> Result<(), BackendError> {
        let progress = self
            .form
            .as_ref()
            .map(|form| upload::lock(form).progress())
            .unwrap_or_default();

        let number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                table: table.to_string(),
                rows: rows.iter().map(|row| serde_json::to_value(row).unwrap()).collect(),
                progress,
            });
            calls.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.fail_batch {
            Some((fail, message)) if *fail == number => Err(BackendError::new(message.clone())),
            _ => Ok(()),
        }
    }
}

/// Table whose inserts wait until the test calls [`GatedTable::release`].
#[derive(Clone, Default)]
pub struct GatedTable {
    gate: Arc<Notify>,
}

impl GatedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let every pending and future insert through.
    pub fn release(&self) {
        self.gate.notify_waiters();
        self.gate.notify_one();
    }
}

#[async_trait]
impl TableClient for GatedTable {
    async fn insert(&self, _table: &str, _rows: &[RowRecord]) -> Result<(), BackendError> {
        self.gate.notified().await;
        Ok(())
    }
}

/// Workbook whose first sheet has every schema column as header and `rows`
/// data rows; row `i` carries `ent-{i}` as its worker id.
pub fn corridas_workbook(rows: usize) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, (name, _)) in SCHEMA.iter().enumerate() {
        worksheet.write_string(0, col as u16, *name).unwrap();
    }

    for i in 0..rows {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, "2024-01-15").unwrap();
        worksheet.write_string(row, 1, "MANHA").unwrap();
        worksheet.write_number(row, 2, 4.0).unwrap();
        worksheet
            .write_string(row, 5, &format!("ent-{}", i))
            .unwrap();
        worksheet.write_string(row, 7, "SAO PAULO").unwrap();
        worksheet.write_number(row, 13, (i % 50) as f64).unwrap();
        worksheet.write_number(row, 18, 12.5).unwrap();
    }

    workbook.save_to_buffer().unwrap()
}

/// Workbook built from explicit header and row text.
pub fn workbook_from(headers: &[&str], rows: &[Vec<&str>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header).unwrap();
    }
    for (r, cells) in rows.iter().enumerate() {
        for (col, text) in cells.iter().enumerate() {
            if !text.is_empty() {
                worksheet
                    .write_string((r + 1) as u32, col as u16, *text)
                    .unwrap();
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}

/// Workbook with one sheet per `(name, headers, rows)` entry, in order.
pub fn workbook_with_sheets(sheets: &[(&str, &[&str], &[Vec<&str>])]) -> Vec<u8> {
    let mut workbook = Workbook::new();

    for (name, headers, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header).unwrap();
        }
        for (r, cells) in rows.iter().enumerate() {
            for (col, text) in cells.iter().enumerate() {
                worksheet
                    .write_string((r + 1) as u32, col as u16, *text)
                    .unwrap();
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}

/// Workbook with a date, a date-time and a duration cell under the
/// `data_do_periodo`, `origem` and `tempo_disponivel_absoluto` headers.
pub fn dated_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let date = Format::new().set_num_format("yyyy-mm-dd");
    let date_time = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let duration = Format::new().set_num_format("[h]:mm:ss");

    worksheet.write_string(0, 0, "data_do_periodo").unwrap();
    worksheet.write_string(0, 1, "origem").unwrap();
    worksheet.write_string(0, 2, "tempo_disponivel_absoluto").unwrap();

    let day = ExcelDateTime::from_ymd(2024, 1, 15).unwrap();
    let moment = ExcelDateTime::from_ymd(2024, 1, 15)
        .unwrap()
        .and_hms(8, 30, 0)
        .unwrap();
    worksheet
        .write_datetime_with_format(1, 0, &day, &date)
        .unwrap();
    worksheet
        .write_datetime_with_format(1, 1, &moment, &date_time)
        .unwrap();
    worksheet.write_number_with_format(1, 2, 1.5, &duration).unwrap();

    workbook.save_to_buffer().unwrap()
}

/*!
# Corridas Dashboard

A small web dashboard for delivery-ride statistics, built in Rust.

## Overview

The dashboard shows a row of statistic cards and a spreadsheet upload form.
A user picks an `.xlsx`/`.xls` file, starts the import, and the server reads
the first sheet, projects every row onto the fixed `corridas` schema and
inserts the rows into the hosted table in batches of 1000, one batch at a
time, reporting progress as it goes.

## Architecture

### Frontend Layer
- **Technologies**: HTML, CSS, JavaScript
- **Key Components**:
  - Stat cards - Numbers formatted for the pt-BR locale
  - Upload form - File picker, import button, progress bar and messages
  - Poller - Reads the upload status and re-fetches the cards after an import

### Backend Layer
- **Technologies**: Rust, axum, tokio
- **Core Components**:
  - Workbook reader - Decodes the first sheet with header-row-as-keys semantics
  - Schema - Declarative table of the 19 `corridas` columns
  - Batcher - Splits projected rows into ordered batches
  - Upload form state - Uploading flag, progress, error and success messages
  - Table client - Insert-many requests against the hosted PostgREST backend

## Upload lifecycle

idle → reading → parsing → uploading (batch i of N) → success or error → idle

A failed batch ends the attempt: later batches are never sent, batches
already inserted remain in the table, and the error names the 1-based batch
number together with the backend's message.

## Modules

- **schema**: Column table, sheet rows and projected records
- **workbook**: Spreadsheet decoding (calamine)
- **batch**: Chunking and progress arithmetic
- **backend**: Remote table trait and REST client
- **upload**: Upload form state and the import pipeline
- **stat_card**: Statistic cards and pt-BR number formatting
- **dashboard**: Card source, insert tally and refresh
- **config**: Command line and environment settings
- **error**: Error types
- **app**: Routing and handlers (web feature)

## REST API Endpoints

- `GET /` - Dashboard page
- `GET /api/stats` - Current stat cards
- `POST /api/upload/file` - Select a file (multipart field `file`)
- `POST /api/upload/start` - Start the import
- `GET /api/upload/status` - Upload form state
*/

pub mod backend;
pub mod batch;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod schema;
pub mod stat_card;
pub mod upload;
pub mod workbook;

#[cfg(feature = "web")]
pub mod app;

/// Re-export the pieces most callers need
pub use backend::{RestTableClient, TableClient};
pub use batch::{CHUNK_SIZE, Progress};
pub use error::{BackendError, ConfigError, ImportError};
pub use schema::{RowRecord, SCHEMA, SheetRow};
pub use stat_card::StatCard;
pub use upload::{SelectedFile, SharedForm, UploadForm};

/// Install the `env_logger` backend, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

use crate::backend::TableClient;
use crate::batch::{self, Progress};
use crate::error::ImportError;
use crate::schema::{self, RowRecord};
use crate::workbook;
use log::{error, info, warn};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Form state shared between the upload routine and whoever renders it.
pub type SharedForm = Arc<Mutex<UploadForm>>;

/// Where the upload currently is
///
/// `Idle` until the first attempt; an attempt ends in `Done` or `Failed`,
/// which stays until the next attempt or file selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Reading,
    Parsing,
    Uploading,
    Done,
    Failed,
}

/// A file chosen by the user, read in full only when the upload starts.
#[derive(Clone, Debug)]
pub struct SelectedFile {
    name: String,
    path: PathBuf,
    // Keeps a received upload on disk for as long as any clone is alive.
    _spool: Option<Arc<NamedTempFile>>,
}

impl SelectedFile {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        SelectedFile {
            name,
            path,
            _spool: None,
        }
    }

    /// Spool uploaded bytes to a temporary file that lives as long as the selection.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> std::io::Result<Self> {
        let mut spool = NamedTempFile::new()?;
        spool.write_all(bytes)?;
        spool.flush()?;
        Ok(SelectedFile {
            name: name.into(),
            path: spool.path().to_path_buf(),
            _spool: Some(Arc::new(spool)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

/// State of the upload form
///
/// Holds the selected file, the uploading flag, the last error or success
/// message (at most one of each, each new one replacing the old) and the
/// batch progress of the current attempt.
#[derive(Debug, Default)]
pub struct UploadForm {
    file: Option<SelectedFile>,
    uploading: bool,
    error: Option<String>,
    success: Option<String>,
    progress: Progress,
    phase: Phase,
}

/// Serializable view of an [`UploadForm`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormSnapshot {
    pub file_name: Option<String>,
    pub uploading: bool,
    pub error: Option<String>,
    pub success: Option<String>,
    pub progress: Progress,
    pub percent: u32,
    pub label: String,
    pub phase: Phase,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedForm {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Replace the selected file, clearing messages and progress.
    pub fn select_file(&mut self, file: SelectedFile) {
        self.file = Some(file);
        self.error = None;
        self.success = None;
        self.progress = Progress::default();
        if !self.uploading {
            self.phase = Phase::Idle;
        }
    }

    /// Start an attempt
    ///
    /// Without a selected file the input error is recorded and nothing else
    /// changes. While an attempt is running the call is rejected and the state
    /// is left untouched.
    ///
    /// # Returns
    /// * `Result<SelectedFile, ImportError>` - The file to read, or the input error
    pub fn begin(&mut self) -> Result<SelectedFile, ImportError> {
        if self.uploading {
            return Err(ImportError::AlreadyUploading);
        }
        let Some(file) = self.file.clone() else {
            let err = ImportError::NoFileSelected;
            self.error = Some(err.user_message());
            return Err(err);
        };

        self.uploading = true;
        self.error = None;
        self.success = None;
        self.progress = Progress::default();
        self.phase = Phase::Reading;
        Ok(file)
    }

    fn enter_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    fn set_progress(&mut self, progress: Progress) {
        self.progress = progress;
    }

    fn succeed(&mut self, rows: usize) {
        self.success = Some(format!("Arquivo com {} linhas importado com sucesso!", rows));
        self.phase = Phase::Done;
    }

    fn fail(&mut self, err: &ImportError) {
        self.error = Some(err.user_message());
        self.phase = Phase::Failed;
    }

    fn finish(&mut self) {
        self.uploading = false;
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file.as_ref().map(SelectedFile::name)
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            file_name: self.file_name().map(str::to_string),
            uploading: self.uploading,
            error: self.error.clone(),
            success: self.success.clone(),
            progress: self.progress,
            percent: self.progress.percent(),
            label: self.progress.label(),
            phase: self.phase,
        }
    }
}

/// Lock the form, recovering the state if a previous holder panicked.
pub fn lock(form: &SharedForm) -> MutexGuard<'_, UploadForm> {
    form.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run a complete upload attempt for the selected file
///
/// Input errors are returned without starting the pipeline. Otherwise the
/// attempt runs to its end: see [`drive_upload`].
///
/// # Returns
/// * `Result<usize, ImportError>` - Number of rows imported, or the failure
pub async fn run_upload<C, F>(
    form: &SharedForm,
    client: &C,
    table: &str,
    on_complete: F,
) -> Result<usize, ImportError>
where
    C: TableClient + ?Sized,
    F: FnOnce() + Send,
{
    let file = lock(form).begin()?;
    drive_upload(form, file, client, table, on_complete).await
}

/// Read, parse, project and submit `file` batch by batch
///
/// Expects [`UploadForm::begin`] to have succeeded. Batches are sent strictly
/// one after another; the first failing batch ends the attempt and later
/// batches are never sent. Batches already committed stay in the table.
/// `on_complete` runs once, only when every batch succeeded, after the success
/// message is set. The uploading flag is cleared on every path.
pub async fn drive_upload<C, F>(
    form: &SharedForm,
    file: SelectedFile,
    client: &C,
    table: &str,
    on_complete: F,
) -> Result<usize, ImportError>
where
    C: TableClient + ?Sized,
    F: FnOnce() + Send,
{
    info!("Importing '{}' into table '{}'", file.name(), table);
    let outcome = import_file(form, &file, client, table).await;

    match &outcome {
        Ok(rows) => {
            info!("Imported {} rows from '{}'", rows, file.name());
            lock(form).succeed(*rows);
            on_complete();
        }
        Err(err) => {
            error!("Import of '{}' failed: {}", file.name(), err);
            lock(form).fail(err);
        }
    }

    lock(form).finish();
    outcome
}

/// Await `work` while sampling the form's batch progress every `every`
///
/// `report` is called with each progress value that differs from the last
/// one reported, and once more when `work` finishes if the final progress
/// was not seen yet.
///
/// # Returns
/// * `T` - Whatever `work` resolved to
pub async fn watch_progress<T, Fut, R>(
    form: &SharedForm,
    every: Duration,
    work: Fut,
    mut report: R,
) -> T
where
    Fut: Future<Output = T>,
    R: FnMut(Progress),
{
    tokio::pin!(work);
    let mut ticker = tokio::time::interval(every);
    let mut last = Progress::default();

    loop {
        tokio::select! {
            output = &mut work => {
                let progress = lock(form).progress();
                if progress != last {
                    report(progress);
                }
                return output;
            }
            _ = ticker.tick() => {
                let progress = lock(form).progress();
                if progress != last {
                    report(progress);
                    last = progress;
                }
            }
        }
    }
}

async fn import_file<C>(
    form: &SharedForm,
    file: &SelectedFile,
    client: &C,
    table: &str,
) -> Result<usize, ImportError>
where
    C: TableClient + ?Sized,
{
    let bytes = file.read().await?;

    lock(form).enter_phase(Phase::Parsing);
    let records: Vec<RowRecord> = workbook::read_first_sheet(&bytes)?
        .iter()
        .map(schema::project)
        .collect();
    drop(bytes);

    let total = batch::batch_count(records.len());
    {
        let mut state = lock(form);
        state.enter_phase(Phase::Uploading);
        state.set_progress(Progress::new(0, total));
    }
    info!("{} rows in {} batches", records.len(), total);

    for (index, chunk) in batch::batches(&records).enumerate() {
        let number = index + 1;
        if let Err(err) = client.insert(table, chunk).await {
            warn!("Batch {} of {} rejected: {}", number, total, err);
            return Err(ImportError::Batch {
                number,
                message: err.message,
            });
        }
        info!("Batch {} of {} committed ({} rows)", number, total, chunk.len());
        lock(form).set_progress(Progress::new(number, total));
    }

    Ok(records.len())
}

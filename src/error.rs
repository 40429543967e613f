use thiserror::Error;

/// Prefix shown in front of every pipeline failure.
pub const IMPORT_ERROR_LABEL: &str = "Erro ao importar o arquivo";

/// Failures of a single upload attempt.
///
/// `NoFileSelected` and `AlreadyUploading` are input errors: they are reported
/// before the pipeline starts. Every other variant is an import error raised
/// while reading, parsing or submitting batches.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Por favor, selecione um arquivo.")]
    NoFileSelected,

    #[error("Já existe uma importação em andamento.")]
    AlreadyUploading,

    #[error("Falha ao ler o arquivo: {0}")]
    Read(#[from] std::io::Error),

    #[error("Planilha inválida: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("A planilha não contém abas.")]
    NoSheets,

    /// `number` is 1-based.
    #[error("Erro no lote {number}: {message}")]
    Batch { number: usize, message: String },
}

impl ImportError {
    pub fn is_input_error(&self) -> bool {
        matches!(self, ImportError::NoFileSelected | ImportError::AlreadyUploading)
    }

    /// The single-line text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        if self.is_input_error() {
            self.to_string()
        } else {
            format!("{IMPORT_ERROR_LABEL}: {self}")
        }
    }
}

/// Error reported by the remote table for one insert request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        BackendError {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::new(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Backend API key must not be empty")]
    MissingKey,

    #[error("Table name must not be empty")]
    MissingTable,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

mod common;

use common::corridas_workbook;
use std::io::Write;
use std::process::Output;
use tempfile::NamedTempFile;
use tokio::process::Command;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn run_import(file: &std::path::Path, url: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_import"))
        .arg(file)
        .args(["--supabase-url", url, "--supabase-key", "anon-key"])
        .env("RUST_LOG", "off")
        .output()
        .await
        .unwrap()
}

#[tokio::test]
async fn import_prints_progress_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/corridas"))
        .respond_with(ResponseTemplate::new(201))
        .expect(3)
        .mount(&server)
        .await;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&corridas_workbook(2500)).unwrap();

    let output = run_import(file.path(), &server.uri()).await;
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(output.status.success());
    assert!(stdout.contains("Enviando lote 3 de 3... (100%)"));
    assert!(stdout.contains("Arquivo com 2500 linhas importado com sucesso!"));
}

#[tokio::test]
async fn failed_import_prints_one_error_line() {
    let output = run_import(
        std::path::Path::new("/nonexistent/corridas.xlsx"),
        "http://127.0.0.1:9",
    )
    .await;
    let stderr = String::from_utf8(output.stderr).unwrap();
    let lines: Vec<&str> = stderr.lines().collect();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Erro ao importar o arquivo: "));
    assert!(!stderr.contains("Error:"));
}

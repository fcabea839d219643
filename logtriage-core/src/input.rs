use anyhow::Result;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info};

/// Read a log file into a string, tolerating common encodings.
///
/// BOM-marked UTF-8/UTF-16 files decode per their BOM; everything else is
/// tried as UTF-8 first and falls back to Windows-1252, which covers the
/// ISO-8859-1 logs legacy systems still emit.
pub async fn read_log_file(file_path: &Path) -> Result<String> {
    info!("Reading log file: {}", file_path.display());

    let data = match fs::read(file_path).await {
        Ok(data) => {
            debug!("Read {} bytes from {}", data.len(), file_path.display());
            data
        }
        Err(e) => {
            error!("Failed to read file {}: {}", file_path.display(), e);
            return Err(e.into());
        }
    };

    let (text, encoding) = decode_bytes(&data);
    info!(
        "Decoded {} as {} ({} characters)",
        file_path.display(),
        encoding.name(),
        text.chars().count()
    );
    Ok(text)
}

fn decode_bytes(data: &[u8]) -> (String, &'static Encoding) {
    if let Some((encoding, _bom_length)) = Encoding::for_bom(data) {
        let (text, _, _) = encoding.decode(data);
        return (text.into_owned(), encoding);
    }

    let (text, had_errors) = UTF_8.decode_without_bom_handling(data);
    if !had_errors {
        return (text.into_owned(), UTF_8);
    }

    let (text, _, _) = WINDOWS_1252.decode(data);
    (text.into_owned(), WINDOWS_1252)
}

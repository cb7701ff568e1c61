use anyhow::{Context, Result};
use reqwest::{header::ACCEPT_LANGUAGE, Client};
use std::path::Path;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info};

/// Whether `dest` must be (re)fetched: always when forced, otherwise only if absent.
pub fn needs_download(dest: &Path, force: bool) -> bool {
    force || !dest.exists()
}

/// Stream the archive at `url` to `dest`, creating its parent directory.
///
/// The body lands in `<dest>.part` first and is renamed once complete.
/// Returns the number of bytes written.
pub async fn download_zip(client: &Client, url: &str, dest: impl AsRef<Path>) -> Result<u64> {
    let dest = dest.as_ref();
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating directory {:?}", parent))?;
    }

    let mut resp = client
        .get(url)
        .header(ACCEPT_LANGUAGE, "en-US")
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()?;

    let part = dest.with_extension("part");
    let mut file = fs::File::create(&part)
        .await
        .with_context(|| format!("creating {:?}", part))?;
    let mut written = 0u64;
    while let Some(chunk) = resp
        .chunk()
        .await
        .with_context(|| format!("reading body from {}", url))?
    {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    fs::rename(&part, dest)
        .await
        .with_context(|| format!("moving {:?} to {:?}", part, dest))?;
    debug!(bytes = written, "download finished");
    info!("File downloaded successfully");
    Ok(written)
}

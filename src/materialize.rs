//! Turns provider output into something the gallery can show.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::Result;
use crate::gemini::{ContentPart, GeneratedContent};

/// Decodes an inline blob as whatever image format it is and re-encodes it as PNG.
pub fn reencode_png(bytes: &[u8]) -> Result<Vec<u8>> {
    let image = image::load_from_memory(bytes)?;
    let mut output = Vec::new();
    image.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

/// Writes every inline image part to `out_dir` as `{prefix}_1.png`, `{prefix}_2.png`, ...
/// in response order. Parts without inline data are skipped; zero image parts yields an
/// empty list.
pub async fn save_inline_images(
    content: &GeneratedContent,
    out_dir: &Path,
    prefix: &str,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for part in &content.parts {
        let ContentPart::InlineData { mime_type, data } = part else {
            continue;
        };
        if paths.is_empty() {
            fs::create_dir_all(out_dir).await?;
        }
        let png = reencode_png(data)?;
        let path = out_dir.join(format!("{prefix}_{}.png", paths.len() + 1));
        fs::write(&path, png).await?;
        debug!("wrote {} from {} bytes of {mime_type}", path.display(), data.len());
        paths.push(path);
    }
    if paths.is_empty() {
        warn!("response contained no inline images");
    }
    Ok(paths)
}

/// Remote results are shown as returned.
pub fn collect_urls(urls: Vec<String>) -> Vec<String> {
    if urls.is_empty() {
        warn!("task completed without image URLs");
    }
    urls
}

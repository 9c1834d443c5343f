//! Upload handling: turns a batch of files into the new slide set.

use crate::detect::{classify, SourceKind};
use crate::error::{Error, Result};
use crate::render::{render_presentation, SlideRasterizer};
use crate::store::SlideStore;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name used when an upload carries no usable filename.
pub const UNKNOWN_FILE_NAME: &str = "unknown";

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename as sent by the client, if any
    pub name: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: Some(name.into()),
            data,
        }
    }

    /// Last path component of the client filename, or `unknown`.
    pub fn file_name(&self) -> String {
        self.name
            .as_deref()
            .map(|name| name.replace('\\', "/"))
            .and_then(|name| {
                Path::new(&name)
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_FILE_NAME.to_string())
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub message: String,
    /// Stored filenames in processing order
    pub slides: Vec<String>,
}

impl UploadOutcome {
    fn new(slides: Vec<String>) -> Self {
        Self {
            message: format!("Uploaded/Converted {} slides", slides.len()),
            slides,
        }
    }
}

/// Replace the slide store with the slides produced from `files`.
///
/// Presentations are rasterized to `slide_NNN.png`, numbered from the count
/// of names already produced in this batch; anything else is stored as-is.
/// Empty files are skipped. Any failure discards the whole batch.
pub fn process_upload(
    store: &SlideStore,
    rasterizer: &dyn SlideRasterizer,
    files: &[UploadedFile],
) -> Result<UploadOutcome> {
    if files.is_empty() {
        return Err(Error::NoFiles);
    }
    info!("processing upload of {} files", files.len());

    let batch = store.begin_batch()?;
    let mut saved: Vec<String> = Vec::new();

    for file in files {
        if file.data.is_empty() {
            debug!("skipping empty upload {:?}", file.name);
            continue;
        }
        let name = file.file_name();

        match classify(&name) {
            SourceKind::Presentation => {
                info!("converting presentation {}", name);
                let slides = render_presentation(rasterizer, &file.data, saved.len(), batch.path())
                    .inspect_err(|e| warn!("conversion of {} failed: {}", name, e))?;
                debug!("{} produced {} slides", name, slides.len());
                saved.extend(slides);
            }
            SourceKind::Image => {
                debug!("storing image {}", name);
                batch.write_file(&name, &file.data)?;
                saved.push(name);
            }
        }
    }

    store.commit(batch)?;
    Ok(UploadOutcome::new(saved))
}

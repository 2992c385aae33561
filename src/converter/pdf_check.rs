use crate::error::{io_error_for, PdfConvError, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

const MIN_PDF_BYTES: u64 = 100;
const HEAD_WINDOW: usize = 4096;
const TAIL_WINDOW: u64 = 1024;

/// Cheap structural check before handing a file to an engine.
pub fn check_pdf(path: &Path) -> Result<()> {
    let invalid = |reason: &str| PdfConvError::InvalidPdf {
        path: path.display().to_string(),
        reason: reason.to_string(),
    };

    if !path.exists() {
        return Err(PdfConvError::InputNotFound {
            path: path.display().to_string(),
        });
    }
    if !path.is_file() {
        return Err(invalid("not a regular file"));
    }

    let mut file = File::open(path).map_err(|e| io_error_for(path, e))?;
    let size = file.metadata()?.len();

    let mut head = vec![0u8; HEAD_WINDOW.min(size as usize)];
    file.read_exact(&mut head)?;

    if !head.starts_with(b"%PDF") {
        return Err(invalid("missing PDF header"));
    }
    if size < MIN_PDF_BYTES {
        return Err(invalid("file too small to be a valid PDF"));
    }
    if !contains(&head, b"obj") {
        return Err(invalid("no PDF objects found"));
    }

    let tail_len = TAIL_WINDOW.min(size);
    file.seek(SeekFrom::End(-(tail_len as i64)))?;
    let mut tail = Vec::with_capacity(tail_len as usize);
    file.read_to_end(&mut tail)?;

    if !contains(&tail, b"%%EOF") {
        return Err(invalid("missing end-of-file marker, the file may be truncated"));
    }

    Ok(())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

//! Recorded-sequence source: frames on disk plus a CSV index.
//!
//! The index lives at `<dir>/index.csv` with `timestamp_ns,filename` rows,
//! `#` comments allowed. Frames are decoded lazily in file order, one ahead
//! of the capture stage.

use std::path::{Path, PathBuf};
use std::time::Duration;

use csv::ReaderBuilder;
use image::RgbImage;
use tracing::info;

use crate::source::{FrameSource, FrameView, SourceError};

#[derive(Debug, Clone)]
struct IndexEntry {
    timestamp_ns: u64,
    filename: String,
}

#[derive(Debug)]
pub struct ReplaySource {
    dir: PathBuf,
    entries: Vec<IndexEntry>,
    cursor: usize,
    current: RgbImage,
}

impl ReplaySource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, SourceError> {
        let dir = dir.as_ref().to_path_buf();
        let index_path = dir.join("index.csv");

        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .from_path(&index_path)?;

        let mut entries = Vec::new();
        for rec in rdr.records() {
            let rec = rec?;
            if rec.len() < 2 {
                continue;
            }
            let line = rec.position().map_or(0, |p| p.line() as usize);
            let timestamp_ns: u64 =
                rec[0]
                    .trim()
                    .parse()
                    .map_err(|e| SourceError::MalformedIndex {
                        line,
                        reason: format!("bad timestamp: {e}"),
                    })?;
            let filename = rec[1].trim().to_string();
            if filename.is_empty() {
                return Err(SourceError::MalformedIndex {
                    line,
                    reason: "empty filename".into(),
                });
            }
            entries.push(IndexEntry {
                timestamp_ns,
                filename,
            });
        }

        info!(frames = entries.len(), dir = %dir.display(), "opened replay sequence");
        Ok(Self {
            dir,
            entries,
            cursor: 0,
            current: RgbImage::new(0, 0),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FrameSource for ReplaySource {
    /// Disk-backed frames are delivered as fast as they decode; the timeout
    /// is ignored.
    fn try_next_frame(&mut self, _timeout: Duration) -> Result<Option<FrameView<'_>>, SourceError> {
        let Some(entry) = self.entries.get(self.cursor) else {
            return Err(SourceError::EndOfStream);
        };
        let path = self.dir.join(&entry.filename);
        self.current = image::open(&path)?.to_rgb8();
        let timestamp_ns = entry.timestamp_ns;
        self.cursor += 1;
        Ok(Some(FrameView {
            data: self.current.as_raw(),
            width: self.current.width(),
            height: self.current.height(),
            timestamp_ns,
        }))
    }
}

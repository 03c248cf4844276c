//! Size-bounded output files
//!
//! Declarations are appended to an in-memory buffer that is written out as
//! `<prefix>_dump_<N>.lua` whenever the next declaration would push it past
//! the threshold. Every file starts with the `---@meta` marker. A single
//! declaration larger than the threshold gets a file of its own.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::annotation::META_HEADER;
use crate::CodegenError;

/// Default chunk size: 500 KiB
pub const DEFAULT_CHUNK_THRESHOLD: usize = 500 * 1024;

#[derive(Debug)]
pub struct ChunkWriter {
    dir: PathBuf,
    file_prefix: String,
    threshold: usize,
    buffer: String,
    next_index: usize,
    files: Vec<PathBuf>,
}

impl ChunkWriter {
    pub fn new(dir: &Path, file_prefix: impl Into<String>, threshold: usize) -> Self {
        Self {
            dir: dir.to_path_buf(),
            file_prefix: file_prefix.into(),
            threshold,
            buffer: String::from(META_HEADER),
            next_index: 0,
            files: Vec::new(),
        }
    }

    /// Whether the buffer holds anything beyond the header
    pub fn has_content(&self) -> bool {
        self.buffer.len() > META_HEADER.len()
    }

    /// Append one declaration block, flushing around it as needed
    pub fn append(&mut self, block: &str) -> Result<(), CodegenError> {
        if self.has_content() && self.buffer.len() + block.len() > self.threshold {
            self.flush()?;
        }
        self.buffer.push_str(block);
        if self.buffer.len() > self.threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// Write the buffer to the next numbered file and reset it
    pub fn flush(&mut self) -> Result<(), CodegenError> {
        if !self.has_content() {
            return Ok(());
        }

        let path = self
            .dir
            .join(format!("{}_dump_{}.lua", self.file_prefix, self.next_index));
        {
            let mut file = File::create(&path).map_err(|e| CodegenError::io(&path, e))?;
            file.write_all(self.buffer.as_bytes())
                .map_err(|e| CodegenError::io(&path, e))?;
        }
        debug!("Wrote {} ({} bytes)", path.display(), self.buffer.len());

        self.files.push(path);
        self.next_index += 1;
        self.buffer.clear();
        self.buffer.push_str(META_HEADER);
        Ok(())
    }

    /// Forced final flush; returns every file written, in order
    pub fn finish(mut self) -> Result<Vec<PathBuf>, CodegenError> {
        self.flush()?;
        Ok(self.files)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

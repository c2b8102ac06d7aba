//! crossbuild write: sinks for finalized compositions.

#![forbid(unsafe_code)]

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crossbuild_compose::{CompositionWriter, WriteError};
use crossbuild_core::Composition;
use metrics::counter;
use tracing::{debug, info};

/// Render one composition as a YAML document, without a leading separator.
pub fn to_yaml(composition: &Composition) -> Result<String, WriteError> {
    serde_yaml::to_string(composition).map_err(|e| WriteError::Encode(Box::new(e)))
}

/// Writes every composition to one stream as a multi-document YAML file.
pub struct StreamWriter<W: Write> {
    out: W,
    label: PathBuf,
}

impl StreamWriter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), "-")
    }
}

impl<W: Write> StreamWriter<W> {
    /// `label` names the stream in I/O errors.
    pub fn new(out: W, label: impl Into<PathBuf>) -> Self {
        Self { out, label: label.into() }
    }

    pub fn into_inner(self) -> W { self.out }

    fn io_error(&self, source: io::Error) -> WriteError {
        WriteError::Io { path: self.label.clone(), source }
    }
}

impl<W: Write> CompositionWriter for StreamWriter<W> {
    fn write(&mut self, composition: &Composition) -> Result<(), WriteError> {
        let yaml = to_yaml(composition)?;
        let res = self
            .out
            .write_all(b"---\n")
            .and_then(|_| self.out.write_all(yaml.as_bytes()))
            .and_then(|_| self.out.flush());
        res.map_err(|e| self.io_error(e))?;
        counter!("write_documents_total", 1u64);
        debug!(name = composition.name(), bytes = yaml.len(), "composition streamed");
        Ok(())
    }
}

/// Writes each composition to `<dir>/<metadata.name>.yaml`.
#[derive(Debug, Clone)]
pub struct DirectoryWriter {
    dir: PathBuf,
}

impl DirectoryWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.yaml", name))
    }
}

impl CompositionWriter for DirectoryWriter {
    fn write(&mut self, composition: &Composition) -> Result<(), WriteError> {
        let name = composition.name();
        if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') || name == "." || name == ".." {
            return Err(WriteError::Other(format!("'{}' is not usable as a file name", name).into()));
        }
        fs::create_dir_all(&self.dir).map_err(|source| WriteError::Io { path: self.dir.clone(), source })?;
        let path = self.path_for(name);
        let yaml = to_yaml(composition)?;
        fs::write(&path, yaml).map_err(|source| WriteError::Io { path: path.clone(), source })?;
        counter!("write_documents_total", 1u64);
        info!(path = %path.display(), "composition written");
        Ok(())
    }
}

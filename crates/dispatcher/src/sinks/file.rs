//! FileSink - persists the stream to one file

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{ContractError, DataSink, EncodedRecord};
use tracing::{debug, error, info, instrument};

/// Sink that writes the encoded stream to a file
///
/// The file is truncated on creation. Writes go through a buffer that is
/// flushed after every record, so the file is complete up to the last
/// record even if the process dies.
pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    samples_written: u64,
}

impl FileSink {
    /// Create (or truncate) the file at `path`
    pub fn create(name: impl Into<String>, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;

        Ok(Self {
            name: name.into(),
            path,
            writer: Some(BufWriter::new(file)),
            samples_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sample records persisted so far
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    fn persist_record(&mut self, record: &EncodedRecord) -> Result<(), ContractError> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(ContractError::sink_closed(&self.name));
        };

        writer
            .write_all(record.payload())
            .and_then(|()| writer.flush())
            .map_err(|e| {
                error!(sink = %self.name, seq = record.sequence(), error = %e, "Write failed");
                ContractError::sink_write(&self.name, e.to_string())
            })?;

        if record.is_sample() {
            self.samples_written += 1;
        }
        Ok(())
    }
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, record),
        fields(sink = %self.name, seq = record.sequence())
    )]
    async fn write(&mut self, record: &EncodedRecord) -> Result<(), ContractError> {
        self.persist_record(record)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        match self.writer.as_mut() {
            Some(writer) => writer
                .flush()
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string())),
            None => Ok(()),
        }
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        let Some(mut writer) = self.writer.take() else {
            debug!(sink = %self.name, "FileSink already closed");
            return Ok(());
        };

        writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        info!(
            sink = %self.name,
            path = %self.path.display(),
            samples = self.samples_written,
            "Output file closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::OutputFormat;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_sink_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.csv");

        let mut sink = FileSink::create("file", &path).unwrap();
        sink.write(&EncodedRecord::header(OutputFormat::Csv, "h\n"))
            .await
            .unwrap();
        sink.write(&EncodedRecord::sample(OutputFormat::Csv, 1, "1,0\n"))
            .await
            .unwrap();

        // flushed per record, readable before close
        assert_eq!(fs::read_to_string(&path).unwrap(), "h\n1,0\n");
        assert_eq!(sink.samples_written(), 1);

        sink.close().await.unwrap();
        sink.close().await.unwrap();
        assert!(sink.write(&EncodedRecord::sample(OutputFormat::Csv, 2, "x\n")).await.is_err());
    }

    #[tokio::test]
    async fn test_file_sink_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        fs::write(&path, "stale content\n").unwrap();

        let mut sink = FileSink::create("file", &path).unwrap();
        sink.close().await.unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test]
    async fn test_file_sink_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/run.csv");

        let sink = FileSink::create("file", &path).unwrap();
        assert!(path.exists());
        assert_eq!(sink.destination(), path.display().to_string());
    }

    #[test]
    fn test_file_sink_unwritable_path() {
        let dir = tempdir().unwrap();
        // a directory cannot be opened as a file
        assert!(FileSink::create("file", dir.path()).is_err());
    }
}

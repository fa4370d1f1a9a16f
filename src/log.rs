use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ExperimentError, Result};
use crate::record::{Column, Schema, TrialRecord};
use crate::session::Session;

/// Append-only CSV results log shared by all sessions.
#[derive(Debug, Clone)]
pub struct LogWriter {
    path: PathBuf,
    schema: Schema,
}

impl LogWriter {
    /// Opens (or creates) the log at `path` and assigns the session for this run.
    ///
    /// A new or zero-byte log gets the schema header and session 1. An existing
    /// log must carry exactly the schema header; its last row's session plus one
    /// becomes the new session, or 1 when it holds only the header.
    pub fn open<P: AsRef<Path>>(path: P, schema: Schema) -> Result<(Self, Session)> {
        let writer = Self {
            path: path.as_ref().to_path_buf(),
            schema,
        };

        let session = if is_new(&writer.path) {
            writer.create()?;
            Session::first()
        } else {
            writer.resume()?
        };

        info!(
            path = %writer.path.display(),
            session = session.id,
            "results log ready"
        );
        Ok((writer, session))
    }

    /// The session `open` would assign, without creating or writing anything.
    pub fn peek_session<P: AsRef<Path>>(path: P, schema: &Schema) -> Result<Session> {
        let path = path.as_ref();
        if is_new(path) {
            return Ok(Session::first());
        }
        Self {
            path: path.to_path_buf(),
            schema: schema.clone(),
        }
        .resume()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| ExperimentError::io("creating the log directory", e))?;
            }
        }
        let file = File::create(&self.path)
            .map_err(|e| ExperimentError::io("creating the results log", e))?;
        let mut csv = csv_writer(file);
        csv.write_record(self.schema.header())
            .map_err(|e| ExperimentError::csv("writing the log header", e))?;
        csv.flush()
            .map_err(|e| ExperimentError::io("writing the log header", e))?;
        debug!(path = %self.path.display(), "created results log");
        Ok(())
    }

    fn resume(&self) -> Result<Session> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| ExperimentError::csv("opening the results log", e))?;

        let mut rows = reader.records();
        let header = match rows.next() {
            Some(row) => row.map_err(|e| ExperimentError::csv("reading the log header", e))?,
            None => csv::StringRecord::new(),
        };

        let expected = self.schema.header();
        if header.iter().ne(expected.iter().map(String::as_str)) {
            return Err(ExperimentError::SchemaMismatch {
                expected: expected.join(","),
                found: header.iter().collect::<Vec<_>>().join(","),
            });
        }

        let mut last = None;
        for row in rows {
            last = Some(row.map_err(|e| ExperimentError::csv("reading the results log", e))?);
        }

        let Some(last) = last else {
            return Ok(Session::first());
        };
        let fields: Vec<String> = last.iter().map(str::to_string).collect();
        self.schema.check_width(&fields)?;

        let Some(idx) = self.schema.position(Column::Session) else {
            warn!("log schema has no session column, numbering this run as session 1");
            return Ok(Session::first());
        };
        let value = fields[idx].trim();
        let previous = value
            .parse::<u32>()
            .map_err(|_| ExperimentError::MalformedSession {
                value: value.to_string(),
            })?;
        Ok(Session::after(previous))
    }

    /// Appends one block of records in trial order and syncs the file.
    pub fn append(&self, records: &[TrialRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ExperimentError::io("opening the results log for append", e))?;

        // Rows written by older tools start with a newline instead of ending with one.
        if !ends_with_newline(&mut file)? {
            file.write_all(b"\n")
                .map_err(|e| ExperimentError::io("appending to the results log", e))?;
        }

        let mut csv = csv_writer(&mut file);
        for record in records {
            let fields = self.schema.encode(record);
            csv.write_record(&fields)
                .map_err(|e| ExperimentError::csv("appending to the results log", e))?;
        }
        csv.flush()
            .map_err(|e| ExperimentError::io("flushing the results log", e))?;
        drop(csv);
        file.sync_data()
            .map_err(|e| ExperimentError::io("syncing the results log", e))?;

        debug!(rows = records.len(), "appended records to results log");
        Ok(())
    }

    /// Reads back every data row as encoded fields.
    pub fn read_rows(&self) -> Result<Vec<Vec<String>>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| ExperimentError::csv("opening the results log", e))?;
        let mut rows = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| ExperimentError::csv("reading the results log", e))?;
            rows.push(row.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }
}

fn is_new(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    }
}

fn csv_writer<W: Write>(w: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(w)
}

fn ends_with_newline(file: &mut File) -> Result<bool> {
    let len = file
        .metadata()
        .map_err(|e| ExperimentError::io("inspecting the results log", e))?
        .len();
    if len == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))
        .and_then(|_| file.read_exact(&mut last))
        .map_err(|e| ExperimentError::io("inspecting the results log", e))?;
    Ok(last[0] == b'\n')
}

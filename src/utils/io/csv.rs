//! CSV table operations
//!
//! Tables are read through Arrow's CSV reader with every column typed as
//! `Utf8`, so cells the pipeline does not touch are written back exactly as
//! they were read. Empty cells become nulls and are written back empty.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arrow::csv::reader::Format;
use arrow::csv::{Reader, ReaderBuilder, Writer, WriterBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;

use crate::error::{IoResultExt, PipelineError, Result};
use crate::filter::{BatchFilter, SubjectFilter, SubjectSet};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Batch size used when a table is loaded in full
pub const DEFAULT_BATCH_SIZE: usize = 65_536;

/// A CSV file with its all-string schema
#[derive(Debug, Clone)]
pub struct CsvTable {
    path: PathBuf,
    table: String,
    schema: SchemaRef,
}

impl CsvTable {
    /// Open a CSV file and read its header
    ///
    /// # Errors
    /// Returns `MissingFile` if the path does not exist, or an Arrow error if
    /// the header cannot be read.
    pub fn open(path: &Path, table: &str) -> Result<Self> {
        let file = open_existing(path)?;
        let (inferred, _) = Format::default()
            .with_header(true)
            .infer_schema(BufReader::new(file), Some(0))?;

        let fields = inferred
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect_vec();

        Ok(Self {
            path: path.to_path_buf(),
            table: table.to_string(),
            schema: Arc::new(Schema::new(fields)),
        })
    }

    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Fail unless every named column is present
    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        match columns
            .iter()
            .find(|column| self.schema.index_of(column).is_err())
        {
            Some(missing) => Err(PipelineError::missing_column(&self.table, *missing)),
            None => Ok(()),
        }
    }

    /// Stream the rows in chunks of at most `chunk_size`
    pub fn chunks(&self, chunk_size: usize) -> Result<CsvChunks> {
        let file = open_existing(&self.path)?;
        let reader = ReaderBuilder::new(self.schema.clone())
            .with_header(true)
            .with_batch_size(chunk_size.max(1))
            .build(file)?;
        Ok(CsvChunks { inner: reader })
    }

    /// Load the whole table into a single batch
    pub fn read_all(&self) -> Result<RecordBatch> {
        let start = Instant::now();
        log_operation_start("Reading CSV table", &self.path);

        let batches = self
            .chunks(DEFAULT_BATCH_SIZE)?
            .collect::<Result<Vec<_>>>()?;
        let batch = arrow::compute::concat_batches(&self.schema, &batches)?;

        log_operation_complete(
            "Read",
            &self.path,
            batch.num_rows(),
            Some(start.elapsed()),
        );
        Ok(batch)
    }
}

/// Iterator over the chunks of a `CsvTable`
pub struct CsvChunks {
    inner: Reader<File>,
}

impl Iterator for CsvChunks {
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|chunk| chunk.map_err(PipelineError::from))
    }
}

/// Writes one output table chunk by chunk
///
/// The first chunk creates the file and writes the header, later chunks
/// append rows only, so the output keeps the input order across chunks.
pub struct TableWriter {
    path: PathBuf,
    schema: SchemaRef,
    writer: Writer<BufWriter<File>>,
    rows: usize,
    chunks: usize,
}

impl TableWriter {
    /// Create (or truncate) the output file
    pub fn create(path: &Path, schema: SchemaRef) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_path(parent)?;
        }
        let file = File::create(path).with_path(path)?;
        let writer = WriterBuilder::new()
            .with_header(true)
            .build(BufWriter::new(file));

        Ok(Self {
            path: path.to_path_buf(),
            schema,
            writer,
            rows: 0,
            chunks: 0,
        })
    }

    /// Append a chunk; the header goes out with the first one only
    pub fn write(&mut self, batch: &RecordBatch) -> Result<()> {
        self.writer.write(batch)?;
        self.rows += batch.num_rows();
        self.chunks += 1;
        Ok(())
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush the file and return the number of rows written
    ///
    /// A table that received no rows still gets its header line.
    pub fn finish(mut self) -> Result<usize> {
        if self.chunks == 0 {
            self.writer.write(&RecordBatch::new_empty(self.schema.clone()))?;
        }
        let mut inner = self.writer.into_inner();
        inner.flush().with_path(&self.path)?;
        Ok(self.rows)
    }
}

/// Write a whole table in one go
pub fn write_table(path: &Path, batch: &RecordBatch) -> Result<usize> {
    let mut writer = TableWriter::create(path, batch.schema())?;
    writer.write(batch)?;
    writer.finish()
}

/// Remove the rows of `subjects` from a finalized output table in place
///
/// The table is streamed chunk by chunk into a sibling temporary file which
/// then replaces the original. Returns the number of rows removed.
pub fn rewrite_excluding(
    path: &Path,
    table: &str,
    subjects: &SubjectSet,
    chunk_size: usize,
) -> Result<usize> {
    stage_excluding(path, table, subjects, chunk_size)?.commit()
}

/// A filtered copy of an output table waiting to replace the original
#[derive(Debug)]
pub struct StagedRewrite {
    tmp: PathBuf,
    path: PathBuf,
    rows_removed: usize,
}

impl StagedRewrite {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the original table with the filtered copy
    pub fn commit(self) -> Result<usize> {
        if let Err(e) = fs::rename(&self.tmp, &self.path) {
            let _ = fs::remove_file(&self.tmp);
            return Err(PipelineError::io(&self.path, e));
        }
        Ok(self.rows_removed)
    }

    /// Drop the filtered copy, leaving the original untouched
    pub fn discard(self) {
        let _ = fs::remove_file(&self.tmp);
    }
}

/// Write a copy of `path` without the rows of `subjects` next to it
///
/// The original is not modified until the returned rewrite is committed. On
/// error no temporary file is left behind.
pub fn stage_excluding(
    path: &Path,
    table: &str,
    subjects: &SubjectSet,
    chunk_size: usize,
) -> Result<StagedRewrite> {
    let source = CsvTable::open(path, table)?;
    source.require_columns(&[crate::utils::arrow::SUBJECT_ID])?;

    let tmp = temporary_sibling(path);
    let result = (|| -> Result<usize> {
        let filter = SubjectFilter::exclude(subjects, table);
        let mut writer = TableWriter::create(&tmp, source.schema())?;
        let mut removed = 0;
        for chunk in source.chunks(chunk_size)? {
            let chunk = chunk?;
            let kept = filter.filter(&chunk)?;
            removed += chunk.num_rows() - kept.num_rows();
            writer.write(&kept)?;
        }
        writer.finish()?;
        Ok(removed)
    })();

    match result {
        Ok(rows_removed) => Ok(StagedRewrite {
            tmp,
            path: path.to_path_buf(),
            rows_removed,
        }),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

/// Persist a subject set as a sorted JSON array of integers
pub fn write_subject_ids(path: &Path, subjects: &SubjectSet) -> Result<()> {
    let sorted = subjects.iter().copied().sorted_unstable().collect_vec();
    let file = File::create(path).with_path(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &sorted)?;
    writer.flush().with_path(path)?;
    Ok(())
}

/// Read a subject set written by `write_subject_ids`
pub fn read_subject_ids(path: &Path) -> Result<SubjectSet> {
    let file = open_existing(path)?;
    let ids: Vec<i64> = serde_json::from_reader(BufReader::new(file))?;
    Ok(ids.into_iter().collect())
}

fn open_existing(path: &Path) -> Result<File> {
    if !path.is_file() {
        return Err(PipelineError::MissingFile(path.to_path_buf()));
    }
    File::open(path).with_path(path)
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

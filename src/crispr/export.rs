use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use arrow_array::{ArrayRef, RecordBatch, StringArray, UInt64Array};
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::errors::ParquetError;
use serde::Serialize;

use crate::crispr::array::RepeatArray;
use crate::crispr::data::DnaSequence;

const RULE: &str =
    "---------------------------------------------------------------------------------------------";

/// One repeat of one array, flattened for tabular output. Spacer fields are
/// empty on the last repeat of an array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RepeatRecord {
    pub sequence: String,
    pub array: usize,
    pub repeat_index: usize,
    pub repeat_start: usize,
    pub repeat_end: usize,
    pub repeat: String,
    pub spacer_start: Option<usize>,
    pub spacer_end: Option<usize>,
    pub spacer: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ArrayReport {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub repeat_length: usize,
    pub num_repeats: usize,
    pub average_spacer_length: usize,
    pub repeats: Vec<RepeatRecord>,
}

impl ArrayReport {
    pub fn from_array(index: usize, array: &RepeatArray<'_>) -> Self {
        let name = array.sequence().name().to_string();
        let repeats = (0..array.num_repeats())
            .map(|i| {
                let repeat_start = array.repeat_position(i);
                let has_spacer = i < array.num_spacers();
                RepeatRecord {
                    sequence: name.clone(),
                    array: index,
                    repeat_index: i,
                    repeat_start,
                    repeat_end: repeat_start + array.repeat_length(),
                    repeat: String::from_utf8_lossy(array.repeat(i)).into_owned(),
                    spacer_start: has_spacer.then(|| array.spacer_start(i)),
                    spacer_end: has_spacer.then(|| array.repeat_position(i + 1)),
                    spacer: has_spacer
                        .then(|| String::from_utf8_lossy(array.spacer(i)).into_owned()),
                }
            })
            .collect();
        Self {
            index,
            start: array.start_index(),
            end: array.end_index(),
            repeat_length: array.repeat_length(),
            num_repeats: array.num_repeats(),
            average_spacer_length: array.average_spacer_length(),
            repeats,
        }
    }
}

/// Everything found in one sequence, detached from the sequence buffer.
#[derive(Clone, Debug, Serialize)]
pub struct SequenceReport {
    pub header: String,
    pub name: String,
    pub length: usize,
    pub arrays: Vec<ArrayReport>,
}

impl SequenceReport {
    pub fn new(sequence: &DnaSequence, arrays: &[RepeatArray<'_>]) -> Self {
        Self {
            header: sequence.header().to_string(),
            name: sequence.name().to_string(),
            length: sequence.len(),
            arrays: arrays
                .iter()
                .enumerate()
                .map(|(index, array)| ArrayReport::from_array(index, array))
                .collect(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &RepeatRecord> {
        self.arrays.iter().flat_map(|array| array.repeats.iter())
    }

    /// Human-readable listing: one block per array with a repeat/spacer table.
    pub fn render_text(&self) -> String {
        let mut out = format!("ORGANISM: {}\n", self.header);
        for array in &self.arrays {
            out.push_str(&format!("CRISPR {}\n", array.index));
            out.push_str(&format!("Range: {}-{}\n", array.start, array.end));
            out.push_str(RULE);
            out.push('\n');
            out.push_str("POSITION\tREPEAT\tPOSITION\tSPACER\n");
            for repeat in &array.repeats {
                match (repeat.spacer_start, repeat.spacer.as_deref()) {
                    (Some(spacer_start), Some(spacer)) => out.push_str(&format!(
                        "{}\t{}\t{}\t{}\n",
                        repeat.repeat_start, repeat.repeat, spacer_start, spacer
                    )),
                    _ => out.push_str(&format!("{}\t{}\n", repeat.repeat_start, repeat.repeat)),
                }
            }
            out.push_str(RULE);
            out.push('\n');
            out.push_str(&format!(
                "Repeats: {}\tAverage Repeat Length: {}\tAverage Spacer Length: {}\n\n",
                array.num_repeats, array.repeat_length, array.average_spacer_length
            ));
        }
        out
    }
}

pub fn render_text_report(sequence: &DnaSequence, arrays: &[RepeatArray<'_>]) -> String {
    SequenceReport::new(sequence, arrays).render_text()
}

pub fn write_csv_records<'r, W, I>(records: I, writer: W) -> Result<(), ExportError>
where
    W: Write,
    I: IntoIterator<Item = &'r RepeatRecord>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn render_csv_results(arrays: &[RepeatArray<'_>]) -> Result<String, ExportError> {
    let records: Vec<RepeatRecord> = arrays
        .iter()
        .enumerate()
        .flat_map(|(index, array)| ArrayReport::from_array(index, array).repeats)
        .collect();
    let mut buffer = Vec::new();
    write_csv_records(&records, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn write_json_reports<W: Write>(
    reports: &[SequenceReport],
    mut writer: W,
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, reports)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn render_json_results(
    sequence: &DnaSequence,
    arrays: &[RepeatArray<'_>],
) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&SequenceReport::new(
        sequence, arrays,
    ))?)
}

#[derive(Debug)]
pub enum ExportError {
    Io(io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Arrow(arrow_schema::ArrowError),
    Parquet(ParquetError),
}

impl From<io::Error> for ExportError {
    fn from(value: io::Error) -> Self {
        ExportError::Io(value)
    }
}

impl From<csv::Error> for ExportError {
    fn from(value: csv::Error) -> Self {
        ExportError::Csv(value)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        ExportError::Json(value)
    }
}

impl From<arrow_schema::ArrowError> for ExportError {
    fn from(value: arrow_schema::ArrowError) -> Self {
        ExportError::Arrow(value)
    }
}

impl From<ParquetError> for ExportError {
    fn from(value: ParquetError) -> Self {
        ExportError::Parquet(value)
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(err) => write!(f, "io error: {err}"),
            ExportError::Csv(err) => write!(f, "csv error: {err}"),
            ExportError::Json(err) => write!(f, "json error: {err}"),
            ExportError::Arrow(err) => write!(f, "arrow error: {err}"),
            ExportError::Parquet(err) => write!(f, "parquet error: {err}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(err) => Some(err),
            ExportError::Csv(err) => Some(err),
            ExportError::Json(err) => Some(err),
            ExportError::Arrow(err) => Some(err),
            ExportError::Parquet(err) => Some(err),
        }
    }
}

pub fn write_parquet_records<W: Write + Send>(
    records: &[&RepeatRecord],
    writer: W,
) -> Result<(), ExportError> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("sequence", DataType::Utf8, false),
        Field::new("array", DataType::UInt64, false),
        Field::new("repeat_index", DataType::UInt64, false),
        Field::new("repeat_start", DataType::UInt64, false),
        Field::new("repeat_end", DataType::UInt64, false),
        Field::new("repeat", DataType::Utf8, false),
        Field::new("spacer_start", DataType::UInt64, true),
        Field::new("spacer_end", DataType::UInt64, true),
        Field::new("spacer", DataType::Utf8, true),
    ]));

    let sequences: Vec<&str> = records.iter().map(|r| r.sequence.as_str()).collect();
    let arrays: Vec<u64> = records.iter().map(|r| r.array as u64).collect();
    let indices: Vec<u64> = records.iter().map(|r| r.repeat_index as u64).collect();
    let starts: Vec<u64> = records.iter().map(|r| r.repeat_start as u64).collect();
    let ends: Vec<u64> = records.iter().map(|r| r.repeat_end as u64).collect();
    let repeats: Vec<&str> = records.iter().map(|r| r.repeat.as_str()).collect();
    let spacer_starts: Vec<Option<u64>> = records
        .iter()
        .map(|r| r.spacer_start.map(|v| v as u64))
        .collect();
    let spacer_ends: Vec<Option<u64>> = records
        .iter()
        .map(|r| r.spacer_end.map(|v| v as u64))
        .collect();
    let spacers: Vec<Option<&str>> = records.iter().map(|r| r.spacer.as_deref()).collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(sequences)),
        Arc::new(UInt64Array::from(arrays)),
        Arc::new(UInt64Array::from(indices)),
        Arc::new(UInt64Array::from(starts)),
        Arc::new(UInt64Array::from(ends)),
        Arc::new(StringArray::from(repeats)),
        Arc::new(UInt64Array::from(spacer_starts)),
        Arc::new(UInt64Array::from(spacer_ends)),
        Arc::new(StringArray::from(spacers)),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    let mut arrow_writer = ArrowWriter::try_new(writer, schema, None)?;
    arrow_writer.write(&batch)?;
    arrow_writer.close()?;
    Ok(())
}

pub fn write_parquet_results<W: Write + Send>(
    sequence: &DnaSequence,
    arrays: &[RepeatArray<'_>],
    writer: W,
) -> Result<(), ExportError> {
    let report = SequenceReport::new(sequence, arrays);
    let records: Vec<&RepeatRecord> = report.records().collect();
    write_parquet_records(&records, writer)
}

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Value the annotation file uses for an empty field.
pub const ABSENT: &str = "-";

/// Header names every annotation file must carry. The taxon column is
/// checked separately since it may be spelled with or without a `#`.
const REQUIRED_COLUMNS: &[&str] = &[
    "GeneID",
    "Symbol",
    "LocusTag",
    "Synonyms",
    "dbXrefs",
    "Symbol_from_nomenclature_authority",
    "Full_name_from_nomenclature_authority",
    "Other_designations",
];

const TAXON_COLUMNS: &[&str] = &["#tax_id", "tax_id"];

/// Opens an input file, decoding it on the fly when the name ends in `.gz`.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let gzipped = path.extension().map(|ext| ext == "gz").unwrap_or(false);

    let reader: Box<dyn BufRead> = if gzipped {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

fn tsv_reader<R: Read>(reader: R, has_headers: bool) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .delimiter(b'\t')
        .quoting(false)
        .flexible(!has_headers)
        .from_reader(reader)
}

fn absent_sentinel<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<Option<String>, D::Error> {
    let value = String::deserialize(de)?;
    if value.is_empty() || value == ABSENT {
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

/// One row of the NCBI `gene_info` annotation file.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Deserialize)]
pub struct GeneInfoRecord {
    #[serde(rename = "#tax_id", alias = "tax_id")]
    pub taxon_id: u32,
    #[serde(rename = "GeneID")]
    pub gene_id: u64,
    #[serde(rename = "Symbol", deserialize_with = "absent_sentinel")]
    pub symbol: Option<String>,
    #[serde(rename = "LocusTag", deserialize_with = "absent_sentinel")]
    pub locus_tag: Option<String>,
    #[serde(rename = "Synonyms", deserialize_with = "absent_sentinel")]
    pub synonyms: Option<String>,
    #[serde(rename = "dbXrefs", deserialize_with = "absent_sentinel")]
    pub db_xrefs: Option<String>,
    #[serde(rename = "Symbol_from_nomenclature_authority", deserialize_with = "absent_sentinel")]
    pub authority_symbol: Option<String>,
    #[serde(rename = "Full_name_from_nomenclature_authority", deserialize_with = "absent_sentinel")]
    pub authority_full_name: Option<String>,
    #[serde(rename = "Other_designations", deserialize_with = "absent_sentinel")]
    pub other_designations: Option<String>,
}

impl GeneInfoRecord {
    pub fn parse_from<R: Read>(reader: R) -> Result<Vec<Self>> {
        GeneInfoReader::new(reader)?.collect()
    }
}

/// Streams [`GeneInfoRecord`]s out of a tab-separated annotation file.
///
/// Every malformed row is an error. A row with the wrong number of
/// columns or a non-numeric taxon or gene id means the reference data is
/// corrupt, and the caller is expected to stop.
pub struct GeneInfoReader<R> {
    records: csv::DeserializeRecordsIntoIter<R, GeneInfoRecord>,
}

impl<R: Read> GeneInfoReader<R> {
    pub fn new(reader: R) -> Result<GeneInfoReader<R>> {
        let mut csv_reader = tsv_reader(reader, true);
        let headers = csv_reader.headers()?;

        if !headers.iter().any(|header| TAXON_COLUMNS.contains(&header)) {
            return Err(Error::MissingColumn(TAXON_COLUMNS[0].to_string()));
        }
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|header| header == *column) {
                return Err(Error::MissingColumn(column.to_string()));
            }
        }

        Ok(GeneInfoReader { records: csv_reader.into_deserialize() })
    }
}

impl<R: Read> Iterator for GeneInfoReader<R> {
    type Item = Result<GeneInfoRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next().map(|record| record.map_err(annotation_error))
    }
}

fn annotation_error(err: csv::Error) -> Error {
    let line = Error::csv_line(&err);
    match err.kind() {
        csv::ErrorKind::UnequalLengths { .. }
        | csv::ErrorKind::Deserialize { .. }
        | csv::ErrorKind::Utf8 { .. } => Error::MalformedAnnotation { line, reason: err.to_string() },
        _ => Error::Csv(err),
    }
}

/// The five columns of a Panther ortholog pair row.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct OrthologRow {
    pub gene: String,
    pub ortholog: String,
    pub ortholog_type: String,
    pub common_ancestor: String,
    pub family_id: String,
}

impl OrthologRow {
    pub const COLUMNS: usize = 5;

    pub fn from_record(record: &csv::StringRecord) -> Option<OrthologRow> {
        if record.len() != Self::COLUMNS {
            return None;
        }
        Some(OrthologRow {
            gene: record[0].to_string(),
            ortholog: record[1].to_string(),
            ortholog_type: record[2].to_string(),
            common_ancestor: record[3].to_string(),
            family_id: record[4].to_string(),
        })
    }
}

/// A line from the ortholog file, either a usable row or one that was
/// structurally broken.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum OrthologLine {
    Row(OrthologRow),
    Malformed { line: u64, reason: String },
}

/// Streams rows from the headerless ortholog pair file.
///
/// Broken rows come back as [`OrthologLine::Malformed`] so the caller can
/// count them and move on; only IO failures end the stream with an error.
pub struct OrthologReader<R> {
    reader: csv::Reader<R>,
    record: csv::StringRecord,
}

impl<R: Read> OrthologReader<R> {
    pub fn new(reader: R) -> OrthologReader<R> {
        OrthologReader {
            reader: tsv_reader(reader, false),
            record: csv::StringRecord::new(),
        }
    }
}

impl<R: Read> Iterator for OrthologReader<R> {
    type Item = Result<OrthologLine>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                let line = self.record.position().map(|pos| pos.line()).unwrap_or(0);
                let parsed = match OrthologRow::from_record(&self.record) {
                    Some(row) => OrthologLine::Row(row),
                    None => OrthologLine::Malformed {
                        line,
                        reason: format!("expected {} columns, found {}", OrthologRow::COLUMNS, self.record.len()),
                    },
                };
                Some(Ok(parsed))
            }
            Err(err) => match err.kind() {
                csv::ErrorKind::Utf8 { .. } => Some(Ok(OrthologLine::Malformed {
                    line: Error::csv_line(&err),
                    reason: err.to_string(),
                })),
                _ => Some(Err(Error::Csv(err))),
            },
        }
    }
}

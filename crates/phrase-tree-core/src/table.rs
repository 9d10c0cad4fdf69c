//! CSV input and output for phrase tables.
//!
//! # Input
//!
//! A header row is required. Headers are matched case-insensitively:
//!
//! | Column      | Alternate    | Required | Notes                               |
//! |-------------|--------------|----------|-------------------------------------|
//! | `phrase`    |              | yes      | rows with an empty cell are dropped |
//! | `freq`      | `doc_count`  | yes      |                                     |
//! | `length`    | `word_count` | no       | defaults to the phrase's word count |
//! | `score`     |              | no       | overrides the computed score        |
//!
//! `id`, `parent_id` and `level` are ignored on input so an enriched table
//! can be fed back in. Every other column is carried through to the output.
//!
//! # Output
//!
//! `phrase, length, freq[, score], <extra columns>, id, parent_id, level`,
//! one row per phrase in id order. Roots have an empty `parent_id`.

use std::io::{BufWriter, Write};

use camino::Utf8Path;

use crate::corpus::{Corpus, RawPhrase};
use crate::error::{TableError, TableResult};
use crate::normalize::words;

/// Columns produced by linking; skipped when reading.
const DERIVED_COLUMNS: &[&str] = &["id", "parent_id", "level"];

/// Sanitized rows read from a CSV file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhraseTable {
    /// Headers of pass-through columns, in input order.
    pub extra_columns: Vec<String>,
    /// Rows that survived sanitization.
    pub rows: Vec<RawPhrase>,
    /// Rows dropped for missing or malformed cells.
    pub dropped: usize,
}

impl PhraseTable {
    /// Keep only rows with `length >= min_length` and `freq >= min_frequency`.
    ///
    /// Returns how many rows were removed.
    pub fn retain_min(&mut self, min_length: usize, min_frequency: u64) -> usize {
        let before = self.rows.len();
        self.rows
            .retain(|r| r.length >= min_length && r.frequency >= min_frequency);
        before - self.rows.len()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows survived.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug)]
struct Columns {
    phrase: usize,
    freq: usize,
    length: Option<usize>,
    score: Option<usize>,
    extra: Vec<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> TableResult<Self> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |name: &str| names.iter().position(|n| n == name);

        let phrase = find("phrase").ok_or(TableError::MissingColumn { name: "phrase" })?;
        let freq = find("freq")
            .or_else(|| find("doc_count"))
            .ok_or(TableError::MissingColumn { name: "freq" })?;
        let length = find("length").or_else(|| find("word_count"));
        let score = find("score");

        let used = [Some(phrase), Some(freq), length, score];
        let extra = (0..names.len())
            .filter(|i| !used.contains(&Some(*i)))
            .filter(|i| !DERIVED_COLUMNS.contains(&names[*i].as_str()))
            .collect();

        Ok(Self {
            phrase,
            freq,
            length,
            score,
            extra,
        })
    }
}

/// Read a phrase table from a CSV file.
///
/// Bytes that are not valid UTF-8 are decoded as Latin-1.
#[tracing::instrument(skip_all, fields(path = %path))]
pub fn read_csv(path: &Utf8Path) -> TableResult<PhraseTable> {
    let bytes = std::fs::read(path.as_std_path()).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(%path, "input is not valid UTF-8; decoding as Latin-1");
            e.into_bytes().into_iter().map(char::from).collect()
        }
    };
    parse_csv(&text)
}

/// Parse a phrase table from CSV text.
pub fn parse_csv(text: &str) -> TableResult<PhraseTable> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = Columns::resolve(&headers)?;
    if columns.length.is_none() {
        tracing::debug!("no length column; using word counts");
    }

    let mut table = PhraseTable {
        extra_columns: columns
            .extra
            .iter()
            .map(|&i| headers[i].trim().to_string())
            .collect(),
        ..PhraseTable::default()
    };

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        match parse_row(&record, &columns) {
            Ok(row) => table.rows.push(row),
            Err(reason) => {
                // +2: one for the header, one for 1-based numbering.
                tracing::debug!(row = line + 2, reason, "dropping row");
                table.dropped += 1;
            }
        }
    }

    if table.dropped > 0 {
        tracing::warn!(dropped = table.dropped, "dropped rows with missing or malformed cells");
    }
    tracing::info!(rows = table.rows.len(), "phrase table read");
    Ok(table)
}

fn parse_row(record: &csv::StringRecord, columns: &Columns) -> Result<RawPhrase, &'static str> {
    let cell = |i: usize| record.get(i).map(str::trim).unwrap_or_default();

    let text = cell(columns.phrase);
    if text.is_empty() {
        return Err("missing phrase");
    }
    let frequency = parse_count(cell(columns.freq)).ok_or("invalid freq")?;
    let length = match columns.length {
        Some(i) => parse_count(cell(i))
            .and_then(|n| usize::try_from(n).ok())
            .ok_or("invalid length")?,
        None => words(text).len(),
    };
    let score = match columns.score.map(cell) {
        None | Some("") => None,
        Some(s) => Some(s.parse::<f64>().map_err(|_| "invalid score")?),
    };

    Ok(RawPhrase {
        text: text.to_string(),
        length,
        frequency,
        score,
        extra: columns.extra.iter().map(|&i| cell(i).to_string()).collect(),
    })
}

/// Parse a non-negative integer, accepting integral floats such as `3.0`.
fn parse_count(cell: &str) -> Option<u64> {
    if let Ok(n) = cell.parse::<u64>() {
        return Some(n);
    }
    let f = cell.parse::<f64>().ok()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then(|| f as u64)
}

/// Write the enriched table to a CSV file.
#[tracing::instrument(skip_all, fields(path = %path, rows = corpus.len()))]
pub fn write_csv(path: &Utf8Path, corpus: &Corpus) -> TableResult<()> {
    let io_err = |source| TableError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::create(path.as_std_path()).map_err(io_err)?;
    let mut out = BufWriter::new(file);
    write_csv_to(&mut out, corpus)?;
    out.flush().map_err(io_err)
}

/// Write the enriched table to any writer.
pub fn write_csv_to<W: Write>(writer: W, corpus: &Corpus) -> TableResult<()> {
    let with_score = corpus.has_scores();
    let mut csv = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = vec!["phrase", "length", "freq"];
    if with_score {
        header.push("score");
    }
    header.extend(corpus.extra_columns().iter().map(String::as_str));
    header.extend(DERIVED_COLUMNS);
    csv.write_record(&header)?;

    for phrase in corpus.phrases() {
        let mut record = vec![
            phrase.text().to_string(),
            phrase.length().to_string(),
            phrase.frequency().to_string(),
        ];
        if with_score {
            record.push(phrase.score().map(|s| s.to_string()).unwrap_or_default());
        }
        record.extend(phrase.extra().iter().cloned());
        record.push(phrase.id().to_string());
        record.push(
            phrase
                .parent_id()
                .map(|p| p.to_string())
                .unwrap_or_default(),
        );
        record.push(phrase.level().to_string());
        csv.write_record(&record)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

//! Typed records for every persisted line format.
//!
//! All records are written as tab-separated lines. Floating point fields use Rust's
//! shortest round-trip formatting, so a value read back parses to the identical `f64`.
//! Parsing is lenient about surrounding whitespace and strict about everything else:
//! a line with the wrong number of fields or an unparseable number yields `None`, and
//! the consuming stage skips it.

use std::str::FromStr;

/// A record that can be written to and read from one output line.
pub trait Record: Sized {
    /// Formats the record as a single line without trailing newline.
    fn to_line(&self) -> String;

    /// Parses a line, returning `None` if it is malformed.
    fn parse_line(line: &str) -> Option<Self>;
}

/// Splits a trimmed line into exactly `N` tab-separated fields.
fn fields<const N: usize>(line: &str) -> Option<[&str; N]> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let parts: Vec<&str> = line.split('\t').collect();
    parts.try_into().ok()
}

/// Parses a non-empty text field.
fn text(field: &str) -> Option<String> {
    (!field.is_empty()).then(|| field.to_string())
}

/// Parses an integer field.
fn integer<T: FromStr>(field: &str) -> Option<T> {
    field.parse().ok()
}

/// Parses a finite floating point field.
fn float(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Raw count `f(t,d)` of a term in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermCount {
    /// The term.
    pub term: String,
    /// The document id.
    pub document: String,
    /// Occurrences of the term in the document.
    pub count: u64,
}

impl Record for TermCount {
    fn to_line(&self) -> String {
        format!("{}\t{}\t{}", self.term, self.document, self.count)
    }

    fn parse_line(line: &str) -> Option<Self> {
        let [term, document, count] = fields(line)?;
        Some(Self {
            term: text(term)?,
            document: text(document)?,
            count: integer(count)?,
        })
    }
}

/// Total filtered-term occurrences `L(d)` of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTotal {
    /// The document id.
    pub document: String,
    /// Number of terms in the document after filtering.
    pub total: u64,
}

impl Record for DocTotal {
    fn to_line(&self) -> String {
        format!("{}\t{}", self.document, self.total)
    }

    fn parse_line(line: &str) -> Option<Self> {
        let [document, total] = fields(line)?;
        Some(Self {
            document: text(document)?,
            total: integer(total)?,
        })
    }
}

/// Term frequency `TF(t,d) = f(t,d) / L(d)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TermFrequency {
    /// The term.
    pub term: String,
    /// The document id.
    pub document: String,
    /// The term frequency, in `(0, 1]`.
    pub tf: f64,
}

impl Record for TermFrequency {
    fn to_line(&self) -> String {
        format!("{}\t{}\t{}", self.term, self.document, self.tf)
    }

    fn parse_line(line: &str) -> Option<Self> {
        let [term, document, tf] = fields(line)?;
        Some(Self {
            term: text(term)?,
            document: text(document)?,
            tf: float(tf)?,
        })
    }
}

/// Inverse document frequency `IDF(t) = ln(D / sum_d TF(t,d))`.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseDocFrequency {
    /// The term.
    pub term: String,
    /// The inverse document frequency.
    pub idf: f64,
}

impl Record for InverseDocFrequency {
    fn to_line(&self) -> String {
        format!("{}\t{}", self.term, self.idf)
    }

    fn parse_line(line: &str) -> Option<Self> {
        let [term, idf] = fields(line)?;
        Some(Self {
            term: text(term)?,
            idf: float(idf)?,
        })
    }
}

/// Fused score `TF(t,d) * IDF(t)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TfIdf {
    /// The document id.
    pub document: String,
    /// The term.
    pub term: String,
    /// The TF-IDF score.
    pub tfidf: f64,
}

impl Record for TfIdf {
    fn to_line(&self) -> String {
        format!("{}\t{}\t{}", self.document, self.term, self.tfidf)
    }

    fn parse_line(line: &str) -> Option<Self> {
        let [document, term, tfidf] = fields(line)?;
        Some(Self {
            document: text(document)?,
            term: text(term)?,
            tfidf: float(tfidf)?,
        })
    }
}

/// One row of a document's top-N ranking by raw frequency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopNEntry {
    /// The document id.
    pub document: String,
    /// 1-based rank within the document.
    pub rank: usize,
    /// The term.
    pub term: String,
    /// Raw frequency `f(t,d)`.
    pub frequency: u64,
}

impl Record for TopNEntry {
    fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.document, self.rank, self.term, self.frequency
        )
    }

    fn parse_line(line: &str) -> Option<Self> {
        let [document, rank, term, frequency] = fields(line)?;
        Some(Self {
            document: text(document)?,
            rank: integer(rank)?,
            term: text(term)?,
            frequency: integer(frequency)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_count_line_format() {
        let record = TermCount {
            term: "cat".into(),
            document: "doc1".into(),
            count: 2,
        };
        assert_eq!(record.to_line(), "cat\tdoc1\t2");
        assert_eq!(TermCount::parse_line("cat\tdoc1\t2\n"), Some(record));
    }

    #[test]
    fn field_count_must_match() {
        assert!(TermCount::parse_line("doc1\t3").is_none());
        assert!(DocTotal::parse_line("cat\tdoc1\t2").is_none());
        assert!(TopNEntry::parse_line("doc1\t1\tcat").is_none());
        assert!(InverseDocFrequency::parse_line("").is_none());
        assert!(InverseDocFrequency::parse_line("   ").is_none());
    }

    #[test]
    fn numbers_must_parse() {
        assert!(TermCount::parse_line("cat\tdoc1\tmany").is_none());
        assert!(TermCount::parse_line("cat\tdoc1\t-1").is_none());
        assert!(TermFrequency::parse_line("cat\tdoc1\tNaN").is_none());
        assert!(InverseDocFrequency::parse_line("cat\tinf").is_none());
    }

    #[test]
    fn empty_text_fields_are_malformed() {
        assert!(DocTotal::parse_line("\t3").is_none());
        assert!(TfIdf::parse_line("doc1\t\t0.5").is_none());
    }

    #[test]
    fn floats_round_trip_exactly() {
        let tf = 1.0 / 3.0;
        let record = TermFrequency {
            term: "cat".into(),
            document: "doc1".into(),
            tf,
        };
        let parsed = TermFrequency::parse_line(&record.to_line()).unwrap();
        assert_eq!(parsed.tf.to_bits(), tf.to_bits());
        assert_eq!(record.to_line(), "cat\tdoc1\t0.3333333333333333");
    }

    #[test]
    fn tfidf_orders_document_first() {
        let record = TfIdf {
            document: "doc1".into(),
            term: "cat".into(),
            tfidf: 0.5,
        };
        assert_eq!(record.to_line(), "doc1\tcat\t0.5");
    }

    #[test]
    fn top_n_entry_line_format() {
        let line = "doc1\t1\tcat\t4";
        let entry = TopNEntry::parse_line(line).unwrap();
        assert_eq!(entry.rank, 1);
        assert_eq!(entry.frequency, 4);
        assert_eq!(entry.to_line(), line);
    }
}

use std::fs::File;
use std::io;

use bio::io::fasta;
use bstr::{BStr, BString, ByteSlice};
use fnv::FnvHashMap;
use tracing::debug;

use crate::parser::error::{ParseError, ParseResult};

/// Contig name to sequence map, remembering insertion order.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct SequenceStore {
    index: FnvHashMap<BString, usize>,
    records: Vec<(BString, BString)>,
}

impl SequenceStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Insert a sequence, returning the previous one if the name was
    /// already present. A replaced record keeps its original position.
    pub fn insert<N, S>(&mut self, name: N, sequence: S) -> Option<BString>
    where
        N: AsRef<[u8]>,
        S: Into<BString>,
    {
        let name = name.as_ref();
        let sequence = sequence.into();
        if let Some(&ix) = self.index.get(name.as_bstr()) {
            Some(std::mem::replace(&mut self.records[ix].1, sequence))
        } else {
            self.index.insert(BString::from(name), self.records.len());
            self.records.push((BString::from(name), sequence));
            None
        }
    }

    pub fn get<N: AsRef<[u8]>>(&self, name: N) -> Option<&BStr> {
        self.index
            .get(name.as_ref().as_bstr())
            .map(|&ix| self.records[ix].1.as_bstr())
    }

    pub fn contains<N: AsRef<[u8]>>(&self, name: N) -> bool {
        self.index.contains_key(name.as_ref().as_bstr())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over `(name, sequence)` in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&'_ BStr, &'_ BStr)> + '_ {
        self.records
            .iter()
            .map(|(name, seq)| (name.as_bstr(), seq.as_bstr()))
    }

    pub fn names(&self) -> impl Iterator<Item = &'_ BStr> + '_ {
        self.records.iter().map(|(name, _)| name.as_bstr())
    }

    pub fn lengths(&self) -> Vec<usize> {
        self.records.iter().map(|(_, seq)| seq.len()).collect()
    }

    /// Read a FASTA stream. The record name is the first
    /// whitespace-delimited token of the header; sequence lines are
    /// concatenated.
    ///
    /// Data before the first header, a header without a name, a
    /// record without sequence and a repeated name are all
    /// `ParseError::Fasta`.
    pub fn from_fasta_reader<R: io::Read>(reader: R) -> ParseResult<Self> {
        let mut store = SequenceStore::new();

        for record in fasta::Reader::new(reader).records() {
            let record = record.map_err(fasta_error)?;
            store.push_record(&record)?;
        }

        debug!("Read {} sequences", store.len());
        Ok(store)
    }

    fn push_record(&mut self, record: &fasta::Record) -> ParseResult<()> {
        let name = record.id();
        if name.is_empty() {
            return Err(ParseError::Fasta(
                "record header has no name".to_string(),
            ));
        }
        if record.seq().is_empty() {
            return Err(ParseError::Fasta(format!(
                "record `{}` has no sequence",
                name
            )));
        }
        if self.insert(name, record.seq()).is_some() {
            return Err(ParseError::Fasta(format!(
                "duplicate record `{}`",
                name
            )));
        }
        Ok(())
    }

    pub fn from_fasta_file<P: AsRef<std::path::Path>>(
        path: P,
    ) -> ParseResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_fasta_reader(file)
    }
}

/// The FASTA reader reports malformed input as `Other` (a line that
/// should be a header) or `InvalidData` (not UTF-8); anything else is a
/// real I/O failure.
fn fasta_error(err: io::Error) -> ParseError {
    match err.kind() {
        io::ErrorKind::Other | io::ErrorKind::InvalidData => {
            ParseError::Fasta(err.to_string())
        }
        _ => ParseError::IOError(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn insert_and_lookup() {
        let mut store = SequenceStore::new();
        assert!(store.insert("b", "ACGT").is_none());
        assert!(store.insert("a", "GG").is_none());
        assert_eq!(store.insert("b", "TTTT"), Some(BString::from("ACGT")));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("b"), Some("TTTT".into()));
        assert!(store.contains("a"));
        assert!(!store.contains("c"));
        assert_eq!(store.lengths(), vec![4, 2]);

        let names: Vec<_> = store.names().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn parse_fasta() {
        let fasta = b">ctg1 length=12 cov=3.0\nACGTAC\nGTACGT\n\n>ctg2\r\nTTGA\r\n";
        let store = SequenceStore::from_fasta_reader(&fasta[..]).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("ctg1"), Some("ACGTACGTACGT".into()));
        assert_eq!(store.get("ctg2"), Some("TTGA".into()));
    }

    #[test]
    fn malformed_fasta() {
        let orphan = b"ACGT\n>ctg1\nACGT\n";
        assert!(matches!(
            SequenceStore::from_fasta_reader(&orphan[..]),
            Err(ParseError::Fasta(_))
        ));

        let duplicate = b">ctg1\nACGT\n>ctg1\nTT\n";
        assert!(matches!(
            SequenceStore::from_fasta_reader(&duplicate[..]),
            Err(ParseError::Fasta(_))
        ));

        let empty = b">ctg1\n>ctg2\nACGT\n";
        assert!(matches!(
            SequenceStore::from_fasta_reader(&empty[..]),
            Err(ParseError::Fasta(_))
        ));

        let unnamed = b">\nACGT\n";
        assert!(matches!(
            SequenceStore::from_fasta_reader(&unnamed[..]),
            Err(ParseError::Fasta(_))
        ));
    }

    #[test]
    fn fasta_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, ">x\nAAAA\n>y\nCCCCCC").unwrap();

        let store = SequenceStore::from_fasta_file(file.path()).unwrap();
        assert_eq!(store.lengths(), vec![4, 6]);
    }
}

pub mod error;

use std::fs::File;
use std::io::{BufRead, BufReader};

use bstr::io::BufReadExt;
use bstr::{BString, ByteSlice};
use lazy_static::lazy_static;
use nom::IResult;
use regex::bytes::Regex;
use tracing::{debug, warn};

pub use self::error::*;

use crate::graph::{OverlapGraph, OverlapInfo};

/// Settings for loading the overlap graph and the contig sequences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    pub tolerance: ParserTolerance,
    /// Add every contig of the sequence store that the graph doesn't
    /// mention as an isolated vertex
    pub include_unlinked: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        LoadConfig {
            tolerance: ParserTolerance::Safe,
            include_unlinked: true,
        }
    }
}

/// A parsed line of the overlap graph format
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// `V <name>`
    Vertex(BString),
    /// `E <from> <to> <descriptor>`
    Edge {
        from: BString,
        to: BString,
        info: OverlapInfo,
    },
}

/// Parser for the tab-separated overlap graph format:
///
/// ```text
/// # comment
/// V	ctg3
/// E	ctg1	ctg2	dovetail,20,1,0,100,80,99,80,0,19
/// ```
///
/// The edge descriptor lists overlap type, overlap length, mismatches,
/// edits, from length, overlap start and end on from, to length,
/// overlap start and end on to.
#[derive(Debug, Clone, Default)]
pub struct OverlapGraphParser {
    tolerance: ParserTolerance,
}

impl OverlapGraphParser {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_tolerance(tolerance: ParserTolerance) -> Self {
        OverlapGraphParser { tolerance }
    }

    pub fn tolerance(&self) -> ParserTolerance {
        self.tolerance
    }

    /// Parse a single line. `line_no` is only used in error messages.
    pub fn parse_line(&self, line: &[u8], line_no: usize) -> ParseResult<Line> {
        let line = line.trim_end_with(|c| c == '\r' || c == '\n');
        if line.is_empty() || line.starts_with(b"#") {
            return Err(ParseError::EmptyLine);
        }

        let mut fields = line.split_str(b"\t");
        let line_type = fields.next().ok_or(ParseError::EmptyLine)?;

        let parsed = match line_type {
            b"V" => parse_vertex(fields),
            b"E" => parse_edge(fields),
            _ => return Err(ParseError::UnknownLineType),
        };

        parsed.map_err(|err| ParseError::invalid_line(err, line_no, line))
    }

    /// Parse a line and add its contents to `graph`.
    fn consume(
        &self,
        graph: &mut OverlapGraph,
        line: &[u8],
        line_no: usize,
    ) -> ParseResult<()> {
        match self.parse_line(line, line_no)? {
            Line::Vertex(name) => {
                graph.add_vertex(name);
            }
            Line::Edge { from, to, info } => {
                if !graph.add_edge(&from, &to, info) {
                    return Err(ParseError::duplicate_edge(&from, &to));
                }
            }
        }
        Ok(())
    }

    /// Decide whether a failed line ends the parse, logging the ones
    /// that are skipped.
    fn handle_error(&self, err: ParseError, line_no: usize) -> ParseResult<()> {
        if err.can_safely_continue(&self.tolerance) {
            if !matches!(err, ParseError::EmptyLine) {
                warn!("Skipping line {}: {}", line_no, err);
            }
            Ok(())
        } else {
            Err(err)
        }
    }

    pub fn parse_lines<I>(&self, lines: I) -> ParseResult<OverlapGraph>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut graph = OverlapGraph::new();
        for (ix, line) in lines.into_iter().enumerate() {
            if let Err(err) = self.consume(&mut graph, line.as_ref(), ix + 1) {
                self.handle_error(err, ix + 1)?;
            }
        }
        debug!(
            "Parsed overlap graph with {} vertices and {} edges",
            graph.vertex_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    pub fn parse_reader<R: BufRead>(&self, reader: R) -> ParseResult<OverlapGraph> {
        let mut graph = OverlapGraph::new();
        for (ix, line) in reader.byte_lines().enumerate() {
            let line = line?;
            if let Err(err) = self.consume(&mut graph, &line, ix + 1) {
                self.handle_error(err, ix + 1)?;
            }
        }
        debug!(
            "Parsed overlap graph with {} vertices and {} edges",
            graph.vertex_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    pub fn parse_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> ParseResult<OverlapGraph> {
        let file = File::open(path.as_ref())?;
        self.parse_reader(BufReader::new(file))
    }
}

fn parse_name(input: &[u8]) -> ParseFieldResult<BString> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"(?-u)^[!-)+-<>-~][!-~]*$").unwrap();
    }
    if RE.is_match(input) {
        Ok(BString::from(input))
    } else {
        Err(ParseFieldError::InvalidName)
    }
}

fn parse_next_name<'a, I>(input: &mut I) -> ParseFieldResult<BString>
where
    I: Iterator<Item = &'a [u8]>,
{
    let next = input.next().ok_or(ParseFieldError::MissingFields)?;
    parse_name(next)
}

fn parse_vertex<'a, I>(mut fields: I) -> ParseFieldResult<Line>
where
    I: Iterator<Item = &'a [u8]>,
{
    let name = parse_next_name(&mut fields)?;
    Ok(Line::Vertex(name))
}

fn parse_edge<'a, I>(mut fields: I) -> ParseFieldResult<Line>
where
    I: Iterator<Item = &'a [u8]>,
{
    let from = parse_next_name(&mut fields)?;
    let to = parse_next_name(&mut fields)?;
    let descriptor = fields.next().ok_or(ParseFieldError::MissingFields)?;
    let info = OverlapInfo::from_bytes(descriptor)
        .ok_or(ParseFieldError::InvalidDescriptor)?;
    Ok(Line::Edge { from, to, info })
}

fn parse_usize(i: &[u8]) -> IResult<&[u8], usize> {
    use nom::{character::complete::digit1, combinator::map_res};
    map_res(digit1, |bs: &[u8]| -> ParseFieldResult<usize> {
        let s = std::str::from_utf8(bs)?;
        Ok(s.parse::<usize>()?)
    })(i)
}

impl OverlapInfo {
    pub(crate) fn parser_bytestring(i: &[u8]) -> IResult<&[u8], Self> {
        use nom::{
            bytes::complete::{is_not, tag},
            error::ErrorKind,
            sequence::preceded,
        };

        let (mut i, overlap_type) =
            is_not::<_, _, (&[u8], ErrorKind)>(", \t\r\n")(i)?;

        let mut fields = [0usize; 9];
        for field in fields.iter_mut() {
            let (rest, value) = preceded(tag(","), parse_usize)(i)?;
            *field = value;
            i = rest;
        }

        let info = OverlapInfo {
            overlap_type: overlap_type.into(),
            overlap_length: fields[0],
            mismatches: fields[1],
            edits: fields[2],
            from_ctg_length: fields[3],
            overlap_start_on_from: fields[4],
            overlap_end_on_from: fields[5],
            to_ctg_length: fields[6],
            overlap_start_on_to: fields[7],
            overlap_end_on_to: fields[8],
        };
        Ok((i, info))
    }

    /// Parse an overlap descriptor from an ASCII byte slice; the whole
    /// slice must be consumed
    pub fn from_bytes(i: &[u8]) -> Option<Self> {
        match Self::parser_bytestring(i) {
            Ok((rest, info)) if rest.is_empty() => Some(info),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn can_parse_descriptor() {
        let (rest, info) =
            OverlapInfo::parser_bytestring(b"dovetail,20,1,0,100,80,99,80,0,19")
                .unwrap();
        assert_eq!(rest, b"");
        assert_eq!(
            info,
            OverlapInfo {
                overlap_type: "dovetail".into(),
                overlap_length: 20,
                mismatches: 1,
                edits: 0,
                from_ctg_length: 100,
                overlap_start_on_from: 80,
                overlap_end_on_from: 99,
                to_ctg_length: 80,
                overlap_start_on_to: 0,
                overlap_end_on_to: 19,
            }
        );

        assert_eq!(
            OverlapInfo::from_bytes(info.to_string().as_bytes()),
            Some(info)
        );

        assert!(OverlapInfo::from_bytes(b"dovetail,20,1,0").is_none());
        assert!(OverlapInfo::from_bytes(b",20,1,0,100,80,99,80,0,19").is_none());
        assert!(
            OverlapInfo::from_bytes(b"dovetail,20,1,0,100,80,99,80,0,-19").is_none()
        );
        assert!(
            OverlapInfo::from_bytes(b"dovetail,20,1,0,100,80,99,80,0,19,7").is_none()
        );
    }

    #[test]
    fn can_parse_lines() {
        let parser = OverlapGraphParser::new();

        assert_eq!(
            parser.parse_line(b"V\tctg1", 1).unwrap(),
            Line::Vertex("ctg1".into())
        );

        match parser.parse_line(b"E\tctg1\tctg2\tcontained,5,0,2,10,0,4,5,0,4\r\n", 2) {
            Ok(Line::Edge { from, to, info }) => {
                assert_eq!(from, "ctg1");
                assert_eq!(to, "ctg2");
                assert_eq!(info.overlap_type, "contained");
                assert_eq!(info.error(), 2);
            }
            other => panic!("Expected an edge, got {:?}", other),
        }

        assert!(matches!(
            parser.parse_line(b"# header", 3),
            Err(ParseError::EmptyLine)
        ));
        assert!(matches!(
            parser.parse_line(b"S\tctg1\tACGT", 4),
            Err(ParseError::UnknownLineType)
        ));
        assert!(matches!(
            parser.parse_line(b"E\tctg1\tctg2", 5),
            Err(ParseError::InvalidLine(ParseFieldError::MissingFields, 5, _))
        ));
        assert!(matches!(
            parser.parse_line(b"V\t*ctg", 6),
            Err(ParseError::InvalidLine(ParseFieldError::InvalidName, 6, _))
        ));
        assert!(matches!(
            parser.parse_line(b"E\ta\tb\tdovetail,1,2", 7),
            Err(ParseError::InvalidLine(
                ParseFieldError::InvalidDescriptor,
                7,
                _
            ))
        ));
    }

    const GRAPH: &[&str] = &[
        "# two chains and a loner",
        "V\tloner",
        "E\ta\tb\tdovetail,3,0,0,10,7,9,8,0,2",
        "",
        "E\tc\tb\tdovetail,2,1,0,6,0,1,8,6,7",
        "S\tignored\tACGT",
        "E\ta\tb\tdovetail,4,0,0,10,6,9,8,0,3",
    ];

    #[test]
    fn safe_parse_skips_unknown_and_duplicates() {
        let parser = OverlapGraphParser::new();
        let graph = parser.parse_lines(GRAPH.iter()).unwrap();

        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.vertex_index("loner"), Some(0));

        let a = graph.vertex_index("a").unwrap();
        let b = graph.vertex_index("b").unwrap();
        assert_eq!(graph.edge(a, b).unwrap().overlap_length, 3);
    }

    #[test]
    fn pedantic_parse_fails() {
        let parser = OverlapGraphParser::with_tolerance(ParserTolerance::Pedantic);
        assert!(matches!(
            parser.parse_lines(GRAPH.iter()),
            Err(ParseError::UnknownLineType)
        ));

        let known_types: Vec<&str> = GRAPH
            .iter()
            .copied()
            .filter(|l| !l.starts_with('S'))
            .collect();
        assert!(matches!(
            parser.parse_lines(known_types),
            Err(ParseError::DuplicateEdge(..))
        ));
    }

    #[test]
    fn tolerance_decides_on_bad_lines() {
        let lines = ["E\ta\tb\tdovetail,3,0,0,10,7,9,8,0,2", "E\tb\tc\tbroken"];

        let safe = OverlapGraphParser::new();
        assert!(matches!(
            safe.parse_lines(lines.iter()),
            Err(ParseError::InvalidLine(_, 2, _))
        ));

        let lenient = OverlapGraphParser::with_tolerance(ParserTolerance::IgnoreAll);
        let graph = lenient.parse_lines(lines.iter()).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.vertex_count(), 2);
    }

    #[test]
    fn can_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in GRAPH {
            writeln!(file, "{}", line).unwrap();
        }

        let graph = OverlapGraphParser::new().parse_file(file.path()).unwrap();
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(), 2);
    }
}

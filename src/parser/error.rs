use std::{error, fmt};

use bstr::ByteSlice;

pub type ParseFieldResult<T> = Result<T, ParseFieldError>;
pub type ParseResult<T> = Result<T, ParseError>;

/// How forgiving the overlap graph parser is with lines it can't use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserTolerance {
    /// Skip every line that fails to parse
    IgnoreAll,
    /// Skip empty lines, comments, unknown line types and duplicate
    /// edges, fail on malformed lines
    Safe,
    /// Fail on anything that isn't a well-formed V or E line
    Pedantic,
}

impl Default for ParserTolerance {
    fn default() -> Self {
        Self::Safe
    }
}

impl std::str::FromStr for ParserTolerance {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore-all" => Ok(Self::IgnoreAll),
            "safe" => Ok(Self::Safe),
            "pedantic" => Ok(Self::Pedantic),
            _ => Err("Tolerance must be one of ignore-all, safe, pedantic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFieldError {
    /// A contig name didn't match the allowed name characters
    InvalidName,
    /// The overlap descriptor wasn't an overlap type followed by nine
    /// comma-separated unsigned integers
    InvalidDescriptor,
    /// A field couldn't be parsed into the correct type
    ParseFromStringError,
    /// A bytestring couldn't be parsed as UTF-8
    Utf8Error,
    MissingFields,
}

macro_rules! impl_many_from {
    ($to:ty, ($from:ty, $out:expr)) => (
        impl From<$from> for $to {
            fn from(_: $from) -> Self {
                $out
            }
        }
    );
    ($to:ty, ($from:ty, $out:expr), $(($f:ty, $o:expr)),* $(,)?) => (
        impl_many_from!($to, ($from, $out));
        impl_many_from!($to, $(($f, $o)),*);
    );
}

impl_many_from!(
    ParseFieldError,
    (std::str::Utf8Error, ParseFieldError::Utf8Error),
    (
        std::num::ParseIntError,
        ParseFieldError::ParseFromStringError
    ),
);

impl fmt::Display for ParseFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ParseFieldError as PFE;
        match self {
            PFE::InvalidName => write!(f, "Invalid contig name"),
            PFE::InvalidDescriptor => {
                write!(f, "Failed to parse the overlap descriptor")
            }
            PFE::ParseFromStringError => {
                write!(f, "Failed to parse a field from a string")
            }
            PFE::Utf8Error => {
                write!(f, "Failed to parse a bytestring as a UTF-8 string")
            }
            PFE::MissingFields => write!(f, "Line is missing required fields"),
        }
    }
}

impl error::Error for ParseFieldError {}

/// Errors raised while reading the overlap graph or the contig FASTA
#[derive(Debug)]
pub enum ParseError {
    /// The line type was something other than 'V' or 'E'. Skipped
    /// unless the tolerance is pedantic.
    UnknownLineType,
    /// Tried to parse an empty line or a comment. Always skipped.
    EmptyLine,
    /// A line couldn't be parsed. Includes the line number, the problem
    /// line, and a variant describing the error.
    InvalidLine(ParseFieldError, usize, String),
    /// An edge between an ordered pair of contigs that already has one.
    DuplicateEdge(String, String),
    /// A structural problem in a FASTA file
    Fasta(String),
    /// Wrapper for an IO error.
    IOError(std::io::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ParseError as PE;
        match self {
            PE::UnknownLineType => {
                write!(f, "Line type was not one of 'V', 'E'")
            }
            PE::EmptyLine => write!(f, "Line was empty"),
            PE::InvalidLine(field_err, line_no, line) => write!(
                f,
                "Failed to parse line {} `{}`, error: {}",
                line_no, line, field_err
            ),
            PE::DuplicateEdge(from, to) => {
                write!(f, "Duplicate overlap edge {} -> {}", from, to)
            }
            PE::Fasta(msg) => write!(f, "Invalid FASTA: {}", msg),
            PE::IOError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl From<std::io::Error> for ParseError {
    #[inline]
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err)
    }
}

impl error::Error for ParseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ParseError::InvalidLine(err, _, _) => Some(err),
            ParseError::IOError(err) => Some(err),
            _ => None,
        }
    }
}

impl ParseError {
    #[inline]
    pub(crate) fn invalid_line(
        error: ParseFieldError,
        line_no: usize,
        line: &[u8],
    ) -> Self {
        let mut dest = String::new();
        line.to_str_lossy_into(&mut dest);
        Self::InvalidLine(error, line_no, dest)
    }

    #[inline]
    pub(crate) fn duplicate_edge(from: &[u8], to: &[u8]) -> Self {
        Self::DuplicateEdge(
            from.to_str_lossy().into_owned(),
            to.to_str_lossy().into_owned(),
        )
    }

    #[inline]
    pub fn can_safely_continue(&self, tol: &ParserTolerance) -> bool {
        use ParserTolerance as Tol;
        match self {
            ParseError::EmptyLine => true,
            ParseError::IOError(_) | ParseError::Fasta(_) => false,
            _ => match tol {
                Tol::IgnoreAll => true,
                Tol::Safe => matches!(
                    self,
                    ParseError::UnknownLineType | ParseError::DuplicateEdge(..)
                ),
                Tol::Pedantic => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_levels() {
        use ParserTolerance as Tol;

        let unknown = ParseError::UnknownLineType;
        let dup = ParseError::duplicate_edge(b"a", b"b");
        let bad = ParseError::invalid_line(
            ParseFieldError::InvalidDescriptor,
            3,
            b"E\ta\tb\tnope",
        );

        assert!(ParseError::EmptyLine.can_safely_continue(&Tol::Pedantic));

        assert!(unknown.can_safely_continue(&Tol::Safe));
        assert!(dup.can_safely_continue(&Tol::Safe));
        assert!(!bad.can_safely_continue(&Tol::Safe));

        assert!(bad.can_safely_continue(&Tol::IgnoreAll));
        assert!(!unknown.can_safely_continue(&Tol::Pedantic));
        assert!(!dup.can_safely_continue(&Tol::Pedantic));

        let io = ParseError::from(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk on fire",
        ));
        assert!(!io.can_safely_continue(&Tol::IgnoreAll));
    }

    #[test]
    fn tolerance_from_str() {
        assert_eq!(
            "pedantic".parse::<ParserTolerance>(),
            Ok(ParserTolerance::Pedantic)
        );
        assert_eq!(ParserTolerance::default(), ParserTolerance::Safe);
        assert!("lenient".parse::<ParserTolerance>().is_err());
    }

    #[test]
    fn invalid_line_display() {
        let err = ParseError::invalid_line(
            ParseFieldError::MissingFields,
            7,
            b"E\tctg1",
        );
        assert_eq!(
            err.to_string(),
            "Failed to parse line 7 `E\tctg1`, error: Line is missing required fields"
        );
    }
}

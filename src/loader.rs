//! Program loader for the LS-8.
//!
//! Programs are text files holding one byte per line, written as a binary literal:
//!
//! ```text
//! # print8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```
//!
//! Blank lines and anything after a `#` are ignored. Bytes are stored at consecutive addresses starting at 0.

use std::{
    fs,
    path::{Path, PathBuf},
};

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space0},
    combinator::{eof, opt, rest},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use nom_locate::LocatedSpan;
use thiserror::Error;

use crate::plat::MEMORY_SIZE;

pub type Span<'a> = LocatedSpan<&'a str>;

/// An error for the program loader of the LS-8.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("couldn't read program file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("syntax error at ({}:{}): expected a binary byte literal, found `{}`", .line, .column, .text)]
    Syntax {
        line: usize,
        column: usize,
        text: String,
    },
    #[error("on line {line}: `{literal}` doesn't fit in a byte")]
    ByteOverflow { line: usize, literal: String },
    #[error("program is {len} bytes long (memory is {} bytes)", MEMORY_SIZE)]
    ProgramTooLarge { len: usize },
}

pub fn lex_byte_literal(inp: Span) -> IResult<Span, Span> {
    take_while1(|c: char| c == '0' || c == '1')(inp)
}

pub fn lex_comment(inp: Span) -> IResult<Span, Span> {
    preceded(char('#'), rest)(inp)
}

/// Lexes a single line of a program. A line holds at most one byte literal.
pub fn lex_line(inp: Span) -> IResult<Span, Option<Span>> {
    terminated(
        delimited(space0, opt(lex_byte_literal), space0),
        pair(opt(lex_comment), eof),
    )(inp)
}

/// Parses program text into the bytes it describes.
///
/// # Errors
///
/// This function will return an error if a line holds anything but a binary byte literal and/or a comment,
/// or if the program doesn't fit in memory.
pub fn parse_program(program: &str) -> Result<Vec<u8>, LoadError> {
    let mut out = vec![];
    for (idx, text) in program.lines().enumerate() {
        let line = idx + 1;
        let span = Span::new(text);
        let (_, literal) = lex_line(span).map_err(|e| {
            let span = match e {
                nom::Err::Error(e) => e.input,
                nom::Err::Failure(e) => e.input,
                nom::Err::Incomplete(_) => span,
            };
            LoadError::Syntax {
                line,
                column: span.get_utf8_column(),
                text: span.fragment().trim_end().to_string(),
            }
        })?;
        if let Some(literal) = literal {
            let byte = u8::from_str_radix(literal.fragment(), 2).map_err(|_| {
                LoadError::ByteOverflow {
                    line,
                    literal: literal.fragment().to_string(),
                }
            })?;
            out.push(byte);
        }
    }
    if out.len() > MEMORY_SIZE {
        return Err(LoadError::ProgramTooLarge { len: out.len() });
    }
    Ok(out)
}

/// Reads and parses the program file at `path`.
///
/// # Errors
///
/// This function will return an error if the file can't be read or doesn't parse. See [`parse_program`].
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<u8>, LoadError> {
    let path = path.as_ref();
    let program = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    let bin = parse_program(&program)?;
    log::info!("loaded {} bytes from {}", bin.len(), path.display());
    Ok(bin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_program() {
        let prog = "
# im a comment!
10000010 # LDI R0,8
00000000
  00001000\t
01000111 #PRN R0

00000000
00000001#HLT
";
        let bin = parse_program(prog).unwrap();
        assert_eq!(bin, vec![0b1000_0010, 0, 8, 0b0100_0111, 0, 1]);
    }

    #[test]
    fn test_parse_bundled_programs() {
        let print8 = parse_program(include_str!("../programs/print8.ls8")).unwrap();
        assert_eq!(print8, vec![0b1000_0010, 0, 8, 0b0100_0111, 0, 1]);
        let sctest = parse_program(include_str!("../programs/sctest.ls8")).unwrap();
        assert_eq!(sctest.len(), 65);
    }

    #[test]
    fn test_short_literals() {
        assert_eq!(parse_program("1\n101\r\n0").unwrap(), vec![1, 5, 0]);
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_program("10000010\n0000000x\n").unwrap_err();
        match err {
            LoadError::Syntax { line, column, text } => {
                assert_eq!(line, 2);
                assert_eq!(column, 8);
                assert_eq!(text, "x");
            }
            e => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_non_binary_lines() {
        for bad in ["LDI R0,8", "0b1010", "12", "0101 0101", "  # fine\n2"] {
            assert!(
                matches!(parse_program(bad), Err(LoadError::Syntax { .. })),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_byte_overflow() {
        let err = parse_program("100000000").unwrap_err();
        assert!(matches!(err, LoadError::ByteOverflow { line: 1, .. }));
        // leading zeros don't count
        assert_eq!(parse_program("000000001").unwrap(), vec![1]);
    }

    #[test]
    fn test_program_too_large() {
        let prog = "00000000\n".repeat(MEMORY_SIZE + 1);
        assert!(matches!(
            parse_program(&prog),
            Err(LoadError::ProgramTooLarge { len: 257 })
        ));
        let prog = "00000000\n".repeat(MEMORY_SIZE);
        assert_eq!(parse_program(&prog).unwrap().len(), MEMORY_SIZE);
    }

    #[test]
    fn test_missing_file() {
        let err = load_file("/this/file/does/not/exist.ls8").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}

//! Decoding of raw chunk extensions into name/value pairs.

use crate::codec::syntax::is_tchar;
use crate::ensure;
use crate::protocol::ParseError;
use crate::utils::is_ows;
use std::borrow::Cow;

/// Iterator over the `name[=value]` pairs of a raw [`ChunkExt`](crate::codec::Token::ChunkExt)
/// token such as `;name=value;flag;q="quoted \"string\""`.
///
/// Names are tokens. Values are tokens or quoted strings, the latter are unescaped. A missing
/// value reads as an empty string. Iteration stops after the first malformed extension.
#[derive(Debug, Clone)]
pub struct ChunkExtensions<'a> {
    rest: &'a [u8],
    failed: bool,
}

impl<'a> ChunkExtensions<'a> {
    pub fn new(raw: &'a [u8]) -> Self {
        Self { rest: raw, failed: false }
    }

    fn skip_ows(&mut self) {
        let n = self.rest.iter().take_while(|b| is_ows(**b)).count();
        self.rest = &self.rest[n..];
    }

    fn token(&mut self) -> Result<&'a str, ParseError> {
        let n = self.rest.iter().take_while(|b| is_tchar(**b)).count();
        ensure!(n > 0, ParseError::InvalidData);

        let (token, rest) = self.rest.split_at(n);
        self.rest = rest;
        std::str::from_utf8(token).map_err(|_e| ParseError::InvalidData)
    }

    fn quoted_string(&mut self) -> Result<Cow<'a, str>, ParseError> {
        let mut value = Vec::new();
        let mut escaped = false;

        for (i, b) in self.rest.iter().enumerate().skip(1) {
            match (*b, escaped) {
                (b'\r' | b'\n', _) => break,
                (_, true) => {
                    value.push(*b);
                    escaped = false;
                }
                (b'\\', false) => escaped = true,
                (b'"', false) => {
                    self.rest = &self.rest[i + 1..];
                    return String::from_utf8(value).map(Cow::Owned).map_err(|_e| ParseError::InvalidData);
                }
                (b, false) => value.push(b),
            }
        }

        Err(ParseError::InvalidData)
    }

    fn extension(&mut self) -> Result<(&'a str, Cow<'a, str>), ParseError> {
        self.skip_ows();
        ensure!(self.rest.first() == Some(&b';'), ParseError::InvalidData);
        self.rest = &self.rest[1..];
        self.skip_ows();

        let name = self.token()?;
        self.skip_ows();

        if self.rest.first() != Some(&b'=') {
            return Ok((name, Cow::Borrowed("")));
        }
        self.rest = &self.rest[1..];
        self.skip_ows();

        let value = if self.rest.first() == Some(&b'"') { self.quoted_string()? } else { Cow::Borrowed(self.token()?) };
        Ok((name, value))
    }
}

impl<'a> Iterator for ChunkExtensions<'a> {
    type Item = Result<(&'a str, Cow<'a, str>), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        self.skip_ows();
        if self.rest.is_empty() {
            return None;
        }

        let extension = self.extension();
        self.failed = extension.is_err();
        Some(extension)
    }
}

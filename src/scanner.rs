//! Streaming scanner for flat configuration payloads.
//!
//! Accepted wire format:
//!
//! ```text
//!  { "key" : "value" , "key" : "value" ... }   then optional whitespace / NULs
//! ```
//!
//! Every value is a string.  Nested objects, arrays, numeric and boolean
//! literals and escape sequences are all rejected.  The scanner yields one
//! pair at a time without allocating, so a caller can apply each pair
//! before the next one is even looked at.  After the first error the
//! iterator is fused and yields `None`.

use core::fmt;

/// One `"key": "value"` pair, borrowing from the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

/// What went wrong while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// Payload does not start with `{`.
    ExpectedObject,
    /// A key was expected but something other than `"` was found.
    ExpectedKey,
    /// `:` missing between key and value.
    ExpectedColon,
    /// Value is a number, boolean, null or other bare literal.
    NonStringValue,
    /// Value is an object or array.
    NestedValue,
    /// Neither `,` nor `}` after a value.
    ExpectedCommaOrEnd,
    /// Input ended inside a string or before the closing `}`.
    UnexpectedEnd,
    /// Backslash escapes are not supported.
    EscapeSequence,
    /// Non-whitespace text after the closing `}`.
    TrailingData,
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::ExpectedObject => "expected '{'",
            Self::ExpectedKey => "expected string key",
            Self::ExpectedColon => "expected ':'",
            Self::NonStringValue => "value is not a string",
            Self::NestedValue => "nested value",
            Self::ExpectedCommaOrEnd => "expected ',' or '}'",
            Self::UnexpectedEnd => "unexpected end of payload",
            Self::EscapeSequence => "escape sequences unsupported",
            Self::TrailingData => "trailing data after object",
        };
        f.write_str(msg)
    }
}

/// Scan failure with the byte offset it was detected at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub offset: usize,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.kind, self.offset)
    }
}

impl std::error::Error for ScanError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Nothing consumed yet.
    Start,
    /// After `{`: a key or `}` may follow.
    FirstMember,
    /// After `,`: a key must follow.
    NextMember,
    /// After a value: `,` or `}` must follow.
    AfterValue,
    Done,
}

/// Iterator over the pairs of one payload.
pub struct PairScanner<'a> {
    text: &'a str,
    pos: usize,
    state: ScanState,
}

impl<'a> PairScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            state: ScanState::Start,
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.bytes().get(self.pos) {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn fail(&mut self, kind: ScanErrorKind) -> ScanError {
        self.state = ScanState::Done;
        ScanError {
            kind,
            offset: self.pos,
        }
    }

    /// Consume a `"..."` string starting at the current position.
    fn string(&mut self, not_a_string: ScanErrorKind) -> Result<&'a str, ScanError> {
        match self.peek() {
            Some(b'"') => {}
            Some(b'{' | b'[') if not_a_string == ScanErrorKind::NonStringValue => {
                return Err(self.fail(ScanErrorKind::NestedValue));
            }
            Some(_) => return Err(self.fail(not_a_string)),
            None => return Err(self.fail(ScanErrorKind::UnexpectedEnd)),
        }
        let start = self.pos + 1;
        let mut end = start;
        loop {
            match self.bytes().get(end) {
                Some(b'"') => break,
                Some(b'\\') => {
                    self.pos = end;
                    return Err(self.fail(ScanErrorKind::EscapeSequence));
                }
                Some(_) => end += 1,
                None => {
                    self.pos = end;
                    return Err(self.fail(ScanErrorKind::UnexpectedEnd));
                }
            }
        }
        self.pos = end + 1;
        // `"` is ASCII so both bounds are char boundaries.
        Ok(&self.text[start..end])
    }

    fn member(&mut self) -> Result<Pair<'a>, ScanError> {
        let key = self.string(ScanErrorKind::ExpectedKey)?;
        self.skip_ws();
        if self.peek() != Some(b':') {
            let kind = if self.peek().is_none() {
                ScanErrorKind::UnexpectedEnd
            } else {
                ScanErrorKind::ExpectedColon
            };
            return Err(self.fail(kind));
        }
        self.pos += 1;
        self.skip_ws();
        let value = self.string(ScanErrorKind::NonStringValue)?;
        self.state = ScanState::AfterValue;
        Ok(Pair { key, value })
    }

    /// Everything after the closing brace must be whitespace or NUL
    /// padding left over from the staging buffer.
    fn finish(&mut self) -> Option<Result<Pair<'a>, ScanError>> {
        let rest = &self.bytes()[self.pos..];
        if let Some(i) = rest.iter().position(|b| !(b.is_ascii_whitespace() || *b == 0)) {
            self.pos += i;
            return Some(Err(self.fail(ScanErrorKind::TrailingData)));
        }
        self.state = ScanState::Done;
        None
    }
}

impl<'a> Iterator for PairScanner<'a> {
    type Item = Result<Pair<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.skip_ws();
            match self.state {
                ScanState::Done => return None,
                ScanState::Start => {
                    if self.peek() != Some(b'{') {
                        return Some(Err(self.fail(ScanErrorKind::ExpectedObject)));
                    }
                    self.pos += 1;
                    self.state = ScanState::FirstMember;
                }
                ScanState::FirstMember => {
                    if self.peek() == Some(b'}') {
                        self.pos += 1;
                        return self.finish();
                    }
                    return Some(self.member());
                }
                ScanState::NextMember => return Some(self.member()),
                ScanState::AfterValue => match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                        self.state = ScanState::NextMember;
                    }
                    Some(b'}') => {
                        self.pos += 1;
                        return self.finish();
                    }
                    Some(_) => return Some(Err(self.fail(ScanErrorKind::ExpectedCommaOrEnd))),
                    None => return Some(Err(self.fail(ScanErrorKind::UnexpectedEnd))),
                },
            }
        }
    }
}

impl core::iter::FusedIterator for PairScanner<'_> {}

/// Scan `text` into its key/value pairs.
pub fn scan(text: &str) -> PairScanner<'_> {
    PairScanner::new(text)
}

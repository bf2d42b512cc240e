// src/parser.rs

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    InvalidSyntax(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidSyntax(msg) => write!(f, "{msg}"),
        }
    }
}

/// Character cursor over a selector expression such as `List[1].Foo`.
pub struct Parser<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn parse_identifier(&mut self) -> Result<String, ParseError> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == '_' || c.is_alphanumeric() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
        if self.i == start {
            return Err(match self.peek_char() {
                Some(c) => ParseError::InvalidSyntax(format!("unexpected '{c}'")),
                None => ParseError::InvalidSyntax("member name expected".into()),
            });
        }
        if self.s[start..].starts_with(|c: char| c.is_ascii_digit()) {
            return Err(ParseError::InvalidSyntax(format!(
                "'{}' is not a member name",
                &self.s[start..self.i]
            )));
        }
        Ok(self.s[start..self.i].to_string())
    }

    pub fn parse_index(&mut self) -> Result<usize, ParseError> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.i += 1;
            } else {
                break;
            }
        }
        if self.i == start {
            return Err(ParseError::InvalidSyntax("expected index".into()));
        }
        self.s[start..self.i]
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidSyntax("bad index".into()))
    }

    /// Reads a dictionary key written as `"Bar"` or `'Bar'`. Only the quote
    /// characters and the backslash can be escaped.
    pub fn parse_quoted_string(&mut self) -> Result<String, ParseError> {
        let quote = match self.peek_char() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(ParseError::InvalidSyntax("expected quoted key".into())),
        };
        self.i += 1;
        let mut key = String::new();
        let mut escaped = false;
        while let Some(c) = self.peek_char() {
            self.i += c.len_utf8();
            match c {
                _ if escaped => {
                    if !matches!(c, '"' | '\'' | '\\') {
                        key.push('\\');
                    }
                    key.push(c);
                    escaped = false;
                }
                '\\' => escaped = true,
                _ if c == quote => return Ok(key),
                _ => key.push(c),
            }
        }
        Err(ParseError::InvalidSyntax("unterminated key".into()))
    }

    pub fn capture_until(&mut self, end: char) -> Result<&'a str, ParseError> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == end {
                break;
            }
            self.i += c.len_utf8();
        }
        if self.peek_char() != Some(end) {
            return Err(ParseError::InvalidSyntax(format!("expected '{end}'")));
        }
        Ok(&self.s[start..self.i])
    }

    pub fn expect(&mut self, c: char) -> Result<(), ParseError> {
        if self.consume_char(c) {
            Ok(())
        } else {
            Err(ParseError::InvalidSyntax(format!("expected '{}'", c)))
        }
    }

    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    pub fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_identifiers_and_indices() {
        let mut p = Parser::new("Orders[12]");
        assert_eq!(p.parse_identifier().unwrap(), "Orders");
        p.expect('[').unwrap();
        assert_eq!(p.parse_index().unwrap(), 12);
        p.expect(']').unwrap();
        assert!(p.eof());
    }

    #[test]
    fn quoted_strings_unescape() {
        let mut p = Parser::new(r#""a\"b""#);
        assert_eq!(p.parse_quoted_string().unwrap(), "a\"b");
        assert!(Parser::new("'open").parse_quoted_string().is_err());
    }

    #[test]
    fn identifiers_cannot_start_with_a_digit() {
        assert!(Parser::new("1abc").parse_identifier().is_err());
        assert!(Parser::new("+").parse_identifier().is_err());
    }
}

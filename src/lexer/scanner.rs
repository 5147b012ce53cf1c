use super::token::{Token, TokenKind};
use crate::error::{Error, Result};

/// Scanner for the class-based contract syntax
pub struct Scanner {
    /// Source code as character vector
    source: Vec<char>,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Start position of current token
    start: usize,
    /// Column where the current token starts
    start_column: usize,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
}

impl Scanner {
    /// Creates a new scanner from source code
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            start_column: 1,
            current: 0,
            line: 1,
            column: 1,
        }
    }

    /// Scans all tokens from source code and returns them as a vector
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_column = self.column;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
        ));

        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();

        match c {
            ' ' | '\r' | '\t' => {}
            '\n' => {
                self.line += 1;
                self.column = 1;
            }

            '/' => {
                if self.match_char('/') {
                    self.skip_line_comment();
                } else if self.match_char('*') {
                    self.skip_block_comment()?;
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }

            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            '[' => self.add_token(TokenKind::LeftBracket),
            ']' => self.add_token(TokenKind::RightBracket),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            ';' => self.add_token(TokenKind::Semicolon),
            ':' => self.add_token(TokenKind::Colon),
            '?' => self.add_token(TokenKind::Question),
            '@' => self.add_token(TokenKind::At),

            '+' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::PlusAssign);
                } else {
                    self.add_token(TokenKind::Plus);
                }
            }
            '-' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::MinusAssign);
                } else {
                    self.add_token(TokenKind::Minus);
                }
            }
            '*' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::StarAssign);
                } else {
                    self.add_token(TokenKind::Star);
                }
            }
            '%' => self.add_token(TokenKind::Percent),

            '=' => {
                if self.match_char('=') {
                    // `===` is accepted as plain equality
                    self.match_char('=');
                    self.add_token(TokenKind::Eq);
                } else if self.match_char('>') {
                    self.add_token(TokenKind::FatArrow);
                } else {
                    self.add_token(TokenKind::Assign);
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.match_char('=');
                    self.add_token(TokenKind::NotEq);
                } else {
                    self.add_token(TokenKind::Bang);
                }
            }
            '<' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::LtEq);
                } else {
                    self.add_token(TokenKind::Lt);
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::GtEq);
                } else {
                    self.add_token(TokenKind::Gt);
                }
            }
            '&' => {
                if self.match_char('&') {
                    self.add_token(TokenKind::AndAnd);
                } else {
                    return Err(self.unexpected('&'));
                }
            }
            '|' => {
                if self.match_char('|') {
                    self.add_token(TokenKind::OrOr);
                } else {
                    return Err(self.unexpected('|'));
                }
            }

            '"' | '\'' => self.scan_string(c)?,

            c if c.is_ascii_digit() => self.scan_number()?,

            c if c.is_alphabetic() || c == '_' || c == '$' => self.scan_identifier_or_keyword(),

            _ => return Err(self.unexpected(c)),
        }

        Ok(())
    }

    fn unexpected(&self, c: char) -> Error {
        Error::SyntaxError {
            line: self.line,
            col: self.start_column,
            message: format!("Unexpected character '{}'", c),
        }
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let opened_at = self.line;
        loop {
            if self.is_at_end() {
                return Err(Error::SyntaxError {
                    line: opened_at,
                    col: self.start_column,
                    message: "Unterminated block comment".to_string(),
                });
            }
            let c = self.advance();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else if c == '*' && self.match_char('/') {
                return Ok(());
            }
        }
    }

    fn scan_string(&mut self, quote: char) -> Result<()> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != quote {
            if self.peek() == '\\' {
                self.advance();
                let escaped = self.advance();
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' => value.push('\\'),
                    '"' => value.push('"'),
                    '\'' => value.push('\''),
                    _ => {
                        return Err(Error::SyntaxError {
                            line: self.line,
                            col: self.column,
                            message: format!("Invalid escape sequence \\{}", escaped),
                        });
                    }
                }
            } else {
                if self.peek() == '\n' {
                    return Err(Error::SyntaxError {
                        line: self.line,
                        col: self.start_column,
                        message: "Unterminated string".to_string(),
                    });
                }
                value.push(self.advance());
            }
        }

        if self.is_at_end() {
            return Err(Error::SyntaxError {
                line: self.line,
                col: self.start_column,
                message: "Unterminated string".to_string(),
            });
        }

        self.advance(); // closing quote
        self.add_token(TokenKind::String(value));
        Ok(())
    }

    fn scan_number(&mut self) -> Result<()> {
        let first = self.source[self.start];
        if first == '0' && matches!(self.peek(), 'x' | 'X') {
            self.advance();
            while self.peek().is_ascii_hexdigit() || self.peek() == '_' {
                self.advance();
            }
        } else {
            while self.peek().is_ascii_digit() || self.peek() == '_' {
                self.advance();
            }
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            return Err(Error::SyntaxError {
                line: self.line,
                col: self.start_column,
                message: "Fractional numbers are not supported".to_string(),
            });
        }

        let text: String = self.source[self.start..self.current]
            .iter()
            .filter(|c| **c != '_')
            .collect();
        if text.eq_ignore_ascii_case("0x") {
            return Err(Error::SyntaxError {
                line: self.line,
                col: self.start_column,
                message: "Hex literal without digits".to_string(),
            });
        }

        self.add_token(TokenKind::Number(text));
        Ok(())
    }

    fn scan_identifier_or_keyword(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' || self.peek() == '$' {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier(text));
        self.add_token(kind);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;
            self.column += 1;
            true
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme: String = self.source[self.start..self.current].iter().collect();
        self.tokens
            .push(Token::new(kind, lexeme, self.line, self.start_column));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source)
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_decorated_property() {
        let tokens = kinds("@Indexed from: Address;");
        assert_eq!(
            tokens,
            vec![
                TokenKind::At,
                TokenKind::Identifier("Indexed".to_string()),
                TokenKind::From,
                TokenKind::Colon,
                TokenKind::Identifier("Address".to_string()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strict_equality_collapses() {
        let tokens = kinds("a === b !== c");
        assert_eq!(tokens[1], TokenKind::Eq);
        assert_eq!(tokens[3], TokenKind::NotEq);
    }

    #[test]
    fn test_hex_and_separated_numbers() {
        let tokens = kinds("0xFF 1_000");
        assert_eq!(tokens[0], TokenKind::Number("0xFF".to_string()));
        assert_eq!(tokens[1], TokenKind::Number("1000".to_string()));
    }

    #[test]
    fn test_comments_are_skipped_and_lines_tracked() {
        let source = "// header\n/* block\n comment */\nreturn;";
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Return);
        assert_eq!(tokens[0].line, 4);
        assert_eq!(tokens[0].column, 1);
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let err = Scanner::new("let s = \"abc").scan_tokens().unwrap_err();
        assert!(matches!(err, Error::SyntaxError { line: 1, .. }));
    }

    #[test]
    fn test_single_ampersand_rejected() {
        assert!(Scanner::new("a & b").scan_tokens().is_err());
    }
}

//! Character stream -> token stream. Greedily scans the whole source before
//! parsing begins; there is no streaming interface.

use std::rc::Rc;

use crate::{
    common::{Source, Span, Value},
    compiler::{
        error::Syntax,
        token::{keyword, Token, TokenKind},
    },
};

pub struct Scanner {
    source: Rc<Source>,
    chars: Vec<char>,
    start: usize,
    current: usize,
    line: usize,
}

impl Scanner {
    pub fn new(source: Rc<Source>) -> Scanner {
        let chars = source.contents.chars().collect();
        Scanner { source, chars, start: 0, current: 0, line: 1 }
    }

    pub fn scan(source: Rc<Source>) -> Result<Vec<Token>, Syntax> {
        let mut scanner = Scanner::new(source);
        let mut tokens = vec![];
        loop {
            let token = scanner.next_token()?;
            let done = token.kind == TokenKind::End;
            tokens.push(token);
            if done { break; }
        }
        Ok(tokens)
    }

    fn at_end(&self) -> bool { self.current >= self.chars.len() }

    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> char { self.chars.get(self.current).copied().unwrap_or('\0') }
    fn peek_next(&self) -> char { self.chars.get(self.current + 1).copied().unwrap_or('\0') }

    fn matches(&mut self, expected: char) -> bool {
        if self.at_end() || self.chars[self.current] != expected { return false; }
        self.current += 1;
        true
    }

    fn span(&self) -> Span { Span::new(&self.source, self.line) }

    fn lexeme(&self) -> String {
        self.chars[self.start..self.current].iter().collect()
    }

    fn make(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.lexeme(), Value::Nil, self.line)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                ' ' | '\r' | '\t' => { self.advance(); },
                '\n' => { self.line += 1; self.advance(); },
                '/' if self.peek_next() == '/' => {
                    while self.peek() != '\n' && !self.at_end() { self.advance(); }
                },
                _ => return,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, Syntax> {
        self.skip_whitespace_and_comments();
        self.start = self.current;

        if self.at_end() {
            return Ok(self.make(TokenKind::End));
        }

        let c = self.advance();
        use TokenKind::*;

        if c.is_ascii_digit() { return Ok(self.number()); }
        if c == '_' || c.is_ascii_alphabetic() { return Ok(self.identifier()); }

        let kind = match c {
            '(' => LeftParen,
            ')' => RightParen,
            '{' => LeftBrace,
            '}' => RightBrace,
            '[' => LeftBracket,
            ']' => RightBracket,
            ',' => Comma,
            ':' => Colon,
            '.' => Dot,
            ';' => Semicolon,
            '+' => Plus,
            '-' => Minus,
            '*' => Star,
            '/' => Slash,
            '%' => Percent,
            '?' => Question,
            '!' => if self.matches('=') { BangEqual } else { Bang },
            '=' => if self.matches('=') { EqualEqual } else { Equal },
            '<' => if self.matches('=') { LessEqual } else { Less },
            '>' => if self.matches('=') { GreaterEqual } else { Greater },
            '"' => return self.string(),
            other => return Err(Syntax::error(self.span(), format!("unexpected character '{other}'"))),
        };

        Ok(self.make(kind))
    }

    fn string(&mut self) -> Result<Token, Syntax> {
        let start_line = self.line;
        while self.peek() != '"' && !self.at_end() {
            if self.peek() == '\n' { self.line += 1; }
            self.advance();
        }
        if self.at_end() {
            return Err(Syntax::error(Span::new(&self.source, start_line), "unterminated string"));
        }
        self.advance(); // closing quote

        // escapes are interpreted lazily, e.g. by printf; the literal stores
        // the raw (still-escaped) contents between the quotes.
        let raw: String = self.chars[self.start + 1..self.current - 1].iter().collect();
        let mut token = self.make(TokenKind::String);
        token.literal = Value::string(raw);
        Ok(token)
    }

    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() { self.advance(); }
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() { self.advance(); }
        }
        let text = self.lexeme();
        let mut token = self.make(TokenKind::Number);
        token.literal = Value::Number(text.parse().expect("scanner only admits digit characters"));
        token
    }

    fn identifier(&mut self) -> Token {
        while self.peek() == '_' || self.peek().is_ascii_alphanumeric() { self.advance(); }
        let text = self.lexeme();
        match keyword(&text) {
            Some(kind) => self.make(kind),
            None => self.make(TokenKind::Identifier),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Scanner::scan(Source::new("<test>", src)).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn punctuation_and_keywords() {
        assert_eq!(
            kinds("var x = 1 + 2; // comment\n"),
            vec![
                TokenKind::Var, TokenKind::Identifier, TokenKind::Equal, TokenKind::Number,
                TokenKind::Plus, TokenKind::Number, TokenKind::Semicolon, TokenKind::End,
            ]
        );
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(
            kinds("a != b == c <= d >= e"),
            vec![
                TokenKind::Identifier, TokenKind::BangEqual, TokenKind::Identifier,
                TokenKind::EqualEqual, TokenKind::Identifier, TokenKind::LessEqual,
                TokenKind::Identifier, TokenKind::GreaterEqual, TokenKind::Identifier, TokenKind::End,
            ]
        );
    }

    #[test]
    fn unterminated_string_errors_with_line() {
        let err = Scanner::scan(Source::new("<test>", "\"abc")).unwrap_err();
        assert_eq!(err.span.line, 1);
    }

    #[test]
    fn lines_advance_on_newline() {
        let tokens = Scanner::scan(Source::new("<test>", "1\n2\n3")).unwrap();
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 3]);
    }

    #[test]
    fn lexing_preserves_lexemes() {
        let src = "var foo = \"bar\" + 1.5;";
        let tokens = Scanner::scan(Source::new("<test>", src)).unwrap();
        let rendered: String = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::End)
            .map(|t| t.lexeme.clone())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rendered, "var foo = \"bar\" + 1.5 ;");
    }
}

use serde_json::Number;

use super::ScriptError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Str(String),
    Number(Number),
    Pipe,
    Comma,
    LParen,
    RParen,
    Assign,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Newline or `;`.
    Separator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Position just past the last character read.
    pub fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> ScriptError {
        ScriptError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    pub fn tokenize(mut self) -> Result<(Vec<Spanned>, (usize, usize)), ScriptError> {
        let mut tokens = Vec::new();

        while let Some(&c) = self.chars.peek() {
            let (line, column) = self.position();

            let token = match c {
                ' ' | '\t' | '\r' => {
                    self.bump();
                    continue;
                }
                '#' => {
                    while matches!(self.chars.peek(), Some(&c) if c != '\n') {
                        self.bump();
                    }
                    continue;
                }
                '\n' | ';' => {
                    self.bump();
                    Token::Separator
                }
                '|' => {
                    self.bump();
                    Token::Pipe
                }
                ',' => {
                    self.bump();
                    Token::Comma
                }
                '(' => {
                    self.bump();
                    Token::LParen
                }
                ')' => {
                    self.bump();
                    Token::RParen
                }
                '=' => {
                    self.bump();
                    if self.chars.peek() == Some(&'=') {
                        self.bump();
                        Token::Eq
                    } else {
                        Token::Assign
                    }
                }
                '!' => {
                    self.bump();
                    if self.chars.peek() == Some(&'=') {
                        self.bump();
                        Token::Ne
                    } else {
                        return Err(self.error(line, column, "expected '=' after '!'"));
                    }
                }
                '<' | '>' => {
                    self.bump();
                    let or_equal = self.chars.peek() == Some(&'=');
                    if or_equal {
                        self.bump();
                    }
                    match (c, or_equal) {
                        ('<', false) => Token::Lt,
                        ('<', true) => Token::Le,
                        ('>', false) => Token::Gt,
                        _ => Token::Ge,
                    }
                }
                '"' | '\'' => self.string(c, line, column)?,
                c if c.is_ascii_digit() || c == '-' => self.number(line, column)?,
                c if c.is_alphabetic() || c == '_' => {
                    let mut ident = String::new();
                    while let Some(&c) = self.chars.peek() {
                        if c.is_alphanumeric() || c == '_' {
                            ident.push(c);
                            self.bump();
                        } else {
                            break;
                        }
                    }
                    Token::Ident(ident)
                }
                other => {
                    return Err(self.error(line, column, format!("unexpected character {:?}", other)))
                }
            };

            tokens.push(Spanned {
                token,
                line,
                column,
            });
        }

        let end = self.position();
        Ok((tokens, end))
    }

    fn string(&mut self, quote: char, line: usize, column: usize) -> Result<Token, ScriptError> {
        self.bump();
        let mut value = String::new();

        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error(line, column, "unterminated string")),
                Some(c) if c == quote => return Ok(Token::Str(value)),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(c @ ('\\' | '"' | '\'')) => value.push(c),
                    Some(c) => {
                        let (line, column) = self.position();
                        return Err(self.error(line, column - 1, format!("unknown escape '\\{}'", c)));
                    }
                    None => return Err(self.error(line, column, "unterminated string")),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn number(&mut self, line: usize, column: usize) -> Result<Token, ScriptError> {
        let mut text = String::new();
        if self.chars.peek() == Some(&'-') {
            text.push('-');
            self.bump();
        }
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' {
                text.push(c);
                self.bump();
            } else if (c == '-' || c == '+') && text.ends_with(['e', 'E']) {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }

        if let Ok(n) = text.parse::<i64>() {
            return Ok(Token::Number(Number::from(n)));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Token::Number)
            .ok_or_else(|| self.error(line, column, format!("invalid number {:?}", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let (spanned, _) = Lexer::new(source).tokenize().unwrap();
        spanned.into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_pipeline_tokens() {
        assert_eq!(
            tokens("output = areas | where floor >= 2"),
            vec![
                Token::Ident("output".into()),
                Token::Assign,
                Token::Ident("areas".into()),
                Token::Pipe,
                Token::Ident("where".into()),
                Token::Ident("floor".into()),
                Token::Ge,
                Token::Number(Number::from(2)),
            ]
        );
    }

    #[test]
    fn test_strings_numbers_and_comments() {
        assert_eq!(
            tokens("'it\\'s' \"a\\tb\" -3 2.5 # trailing\n;"),
            vec![
                Token::Str("it's".into()),
                Token::Str("a\tb".into()),
                Token::Number(Number::from(-3)),
                Token::Number(Number::from_f64(2.5).unwrap()),
                Token::Separator,
                Token::Separator,
            ]
        );
    }

    #[test]
    fn test_positions_track_lines() {
        let (spanned, end) = Lexer::new("a = 1\n  b = 2").tokenize().unwrap();
        let b = &spanned[4];
        assert_eq!(b.token, Token::Ident("b".into()));
        assert_eq!((b.line, b.column), (2, 3));
        assert_eq!(end, (2, 8));
    }

    #[test]
    fn test_errors_carry_position() {
        let err = Lexer::new("x = 1\ny = \"open").tokenize().unwrap_err();
        assert_eq!(
            err,
            ScriptError::Syntax {
                line: 2,
                column: 5,
                message: "unterminated string".into()
            }
        );

        let err = Lexer::new("x = a ! b").tokenize().unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { line: 1, column: 7, .. }));

        let err = Lexer::new("x = @").tokenize().unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { column: 5, .. }));
    }
}

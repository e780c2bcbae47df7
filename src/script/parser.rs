use serde_json::Value;

use super::lexer::{Spanned, Token};
use super::ScriptError;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub target: String,
    pub pipeline: Pipeline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub source: Source,
    pub stages: Vec<Stage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Variable(String),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Where(Condition),
    Select(Vec<String>),
    Pluck(String),
    Sort { field: String, descending: bool },
    Limit(usize),
    Count,
    First,
    Distinct(String),
    CountBy(String),
    Sum(String),
    Avg(String),
    Min(String),
    Max(String),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Where(_) => "where",
            Stage::Select(_) => "select",
            Stage::Pluck(_) => "pluck",
            Stage::Sort { .. } => "sort",
            Stage::Limit(_) => "limit",
            Stage::Count => "count",
            Stage::First => "first",
            Stage::Distinct(_) => "distinct",
            Stage::CountBy(_) => "count_by",
            Stage::Sum(_) => "sum",
            Stage::Avg(_) => "avg",
            Stage::Min(_) => "min",
            Stage::Max(_) => "max",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    Not(Box<Condition>),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
}

/// Deepest nesting of `not` and parentheses a condition may use.
pub const MAX_DEPTH: usize = 64;

/// Words that cannot name a variable or a field.
const RESERVED: &[&str] = &["let", "and", "or", "not", "true", "false", "null"];

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: (usize, usize),
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>, end: (usize, usize)) -> Self {
        Self {
            tokens,
            pos: 0,
            end,
            depth: 0,
        }
    }

    pub fn parse(mut self) -> Result<Program, ScriptError> {
        let mut statements = Vec::new();

        loop {
            self.skip_separators();
            if self.peek().is_none() {
                break;
            }
            statements.push(self.statement()?);
            match self.peek() {
                None | Some(Token::Separator) => {}
                Some(_) => return Err(self.unexpected("end of statement")),
            }
        }

        Ok(Program { statements })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(ident)) if ident == word)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn skip_separators(&mut self) {
        while self.peek() == Some(&Token::Separator) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        let (line, column) = self
            .tokens
            .get(self.pos)
            .map(|s| (s.line, s.column))
            .unwrap_or(self.end);
        ScriptError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> ScriptError {
        let found = match self.peek() {
            None => "end of input".to_string(),
            Some(token) => describe(token),
        };
        self.error(format!("expected {}, found {}", expected, found))
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<(), ScriptError> {
        if self.peek() == Some(&token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn name(&mut self, expected: &str) -> Result<String, ScriptError> {
        match self.peek() {
            Some(Token::Ident(ident)) if !RESERVED.contains(&ident.as_str()) => {
                let ident = ident.clone();
                self.pos += 1;
                Ok(ident)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn statement(&mut self) -> Result<Statement, ScriptError> {
        if self.peek_ident("let") {
            self.pos += 1;
        }
        let target = self.name("a variable name")?;
        self.expect(Token::Assign, "'='")?;
        let pipeline = self.pipeline()?;
        Ok(Statement { target, pipeline })
    }

    fn pipeline(&mut self) -> Result<Pipeline, ScriptError> {
        let source = match self.peek() {
            Some(Token::Ident(ident)) if !RESERVED.contains(&ident.as_str()) => {
                Source::Variable(self.name("a source")?)
            }
            _ => Source::Literal(self.literal("a variable or literal")?),
        };

        let mut stages = Vec::new();
        while self.peek() == Some(&Token::Pipe) {
            self.pos += 1;
            stages.push(self.stage()?);
        }

        Ok(Pipeline { source, stages })
    }

    fn stage(&mut self) -> Result<Stage, ScriptError> {
        let word = match self.peek() {
            Some(Token::Ident(ident)) => ident.clone(),
            _ => return Err(self.unexpected("a stage name")),
        };

        let stage = match word.as_str() {
            "where" => {
                self.pos += 1;
                Stage::Where(self.condition()?)
            }
            "select" => {
                self.pos += 1;
                let mut fields = vec![self.name("a field name")?];
                while self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                    fields.push(self.name("a field name")?);
                }
                Stage::Select(fields)
            }
            "sort" => {
                self.pos += 1;
                let field = self.name("a field name")?;
                let descending = if self.peek_ident("desc") {
                    self.pos += 1;
                    true
                } else {
                    if self.peek_ident("asc") {
                        self.pos += 1;
                    }
                    false
                };
                Stage::Sort { field, descending }
            }
            "limit" => {
                self.pos += 1;
                match self.peek() {
                    Some(Token::Number(n)) if n.as_u64().is_some() => {
                        let n = n.as_u64().unwrap_or_default() as usize;
                        self.pos += 1;
                        Stage::Limit(n)
                    }
                    _ => return Err(self.unexpected("a non-negative integer")),
                }
            }
            "count" => {
                self.pos += 1;
                Stage::Count
            }
            "first" => {
                self.pos += 1;
                Stage::First
            }
            "pluck" | "distinct" | "count_by" | "sum" | "avg" | "min" | "max" => {
                self.pos += 1;
                let field = self.name("a field name")?;
                match word.as_str() {
                    "pluck" => Stage::Pluck(field),
                    "distinct" => Stage::Distinct(field),
                    "count_by" => Stage::CountBy(field),
                    "sum" => Stage::Sum(field),
                    "avg" => Stage::Avg(field),
                    "min" => Stage::Min(field),
                    _ => Stage::Max(field),
                }
            }
            other => return Err(self.error(format!("unknown stage '{}'", other))),
        };

        Ok(stage)
    }

    fn condition(&mut self) -> Result<Condition, ScriptError> {
        let mut terms = vec![self.and_condition()?];
        while self.peek_ident("or") {
            self.pos += 1;
            terms.push(self.and_condition()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Condition::Or(terms)
        })
    }

    fn and_condition(&mut self) -> Result<Condition, ScriptError> {
        let mut terms = vec![self.unary_condition()?];
        while self.peek_ident("and") {
            self.pos += 1;
            terms.push(self.unary_condition()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Condition::And(terms)
        })
    }

    /// Runs `parse` one nesting level deeper, failing past `MAX_DEPTH`.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ScriptError>,
    ) -> Result<T, ScriptError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!(
                "condition is nested deeper than {} levels",
                MAX_DEPTH
            )));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn unary_condition(&mut self) -> Result<Condition, ScriptError> {
        if self.peek_ident("not") {
            self.pos += 1;
            let inner = self.nested(|p| p.unary_condition())?;
            return Ok(Condition::Not(Box::new(inner)));
        }

        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.nested(|p| p.condition())?;
            self.expect(Token::RParen, "')'")?;
            return Ok(inner);
        }

        let field = self.name("a field name")?;
        let op = match self.peek() {
            Some(Token::Eq) => CompareOp::Eq,
            Some(Token::Ne) => CompareOp::Ne,
            Some(Token::Lt) => CompareOp::Lt,
            Some(Token::Le) => CompareOp::Le,
            Some(Token::Gt) => CompareOp::Gt,
            Some(Token::Ge) => CompareOp::Ge,
            Some(Token::Ident(word)) if word == "contains" => CompareOp::Contains,
            _ => return Err(self.unexpected("a comparison operator")),
        };
        self.pos += 1;
        let value = self.literal("a literal value")?;

        Ok(Condition::Compare { field, op, value })
    }

    fn literal(&mut self, expected: &str) -> Result<Value, ScriptError> {
        let value = match self.peek() {
            Some(Token::Str(s)) => Value::String(s.clone()),
            Some(Token::Number(n)) => Value::Number(n.clone()),
            Some(Token::Ident(word)) if word == "true" => Value::Bool(true),
            Some(Token::Ident(word)) if word == "false" => Value::Bool(false),
            Some(Token::Ident(word)) if word == "null" => Value::Null,
            _ => return Err(self.unexpected(expected)),
        };
        self.advance();
        Ok(value)
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Ident(ident) => format!("'{}'", ident),
        Token::Str(s) => format!("string {:?}", s),
        Token::Number(n) => format!("number {}", n),
        Token::Pipe => "'|'".to_string(),
        Token::Comma => "','".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::Assign => "'='".to_string(),
        Token::Eq => "'=='".to_string(),
        Token::Ne => "'!='".to_string(),
        Token::Lt => "'<'".to_string(),
        Token::Le => "'<='".to_string(),
        Token::Gt => "'>'".to_string(),
        Token::Ge => "'>='".to_string(),
        Token::Separator => "end of statement".to_string(),
    }
}

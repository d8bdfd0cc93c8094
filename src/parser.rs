//! Parser for the textual relational algebra syntax.
//!
//! ```text
//! statement := '\help' | '\quit' | '\list' | '\sqlexec_{SQL}' | expr
//! expr      := unary (binop unary)*
//! unary     := '\select_{COND}' unary
//!            | '\project_{LIST}' unary
//!            | '\rename_{LIST}' unary
//!            | primary
//! primary   := IDENT | '(' expr ')'
//! binop     := '\join' | '\join_{COND}' | '\cross' | '\union'
//!            | '\diff' | '\intersect'
//! ```
//!
//! Binary operators share one precedence level and associate to the left.
//! Keywords are case-insensitive. An operator parameter is the raw text
//! between `_{` and the matching `}`; nested braces must balance and braces
//! inside quoted strings are ignored. Statements are terminated by `;`,
//! which [`statement_end`] locates in a buffer.

use crate::error::RaError;

/// A complete top-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Help,
    Quit,
    List,
    /// Raw SQL to pass to the database.
    SqlExec(String),
    Expr(Expr),
}

/// A relational algebra expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Relation(String),
    Select { condition: String, input: Box<Expr> },
    Project { columns: String, input: Box<Expr> },
    Rename { columns: String, input: Box<Expr> },
    Join {
        condition: Option<String>,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Cross { left: Box<Expr>, right: Box<Expr> },
    Union { left: Box<Expr>, right: Box<Expr> },
    Diff { left: Box<Expr>, right: Box<Expr> },
    Intersect { left: Box<Expr>, right: Box<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Help,
    Quit,
    List,
    SqlExec,
    Select,
    Project,
    Rename,
    Join,
    Cross,
    Union,
    Diff,
    Intersect,
}

/// Whether a keyword takes a `_{...}` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Param {
    Forbidden,
    Optional,
    Required,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Keyword> {
        let kw = match word.to_ascii_lowercase().as_str() {
            "help" => Keyword::Help,
            "quit" => Keyword::Quit,
            "list" => Keyword::List,
            "sqlexec" => Keyword::SqlExec,
            "select" => Keyword::Select,
            "project" => Keyword::Project,
            "rename" => Keyword::Rename,
            "join" => Keyword::Join,
            "cross" => Keyword::Cross,
            "union" => Keyword::Union,
            "diff" => Keyword::Diff,
            "intersect" => Keyword::Intersect,
            _ => return None,
        };
        Some(kw)
    }

    fn param(self) -> Param {
        match self {
            Keyword::SqlExec | Keyword::Select | Keyword::Project | Keyword::Rename => {
                Param::Required
            }
            Keyword::Join => Param::Optional,
            _ => Param::Forbidden,
        }
    }

    fn is_binary(self) -> bool {
        matches!(
            self,
            Keyword::Join | Keyword::Cross | Keyword::Union | Keyword::Diff | Keyword::Intersect
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Keyword {
        keyword: Keyword,
        param: Option<String>,
    },
    Ident(String),
    LParen,
    RParen,
}

fn parse_error(offset: usize, message: impl Into<String>) -> RaError {
    RaError::ParseError {
        offset,
        message: message.into(),
    }
}

// ── Statement splitting ─────────────────────────────────────────────────

/// Byte offset of the `;` ending the first statement in `buf`, if the
/// statement is complete.
///
/// Semicolons inside an operator parameter (for example in
/// `\sqlexec_{INSERT ...; DELETE ...}`) do not end the statement.
pub fn statement_end(buf: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in buf.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') if depth > 0 => quote = Some(c),
            (None, '{') => depth += 1,
            (None, '}') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

// ── Lexer ───────────────────────────────────────────────────────────────

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, RaError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        match c {
            '(' => {
                chars.next();
                tokens.push((Token::LParen, start));
            }
            ')' => {
                chars.next();
                tokens.push((Token::RParen, start));
            }
            '\\' => {
                chars.next();
                let word_start = start + 1;
                let mut word_end = word_start;
                while let Some(&(i, c)) = chars.peek() {
                    if !c.is_ascii_alphabetic() {
                        break;
                    }
                    word_end = i + c.len_utf8();
                    chars.next();
                }
                let word = &input[word_start..word_end];
                let keyword = Keyword::lookup(word)
                    .ok_or_else(|| parse_error(start, format!("unknown operator \\{word}")))?;

                let param = if input[word_end..].starts_with("_{") {
                    let (text, end) = read_param(input, word_end + 2, start)?;
                    while chars.peek().is_some_and(|&(i, _)| i < end) {
                        chars.next();
                    }
                    Some(text)
                } else {
                    None
                };

                match (keyword.param(), &param) {
                    (Param::Required, None) => {
                        return Err(parse_error(
                            start,
                            format!("\\{word} requires a parameter: \\{word}_{{...}}"),
                        ));
                    }
                    (Param::Forbidden, Some(_)) => {
                        return Err(parse_error(
                            start,
                            format!("\\{word} does not take a parameter"),
                        ));
                    }
                    _ => {}
                }
                tokens.push((Token::Keyword { keyword, param }, start));
            }
            c if is_ident_char(c) => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if !is_ident_char(c) {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                tokens.push((Token::Ident(input[start..end].to_string()), start));
            }
            other => {
                return Err(parse_error(start, format!("unexpected character '{other}'")));
            }
        }
    }
    Ok(tokens)
}

/// Read a parameter body starting at `body_start` (just past `_{`).
///
/// Returns the trimmed text and the offset just past the closing brace.
fn read_param(
    input: &str,
    body_start: usize,
    op_offset: usize,
) -> Result<(String, usize), RaError> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    for (i, c) in input[body_start..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '{') => depth += 1,
            (None, '}') => {
                depth -= 1;
                if depth == 0 {
                    let end = body_start + i;
                    return Ok((input[body_start..end].trim().to_string(), end + 1));
                }
            }
            _ => {}
        }
    }
    Err(parse_error(op_offset, "unterminated operator parameter"))
}

// ── Parser ──────────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    /// Offset reported for errors at end of input.
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, o)| *o)
            .unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<Expr, RaError> {
        let mut left = self.unary()?;
        while let Some(Token::Keyword { keyword, param }) = self.peek() {
            if !keyword.is_binary() {
                break;
            }
            let (keyword, param) = (*keyword, param.clone());
            self.advance();
            let right = Box::new(self.unary()?);
            let left_box = Box::new(left);
            left = match keyword {
                Keyword::Join => Expr::Join {
                    condition: param,
                    left: left_box,
                    right,
                },
                Keyword::Cross => Expr::Cross {
                    left: left_box,
                    right,
                },
                Keyword::Union => Expr::Union {
                    left: left_box,
                    right,
                },
                Keyword::Diff => Expr::Diff {
                    left: left_box,
                    right,
                },
                Keyword::Intersect => Expr::Intersect {
                    left: left_box,
                    right,
                },
                other => {
                    return Err(RaError::InternalError(format!(
                        "{other:?} treated as a binary operator"
                    )));
                }
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, RaError> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Keyword {
                keyword: keyword @ (Keyword::Select | Keyword::Project | Keyword::Rename),
                param: Some(param),
            }) => {
                let input = Box::new(self.unary()?);
                Ok(match keyword {
                    Keyword::Select => Expr::Select {
                        condition: param,
                        input,
                    },
                    Keyword::Project => Expr::Project {
                        columns: param,
                        input,
                    },
                    _ => Expr::Rename {
                        columns: param,
                        input,
                    },
                })
            }
            Some(Token::Ident(name)) => Ok(Expr::Relation(name)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(parse_error(offset, "unbalanced parenthesis")),
                }
            }
            Some(Token::RParen) => Err(parse_error(offset, "unexpected ')'")),
            Some(Token::Keyword { keyword, .. }) => Err(parse_error(
                offset,
                format!("expected an expression, found {keyword:?} operator"),
            )),
            None => Err(parse_error(offset, "expected an expression")),
        }
    }
}

/// Parse one statement, without its terminating `;`.
pub fn parse_statement(input: &str) -> Result<Statement, RaError> {
    let tokens = tokenize(input)?;

    if let [(Token::Keyword { keyword, param }, _), rest @ ..] = tokens.as_slice() {
        let command = match keyword {
            Keyword::Help => Some(Statement::Help),
            Keyword::Quit => Some(Statement::Quit),
            Keyword::List => Some(Statement::List),
            Keyword::SqlExec => Some(Statement::SqlExec(param.clone().unwrap_or_default())),
            _ => None,
        };
        if let Some(command) = command {
            if let Some((_, extra)) = rest.first() {
                return Err(parse_error(*extra, "unexpected input after command"));
            }
            return Ok(command);
        }
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
    };
    let expr = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(parse_error(parser.offset(), "unexpected input after expression"));
    }
    Ok(Statement::Expr(expr))
}

/// Parse a relational algebra expression.
pub fn parse_expr(input: &str) -> Result<Expr, RaError> {
    match parse_statement(input)? {
        Statement::Expr(expr) => Ok(expr),
        other => Err(parse_error(0, format!("expected an expression, found {other:?}"))),
    }
}

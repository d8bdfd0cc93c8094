//! Interactive shell.
//!
//! Reads `;`-terminated statements from a [`LineSource`], evaluates them
//! through a [`Session`], and prints results to `out` and diagnostics to
//! `err`. Only a fatal error ends the loop early (see
//! [`RaError::is_fatal`]); every other error is reported and the next
//! statement is read.

use std::io::{self, BufRead, Write};

use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use crate::algebra::{Evaluation, Session};
use crate::db::{CommandResult, Database, QueryResult, write_columns};
use crate::error::{DbError, RaError};
use crate::parser::{Statement, parse_statement, statement_end};

const PROMPT: &str = "ra> ";
const RULE: &str = "-----";
const NULL_TEXT: &str = "<NULL>";

const HELP: &str = r#"Terminate your commands or expressions by ";"

Commands:
\help: print this message
\quit: exit ra
\list: list all relations in the database
\sqlexec_{STATEMENT}: execute SQL in the database

Relational algebra expressions:
R: relation named by R
\select_{COND} EXP: selection over an expression
\project_{ATTR_LIST} EXP: projection of an expression
EXP_1 \join EXP_2: natural join between two expressions
EXP_1 \join_{COND} EXP_2: theta-join between two expressions
EXP_1 \cross EXP_2: cross-product between two expressions
EXP_1 \union EXP_2: union between two expressions
EXP_1 \diff EXP_2: difference between two expressions
EXP_1 \intersect EXP_2: intersection between two expressions
\rename_{NEW_ATTR_NAME_LIST} EXP: rename all attributes of an expression
"#;

// ── Input ───────────────────────────────────────────────────────────────

/// Where statement text comes from.
pub trait LineSource {
    /// Next line without its terminator, or `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, RaError>;
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, RaError> {
        (**self).read_line(prompt)
    }
}

/// Words offered by tab completion.
pub const KEYWORDS: &[&str] = &[
    "\\select_{",
    "\\project_{",
    "\\join",
    "\\join_{",
    "\\cross",
    "\\union",
    "\\diff",
    "\\intersect",
    "\\rename_{",
    "\\help",
    "\\quit",
    "\\list",
    "\\sqlexec_{",
];

/// Complete the backslash word ending at `pos`.
///
/// Returns the byte offset where the word starts and the keywords it is a
/// case-insensitive prefix of. Anything that is not a backslash word gets
/// no candidates.
pub fn complete_keyword(line: &str, pos: usize) -> (usize, Vec<String>) {
    let Some(head) = line.get(..pos) else {
        return (pos, Vec::new());
    };
    let start = head
        .rfind(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | ';' | '}'))
        .map_or(0, |i| i + 1);
    let word = &head[start..];
    if !word.starts_with('\\') {
        return (pos, Vec::new());
    }
    let word = word.to_ascii_lowercase();
    let candidates = KEYWORDS
        .iter()
        .filter(|k| k.starts_with(&word))
        .map(|k| k.to_string())
        .collect();
    (start, candidates)
}

/// Tab completion over [`KEYWORDS`].
pub struct KeywordCompleter;

impl Completer for KeywordCompleter {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        Ok(complete_keyword(line, pos))
    }
}

impl Hinter for KeywordCompleter {
    type Hint = String;
}

impl Highlighter for KeywordCompleter {}

impl Validator for KeywordCompleter {}

impl Helper for KeywordCompleter {}

/// Line editor with history and keyword completion, for terminals.
pub struct EditorSource {
    editor: Editor<KeywordCompleter, DefaultHistory>,
}

impl EditorSource {
    pub fn new() -> Result<Self, RaError> {
        let mut editor =
            Editor::<KeywordCompleter, DefaultHistory>::new().map_err(readline_error)?;
        editor.set_helper(Some(KeywordCompleter));
        Ok(EditorSource { editor })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, RaError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(readline_error(e)),
        }
    }
}

fn readline_error(e: ReadlineError) -> RaError {
    match e {
        ReadlineError::Io(io) => RaError::Io(io),
        other => RaError::Io(io::Error::other(other.to_string())),
    }
}

/// Plain buffered reader, for files and pipes. Prompts are not shown.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        ReaderSource { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>, RaError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

/// Copies every line read, with its prompt, into a transcript.
pub struct EchoSource<S, W> {
    inner: S,
    transcript: W,
}

impl<S: LineSource, W: Write> EchoSource<S, W> {
    pub fn new(inner: S, transcript: W) -> Self {
        EchoSource { inner, transcript }
    }
}

impl<S: LineSource, W: Write> LineSource for EchoSource<S, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, RaError> {
        let line = self.inner.read_line(prompt)?;
        if let Some(text) = &line {
            writeln!(self.transcript, "{prompt}{text}")?;
        }
        Ok(line)
    }
}

// ── Output ──────────────────────────────────────────────────────────────

/// Writer duplicating everything into a transcript.
pub struct Tee<A, B> {
    primary: A,
    copy: B,
}

impl<A: Write, B: Write> Tee<A, B> {
    pub fn new(primary: A, copy: B) -> Self {
        Tee { primary, copy }
    }
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.primary.write(buf)?;
        self.copy.write_all(&buf[..n])?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        self.copy.flush()
    }
}

/// Print a query result: schema line, rows, and row count.
pub fn write_result(out: &mut impl Write, result: &QueryResult) -> io::Result<()> {
    let mut header = String::new();
    // Writing into a String cannot fail.
    let _ = write_columns(&mut header, &result.columns);
    writeln!(out, "Output schema: ({header})")?;
    writeln!(out, "{RULE}")?;
    for row in &result.rows {
        let line = row
            .iter()
            .map(|v| v.as_deref().unwrap_or(NULL_TEXT))
            .collect::<Vec<_>>()
            .join("|");
        writeln!(out, "{line}")?;
    }
    writeln!(out, "{RULE}")?;
    writeln!(out, "Total number of rows: {}", result.rows.len())?;
    writeln!(out)
}

fn write_db_details(err: &mut impl Write, e: &DbError) -> io::Result<()> {
    writeln!(err, "{}", e.details())
}

// ── Shell ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// The read-evaluate-print loop.
pub struct Shell<D: Database, W: Write, E: Write> {
    session: Session<D>,
    out: W,
    err: E,
    verbose: bool,
}

impl<D: Database, W: Write, E: Write> Shell<D, W, E> {
    pub fn new(session: Session<D>, out: W, err: E, verbose: bool) -> Self {
        Shell {
            session,
            out,
            err,
            verbose,
        }
    }

    pub fn session_mut(&mut self) -> &mut Session<D> {
        &mut self.session
    }

    /// Give back the output and error writers.
    pub fn into_output(self) -> (W, E) {
        (self.out, self.err)
    }

    pub fn welcome(&mut self) -> Result<(), RaError> {
        writeln!(self.out)?;
        writeln!(self.out, "RA: an interactive relational algebra interpreter")?;
        writeln!(self.out, "Version {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(self.out, "Type \"\\help;\" for help")?;
        writeln!(self.out)?;
        Ok(())
    }

    /// Read and evaluate statements until `\quit;` or end of input.
    ///
    /// Continuation lines are prompted with their line number within the
    /// pending statement (`2> `, `3> `, ...).
    pub fn run(&mut self, source: &mut impl LineSource) -> Result<(), RaError> {
        let mut pending = String::new();
        let mut line_no = 1;
        loop {
            while let Some(end) = statement_end(&pending) {
                let text = pending[..end].to_string();
                pending.drain(..=end);
                if text.trim().is_empty() {
                    continue;
                }
                let outcome = self.execute(&text);
                if self.recover(outcome)? == Some(Flow::Quit) {
                    return self.bye();
                }
            }
            if pending.trim().is_empty() {
                pending.clear();
                line_no = 1;
            }

            let prompt = if line_no == 1 {
                PROMPT.to_string()
            } else {
                format!("{line_no}> ")
            };
            let read = source.read_line(&prompt);
            match self.recover(read)? {
                None => {}
                Some(Some(line)) => {
                    pending.push_str(&line);
                    pending.push('\n');
                    line_no += 1;
                }
                Some(None) => {
                    if !pending.trim().is_empty() {
                        log::warn!("discarding unterminated statement at end of input");
                        writeln!(self.err, "Error parsing input:")?;
                        writeln!(self.err, "statement not terminated by \";\"")?;
                        writeln!(self.err)?;
                    }
                    return self.bye();
                }
            }
        }
    }

    /// Report a non-fatal error and carry on; pass fatal ones up.
    fn recover<T>(&mut self, result: Result<T, RaError>) -> Result<Option<T>, RaError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                log::warn!("recovered from {} error: {e}", e.kind());
                writeln!(self.err, "{e}")?;
                writeln!(self.err)?;
                Ok(None)
            }
        }
    }

    fn bye(&mut self) -> Result<(), RaError> {
        writeln!(self.out, "Bye!")?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    /// Evaluate one statement (without its `;`).
    fn execute(&mut self, text: &str) -> Result<Flow, RaError> {
        let statement = match parse_statement(text) {
            Ok(statement) => statement,
            Err(e) => {
                writeln!(self.err, "Error parsing input:")?;
                writeln!(self.err, "{e}")?;
                writeln!(self.err, "Rest of input skipped")?;
                writeln!(self.err)?;
                return Ok(Flow::Continue);
            }
        };

        match statement {
            Statement::Quit => return Ok(Flow::Quit),
            Statement::Help => writeln!(self.out, "{HELP}")?,
            Statement::List => self.list()?,
            Statement::SqlExec(sql) => self.sql_exec(&sql)?,
            Statement::Expr(expr) => {
                let evaluation = self.session.evaluate(&expr);
                self.report(evaluation)?;
            }
        }
        self.out.flush()?;
        Ok(Flow::Continue)
    }

    fn list(&mut self) -> Result<(), RaError> {
        match self.session.list_relations() {
            Ok(names) => {
                writeln!(self.out, "{RULE}")?;
                for name in &names {
                    writeln!(self.out, "{name}")?;
                }
                writeln!(self.out, "{RULE}")?;
                writeln!(self.out, "Total of {} table(s) found.", names.len())?;
                writeln!(self.out)?;
            }
            Err(e) => {
                writeln!(
                    self.err,
                    "Unexpected error obtaining list of tables from database"
                )?;
                write_db_details(&mut self.err, &e)?;
                writeln!(self.err)?;
            }
        }
        Ok(())
    }

    fn sql_exec(&mut self, sql: &str) -> Result<(), RaError> {
        let results = self.session.exec_commands(sql);
        for (i, result) in results.iter().enumerate() {
            let n = i + 1;
            match result {
                Ok(CommandResult::Rows(table)) => {
                    writeln!(self.out, "*** Result {n} is a table:")?;
                    write_result(&mut self.out, table)?;
                }
                Ok(CommandResult::UpdateCount(count)) => {
                    writeln!(self.out, "*** Result {n} is an update count of {count}")?;
                }
                Err(e) => {
                    writeln!(self.out, "*** Result {n} is an error: {e}")?;
                }
            }
        }
        Ok(())
    }

    fn report(&mut self, evaluation: Evaluation) -> Result<(), RaError> {
        let Evaluation {
            parsed_tree,
            validated_tree,
            error_tree,
            result,
            cleanup_errors,
        } = evaluation;

        if self.verbose {
            writeln!(self.out, "Parsed query:")?;
            write!(self.out, "{parsed_tree}")?;
            writeln!(self.out, "=====")?;
            if let Some(tree) = &validated_tree {
                writeln!(self.out, "Validated query:")?;
                write!(self.out, "{tree}")?;
                writeln!(self.out, "=====")?;
            }
        }

        match result {
            Ok(table) => write_result(&mut self.out, &table)?,
            Err(e @ RaError::Validation { .. }) => {
                writeln!(self.err, "Error validating subquery:")?;
                if let Some(tree) = &error_tree {
                    write!(self.err, "{tree}")?;
                }
                match e.db_error() {
                    Some(db) => write_db_details(&mut self.err, db)?,
                    None => {
                        if let RaError::Validation { reason, .. } = &e {
                            writeln!(self.err, "{reason}")?;
                        }
                    }
                }
                writeln!(self.err)?;
            }
            Err(RaError::Execution(db)) => {
                writeln!(self.err, "Unexpected error executing validated query:")?;
                write_db_details(&mut self.err, &db)?;
                writeln!(self.err)?;
            }
            Err(e) => {
                writeln!(self.err, "Error evaluating query:")?;
                if let Some(tree) = &error_tree {
                    write!(self.err, "{tree}")?;
                }
                writeln!(self.err, "{e}")?;
                writeln!(self.err)?;
            }
        }

        for e in &cleanup_errors {
            writeln!(self.err, "Unexpected error cleaning up query")?;
            match e.db_error() {
                Some(db) => write_db_details(&mut self.err, db)?,
                None => writeln!(self.err, "{e}")?,
            }
            writeln!(self.err)?;
        }
        Ok(())
    }
}

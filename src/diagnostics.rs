//! User-facing diagnostics
//!
//! A [`Diagnostic`] is one recoverable syntax or semantic error. The driver
//! collects them in `(line, column)` order; [`Diagnostic::render`] formats
//! one as
//!
//! ```text
//! demo.pas:3:5: type error: cannot assign boolean to 'x' of type integer
//!     x := 1 < 2
//!     ^
//! ```
//!
//! with `error` in bold red when color is enabled.

use crate::parser::ast::SourceLocation;
use crate::parser::SyntaxError;
use crate::semantic::SemanticError;
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Syntax(SyntaxError),
    Semantic(SemanticError),
}

impl Diagnostic {
    /// Merge both error lists into one, ordered by source position.
    pub fn collect(syntax: Vec<SyntaxError>, semantic: Vec<SemanticError>) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = syntax
            .into_iter()
            .map(Diagnostic::Syntax)
            .chain(semantic.into_iter().map(Diagnostic::Semantic))
            .collect();
        diagnostics.sort_by_key(Diagnostic::location);
        diagnostics
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            Diagnostic::Syntax(err) => err.location(),
            Diagnostic::Semantic(err) => err.location(),
        }
    }

    /// Short category shown before `error`, e.g. `syntax` or `type`.
    pub fn kind(&self) -> String {
        match self {
            Diagnostic::Syntax(_) => "syntax".to_string(),
            Diagnostic::Semantic(err) => err.kind().to_string(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Diagnostic::Syntax(err) => err.message.clone(),
            Diagnostic::Semantic(err) => err.to_string(),
        }
    }

    /// Header line, offending source line and a caret under the column.
    pub fn render(&self, file: &str, source: &str, color: bool) -> String {
        let location = self.location();
        let label = if color {
            "error".red().bold().to_string()
        } else {
            "error".to_string()
        };
        let mut out = format!(
            "{}:{}:{}: {} {}: {}\n",
            file,
            location.line,
            location.column,
            self.kind(),
            label,
            self.message()
        );

        if let Some(text) = location
            .line
            .checked_sub(1)
            .and_then(|index| source.lines().nth(index))
        {
            // Keep tabs so the caret lines up with the source
            let padding: String = text
                .chars()
                .take(location.column.saturating_sub(1))
                .map(|c| if c == '\t' { '\t' } else { ' ' })
                .collect();
            let caret = if color {
                "^".red().bold().to_string()
            } else {
                "^".to_string()
            };
            out.push_str(&format!("    {}\n    {}{}\n", text, padding, caret));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self.location();
        write!(
            f,
            "{}:{}: {} error: {}",
            location.line,
            location.column,
            self.kind(),
            self.message()
        )
    }
}

/// Color is used only on a terminal and never when `NO_COLOR` is set.
pub fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_tty()
}

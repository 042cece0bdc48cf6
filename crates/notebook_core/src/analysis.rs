//! Line-classification engine behind the code-language handlers.
//!
//! Nothing here executes anything. A [`LanguageProfile`] is a rule table;
//! running a cell through it scans the source line by line, recognizes a
//! small fixed set of shapes (output calls, assignments, imports,
//! definitions) and synthesizes a deterministic textual report. The only
//! fallible step is the denylist scan at the front; every other step is
//! plain string matching and cannot fail.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::language::Language;

/// Outcome of pushing one cell's source through a handler.
///
/// Invariant: `error` is present iff `success` is false, and `output` is
/// never empty — on rejection it carries the simulated traceback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    pub execution_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub language: Language,
}

/// Line-shape condition used by [`LineRule`] and [`Counter`].
#[derive(Debug, Clone)]
pub enum Trigger {
    StartsWithAny(&'static [&'static str]),
    Contains(&'static str),
}

impl Trigger {
    fn matches(&self, line: &str) -> bool {
        match self {
            Trigger::StartsWithAny(prefixes) => prefixes.iter().any(|p| line.starts_with(p)),
            Trigger::Contains(needle) => line.contains(needle),
        }
    }
}

/// One recognizer in a language's classification table. Rules run in table
/// order against each trimmed line and the first rule whose condition
/// matches consumes the line, whether or not it emits an output line.
#[derive(Debug)]
pub enum LineRule {
    /// print/cat/println call; the captured argument is echoed with quote
    /// characters stripped. A line that matches the trigger but not the
    /// pattern (e.g. an unclosed call) emits nothing.
    OutputCall {
        trigger: Trigger,
        pattern: Regex,
        group: usize,
    },
    /// `name <op> value`; emits `<name><suffix>` when the left-hand side is a
    /// single bare token.
    Assignment {
        operator: &'static str,
        comment_prefix: Option<&'static str>,
        suffix: &'static str,
    },
    /// `val`/`var` binding with an `=`; emits `<name>: defined`.
    Binding { keywords: &'static [&'static str] },
    /// import/from statement; echoes the whole line behind a check mark.
    Import { prefixes: &'static [&'static str] },
    /// `library(<pkg>)`; echoes the call behind a check mark.
    LibraryLoad { pattern: Regex },
    /// Data-inspection call (`summary(`, `head(`, ...); reports the function
    /// name in front of the first parenthesis.
    InspectCall { needles: &'static [&'static str] },
    /// `def`/`class`/`object` definition; emits `<label> <name>: defined`.
    Definition {
        keyword: &'static str,
        pattern: Regex,
        label: &'static str,
    },
}

impl LineRule {
    fn matches(&self, line: &str) -> bool {
        match self {
            LineRule::OutputCall { trigger, .. } => trigger.matches(line),
            LineRule::Assignment {
                operator,
                comment_prefix,
                ..
            } => {
                line.contains(operator)
                    && comment_prefix.map_or(true, |prefix| !line.starts_with(prefix))
            }
            LineRule::Binding { keywords } => keywords.iter().any(|k| line.starts_with(k)),
            LineRule::Import { prefixes } => prefixes.iter().any(|p| line.starts_with(p)),
            LineRule::LibraryLoad { .. } => line.starts_with("library("),
            LineRule::InspectCall { needles } => needles.iter().any(|n| line.contains(n)),
            LineRule::Definition { keyword, .. } => line.starts_with(keyword),
        }
    }

    fn emit(&self, line: &str) -> Option<String> {
        match self {
            LineRule::OutputCall { pattern, group, .. } => {
                let caps = pattern.captures(line)?;
                Some(strip_quotes(caps.get(*group)?.as_str()))
            }
            LineRule::Assignment {
                operator, suffix, ..
            } => {
                let name = line.split(operator).next().unwrap_or("").trim();
                if name.is_empty() || name.contains(' ') {
                    return None;
                }
                Some(format!("{name}{suffix}"))
            }
            LineRule::Binding { keywords } => {
                let mut parts = line.splitn(2, '=');
                let head = parts.next().unwrap_or("");
                parts.next()?;
                let mut name = head.to_string();
                for keyword in keywords.iter() {
                    name = name.replace(keyword, "");
                }
                Some(format!("{}: defined", name.trim()))
            }
            LineRule::Import { .. } => Some(format!("✓ {line}")),
            LineRule::LibraryLoad { pattern } => {
                let caps = pattern.captures(line)?;
                Some(format!("✓ library({})", caps.get(1)?.as_str()))
            }
            LineRule::InspectCall { .. } => {
                let head = line.split('(').next().unwrap_or("");
                Some(format!("Function called: {head}"))
            }
            LineRule::Definition { pattern, label, .. } => {
                let caps = pattern.captures(line)?;
                Some(format!("{label} {}: defined", caps.get(1)?.as_str()))
            }
        }
    }
}

/// Summary counter reported in the analysis header when nonzero.
#[derive(Debug, Clone)]
pub struct Counter {
    pub label: &'static str,
    pub trigger: CounterTrigger,
}

#[derive(Debug, Clone)]
pub enum CounterTrigger {
    TrimStartsWithAny(&'static [&'static str]),
    Contains(&'static str),
}

impl CounterTrigger {
    fn matches(&self, line: &str) -> bool {
        match self {
            CounterTrigger::TrimStartsWithAny(prefixes) => {
                prefixes.iter().any(|p| line.trim().starts_with(p))
            }
            CounterTrigger::Contains(needle) => line.contains(needle),
        }
    }
}

/// Shape of the synthesized failure text produced on a denylist rejection.
#[derive(Debug, Clone)]
pub struct TracebackStyle {
    pub banner: &'static str,
    /// Python-style frame with a `File "<notebook>"` line and deeper indent.
    pub file_frame: bool,
}

impl TracebackStyle {
    fn render(&self, source: &str, error: &str) -> String {
        let first_line = source.split('\n').next().unwrap_or("");
        if self.file_frame {
            format!(
                "Error: {error}\n\n{}\n  File \"<notebook>\", line 1\n    {first_line}\n    ^\nError: {error}",
                self.banner
            )
        } else {
            format!(
                "Error: {error}\n\n{}\n  {first_line}\n  ^\nError: {error}",
                self.banner
            )
        }
    }
}

/// Everything that distinguishes one code-language handler from another.
#[derive(Debug)]
pub struct LanguageProfile {
    pub language: Language,
    pub display_name: &'static str,
    pub denylist: &'static [&'static str],
    pub denial_message: &'static str,
    pub rules: Vec<LineRule>,
    pub counters: Vec<Counter>,
    pub fallback: [&'static str; 3],
    pub closing_notes: [&'static str; 2],
    pub traceback: TracebackStyle,
}

/// Run one cell's source through a profile and assemble the full report.
///
/// Deterministic for a given source text: only `timestamp` and
/// `execution_time_ms` vary between calls.
#[tracing::instrument(skip_all, fields(language = %profile.language))]
pub fn analyze(profile: &LanguageProfile, code: &str) -> ExecutionResult {
    let started = Instant::now();
    let trimmed = code.trim();

    // Plain substring scan, case-sensitive, no tokenization: a forbidden
    // token inside a string literal or comment still rejects the cell.
    if let Some(needle) = profile.denylist.iter().find(|n| trimmed.contains(*n)) {
        tracing::warn!(token = *needle, "cell rejected by denylist");
        let error = profile.denial_message.to_string();
        return ExecutionResult {
            success: false,
            output: profile.traceback.render(code, &error),
            error: Some(error),
            execution_time_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
            language: profile.language,
        };
    }

    let code_lines: Vec<&str> = trimmed.split('\n').collect();
    let mut output_lines: Vec<String> = Vec::new();
    for line in &code_lines {
        let line = line.trim();
        if let Some(rule) = profile.rules.iter().find(|r| r.matches(line)) {
            if let Some(emitted) = rule.emit(line) {
                output_lines.push(emitted);
            }
        }
    }

    if output_lines.is_empty() {
        output_lines.extend(profile.fallback.iter().map(|s| s.to_string()));
    }

    let mut report = vec![
        format!("=== {} Code Analysis ===", profile.display_name),
        format!("Lines of code: {}", code_lines.len()),
    ];
    for counter in &profile.counters {
        let count = code_lines.iter().filter(|l| counter.trigger.matches(l)).count();
        if count > 0 {
            report.push(format!("{}: {}", counter.label, count));
        }
    }
    report.push(String::new());
    report.push("=== Output ===".to_string());
    report.push(output_lines.join("\n"));
    report.push(String::new());
    report.extend(profile.closing_notes.iter().map(|s| s.to_string()));

    ExecutionResult {
        success: true,
        output: report.join("\n"),
        error: None,
        execution_time_ms: started.elapsed().as_millis() as u64,
        timestamp: Utc::now(),
        language: profile.language,
    }
}

fn strip_quotes(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, '\'' | '"' | '`')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_quotes_removes_all_quote_kinds() {
        assert_eq!(strip_quotes("'a' + \"b\" + `c`"), "a + b + c");
    }

    #[test]
    fn traceback_uses_first_line_of_raw_source() {
        let style = TracebackStyle {
            banner: "Error in eval (simulated):",
            file_frame: false,
        };
        let text = style.render("x\ny", "nope");
        assert_eq!(text, "Error: nope\n\nError in eval (simulated):\n  x\n  ^\nError: nope");
    }
}

//! Static discovery of the command-line flags a server script declares.
//!
//! Scripts are scanned for `add_argument(...)` calls without being run.
//! Flags are a call's string-literal positional arguments; options are its
//! `key=value` arguments, kept as written in the source.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const CALL_PATTERN: &str = r"\.add_argument\s*\(";

const TOKEN_PATTERN: &str = concat!(
    r#"(?P<string>[rRbBuUfF]{0,2}(?:"""(?s:.*?)"""|'''(?s:.*?)'''|"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'))"#,
    r"|(?P<open>[(\[{])",
    r"|(?P<close>[)\]}])",
    r"|(?P<comma>,)",
    r"|(?P<comment>#[^\n]*)",
    r#"|(?P<other>[^\s"'()\[\]{},#]+)"#,
);

const KEYWORD_PATTERN: &str = r"(?s)^([A-Za-z_][A-Za-z0-9_]*)\s*=([^=].*)$";

/// One declared command-line argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliArgument {
    /// Names and aliases, e.g. `["-s", "--seed"]` or `["port"]`
    pub flags: Vec<String>,
    /// Keyword settings such as `type`, `default` or `help`, as source text
    pub options: BTreeMap<String, String>,
}

impl CliArgument {
    /// The long `--name` of the argument, when it has one.
    ///
    /// This is the key to pass to [`StartOptions::arg`](crate::StartOptions::arg).
    pub fn long_name(&self) -> Option<&str> {
        self.flags.iter().find_map(|flag| flag.strip_prefix("--"))
    }
}

/// A top-level argument of one call.
struct CallPart<'a> {
    text: &'a str,
    is_string: bool,
}

/// Tokenizer and matchers compiled once per scan.
struct Scanner {
    call: Regex,
    token: Regex,
    keyword: Regex,
}

impl Scanner {
    fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::ScriptParse(e.to_string()))
        };
        Ok(Self {
            call: compile(CALL_PATTERN)?,
            token: compile(TOKEN_PATTERN)?,
            keyword: compile(KEYWORD_PATTERN)?,
        })
    }

    /// Splits the argument list starting at `from` (just past the opening
    /// parenthesis). Returns the parts and the offset past the closing one.
    fn split_call<'a>(&self, source: &'a str, from: usize) -> Option<(Vec<CallPart<'a>>, usize)> {
        let mut parts = Vec::new();
        let mut depth = 0usize;
        let mut span: Option<(usize, usize)> = None;
        let mut tokens = 0usize;
        let mut is_string = false;

        for caps in self.token.captures_iter(&source[from..]) {
            let Some(whole) = caps.get(0) else { continue };
            let (start, end) = (from + whole.start(), from + whole.end());

            if caps.name("comment").is_some() {
                continue;
            }
            if caps.name("close").is_some() && depth == 0 {
                push_part(&mut parts, source, span.take(), tokens, is_string);
                return Some((parts, end));
            }
            if caps.name("comma").is_some() && depth == 0 {
                push_part(&mut parts, source, span.take(), tokens, is_string);
                tokens = 0;
                continue;
            }

            if caps.name("open").is_some() {
                depth += 1;
            } else if caps.name("close").is_some() {
                depth -= 1;
            }
            is_string = caps.name("string").is_some();
            tokens += 1;
            span = Some((span.map_or(start, |(s, _)| s), end));
        }

        None
    }

    fn argument(&self, parts: &[CallPart<'_>]) -> Option<CliArgument> {
        let mut flags = Vec::new();
        let mut options = BTreeMap::new();

        for part in parts {
            if part.is_string {
                flags.push(unquote(part.text).to_string());
            } else if let Some(caps) = self.keyword.captures(part.text) {
                options.insert(caps[1].to_string(), caps[2].trim().to_string());
            }
        }

        if flags.is_empty() {
            return None;
        }
        Some(CliArgument { flags, options })
    }
}

/// Every `add_argument(...)` call in `source` that names at least one flag,
/// in source order.
///
/// # Errors
///
/// Returns [`Error::ScriptParse`] when a call is never closed.
///
/// # Examples
///
/// ```
/// use mcp_server_manager::server::inspect::scan_arguments;
///
/// let source = r#"parser.add_argument("--seed", type=int, help="Random seed")"#;
/// let arguments = scan_arguments(source).unwrap();
///
/// assert_eq!(arguments[0].flags, vec!["--seed"]);
/// assert_eq!(arguments[0].options["type"], "int");
/// assert_eq!(arguments[0].long_name(), Some("seed"));
/// ```
pub fn scan_arguments(source: &str) -> Result<Vec<CliArgument>> {
    let scanner = Scanner::new()?;
    let mut arguments = Vec::new();
    let mut resume = 0;

    while let Some(call) = scanner.call.find_at(source, resume) {
        if is_commented(source, call.start()) {
            resume = call.end();
            continue;
        }

        let (parts, end) = scanner.split_call(source, call.end()).ok_or_else(|| {
            Error::ScriptParse(format!(
                "unterminated add_argument call on line {}",
                line_of(source, call.start())
            ))
        })?;
        resume = end;

        if let Some(argument) = scanner.argument(&parts) {
            arguments.push(argument);
        }
    }

    Ok(arguments)
}

fn push_part<'a>(
    parts: &mut Vec<CallPart<'a>>,
    source: &'a str,
    span: Option<(usize, usize)>,
    tokens: usize,
    is_string: bool,
) {
    if let Some((start, end)) = span {
        parts.push(CallPart {
            text: source[start..end].trim(),
            is_string: is_string && tokens == 1,
        });
    }
}

fn is_commented(source: &str, pos: usize) -> bool {
    let line_start = source[..pos].rfind('\n').map_or(0, |i| i + 1);
    source[line_start..pos].contains('#')
}

fn line_of(source: &str, pos: usize) -> usize {
    source[..pos].matches('\n').count() + 1
}

fn unquote(literal: &str) -> &str {
    let body = literal.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in [r#"""""#, "'''", "\"", "'"] {
        if let Some(inner) = body
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANDOM_SERVER: &str = r#"import argparse

parser = argparse.ArgumentParser(description="Random numbers (MCP)")
parser.add_argument("port", type=int, help="Port number, e.g. 8765")
parser.add_argument(
    "-s", "--seed",
    type=int,
    default=None,
    help="Optional random seed (for reproducibility)",
)
parser.add_argument('--mode', choices=["fast", "slow"], default='fast')  # modes, see docs
# parser.add_argument("--legacy")
parser.add_argument(*dynamic_flags)
args = parser.parse_args()
"#;

    #[test]
    fn test_scan_arguments() {
        let arguments = scan_arguments(RANDOM_SERVER).unwrap();
        assert_eq!(arguments.len(), 3);

        assert_eq!(arguments[0].flags, vec!["port"]);
        assert_eq!(arguments[0].options["type"], "int");
        assert_eq!(arguments[0].options["help"], r#""Port number, e.g. 8765""#);
        assert_eq!(arguments[0].long_name(), None);

        assert_eq!(arguments[1].flags, vec!["-s", "--seed"]);
        assert_eq!(arguments[1].options["default"], "None");
        assert_eq!(
            arguments[1].options["help"],
            r#""Optional random seed (for reproducibility)""#
        );
        assert_eq!(arguments[1].long_name(), Some("seed"));

        assert_eq!(arguments[2].flags, vec!["--mode"]);
        assert_eq!(arguments[2].options["choices"], r#"["fast", "slow"]"#);
        assert_eq!(arguments[2].options["default"], "'fast'");
    }

    #[test]
    fn test_scan_without_argparse() {
        let source = "import sys\nport = int(sys.argv[1])\n";
        assert!(scan_arguments(source).unwrap().is_empty());
    }

    #[test]
    fn test_nested_calls_and_comparisons() {
        let source = "p.add_argument('--n', a == b, type=lambda s: max(int(s), 1), required=x == y)\n";
        let arguments = scan_arguments(source).unwrap();

        assert_eq!(arguments[0].flags, vec!["--n"]);
        assert_eq!(arguments[0].options.len(), 2);
        assert_eq!(arguments[0].options["type"], "lambda s: max(int(s), 1)");
        assert_eq!(arguments[0].options["required"], "x == y");
    }

    #[test]
    fn test_unterminated_call() {
        let source = "import argparse\n\nparser.add_argument('--seed', type=int\n";
        match scan_arguments(source) {
            Err(Error::ScriptParse(message)) => {
                assert_eq!(message, "unterminated add_argument call on line 3")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""--seed""#), "--seed");
        assert_eq!(unquote("'-s'"), "-s");
        assert_eq!(unquote(r#"r"""--raw""""#), "--raw");
    }
}

//! Content gate for submitted source
//!
//! Scans source text against a per-language denylist before anything is
//! written or spawned.
//!
//! This is a best-effort textual filter, **not** a security boundary. The
//! search runs over the raw text, so a denylisted name inside a comment or
//! string literal is rejected too, while string concatenation, alternate
//! APIs or encoding tricks get through. Code that passes the gate still runs
//! with the full privileges of the service user.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::config::Language;

/// Rejection reported by [`validate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("import of '{token}' is not allowed")]
pub struct GateRejection {
    pub language: Language,
    pub token: &'static str,
}

const PYTHON_DENYLIST: &[&str] = &[
    "os",
    "sys",
    "subprocess",
    "socket",
    "shutil",
    "ctypes",
    "multiprocessing",
    "threading",
];

const JAVASCRIPT_DENYLIST: &[&str] = &[
    "fs",
    "child_process",
    "os",
    "net",
    "http",
    "https",
    "dgram",
    "dns",
    "tls",
    "repl",
    "vm",
    "worker_threads",
];

const GO_DENYLIST: &[&str] = &["os", "os/exec", "syscall", "net", "net/http", "unsafe"];

const JAVA_DENYLIST: &[&str] = &[
    "java.io",
    "java.net",
    "java.lang.reflect",
    "java.lang.Runtime",
    "java.lang.System",
    "java.lang.ProcessBuilder",
    "java.lang.Thread",
];

const C_DENYLIST: &[&str] = &[
    "<sys/types.h>",
    "<sys/socket.h>",
    "<netdb.h>",
    "<arpa/inet.h>",
    "<netinet/in.h>",
    "<unistd.h>",
    "<stdio.h>",
    "<stdlib.h>",
    "<process.h>",
    "<windows.h>",
    "<winsock2.h>",
    "<ws2tcpip.h>",
];

/// A denylisted token and the pattern that finds it
#[derive(Debug)]
struct Rule {
    token: &'static str,
    pattern: Regex,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Identifier-like tokens only match whole words so `os` does not hit `pos`
fn token_pattern(token: &str) -> String {
    let escaped = regex::escape(token);
    let starts_word = token.chars().next().is_some_and(is_word_char);
    let ends_word = token.chars().last().is_some_and(is_word_char);
    match (starts_word, ends_word) {
        (true, true) => format!(r"\b{escaped}\b"),
        (true, false) => format!(r"\b{escaped}"),
        (false, true) => format!(r"{escaped}\b"),
        (false, false) => escaped,
    }
}

fn compile_rules(tokens: &'static [&'static str]) -> Vec<Rule> {
    tokens
        .iter()
        .map(|&token| Rule {
            token,
            pattern: Regex::new(&token_pattern(token)).expect("escaped token should compile"),
        })
        .collect()
}

static PYTHON_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| compile_rules(PYTHON_DENYLIST));
static JAVASCRIPT_RULES: LazyLock<Vec<Rule>> =
    LazyLock::new(|| compile_rules(JAVASCRIPT_DENYLIST));
static GO_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| compile_rules(GO_DENYLIST));
static JAVA_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| compile_rules(JAVA_DENYLIST));
static C_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| compile_rules(C_DENYLIST));

fn rules(language: Language) -> &'static [Rule] {
    match language {
        Language::Python => &PYTHON_RULES,
        Language::JavaScript => &JAVASCRIPT_RULES,
        Language::Go => &GO_RULES,
        Language::Java => &JAVA_RULES,
        Language::C | Language::Cpp => &C_RULES,
    }
}

/// The ordered denylist for a language
pub fn denylist(language: Language) -> &'static [&'static str] {
    match language {
        Language::Python => PYTHON_DENYLIST,
        Language::JavaScript => JAVASCRIPT_DENYLIST,
        Language::Go => GO_DENYLIST,
        Language::Java => JAVA_DENYLIST,
        Language::C | Language::Cpp => C_DENYLIST,
    }
}

/// Check `code` against the denylist for `language`
///
/// Rules are tried in list order and the first one found anywhere in the
/// text is reported.
pub fn validate(language: Language, code: &str) -> Result<(), GateRejection> {
    match rules(language)
        .iter()
        .find(|rule| rule.pattern.is_match(code))
    {
        Some(rule) => Err(GateRejection {
            language,
            token: rule.token,
        }),
        None => Ok(()),
    }
}

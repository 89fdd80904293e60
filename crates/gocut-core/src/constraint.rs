//! Build constraints deciding which files of a directory are compiled
//!
//! A file takes part in a build when its name carries no `_GOOS`, `_GOARCH`
//! or `_GOOS_GOARCH` suffix for another target and its `//go:build` line (or
//! legacy `// +build` lines) evaluates to true for the target.

use std::env;

use tracing::debug;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed build constraint '{line}': {reason}")]
pub struct ConstraintError {
    pub line: String,
    pub reason: String,
}

/// Operating system, architecture and tags a package is loaded for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    pub goos: String,
    pub goarch: String,
    pub cgo: bool,
    /// Tags passed with `-tags`.
    pub tags: Vec<String>,
}

impl BuildTarget {
    pub fn new(goos: &str, goarch: &str) -> Self {
        Self {
            goos: goos.to_string(),
            goarch: goarch.to_string(),
            cgo: false,
            tags: Vec::new(),
        }
    }

    /// The machine gocut runs on, in Go's spelling.
    pub fn host() -> Self {
        let goos = match env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let goarch = match env::consts::ARCH {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
            "powerpc64" => "ppc64",
            "loongarch64" => "loong64",
            other => other,
        };
        let mut target = Self::new(goos, goarch);
        target.cgo = true;
        target
    }

    /// The host target, overridden by `GOOS`, `GOARCH`, `CGO_ENABLED` and
    /// the `-tags` flag of `GOFLAGS` the way the go command reads them.
    pub fn from_env() -> Self {
        let mut target = Self::host();
        let host = target.clone();
        if let Some(goos) = env::var("GOOS").ok().filter(|v| !v.is_empty()) {
            target.goos = goos;
        }
        if let Some(goarch) = env::var("GOARCH").ok().filter(|v| !v.is_empty()) {
            target.goarch = goarch;
        }
        target.cgo = match env::var("CGO_ENABLED").ok().as_deref() {
            Some("1") => true,
            Some("0") => false,
            _ => target.goos == host.goos && target.goarch == host.goarch,
        };
        if let Ok(flags) = env::var("GOFLAGS") {
            target.tags = tags_from_goflags(&flags);
        }
        debug!(goos = %target.goos, goarch = %target.goarch, cgo = target.cgo, "build target");
        target
    }

    pub fn matches_tag(&self, tag: &str) -> bool {
        if self.tags.iter().any(|t| t == tag) {
            return true;
        }
        match tag {
            "gc" => true,
            "cgo" => self.cgo,
            "unix" => UNIX_OS.contains(&self.goos.as_str()),
            "linux" => self.goos == "linux" || self.goos == "android",
            "solaris" => self.goos == "solaris" || self.goos == "illumos",
            "darwin" => self.goos == "darwin" || self.goos == "ios",
            _ if is_release_tag(tag) => true,
            _ => tag == self.goos || tag == self.goarch,
        }
    }

    /// Applies the `name_GOOS_GOARCH.go` convention. The part before the
    /// first underscore never constrains, so `linux.go` builds everywhere.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        let stem = file_name.strip_suffix(".go").unwrap_or(file_name);
        let stem = stem.strip_suffix("_test").unwrap_or(stem);
        let Some((_, suffix)) = stem.split_once('_') else {
            return true;
        };

        let parts: Vec<&str> = suffix.split('_').collect();
        match parts.as_slice() {
            [.., os, arch] if KNOWN_OS.contains(os) && KNOWN_ARCH.contains(arch) => {
                self.matches_tag(os) && self.matches_tag(arch)
            }
            [.., last] if KNOWN_OS.contains(last) || KNOWN_ARCH.contains(last) => {
                self.matches_tag(last)
            }
            _ => true,
        }
    }

    /// Evaluates the constraint lines above the package clause. A
    /// `//go:build` line takes precedence over `// +build` lines.
    pub fn matches_source(&self, source: &str) -> Result<bool, ConstraintError> {
        let header: Vec<&str> = source
            .lines()
            .map(str::trim)
            .take_while(|line| !line.starts_with("package "))
            .filter(|line| line.starts_with("//"))
            .collect();

        if let Some(expr) = header
            .iter()
            .find_map(|line| line.strip_prefix("//go:build"))
            .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            return ExprParser::new(expr.trim(), self).parse();
        }

        Ok(header
            .iter()
            .filter_map(|line| line.strip_prefix("//").map(str::trim))
            .filter_map(|line| line.strip_prefix("+build"))
            .all(|line| self.matches_plus_build(line)))
    }

    /// Space separated options are alternatives; comma separated terms
    /// must all hold.
    fn matches_plus_build(&self, line: &str) -> bool {
        line.split_whitespace().any(|option| {
            option.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !self.matches_tag(tag),
                None => self.matches_tag(term),
            })
        })
    }
}

fn is_release_tag(tag: &str) -> bool {
    tag.strip_prefix("go1.")
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

fn tags_from_goflags(flags: &str) -> Vec<String> {
    let mut words = flags.split_whitespace();
    let mut tags = Vec::new();
    while let Some(word) = words.next() {
        let value = match word.strip_prefix("-tags").or_else(|| word.strip_prefix("--tags")) {
            Some(rest) if rest.starts_with('=') => rest[1..].to_string(),
            Some("") => words.next().unwrap_or_default().to_string(),
            _ => continue,
        };
        tags.extend(
            value
                .split(',')
                .filter(|tag| !tag.is_empty())
                .map(str::to_string),
        );
    }
    tags
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Tag(&'a str),
    Not,
    And,
    Or,
    Open,
    Close,
}

/// Recursive descent over `||`, `&&`, `!` and parentheses.
struct ExprParser<'a, 't> {
    line: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    target: &'t BuildTarget,
}

impl<'a, 't> ExprParser<'a, 't> {
    fn new(line: &'a str, target: &'t BuildTarget) -> Self {
        Self {
            line,
            tokens: Vec::new(),
            pos: 0,
            target,
        }
    }

    fn parse(mut self) -> Result<bool, ConstraintError> {
        self.tokens = self.tokenize()?;
        if self.tokens.is_empty() {
            return Err(self.error("empty expression"));
        }
        let value = self.or()?;
        if self.pos != self.tokens.len() {
            return Err(self.error("unexpected token"));
        }
        Ok(value)
    }

    fn tokenize(&self) -> Result<Vec<Token<'a>>, ConstraintError> {
        let line = self.line;
        let bytes = line.as_bytes();
        let mut tokens = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b' ' | b'\t' => i += 1,
                b'!' => {
                    tokens.push(Token::Not);
                    i += 1;
                }
                b'(' => {
                    tokens.push(Token::Open);
                    i += 1;
                }
                b')' => {
                    tokens.push(Token::Close);
                    i += 1;
                }
                b'&' if bytes.get(i + 1) == Some(&b'&') => {
                    tokens.push(Token::And);
                    i += 2;
                }
                b'|' if bytes.get(i + 1) == Some(&b'|') => {
                    tokens.push(Token::Or);
                    i += 2;
                }
                b if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' => {
                    let start = i;
                    while i < bytes.len()
                        && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
                    {
                        i += 1;
                    }
                    tokens.push(Token::Tag(&line[start..i]));
                }
                _ => return Err(self.error("invalid character")),
            }
        }
        Ok(tokens)
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).copied();
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn or(&mut self) -> Result<bool, ConstraintError> {
        let mut value = self.and()?;
        while self.peek() == Some(Token::Or) {
            self.pos += 1;
            let rhs = self.and()?;
            value = value || rhs;
        }
        Ok(value)
    }

    fn and(&mut self) -> Result<bool, ConstraintError> {
        let mut value = self.not()?;
        while self.peek() == Some(Token::And) {
            self.pos += 1;
            let rhs = self.not()?;
            value = value && rhs;
        }
        Ok(value)
    }

    fn not(&mut self) -> Result<bool, ConstraintError> {
        match self.next() {
            Some(Token::Not) => Ok(!self.not()?),
            Some(Token::Open) => {
                let value = self.or()?;
                match self.next() {
                    Some(Token::Close) => Ok(value),
                    _ => Err(self.error("missing ')'")),
                }
            }
            Some(Token::Tag(tag)) => Ok(self.target.matches_tag(tag)),
            _ => Err(self.error("expected a build tag")),
        }
    }

    fn error(&self, reason: &str) -> ConstraintError {
        ConstraintError {
            line: self.line.to_string(),
            reason: reason.to_string(),
        }
    }
}

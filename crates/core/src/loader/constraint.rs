//! Build constraint evaluation
//!
//! Decides whether a Go file belongs to the build for the current GOOS and
//! GOARCH, looking at `_os_arch.go` file name suffixes, `//go:build` lines
//! and legacy `// +build` lines. Files that cannot be judged are kept.

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "arm", "arm64", "loong64", "mips", "mipsle", "mips64", "mips64le", "ppc64",
    "ppc64le", "riscv64", "s390x", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::host()
    }
}

impl BuildContext {
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
        }
    }

    /// The running platform, overridable through `GOOS` and `GOARCH`.
    pub fn host() -> Self {
        let goos = std::env::var("GOOS").unwrap_or_else(|_| {
            match std::env::consts::OS {
                "macos" => "darwin",
                other => other,
            }
            .to_string()
        });
        let goarch = std::env::var("GOARCH").unwrap_or_else(|_| {
            match std::env::consts::ARCH {
                "x86_64" => "amd64",
                "x86" => "386",
                "aarch64" => "arm64",
                "powerpc64" => "ppc64",
                "loongarch64" => "loong64",
                other => other,
            }
            .to_string()
        });
        Self { goos, goarch }
    }

    /// Whether a `.go` file should be loaded at all.
    pub fn includes(&self, file_name: &str, source: &str) -> bool {
        file_name.ends_with(".go")
            && !file_name.ends_with("_test.go")
            && !file_name.starts_with('.')
            && !file_name.starts_with('_')
            && self.matches_file_name(file_name)
            && self.matches_source(source)
    }

    pub fn matches_file_name(&self, file_name: &str) -> bool {
        let stem = file_name.strip_suffix(".go").unwrap_or(file_name);
        let stem = stem.strip_suffix("_test").unwrap_or(stem);
        let parts: Vec<&str> = stem.split('_').collect();
        let n = parts.len();

        if n >= 3 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.tag(parts[n - 2]) && self.tag(parts[n - 1]);
        }
        if n >= 2 && (KNOWN_OS.contains(&parts[n - 1]) || KNOWN_ARCH.contains(&parts[n - 1])) {
            return self.tag(parts[n - 1]);
        }
        true
    }

    /// Evaluate the `//go:build` line in the file header, if any. Legacy
    /// `// +build` lines only count when there is no `//go:build` line.
    pub fn matches_source(&self, source: &str) -> bool {
        let mut plus_build = Vec::new();
        for line in source.lines() {
            let line = line.trim();
            if let Some(expr) = line.strip_prefix("//go:build") {
                return Expr::parse(expr)
                    .map(|e| e.eval(&|tag: &str| self.tag(tag)))
                    .unwrap_or(true);
            }
            if let Some(terms) = line
                .strip_prefix("//")
                .map(str::trim_start)
                .and_then(|l| l.strip_prefix("+build"))
            {
                plus_build.push(terms);
            }
            if line.starts_with("package ") {
                break;
            }
        }
        plus_build.iter().all(|terms| self.matches_plus_build(terms))
    }

    /// Space separated options are OR'd, comma separated terms AND'd.
    fn matches_plus_build(&self, terms: &str) -> bool {
        let mut options = terms.split_whitespace().peekable();
        if options.peek().is_none() {
            return true;
        }
        options.any(|option| {
            option.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !tag.is_empty() && !self.tag(tag),
                None => !term.is_empty() && self.tag(term),
            })
        })
    }

    fn tag(&self, tag: &str) -> bool {
        let goos = self.goos.as_str();
        tag == goos
            || tag == self.goarch
            || (tag == "unix" && UNIX_OS.contains(&goos))
            || (tag == "linux" && goos == "android")
            || (tag == "darwin" && goos == "ios")
            || (tag == "solaris" && goos == "illumos")
            || tag == "gc"
            || tag.starts_with("go1.")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn parse(input: &str) -> Option<Expr> {
        let tokens = tokenize(input)?;
        let mut pos = 0;
        let expr = parse_or(&tokens, &mut pos)?;
        (pos == tokens.len()).then_some(expr)
    }

    fn eval(&self, tag: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Expr::Tag(t) => tag(t),
            Expr::Not(e) => !e.eval(tag),
            Expr::And(a, b) => a.eval(tag) && b.eval(tag),
            Expr::Or(a, b) => a.eval(tag) || b.eval(tag),
        }
    }
}

fn tokenize(input: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '(' | ')' | '!' => {
                tokens.push(c.to_string());
                chars.next();
            }
            '&' | '|' => {
                chars.next();
                if chars.next() != Some(c) {
                    return None;
                }
                tokens.push(format!("{c}{c}"));
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut tag = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        tag.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(tag);
            }
            _ => return None,
        }
    }
    Some(tokens)
}

fn parse_or(tokens: &[String], pos: &mut usize) -> Option<Expr> {
    let mut left = parse_and(tokens, pos)?;
    while tokens.get(*pos).map(String::as_str) == Some("||") {
        *pos += 1;
        let right = parse_and(tokens, pos)?;
        left = Expr::Or(Box::new(left), Box::new(right));
    }
    Some(left)
}

fn parse_and(tokens: &[String], pos: &mut usize) -> Option<Expr> {
    let mut left = parse_not(tokens, pos)?;
    while tokens.get(*pos).map(String::as_str) == Some("&&") {
        *pos += 1;
        let right = parse_not(tokens, pos)?;
        left = Expr::And(Box::new(left), Box::new(right));
    }
    Some(left)
}

fn parse_not(tokens: &[String], pos: &mut usize) -> Option<Expr> {
    let token = tokens.get(*pos)?;
    *pos += 1;
    match token.as_str() {
        "!" => Some(Expr::Not(Box::new(parse_not(tokens, pos)?))),
        "(" => {
            let inner = parse_or(tokens, pos)?;
            if tokens.get(*pos).map(String::as_str) != Some(")") {
                return None;
            }
            *pos += 1;
            Some(inner)
        }
        ")" | "&&" | "||" => None,
        tag => Some(Expr::Tag(tag.to_string())),
    }
}

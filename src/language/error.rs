use std::fmt;

/// A positioned compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Byte offset into the source.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column (in characters).
    pub column: usize,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            line: 0,
            column: 0,
            message: message.into(),
        }
    }

    /// Resolve `offset` into a line/column pair against `source`.
    pub(crate) fn locate(mut self, source: &str) -> Self {
        let offset = self.offset.min(source.len());
        let before = source.get(..offset).unwrap_or(source);
        self.line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        self.column = before[line_start..].chars().count() + 1;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: error: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for Diagnostic {}

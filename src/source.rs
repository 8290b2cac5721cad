use std::fmt;

pub type SourceId = usize;

/// Byte offset into a program's source text.
pub type Idx = usize;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Loc {
    pub source: SourceId,
    pub span: core::ops::Range<usize>,
}

impl Loc {
    pub fn new(source: SourceId, span: core::ops::Range<usize>) -> Self {
        Self { source, span }
    }

    #[inline(always)]
    pub fn start(&self) -> Idx {
        self.span.start
    }
}

/// Source text of one program together with its line table.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: SourceId,
    pub name: String,
    pub text: String,
    // Byte offset of the start of each line. line_starts[0] == 0 always.
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(id: SourceId, name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            id,
            name: name.into(),
            text,
            line_starts,
        }
    }

    /// Translate an offset into a 1-based line/column position.
    ///
    /// Offsets past the end of the text or inside a multibyte character are
    /// rejected.
    pub fn position(&self, idx: Idx) -> Option<Position> {
        let line = match self.line_starts.binary_search(&idx) {
            Ok(exact) => exact,
            Err(ins) => ins.saturating_sub(1),
        };
        let column = self.text.get(self.line_starts[line]..idx)?.chars().count();
        Some(Position {
            filename: self.name.clone(),
            line: line + 1,
            column: column + 1,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub filename: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filename.is_empty() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            write!(f, "{}:{}:{}", self.filename, self.line, self.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let file = SourceFile::new(0, "a.js", "if (a) b();");
        let pos = file.position(4).unwrap();
        assert_eq!((pos.line, pos.column), (1, 5));
    }

    #[test]
    fn multi_line() {
        let file = SourceFile::new(0, "a.js", "ab\ncd\nef");
        assert_eq!(file.position(0).map(|p| (p.line, p.column)), Some((1, 1)));
        assert_eq!(file.position(3).map(|p| (p.line, p.column)), Some((2, 1)));
        assert_eq!(file.position(7).map(|p| (p.line, p.column)), Some((3, 2)));
    }

    #[test]
    fn out_of_range_offset() {
        let file = SourceFile::new(0, "a.js", "x");
        assert!(file.position(1).is_some());
        assert!(file.position(2).is_none());
    }

    #[test]
    fn offset_inside_a_character() {
        let file = SourceFile::new(0, "u.js", "é;\nü");
        assert!(file.position(1).is_none());
        assert!(file.position(5).is_none());
        assert_eq!(file.position(2).map(|p| (p.line, p.column)), Some((1, 2)));
        assert_eq!(file.position(4).map(|p| (p.line, p.column)), Some((2, 1)));
    }

    #[test]
    fn display_includes_filename() {
        let file = SourceFile::new(0, "main.js", "\n  x");
        assert_eq!(file.position(3).unwrap().to_string(), "main.js:2:3");
    }
}

use crate::ast::NodeId;
use crate::source::{Loc, Position, SourceFile, SourceId};
use ariadne::{ColorGenerator, Config, Label, Report, ReportKind, Source};
use std::collections::HashMap;
use std::fmt;

// --- Ariadne Cache ---

pub struct SourceCache {
    sources: HashMap<SourceId, Source>,
    filenames: HashMap<SourceId, String>,
}

impl SourceCache {
    pub fn new() -> Self {
        SourceCache {
            sources: HashMap::new(),
            filenames: HashMap::new(),
        }
    }

    pub fn add_source(&mut self, id: SourceId, filename: String, content: String) {
        self.sources.insert(id, Source::from(content));
        self.filenames.insert(id, filename);
    }

    pub fn from_file(file: &SourceFile) -> Self {
        let mut cache = Self::new();
        cache.add_source(file.id, file.name.clone(), file.text.clone());
        cache
    }
}

impl Default for SourceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(refining_impl_trait)]
impl ariadne::Cache<SourceId> for &SourceCache {
    type Storage = String;

    fn fetch(&mut self, id: &SourceId) -> Result<&Source, Box<dyn fmt::Debug + '_>> {
        self.sources
            .get(id)
            .ok_or_else(|| Box::new(format!("Source not found: {:?}", id)) as Box<dyn fmt::Debug>)
    }

    fn display<'a>(&self, id: &'a SourceId) -> Option<Box<dyn fmt::Display + 'a>> {
        self.filenames
            .get(id)
            .map(|f| Box::new(f.clone()) as Box<dyn fmt::Display + 'a>)
    }
}

impl ariadne::Span for Loc {
    type SourceId = SourceId;
    fn source(&self) -> &Self::SourceId {
        &self.source
    }
    fn start(&self) -> usize {
        self.span.start
    }
    fn end(&self) -> usize {
        self.span.end
    }
}

// --- Traversal Errors ---

/// A tree the walker cannot traverse. Fatal to the traversal it occurs in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalkError {
    #[error("{node} does not resolve to a node (child of {parent:?})")]
    MissingNode { node: NodeId, parent: Option<NodeId> },
    #[error("{node} is a {found}, expected {expected}")]
    UnexpectedKind {
        node: NodeId,
        expected: &'static str,
        found: &'static str,
    },
}

/// Failure reported by a hook callback. Never aborts a traversal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("hook failed at {node:?}: {message}")]
pub struct HookError {
    pub node: Option<NodeId>,
    pub message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            node: None,
            message: message.into(),
        }
    }
}

// --- Faults ---

/// Diagnostic captured by the walker's fault boundary.
#[derive(Debug, Clone)]
pub struct Fault {
    pub message: String,
    pub current: Option<NodeId>,
    pub parent: Option<NodeId>,
    /// Kind of the innermost node that still resolved (current, else parent).
    pub node_kind: Option<&'static str>,
    pub loc: Option<Loc>,
    pub position: Option<Position>,
    pub backtrace: String,
}

impl Fault {
    pub fn report(&self, cache: &SourceCache) {
        let Some(loc) = self.loc.clone() else {
            return;
        };
        let mut colors = ColorGenerator::new();

        let label = match self.node_kind {
            Some(kind) => format!("traversal stopped in this {kind}"),
            None => "traversal stopped here".to_string(),
        };

        Report::build(ReportKind::Error, loc.clone())
            .with_config(
                Config::default()
                    .with_cross_gap(false)
                    .with_char_set(ariadne::CharSet::Ascii),
            )
            .with_code("W001")
            .with_message(&self.message)
            .with_label(Label::new(loc).with_message(label).with_color(colors.next()))
            .finish()
            .eprint(cache)
            .unwrap_or_else(|e| eprintln!("Error reporting fault: {:?}", e));
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(kind) = self.node_kind {
            write!(f, " in {kind}")?;
        }
        match &self.position {
            Some(position) => write!(f, " at {position}"),
            None => write!(f, " at unknown position"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_error_messages() {
        let err = WalkError::MissingNode {
            node: NodeId::DANGLING,
            parent: Some(NodeId(3)),
        };
        assert!(err.to_string().contains("does not resolve"));

        let err = WalkError::UnexpectedKind {
            node: NodeId(1),
            expected: "IfStatement",
            found: "Identifier",
        };
        assert_eq!(err.to_string(), "NodeId(1) is a Identifier, expected IfStatement");
    }

    #[test]
    fn caller_renders_fault_against_program_source() {
        let file = SourceFile::new(0, "broken.js", ";\nif (a) b();");
        let fault = Fault {
            message: "NodeId(7) does not resolve to a node".into(),
            current: Some(NodeId::DANGLING),
            parent: Some(NodeId(7)),
            node_kind: Some("IfStatement"),
            loc: Some(Loc::new(0, 2..13)),
            position: file.position(2),
            backtrace: String::new(),
        };
        assert_eq!(
            fault.to_string(),
            "NodeId(7) does not resolve to a node in IfStatement at broken.js:2:1"
        );
        fault.report(&SourceCache::from_file(&file));
    }

    #[test]
    fn fault_display_without_position() {
        let fault = Fault {
            message: "boom".into(),
            current: None,
            parent: None,
            node_kind: None,
            loc: None,
            position: None,
            backtrace: String::new(),
        };
        assert_eq!(fault.to_string(), "boom at unknown position");
    }
}

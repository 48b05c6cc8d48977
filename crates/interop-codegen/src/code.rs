//! Structured statement lists for emitted code.
//!
//! Emitters build a [`Block`] of [`Stmt`]s instead of concatenating strings
//! with hand-written whitespace. Indentation is applied once, at render time,
//! according to an [`Indent`] style.

use serde::{Deserialize, Serialize};

/// Indentation style of rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Indent {
    #[default]
    Tab,
    Spaces(usize),
}

impl Indent {
    /// Indentation string for the given nesting depth.
    pub fn at(self, depth: usize) -> String {
        match self {
            Indent::Tab => "\t".repeat(depth),
            Indent::Spaces(width) => " ".repeat(width * depth),
        }
    }

    /// Column width of one level, tabs counted as one.
    pub fn width(self) -> usize {
        match self {
            Indent::Tab => 1,
            Indent::Spaces(width) => width,
        }
    }
}

/// A single statement or nested group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Line(String),
    Blank,
    Indented(Vec<Stmt>),
}

/// An ordered statement list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    stmts: Vec<Stmt>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.stmts.push(Stmt::Line(line.into()));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.stmts.push(Stmt::Blank);
        self
    }

    /// Append `body` one level deeper.
    pub fn nest(&mut self, body: Block) -> &mut Self {
        if !body.is_empty() {
            self.stmts.push(Stmt::Indented(body.stmts));
        }
        self
    }

    /// `header`, then `{`, the indented body and `}`.
    pub fn scope(&mut self, header: impl Into<String>, body: Block) -> &mut Self {
        self.scope_with(header, body, "}")
    }

    /// Like [`Block::scope`] with a custom closing line such as `};`.
    pub fn scope_with(
        &mut self,
        header: impl Into<String>,
        body: Block,
        close: impl Into<String>,
    ) -> &mut Self {
        self.line(header);
        self.line("{");
        self.nest(body);
        self.line(close);
        self
    }

    /// A C++ class body closed with `};`. `body` stays at the level of the
    /// braces so access labels line up with them; members are nested by
    /// the caller.
    pub fn class_scope(&mut self, header: impl Into<String>, body: Block) -> &mut Self {
        self.line(header);
        self.line("{");
        self.append(body);
        self.line("};");
        self
    }

    /// Append every statement of `other` at the current level.
    pub fn append(&mut self, other: Block) -> &mut Self {
        self.stmts.extend(other.stmts);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }

    /// Flatten into `(depth, text)` pairs; blank lines have empty text.
    pub fn lines(&self) -> Vec<(usize, String)> {
        let mut out = Vec::new();
        flatten(&self.stmts, 0, &mut out);
        out
    }

    /// Whether any line equals `text` after trimming.
    pub fn has_line(&self, text: &str) -> bool {
        self.lines().iter().any(|(_, line)| line.trim() == text)
    }

    pub fn render(&self, indent: Indent) -> String {
        self.render_at(indent, 0)
    }

    /// Render with every line shifted by `depth` levels.
    pub fn render_at(&self, indent: Indent, depth: usize) -> String {
        let mut output = String::new();
        for (level, text) in self.lines() {
            if !text.is_empty() {
                output.push_str(&indent.at(level + depth));
                output.push_str(&text);
            }
            output.push('\n');
        }
        output
    }

    /// Concatenate non-empty blocks with a blank line between each.
    pub fn join(blocks: impl IntoIterator<Item = Block>) -> Block {
        let mut joined = Block::new();
        for block in blocks.into_iter().filter(|b| !b.is_empty()) {
            if !joined.is_empty() {
                joined.blank();
            }
            joined.append(block);
        }
        joined
    }
}

fn flatten(stmts: &[Stmt], depth: usize, out: &mut Vec<(usize, String)>) {
    for stmt in stmts {
        match stmt {
            Stmt::Line(text) => out.push((depth, text.clone())),
            Stmt::Blank => out.push((depth, String::new())),
            Stmt::Indented(inner) => flatten(inner, depth + 1, out),
        }
    }
}

impl From<Vec<String>> for Block {
    fn from(lines: Vec<String>) -> Self {
        Self {
            stmts: lines.into_iter().map(Stmt::Line).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_nests_body() {
        let mut body = Block::new();
        body.line("int x = 0;");
        let mut block = Block::new();
        block.scope("void f()", body);

        assert_eq!(
            block.lines(),
            vec![
                (0, "void f()".to_string()),
                (0, "{".to_string()),
                (1, "int x = 0;".to_string()),
                (0, "}".to_string()),
            ]
        );
    }

    #[test]
    fn test_render_with_spaces_and_blank_lines() {
        let mut body = Block::new();
        body.line("a();").blank().line("b();");
        let mut block = Block::new();
        block.scope_with("struct S", body, "};");

        assert_eq!(
            block.render(Indent::Spaces(4)),
            "struct S\n{\n    a();\n\n    b();\n};\n"
        );
        assert_eq!(block.render(Indent::Tab), "struct S\n{\n\ta();\n\n\tb();\n};\n");
    }

    #[test]
    fn test_class_scope_keeps_labels_at_brace_level() {
        let mut body = Block::new();
        body.line("public:");
        body.nest(Block::from(vec!["void f();".to_string()]));
        let mut block = Block::new();
        block.class_scope("class C", body);

        assert_eq!(
            block.render(Indent::Spaces(4)),
            "class C\n{\npublic:\n    void f();\n};\n"
        );
    }

    #[test]
    fn test_render_at_depth() {
        let mut block = Block::new();
        block.line("x;");
        assert_eq!(block.render_at(Indent::Tab, 2), "\t\tx;\n");
    }

    #[test]
    fn test_join_skips_empty_blocks() {
        let mut a = Block::new();
        a.line("a");
        let mut b = Block::new();
        b.line("b");
        let joined = Block::join([a, Block::new(), b]);
        assert_eq!(joined.render(Indent::Tab), "a\n\nb\n");
        assert!(joined.has_line("b"));
    }

    #[test]
    fn test_empty_nest_is_dropped() {
        let mut block = Block::new();
        block.nest(Block::new());
        assert!(block.is_empty());
    }
}

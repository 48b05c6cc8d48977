//! Documentation entries, `@copydoc` resolution and XML doc rendering.
//!
//! Documentation arrives pre-segmented into brief paragraphs, per-parameter
//! paragraphs and return paragraphs. A brief paragraph starting with
//! `@copydoc <target>` is a reference to another declaration's documentation
//! and is replaced by it during postprocessing.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::code::Block;

/// Documentation of a single parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParamComment {
    pub name: String,
    #[serde(default)]
    pub comments: Vec<String>,
}

/// Documentation attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentEntry {
    pub brief: Vec<String>,
    pub params: Vec<ParamComment>,
    pub returns: Vec<String>,
}

impl CommentEntry {
    pub fn brief(text: impl Into<String>) -> Self {
        Self {
            brief: vec![text.into()],
            ..Self::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.params.push(ParamComment {
            name: name.into(),
            comments: vec![text.into()],
        });
        self
    }

    pub fn with_returns(mut self, text: impl Into<String>) -> Self {
        self.returns.push(text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.brief.is_empty() && self.params.is_empty() && self.returns.is_empty()
    }

    /// Argument of the first `@copydoc` brief paragraph, if any.
    pub fn copydoc_target(&self) -> Option<&str> {
        self.brief.iter().find_map(|entry| {
            entry
                .strip_prefix("@copydoc")
                .and_then(|rest| rest.split_once(' '))
                .map(|(_, target)| target)
        })
    }
}

/// Documentation of one overload of a function.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommentOverload {
    /// Parameter types as written in the declaration.
    pub params: Vec<String>,
    pub comment: CommentEntry,
}

/// An indexed declaration that `@copydoc` references may point at.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentInfo {
    /// Simple lookup key: `Type` or `Type::member`.
    pub name: String,
    /// Enclosing namespaces, outermost first.
    pub namespaces: Vec<String>,
    pub is_function: bool,
    pub comment: CommentEntry,
    pub overloads: Vec<CommentOverload>,
}

impl CommentInfo {
    /// Index entry for a type or field.
    pub fn new(name: impl Into<String>, namespaces: &[&str], comment: CommentEntry) -> Self {
        Self {
            name: name.into(),
            namespaces: namespaces.iter().map(|ns| ns.to_string()).collect(),
            is_function: false,
            comment,
            overloads: Vec::new(),
        }
    }

    /// Index entry for a function; add overloads with [`CommentInfo::with_overload`].
    pub fn function(name: impl Into<String>, namespaces: &[&str]) -> Self {
        Self {
            is_function: true,
            ..Self::new(name, namespaces, CommentEntry::default())
        }
    }

    pub fn with_overload(mut self, params: &[&str], comment: CommentEntry) -> Self {
        self.overloads.push(CommentOverload {
            params: params.iter().map(|p| p.to_string()).collect(),
            comment,
        });
        self
    }
}

/// Why a `@copydoc` reference could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CopydocFailure {
    #[error("cannot find identifier referenced by @copydoc: \"{0}\"")]
    Unresolved(String),
    #[error("@copydoc references form a cycle through \"{0}\"")]
    Cycle(String),
}

/// Global documentation index keyed by simple name.
#[derive(Debug, Clone, Default)]
pub struct CommentIndex {
    entries: Vec<CommentInfo>,
    simple_lookup: HashMap<String, Vec<usize>>,
}

impl CommentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, info: CommentInfo) {
        let index = self.entries.len();
        self.simple_lookup
            .entry(info.name.clone())
            .or_default()
            .push(index);
        self.entries.push(info);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace a `@copydoc` comment with the referenced documentation,
    /// following chains of references. On failure the comment is cleared.
    pub fn resolve(
        &self,
        comment: &mut CommentEntry,
        current_ns: &[String],
    ) -> Result<(), CopydocFailure> {
        let mut visited = HashSet::new();
        while let Some(target) = comment.copydoc_target().map(str::to_string) {
            if !visited.insert(target.clone()) {
                *comment = CommentEntry::default();
                return Err(CopydocFailure::Cycle(target));
            }
            match self.lookup(&target, current_ns) {
                Some(found) => *comment = found.clone(),
                None => {
                    *comment = CommentEntry::default();
                    return Err(CopydocFailure::Unresolved(target));
                }
            }
        }
        Ok(())
    }

    /// Find the documentation a single `@copydoc` argument refers to.
    pub fn lookup(&self, target: &str, current_ns: &[String]) -> Option<&CommentEntry> {
        let target = target.trim();
        let (full_name, params) = match target.split_once('(') {
            Some((name, params)) => (
                name.trim(),
                Some(params.trim_matches(|c: char| c == ')' || c.is_whitespace())),
            ),
            None => (target, None),
        };

        let segments: Vec<&str> = full_name.split("::").filter(|s| !s.is_empty()).collect();
        let last = *segments.last()?;

        let mut candidates = None;
        let mut namespace_start = 1;
        if segments.len() > 1 {
            let pair = format!("{}::{}", segments[segments.len() - 2], last);
            if let Some(found) = self.simple_lookup.get(&pair) {
                candidates = Some(found);
                namespace_start = 2;
            }
        }
        let candidates = match candidates {
            Some(found) => found,
            None => self.simple_lookup.get(last)?,
        };

        let target_ns: Vec<String> = segments[..segments.len() - namespace_start]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let relative_ns: Vec<String> = current_ns.iter().cloned().chain(target_ns.clone()).collect();

        let info = candidates
            .iter()
            .map(|&i| &self.entries[i])
            .find(|info| info.namespaces == relative_ns)
            .or_else(|| {
                candidates
                    .iter()
                    .map(|&i| &self.entries[i])
                    .find(|info| info.namespaces == target_ns)
            })?;

        match params {
            Some(params) => {
                if !info.is_function {
                    return None;
                }
                let wanted: Vec<&str> = params
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .collect();
                info.overloads
                    .iter()
                    .find(|o| o.params.iter().map(String::as_str).eq(wanted.iter().copied()))
                    .or_else(|| {
                        // Any overload will do when no parameters were given
                        if wanted.is_empty() {
                            info.overloads.first()
                        } else {
                            None
                        }
                    })
                    .map(|o| &o.comment)
            }
            None if info.is_function => info.overloads.first().map(|o| &o.comment),
            None => Some(&info.comment),
        }
    }
}

/// Render `comment` as a managed XML documentation block.
pub fn xml_doc(comment: &CommentEntry, wrap_column: usize, base_width: usize) -> Block {
    let mut block = Block::new();
    let width = wrap_column.saturating_sub(base_width);

    let paragraphs = |block: &mut Block, input: &[String]| {
        for (i, paragraph) in input.iter().enumerate() {
            if i > 0 {
                block.line("///");
            }
            for line in word_wrap(paragraph, "/// ", width) {
                block.line(line);
            }
        }
    };

    if comment.brief.is_empty() {
        block.line("/// <summary></summary>");
    } else {
        block.line("/// <summary>");
        paragraphs(&mut block, &comment.brief);
        block.line("/// </summary>");
    }

    for param in comment.params.iter().filter(|p| !p.comments.is_empty()) {
        block.line(format!("/// <param name=\"{}\">", param.name));
        paragraphs(&mut block, &param.comments);
        block.line("/// </param>");
    }

    if !comment.returns.is_empty() {
        block.line("/// <returns>");
        paragraphs(&mut block, &comment.returns);
        block.line("/// </returns>");
    }

    block
}

/// Wrap `input` into lines of at most `column` characters including `prefix`.
///
/// Breaks at the last space that fits, or mid-word when a single word is
/// longer than a line.
pub fn word_wrap(input: &str, prefix: &str, column: usize) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let prefix_len = prefix.chars().count();
    if chars.len() + prefix_len <= column {
        return vec![format!("{prefix}{input}")];
    }

    let line_len = column.saturating_sub(prefix_len).max(1);
    let mut lines = Vec::new();
    let mut cur = 0;
    while cur < chars.len() {
        let remaining = chars.len() - cur;
        if remaining <= line_len {
            lines.push(format!("{prefix}{}", chars[cur..].iter().collect::<String>()));
            break;
        }

        let search_end = (cur + line_len).min(chars.len() - 1);
        let last_space = (cur + 1..=search_end).rev().find(|&i| chars[i] == ' ');
        let len = match last_space {
            Some(space) => space - cur + 1,
            None => line_len,
        };
        let text: String = chars[cur..cur + len].iter().collect();
        lines.push(format!("{prefix}{}", text.trim_end()));
        cur += len;
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn index() -> CommentIndex {
        let mut index = CommentIndex::new();
        index.add(CommentInfo::new(
            "Texture",
            &["bs"],
            CommentEntry::brief("Abstract class representing a texture."),
        ));
        index.add(
            CommentInfo::function("Texture::getPixel", &["bs"])
                .with_overload(&["UINT32", "UINT32"], CommentEntry::brief("Reads a pixel."))
                .with_overload(
                    &["UINT32", "UINT32", "UINT32"],
                    CommentEntry::brief("Reads a pixel from a face."),
                ),
        );
        index.add(CommentInfo::new(
            "Texture",
            &["bs", "ct"],
            CommentEntry::brief("Core thread texture."),
        ));
        index
    }

    // ── Lookup ──

    #[test]
    fn test_lookup_prefers_relative_namespace() {
        let index = index();
        let found = index.lookup("Texture", &ns(&["bs"])).unwrap();
        assert_eq!(found.brief[0], "Abstract class representing a texture.");

        let found = index.lookup("ct::Texture", &ns(&["bs"])).unwrap();
        assert_eq!(found.brief[0], "Core thread texture.");
    }

    #[test]
    fn test_lookup_falls_back_to_absolute_namespace() {
        let index = index();
        let found = index.lookup("bs::ct::Texture", &ns(&["bs"])).unwrap();
        assert_eq!(found.brief[0], "Core thread texture.");
    }

    #[test]
    fn test_lookup_matches_overload_by_params() {
        let index = index();
        let found = index
            .lookup("Texture::getPixel(UINT32, UINT32, UINT32)", &ns(&["bs"]))
            .unwrap();
        assert_eq!(found.brief[0], "Reads a pixel from a face.");

        let first = index.lookup("Texture::getPixel()", &ns(&["bs"])).unwrap();
        assert_eq!(first.brief[0], "Reads a pixel.");

        let first = index.lookup("Texture::getPixel", &ns(&["bs"])).unwrap();
        assert_eq!(first.brief[0], "Reads a pixel.");

        assert!(index.lookup("Texture::getPixel(float)", &ns(&["bs"])).is_none());
    }

    #[test]
    fn test_params_on_non_function_fail() {
        let index = index();
        assert!(index.lookup("Texture(int)", &ns(&["bs"])).is_none());
    }

    // ── Resolution ──

    #[test]
    fn test_resolve_follows_chain() {
        let mut index = index();
        index.add(CommentInfo::new(
            "Alias",
            &["bs"],
            CommentEntry::brief("@copydoc Texture"),
        ));

        let mut comment = CommentEntry::brief("@copydoc Alias");
        index.resolve(&mut comment, &ns(&["bs"])).unwrap();
        assert_eq!(comment.brief[0], "Abstract class representing a texture.");
    }

    #[test]
    fn test_resolve_unresolved_clears_comment() {
        let index = index();
        let mut comment = CommentEntry::brief("@copydoc Missing::thing");
        let err = index.resolve(&mut comment, &ns(&["bs"])).unwrap_err();
        assert_eq!(err, CopydocFailure::Unresolved("Missing::thing".to_string()));
        assert!(comment.is_empty());
    }

    #[test]
    fn test_resolve_detects_cycle() {
        let mut index = CommentIndex::new();
        index.add(CommentInfo::new("A", &[], CommentEntry::brief("@copydoc B")));
        index.add(CommentInfo::new("B", &[], CommentEntry::brief("@copydoc A")));

        let mut comment = CommentEntry::brief("@copydoc A");
        let err = index.resolve(&mut comment, &[]).unwrap_err();
        assert!(matches!(err, CopydocFailure::Cycle(_)));
        assert!(comment.is_empty());
    }

    #[test]
    fn test_plain_comment_is_untouched() {
        let index = index();
        let mut comment = CommentEntry::brief("Nothing to resolve.");
        index.resolve(&mut comment, &[]).unwrap();
        assert_eq!(comment.brief[0], "Nothing to resolve.");
    }

    // ── XML rendering ──

    #[test]
    fn test_xml_doc_sections() {
        let comment = CommentEntry::brief("Sets the texture.")
            .with_param("texture", "Texture to use.")
            .with_returns("True on success.");
        let rendered = xml_doc(&comment, 124, 0).render(crate::code::Indent::Tab);
        assert_eq!(
            rendered,
            "/// <summary>\n/// Sets the texture.\n/// </summary>\n\
             /// <param name=\"texture\">\n/// Texture to use.\n/// </param>\n\
             /// <returns>\n/// True on success.\n/// </returns>\n"
        );
    }

    #[test]
    fn test_xml_doc_empty_summary() {
        let block = xml_doc(&CommentEntry::default(), 124, 0);
        assert_eq!(block.lines().len(), 1);
        assert!(block.has_line("/// <summary></summary>"));
    }

    #[test]
    fn test_word_wrap_breaks_at_spaces() {
        let lines = word_wrap("aaa bbb ccc ddd", "/// ", 12);
        assert_eq!(lines, vec!["/// aaa bbb", "/// ccc ddd"]);
    }

    #[test]
    fn test_word_wrap_breaks_long_words() {
        let lines = word_wrap("abcdefghij", "// ", 7);
        assert_eq!(lines, vec!["// abcd", "// efgh", "// ij"]);
    }
}

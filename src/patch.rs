// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Idempotent configuration block patching.
//!
//! Tools like powerline or SSH need a few lines injected into files that the
//! user also edits by hand, e.g., `~/.bash_profile`, `~/.vimrc`, or
//! `~/.ssh/config`. Devboot maintains each of these injections as a
//! __configuration block__: a named multi-line fragment that should appear
//! exactly once in its target file.
//!
//! # Locating Blocks
//!
//! A block is located by a pattern rather than by its literal text. Some
//! parts of a block legitimately vary between machines, like the absolute
//! path of the Python user site. Those parts are declared as __slots__ that
//! carry their own regex fragment. Everything else in a block is literal text
//! that is always escaped before being compiled into the locating pattern.
//! Thus, it is impossible to build a block whose literal text is accidentally
//! interpreted as regex syntax.
//!
//! Blocks always cover whole lines. The locating pattern is anchored at line
//! boundaries, so a block never matches the tail of some longer line.
//!
//! The first occurrence of the pattern is the only one considered. A file
//! with two hand-copied instances of a block will only have its first
//! instance touched.
//!
//! # Patching Semantics
//!
//! - __Upsert__: append the block when absent, replace the located span when
//!   it drifted from the template, and leave the file alone when it already
//!   matches character for character.
//! - __Remove__: splice the located span out of the file.
//!
//! Appending separates the block from prior content with a blank line.
//! Removal undoes that separation when the block is the last thing in the
//! file, so an upsert followed by a remove leaves the file byte-identical.
//!
//! # Pitfalls
//!
//! Files are read fully into memory, edited, and written back in full. There
//! is no locking, so a second process editing the same file concurrently
//! will race with devboot, and the last writer wins.

use regex::{Match, Regex};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{read_to_string, write, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Slot pattern taking the rest of a line, spaces included.
pub const LINE_SLOT: &str = r"[^\n]+";

/// Piece of a block line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text matched verbatim.
    Text(String),

    /// Parametric text located by a regex fragment.
    Slot {
        name: String,
        pattern: String,
        value: Option<String>,
    },
}

/// Single line of a configuration block.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlockLine {
    segments: Vec<Segment>,
}

impl BlockLine {
    /// Construct new empty line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append literal text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment::Text(text.into()));
        self
    }

    /// Append slot bound to a value.
    pub fn slot(
        mut self,
        name: impl Into<String>,
        pattern: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.segments.push(Segment::Slot {
            name: name.into(),
            pattern: pattern.into(),
            value: Some(value.into()),
        });
        self
    }

    /// Append slot without a value.
    ///
    /// Blocks with unbound slots can still be located and removed, but cannot
    /// be upserted.
    pub fn unbound_slot(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.segments.push(Segment::Slot {
            name: name.into(),
            pattern: pattern.into(),
            value: None,
        });
        self
    }

    pub fn segments(&self) -> &[Segment] {
        self.segments.as_slice()
    }

    fn pattern(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => regex::escape(text),
                Segment::Slot { name, pattern, .. } => format!("(?P<{name}>{pattern})"),
            })
            .collect()
    }

    fn render(&self) -> Option<String> {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => Some(text.as_str()),
                Segment::Slot { value, .. } => value.as_deref(),
            })
            .collect()
    }
}

impl From<&str> for BlockLine {
    fn from(text: &str) -> Self {
        Self::new().text(text)
    }
}

impl From<String> for BlockLine {
    fn from(text: String) -> Self {
        Self::new().text(text)
    }
}

/// Named multi-line configuration block.
///
/// # Invariants
///
/// - Literal text is always escaped in the locating pattern.
/// - Locating pattern only matches whole lines.
/// - When every slot is bound, the rendered template is matched in full by
///   the locating pattern. Hence, upserting is idempotent.
#[derive(Debug, Clone)]
pub struct ConfigBlock {
    name: String,
    lines: Vec<BlockLine>,
    template: Option<String>,
    matcher: Regex,
}

impl ConfigBlock {
    /// Construct new configuration block.
    ///
    /// # Errors
    ///
    /// - Return [`Error::EmptyBlock`] if no lines are given.
    /// - Return [`Error::InvalidPattern`] if a slot pattern is invalid regex.
    /// - Return [`Error::TemplateMismatch`] if a slot value is not matched by
    ///   its own pattern.
    pub fn new(
        name: impl Into<String>,
        lines: impl IntoIterator<Item = impl Into<BlockLine>>,
    ) -> Result<Self> {
        let name = name.into();
        let lines = lines.into_iter().map(Into::into).collect::<Vec<BlockLine>>();
        if lines.is_empty() {
            return Err(Error::EmptyBlock { name });
        }

        // INVARIANT: Blocks only ever span whole lines.
        let pattern = lines
            .iter()
            .map(BlockLine::pattern)
            .collect::<Vec<_>>()
            .join("\n");
        let pattern = format!("(?m)^{pattern}$");
        let matcher = Regex::new(&pattern).map_err(|source| Error::InvalidPattern {
            source,
            name: name.clone(),
        })?;

        let template = lines
            .iter()
            .map(BlockLine::render)
            .collect::<Option<Vec<_>>>()
            .map(|lines| lines.join("\n"));

        // INVARIANT: Bound template must be located by its own pattern in full.
        if let Some(template) = &template {
            let full_match = matcher
                .find(template)
                .is_some_and(|found| found.as_str() == template);
            if !full_match {
                return Err(Error::TemplateMismatch { name });
            }
        }

        Ok(Self {
            name,
            lines,
            template,
            matcher,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn lines(&self) -> &[BlockLine] {
        self.lines.as_slice()
    }

    /// Literal text of block, if every slot is bound.
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Regex used to locate block.
    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }

    /// Locate first instance of block in content.
    pub fn find<'h>(&self, content: &'h str) -> Option<Match<'h>> {
        self.matcher.find(content)
    }

    /// Extract value of named slot from first instance of block in content.
    pub fn capture(&self, content: &str, slot: &str) -> Option<String> {
        self.matcher
            .captures(content)
            .and_then(|captures| captures.name(slot))
            .map(|found| found.as_str().to_owned())
    }
}

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Result of a removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    AlreadyAbsent,
}

/// In-memory block editor.
///
/// # Invariant
///
/// - Content is only marked as changed when an edit actually altered it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlockEdit {
    content: String,
    changed: bool,
}

impl BlockEdit {
    /// Construct new block editor over empty content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert block, or update it in place if it drifted.
    ///
    /// # Errors
    ///
    /// - Return [`Error::UnboundSlot`] if block has slots without values.
    pub fn upsert(&mut self, block: &ConfigBlock) -> Result<UpsertOutcome> {
        let template = block.template().ok_or_else(|| Error::UnboundSlot {
            name: block.name().to_owned(),
        })?;

        let Some(range) = block.find(&self.content).map(|found| found.range()) else {
            self.content.push('\n');
            self.content.push_str(template);
            self.content.push('\n');
            self.changed = true;
            return Ok(UpsertOutcome::Inserted);
        };

        if &self.content[range.clone()] == template {
            return Ok(UpsertOutcome::Unchanged);
        }

        self.content.replace_range(range, template);
        self.changed = true;

        Ok(UpsertOutcome::Updated)
    }

    /// Splice block out of content.
    pub fn remove(&mut self, block: &ConfigBlock) -> RemoveOutcome {
        let Some(range) = block.find(&self.content).map(|found| found.range()) else {
            return RemoveOutcome::AlreadyAbsent;
        };

        let (mut start, mut end) = (range.start, range.end);

        // INVARIANT: Take the line terminator of the block along with it.
        if self.content[end..].starts_with('\n') {
            end += 1;
        }

        // INVARIANT: Undo the separator added on insertion at end of content.
        if end == self.content.len() && self.content[..start].ends_with('\n') {
            start -= 1;
        }

        self.content.replace_range(start..end, "");
        self.changed = true;

        RemoveOutcome::Removed
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn as_str(&self) -> &str {
        self.content.as_str()
    }
}

impl Display for BlockEdit {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.content.as_str())
    }
}

impl From<String> for BlockEdit {
    fn from(content: String) -> Self {
        Self {
            content,
            changed: false,
        }
    }
}

impl From<&str> for BlockEdit {
    fn from(content: &str) -> Self {
        Self::from(content.to_owned())
    }
}

/// Patch configuration blocks into a target file.
#[derive(Debug, Clone)]
pub struct BlockPatcher {
    path: PathBuf,
}

impl BlockPatcher {
    /// Construct new block patcher for target file.
    ///
    /// The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Edit file content.
    ///
    /// Read current content into [`BlockEdit`] instance, let the editor alter
    /// it, and write it back only if it changed. A missing file is treated as
    /// empty content.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ReadFile`] if target file cannot be read.
    /// - Return [`Error::WriteFile`] if target file cannot be written.
    /// - Return whatever error the editor itself produces.
    pub fn edit<E, T>(&self, editor: E) -> Result<T>
    where
        E: FnOnce(&mut BlockEdit) -> Result<T>,
    {
        let content = match read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => {
                return Err(Error::ReadFile {
                    source: err,
                    path: self.path.clone(),
                })
            }
        };

        let mut edit = BlockEdit::from(content);
        let outcome = editor(&mut edit)?;

        if !edit.is_changed() {
            return Ok(outcome);
        }

        write(&self.path, edit.as_str().as_bytes()).map_err(|err| Error::WriteFile {
            source: err,
            path: self.path.clone(),
        })?;

        Ok(outcome)
    }

    /// Ensure block exists exactly once in target file.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ReadFile`] if target file cannot be read.
    /// - Return [`Error::WriteFile`] if target file cannot be written.
    /// - Return [`Error::UnboundSlot`] if block has slots without values.
    #[instrument(skip(self, block), fields(block = block.name()), level = "debug")]
    pub fn upsert(&self, block: &ConfigBlock) -> Result<UpsertOutcome> {
        let outcome = self.edit(|edit| edit.upsert(block))?;
        match outcome {
            UpsertOutcome::Inserted => info!(
                "appended {} block in {:?}",
                block.name(),
                self.path.display()
            ),
            UpsertOutcome::Updated => info!(
                "updated {} block in {:?}",
                block.name(),
                self.path.display()
            ),
            UpsertOutcome::Unchanged => info!(
                "{} block already configured in {:?}",
                block.name(),
                self.path.display()
            ),
        }

        Ok(outcome)
    }

    /// Remove block from target file.
    ///
    /// A missing target file counts as the block being absent.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ReadFile`] if target file cannot be read.
    /// - Return [`Error::WriteFile`] if target file cannot be written.
    #[instrument(skip(self, block), fields(block = block.name()), level = "debug")]
    pub fn remove(&self, block: &ConfigBlock) -> Result<RemoveOutcome> {
        if !self.path.exists() {
            debug!("{:?} does not exist", self.path.display());
            info!("{} block already removed", block.name());
            return Ok(RemoveOutcome::AlreadyAbsent);
        }

        let outcome = self.edit(|edit| Ok(edit.remove(block)))?;
        match outcome {
            RemoveOutcome::Removed => info!(
                "removed {} block from {:?}",
                block.name(),
                self.path.display()
            ),
            RemoveOutcome::AlreadyAbsent => info!(
                "{} block already removed from {:?}",
                block.name(),
                self.path.display()
            ),
        }

        Ok(outcome)
    }

    /// Create target file if it does not exist yet, without truncating it.
    ///
    /// # Errors
    ///
    /// - Return [`Error::WriteFile`] if target file cannot be created.
    pub fn touch(&self) -> Result<()> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| Error::WriteFile {
                source: err,
                path: self.path.clone(),
            })?;

        Ok(())
    }
}

/// Block patching error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Block was defined without lines.
    #[error("block {name:?} has no lines")]
    EmptyBlock { name: String },

    /// Slot pattern is not valid regex.
    #[error("block {name:?} has invalid slot pattern")]
    InvalidPattern {
        #[source]
        source: regex::Error,
        name: String,
    },

    /// Rendered template is not located by its own pattern.
    #[error("block {name:?} template is not matched by its own pattern")]
    TemplateMismatch { name: String },

    /// Block cannot be written while slots lack values.
    #[error("block {name:?} has unbound slots")]
    UnboundSlot { name: String },

    /// Target file cannot be read from.
    #[error("failed to read from {:?}", path.display())]
    ReadFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Target file cannot be written to.
    #[error("failed to write to {:?}", path.display())]
    WriteFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    fn daemon_block(site: &str) -> ConfigBlock {
        ConfigBlock::new(
            "daemon",
            [
                BlockLine::from("# Powerline user config"),
                BlockLine::from("powerline-daemon -q"),
                BlockLine::new()
                    .text("source ")
                    .slot("site", r"[\w\-/.]+", site)
                    .text("/powerline/bindings/bash/powerline.sh"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn literal_lines_are_escaped() {
        let block = ConfigBlock::new("rtp", ["set rtp+=/a/b", "set t_Co=256"]).unwrap();
        assert_eq!(block.pattern(), "(?m)^set rtp\\+=/a/b\nset t_Co=256$");

        // A literal '+' would otherwise act as a quantifier.
        assert!(block.find("set rtpp=/a/b\nset t_Co=256").is_none());
        assert!(block.find("set rtp+=/a/b\nset t_Co=256").is_some());
    }

    #[test]
    fn blocks_only_match_whole_lines() {
        let block = ConfigBlock::new(
            "host",
            [BlockLine::new().text("github.com ").unbound_slot("key", r"\S+")],
        )
        .unwrap();

        assert!(block.find("gist.github.com AAAA\n").is_none());
        assert!(block.find("github.com AAAA extra\n").is_none());

        let content = "gist.github.com GIST\ngithub.com AAAA\n";
        let found = block.find(content).unwrap();
        assert_eq!(found.as_str(), "github.com AAAA");
        assert_eq!(found.start(), "gist.github.com GIST\n".len());
    }

    #[test]
    fn slot_value_must_match_own_pattern() {
        let result = ConfigBlock::new(
            "bad",
            [BlockLine::new().text("path ").slot("path", r"\d+", "/not/digits")],
        );
        assert!(matches!(result, Err(Error::TemplateMismatch { .. })));
    }

    #[test]
    fn empty_block_is_rejected() {
        let result = ConfigBlock::new("empty", Vec::<BlockLine>::new());
        assert!(matches!(result, Err(Error::EmptyBlock { .. })));
    }

    #[test]
    fn upsert_into_empty_content_then_unchanged() {
        let block = daemon_block("/site");
        let mut edit = BlockEdit::new();

        assert_eq!(edit.upsert(&block).unwrap(), UpsertOutcome::Inserted);
        let expect = indoc! {"

            # Powerline user config
            powerline-daemon -q
            source /site/powerline/bindings/bash/powerline.sh
        "};
        assert_eq!(edit.to_string(), expect);

        let mut again = BlockEdit::from(edit.to_string());
        assert_eq!(again.upsert(&block).unwrap(), UpsertOutcome::Unchanged);
        assert!(!again.is_changed());
        assert_eq!(again.to_string(), expect);
    }

    #[test]
    fn upsert_corrects_drift_in_place() {
        let content = indoc! {"
            export PATH=$HOME/bin:$PATH

            # Powerline user config
            powerline-daemon -q
            source /old/site/powerline/bindings/bash/powerline.sh

            alias ll='ls -l'
        "};
        let mut edit = BlockEdit::from(content);

        let outcome = edit.upsert(&daemon_block("/new/site")).unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);

        let expect = indoc! {"
            export PATH=$HOME/bin:$PATH

            # Powerline user config
            powerline-daemon -q
            source /new/site/powerline/bindings/bash/powerline.sh

            alias ll='ls -l'
        "};
        assert_eq!(edit.to_string(), expect);
    }

    #[test]
    fn upsert_only_touches_first_instance() {
        let block = ConfigBlock::new(
            "identity",
            [BlockLine::new().text("IdentityFile ").slot("key", r"\S+", "~/.ssh/id_rsa")],
        )
        .unwrap();
        let mut edit = BlockEdit::from("IdentityFile a\nIdentityFile b\n");

        edit.upsert(&block).unwrap();
        assert_eq!(edit.to_string(), "IdentityFile ~/.ssh/id_rsa\nIdentityFile b\n");
    }

    #[test]
    fn upsert_with_unbound_slot_fails() {
        let block = ConfigBlock::new(
            "host",
            [BlockLine::new().text("github.com ").unbound_slot("key", r"\S+")],
        )
        .unwrap();
        let mut edit = BlockEdit::new();
        assert!(matches!(edit.upsert(&block), Err(Error::UnboundSlot { .. })));
    }

    #[test]
    fn remove_absent_block_is_noop() {
        let mut edit = BlockEdit::from("alias ll='ls -l'\n");
        assert_eq!(edit.remove(&daemon_block("/site")), RemoveOutcome::AlreadyAbsent);
        assert!(!edit.is_changed());
    }

    #[test]
    fn upsert_then_remove_restores_content() {
        let block = daemon_block("/site");
        for original in ["", "alias ll='ls -l'\n", "no trailing newline", "a\n\n"] {
            let mut edit = BlockEdit::from(original);
            edit.upsert(&block).unwrap();
            assert_eq!(edit.remove(&block), RemoveOutcome::Removed);
            assert_eq!(edit.as_str(), original);
        }
    }

    #[test]
    fn remove_block_in_middle_keeps_neighbours() {
        let content = indoc! {"
            export A=1
            # Powerline user config
            powerline-daemon -q
            source /any/site/powerline/bindings/bash/powerline.sh
            export B=2
        "};
        let mut edit = BlockEdit::from(content);

        assert_eq!(edit.remove(&daemon_block("/site")), RemoveOutcome::Removed);
        assert_eq!(edit.to_string(), "export A=1\nexport B=2\n");
    }

    #[test]
    fn capture_reads_slot_value() {
        let block = daemon_block("/site");
        let content = "# Powerline user config\npowerline-daemon -q\nsource /x/y/powerline/bindings/bash/powerline.sh";
        assert_eq!(block.capture(content, "site"), Some("/x/y".into()));
    }

    #[sealed_test]
    fn patcher_writes_only_on_change() -> anyhow::Result<()> {
        let patcher = BlockPatcher::new(".bash_profile");
        let block = daemon_block("/site");

        assert_eq!(patcher.upsert(&block)?, UpsertOutcome::Inserted);
        let first = std::fs::read_to_string(".bash_profile")?;
        assert_eq!(patcher.upsert(&block)?, UpsertOutcome::Unchanged);
        assert_eq!(std::fs::read_to_string(".bash_profile")?, first);

        assert_eq!(patcher.remove(&block)?, RemoveOutcome::Removed);
        assert_eq!(std::fs::read_to_string(".bash_profile")?, "");
        assert_eq!(patcher.remove(&block)?, RemoveOutcome::AlreadyAbsent);

        Ok(())
    }

    #[sealed_test]
    fn patcher_remove_on_missing_file_is_absent() -> anyhow::Result<()> {
        let patcher = BlockPatcher::new("missing");
        assert_eq!(patcher.remove(&daemon_block("/site"))?, RemoveOutcome::AlreadyAbsent);
        assert!(!Path::new("missing").exists());
        Ok(())
    }
}

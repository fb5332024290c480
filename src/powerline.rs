// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Powerline prompt configuration.
//!
//! Powerline is installed as a user level Python package, so its bindings
//! live under the Python user site directory. Configuring it takes a handful
//! of steps:
//!
//! 1. Hook the daemon into `~/.bash_profile` and the runtime path into
//!    `~/.vimrc` through configuration blocks.
//! 2. Copy the packaged default configuration into the user configuration
//!    directory, so it can be customized.
//! 3. Merge git status colors into the default colorscheme, and append the
//!    git status segment to the default shell theme.
//! 4. Install patched fonts so the prompt glyphs render.
//!
//! Every step is idempotent, and all of them are undone by the clean flow.

use crate::{
    git::{self, GitError},
    patch::{self, BlockLine, BlockPatcher, ConfigBlock, RemoveOutcome, UpsertOutcome, LINE_SLOT},
    syscall::{Syscall, SyscallError, Syscaller, SystemSyscaller},
};

use ignore::WalkBuilder;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use std::{
    fs::{copy, read_to_string, remove_dir_all, write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Bash profile block starting the powerline daemon.
///
/// Without a site directory the block can only be located and removed.
///
/// # Errors
///
/// - Return [`patch::Error`] if block cannot be built.
pub fn daemon_block(site: Option<&Path>) -> patch::Result<ConfigBlock> {
    let source = BlockLine::new().text("source ");
    let source = match site {
        Some(site) => source.slot("site", LINE_SLOT, site.to_string_lossy()),
        None => source.unbound_slot("site", LINE_SLOT),
    }
    .text("/powerline/bindings/bash/powerline.sh");

    ConfigBlock::new(
        "powerline daemon",
        [
            BlockLine::from("# Powerline user config"),
            BlockLine::from("powerline-daemon -q"),
            BlockLine::from("POWERLINE_BASH_CONTINUATION=1"),
            BlockLine::from("POWERLINE_BASH_SELECT=1"),
            source,
        ],
    )
}

/// Vimrc block adding powerline to the runtime path.
///
/// Without a site directory the block can only be located and removed.
///
/// # Errors
///
/// - Return [`patch::Error`] if block cannot be built.
pub fn vim_block(site: Option<&Path>) -> patch::Result<ConfigBlock> {
    let rtp = BlockLine::new().text("set rtp+=");
    let rtp = match site {
        Some(site) => rtp.slot("site", LINE_SLOT, site.to_string_lossy()),
        None => rtp.unbound_slot("site", LINE_SLOT),
    }
    .text("/powerline/bindings/vim");

    ConfigBlock::new(
        "powerline vim",
        [
            BlockLine::from("\" Powerline"),
            rtp,
            BlockLine::from("set laststatus=2"),
            BlockLine::from("set t_Co=256"),
        ],
    )
}

/// Result of merging JSON configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    AlreadyConfigured,
    Merged,
}

/// Result of a font operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontsOutcome {
    AlreadyDone,
    Done,
}

/// User level powerline configuration.
#[derive(Debug, Clone)]
pub struct Powerline<S = SystemSyscaller>
where
    S: Syscaller,
{
    config_dir: PathBuf,
    syscaller: S,
}

impl<S> Powerline<S>
where
    S: Syscaller,
{
    /// Construct new powerline configuration over target directory.
    pub fn new(config_dir: impl Into<PathBuf>, syscaller: S) -> Self {
        Self {
            config_dir: config_dir.into(),
            syscaller,
        }
    }

    pub fn config_dir(&self) -> &Path {
        self.config_dir.as_path()
    }

    pub fn colorscheme_path(&self) -> PathBuf {
        self.config_dir.join("colorschemes").join("default.json")
    }

    pub fn shell_theme_path(&self) -> PathBuf {
        self.config_dir.join("themes").join("shell").join("default.json")
    }

    pub fn fonts_dir(&self) -> PathBuf {
        self.config_dir.join("fonts")
    }

    /// Hook powerline daemon into bash profile.
    ///
    /// # Errors
    ///
    /// - Return [`PowerlineError::Patch`] if bash profile cannot be patched.
    pub fn configure_bash(&self, profile: impl AsRef<Path>, site: &Path) -> Result<UpsertOutcome> {
        let patcher = BlockPatcher::new(profile.as_ref());
        patcher.touch()?;
        Ok(patcher.upsert(&daemon_block(Some(site))?)?)
    }

    /// Hook powerline into vim runtime path.
    ///
    /// # Errors
    ///
    /// - Return [`PowerlineError::Patch`] if vimrc cannot be patched.
    pub fn configure_vim(&self, vimrc: impl AsRef<Path>, site: &Path) -> Result<UpsertOutcome> {
        let patcher = BlockPatcher::new(vimrc.as_ref());
        patcher.touch()?;
        Ok(patcher.upsert(&vim_block(Some(site))?)?)
    }

    /// Unhook powerline daemon from bash profile.
    ///
    /// # Errors
    ///
    /// - Return [`PowerlineError::Patch`] if bash profile cannot be patched.
    pub fn remove_bash(&self, profile: impl AsRef<Path>) -> Result<RemoveOutcome> {
        Ok(BlockPatcher::new(profile.as_ref()).remove(&daemon_block(None)?)?)
    }

    /// Unhook powerline from vim runtime path.
    ///
    /// # Errors
    ///
    /// - Return [`PowerlineError::Patch`] if vimrc cannot be patched.
    pub fn remove_vim(&self, vimrc: impl AsRef<Path>) -> Result<RemoveOutcome> {
        Ok(BlockPatcher::new(vimrc.as_ref()).remove(&vim_block(None)?)?)
    }

    /// Copy packaged default configuration into user configuration directory.
    ///
    /// Files that already exist in the user configuration directory are left
    /// alone, so customizations survive repeated runs. Returns the number of
    /// files copied.
    ///
    /// # Errors
    ///
    /// - Return [`PowerlineError::MissingDefaultConfig`] if powerline is not
    ///   installed under site directory.
    /// - Return [`PowerlineError::Walk`] if default configuration cannot be
    ///   walked.
    /// - Return [`PowerlineError::Copy`] if a file cannot be copied.
    #[instrument(skip(self, site), level = "debug")]
    pub fn copy_default_config(&self, site: &Path) -> Result<usize> {
        let source = site.join("powerline").join("config_files");
        if !source.is_dir() {
            return Err(PowerlineError::MissingDefaultConfig { path: source });
        }

        let mut count = 0;
        for entry in WalkBuilder::new(&source).standard_filters(false).build() {
            let entry = entry?;
            let relative = entry.path().strip_prefix(&source).unwrap_or(entry.path());
            let target = self.config_dir.join(relative);
            let copy_error = |err| PowerlineError::Copy {
                source: err,
                path: target.clone(),
            };

            if entry.file_type().is_some_and(|kind| kind.is_dir()) {
                mkdirp::mkdirp(&target).map_err(copy_error)?;
                continue;
            }

            if target.exists() {
                debug!("keep existing {:?}", target.display());
                continue;
            }

            copy(entry.path(), &target).map_err(copy_error)?;
            count += 1;
        }

        if count == 0 {
            info!("powerline config already present in user directory");
        } else {
            info!("copied {count} powerline config file(s) to user directory");
        }

        Ok(count)
    }

    /// Merge colorscheme groups from overlay into default colorscheme.
    ///
    /// # Errors
    ///
    /// - Return [`PowerlineError::ReadJson`] or [`PowerlineError::ParseJson`]
    ///   if either file cannot be loaded.
    /// - Return [`PowerlineError::Layout`] if either file has no `groups`
    ///   object.
    /// - Return [`PowerlineError::WriteJson`] if the result cannot be written.
    pub fn configure_git_colorscheme(&self, overlay: impl AsRef<Path>) -> Result<MergeOutcome> {
        let path = self.colorscheme_path();
        let mut default = load_json(&path)?;
        let overlay_path = overlay.as_ref();
        let overlay = load_json(overlay_path)?;

        let outcome = merge_colorscheme(&mut default, &overlay).ok_or_else(|| {
            PowerlineError::Layout {
                path: path.clone(),
                field: "groups",
            }
        })?;

        match outcome {
            MergeOutcome::AlreadyConfigured => {
                info!("color scheme for git status is already configured")
            }
            MergeOutcome::Merged => {
                save_json(&path, &default)?;
                info!("finish configuring color scheme for git status");
            }
        }

        Ok(outcome)
    }

    /// Append git status segment to default shell theme.
    ///
    /// # Errors
    ///
    /// - Return [`PowerlineError::ReadJson`] or [`PowerlineError::ParseJson`]
    ///   if either file cannot be loaded.
    /// - Return [`PowerlineError::Layout`] if theme has no `segments.left`
    ///   array.
    /// - Return [`PowerlineError::WriteJson`] if the result cannot be written.
    pub fn configure_git_shell(&self, segment: impl AsRef<Path>) -> Result<MergeOutcome> {
        let path = self.shell_theme_path();
        let mut theme = load_json(&path)?;
        let segment = load_json(segment.as_ref())?;

        let outcome = append_shell_segment(&mut theme, segment).ok_or_else(|| {
            PowerlineError::Layout {
                path: path.clone(),
                field: "segments.left",
            }
        })?;

        match outcome {
            MergeOutcome::AlreadyConfigured => {
                info!("shell for git status is already configured")
            }
            MergeOutcome::Merged => {
                save_json(&path, &theme)?;
                info!("finish configuring shell for git status");
            }
        }

        Ok(outcome)
    }

    /// Clone fonts repository and run its installer.
    ///
    /// # Errors
    ///
    /// - Return [`PowerlineError::Git`] if fonts repository cannot be cloned.
    /// - Return [`PowerlineError::Syscall`] if installer fails.
    #[instrument(skip(self), level = "debug")]
    pub fn install_fonts(&self, url: &str) -> Result<FontsOutcome> {
        let dir = self.fonts_dir();
        if dir.exists() {
            info!("powerline fonts are already installed");
            return Ok(FontsOutcome::AlreadyDone);
        }

        git::clone_with_progress(url, &dir)?;
        let output = self
            .syscaller
            .call_checked(&Syscall::new("bash").arg(dir.join("install.sh")))?;
        debug!("{}", output.message());
        info!("successfully installed powerline fonts");

        Ok(FontsOutcome::Done)
    }

    /// Run fonts uninstaller and delete fonts repository.
    ///
    /// # Errors
    ///
    /// - Return [`PowerlineError::Syscall`] if uninstaller fails.
    /// - Return [`PowerlineError::Remove`] if fonts repository cannot be
    ///   deleted.
    #[instrument(skip(self), level = "debug")]
    pub fn uninstall_fonts(&self) -> Result<FontsOutcome> {
        let dir = self.fonts_dir();
        let script = dir.join("uninstall.sh");
        if !script.is_file() {
            info!("powerline fonts are already uninstalled");
            return Ok(FontsOutcome::AlreadyDone);
        }

        let output = self.syscaller.call_checked(&Syscall::new("bash").arg(script))?;
        debug!("{}", output.message());
        remove_dir_all(&dir).map_err(|source| PowerlineError::Remove { source, path: dir })?;
        info!("powerline fonts have successfully been uninstalled");

        Ok(FontsOutcome::Done)
    }

    /// Delete user configuration directory.
    ///
    /// Returns `false` if there was nothing to delete.
    ///
    /// # Errors
    ///
    /// - Return [`PowerlineError::Remove`] if directory cannot be deleted.
    pub fn remove_config_dir(&self) -> Result<bool> {
        if !self.config_dir.exists() {
            info!("powerline config at the user config directory has already been removed");
            return Ok(false);
        }

        remove_dir_all(&self.config_dir).map_err(|source| PowerlineError::Remove {
            source,
            path: self.config_dir.clone(),
        })?;
        info!("powerline config has successfully been removed");

        Ok(true)
    }
}

/// Merge `groups` of overlay into `groups` of colorscheme.
///
/// Nothing happens when every overlay group already exists in colorscheme.
/// Returns `None` when either side has no `groups` object.
pub fn merge_colorscheme(colorscheme: &mut Value, overlay: &Value) -> Option<MergeOutcome> {
    let overlay = overlay.get("groups")?.as_object()?;
    let groups = colorscheme.get_mut("groups")?.as_object_mut()?;

    if overlay.keys().all(|group| groups.contains_key(group)) {
        return Some(MergeOutcome::AlreadyConfigured);
    }

    for (group, style) in overlay {
        groups.insert(group.clone(), style.clone());
    }

    Some(MergeOutcome::Merged)
}

/// Append segment to `segments.left` of shell theme unless already there.
///
/// Returns `None` when theme has no `segments.left` array.
pub fn append_shell_segment(theme: &mut Value, segment: Value) -> Option<MergeOutcome> {
    let left = theme.get_mut("segments")?.get_mut("left")?.as_array_mut()?;
    if left.contains(&segment) {
        return Some(MergeOutcome::AlreadyConfigured);
    }

    left.push(segment);
    Some(MergeOutcome::Merged)
}

fn load_json(path: &Path) -> Result<Value> {
    let data = read_to_string(path).map_err(|source| PowerlineError::ReadJson {
        source,
        path: path.to_path_buf(),
    })?;

    serde_json::from_str(&data).map_err(|source| PowerlineError::ParseJson {
        source,
        path: path.to_path_buf(),
    })
}

/// Serialize JSON value with four space indentation.
pub fn to_pretty_json(value: &Value) -> serde_json::Result<String> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;

    // INVARIANT: serde_json only ever emits valid UTF-8.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn save_json(path: &Path, value: &Value) -> Result<()> {
    let data = to_pretty_json(value).map_err(|source| PowerlineError::ParseJson {
        source,
        path: path.to_path_buf(),
    })?;

    write(path, data).map_err(|source| PowerlineError::WriteJson {
        source,
        path: path.to_path_buf(),
    })
}

/// Powerline error types.
#[derive(Debug, thiserror::Error)]
pub enum PowerlineError {
    /// Powerline package does not ship its default configuration.
    #[error("no powerline default config at {:?}, is powerline-status installed?", path.display())]
    MissingDefaultConfig { path: PathBuf },

    /// Default configuration could not be walked.
    #[error(transparent)]
    Walk(#[from] ignore::Error),

    /// Configuration file could not be copied.
    #[error("failed to copy powerline config to {:?}", path.display())]
    Copy {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// JSON file could not be read.
    #[error("failed to read {:?}", path.display())]
    ReadJson {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// JSON file is not valid JSON.
    #[error("invalid JSON in {:?}", path.display())]
    ParseJson {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },

    /// JSON file could not be written.
    #[error("failed to write {:?}", path.display())]
    WriteJson {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// JSON file lacks expected field.
    #[error("{:?} has no {field:?} of the expected type", path.display())]
    Layout { path: PathBuf, field: &'static str },

    /// File or directory could not be deleted.
    #[error("failed to remove {:?}", path.display())]
    Remove {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error(transparent)]
    Patch(#[from] patch::Error),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Syscall(#[from] SyscallError),
}

/// Friendly result alias :3
pub type Result<T, E = PowerlineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{patch::BlockEdit, syscall::SyscallOutput};
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use serde_json::json;
    use std::{cell::RefCell, fs::create_dir_all};

    #[derive(Default)]
    struct RecordingSyscaller {
        calls: RefCell<Vec<String>>,
    }

    impl Syscaller for RecordingSyscaller {
        fn call(&self, syscall: &Syscall) -> crate::syscall::Result<SyscallOutput> {
            self.calls.borrow_mut().push(syscall.to_string());
            Ok(SyscallOutput::ok(""))
        }

        fn call_interactive(&self, _: &Syscall) -> crate::syscall::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn daemon_block_follows_site_directory() -> anyhow::Result<()> {
        let mut edit = BlockEdit::from("export EDITOR=vim\n");
        let old = daemon_block(Some(Path::new("/Users/octocat/Library/Python/3.8/lib/python/site-packages")))?;
        let new = daemon_block(Some(Path::new("/Users/octocat/Library/Python/3.9/lib/python/site-packages")))?;

        assert_eq!(edit.upsert(&old)?, UpsertOutcome::Inserted);
        assert_eq!(edit.upsert(&new)?, UpsertOutcome::Updated);
        assert_eq!(
            edit.as_str(),
            indoc! {"
                export EDITOR=vim

                # Powerline user config
                powerline-daemon -q
                POWERLINE_BASH_CONTINUATION=1
                POWERLINE_BASH_SELECT=1
                source /Users/octocat/Library/Python/3.9/lib/python/site-packages/powerline/bindings/bash/powerline.sh
            "}
        );

        assert_eq!(edit.remove(&daemon_block(None)?), RemoveOutcome::Removed);
        assert_eq!(edit.as_str(), "export EDITOR=vim\n");
        Ok(())
    }

    #[test]
    fn site_directory_may_contain_spaces() -> anyhow::Result<()> {
        let site = Path::new("/Users/Jane Doe/Library/Python/3.9/lib/python/site-packages");
        let mut edit = BlockEdit::from("set number\n");

        assert_eq!(edit.upsert(&vim_block(Some(site))?)?, UpsertOutcome::Inserted);
        assert_eq!(edit.upsert(&vim_block(Some(site))?)?, UpsertOutcome::Unchanged);
        assert_eq!(
            vim_block(None)?.capture(edit.as_str(), "site"),
            Some(site.to_string_lossy().into_owned())
        );

        assert_eq!(edit.remove(&vim_block(None)?), RemoveOutcome::Removed);
        assert_eq!(edit.as_str(), "set number\n");
        Ok(())
    }

    #[sealed_test]
    fn vim_block_round_trip() -> anyhow::Result<()> {
        let original = "set number\nsyntax on\n";
        write(".vimrc", original)?;
        let powerline = Powerline::new("powerline", RecordingSyscaller::default());
        let site = Path::new("/home/octocat/.local/lib/python3.11/site-packages");

        assert_eq!(powerline.configure_vim(".vimrc", site)?, UpsertOutcome::Inserted);
        assert_eq!(powerline.configure_vim(".vimrc", site)?, UpsertOutcome::Unchanged);
        assert!(read_to_string(".vimrc")?.contains(
            "set rtp+=/home/octocat/.local/lib/python3.11/site-packages/powerline/bindings/vim\n"
        ));

        assert_eq!(powerline.remove_vim(".vimrc")?, RemoveOutcome::Removed);
        assert_eq!(read_to_string(".vimrc")?, original);
        Ok(())
    }

    #[test]
    fn merge_colorscheme_adds_missing_groups() {
        let mut colorscheme = json!({
            "name": "Default",
            "groups": { "cwd": { "fg": "gray9", "bg": "gray4", "attrs": [] } }
        });
        let overlay = json!({
            "groups": {
                "gitstatus": { "fg": "gray8", "bg": "gray2", "attrs": [] },
                "cwd": { "fg": "white", "bg": "gray4", "attrs": [] }
            }
        });

        assert_eq!(merge_colorscheme(&mut colorscheme, &overlay), Some(MergeOutcome::Merged));
        assert_eq!(colorscheme["groups"]["gitstatus"]["fg"], "gray8");
        assert_eq!(colorscheme["groups"]["cwd"]["fg"], "white");
        assert_eq!(
            merge_colorscheme(&mut colorscheme, &overlay),
            Some(MergeOutcome::AlreadyConfigured)
        );
        assert_eq!(merge_colorscheme(&mut json!({}), &overlay), None);
    }

    #[test]
    fn append_shell_segment_once() {
        let mut theme = json!({ "segments": { "left": [{ "function": "powerline.segments.shell.cwd" }] } });
        let segment = json!({ "function": "powerline_gitstatus.gitstatus", "priority": 40 });

        assert_eq!(append_shell_segment(&mut theme, segment.clone()), Some(MergeOutcome::Merged));
        assert_eq!(
            append_shell_segment(&mut theme, segment.clone()),
            Some(MergeOutcome::AlreadyConfigured)
        );
        assert_eq!(theme["segments"]["left"].as_array().map(Vec::len), Some(2));
        assert_eq!(append_shell_segment(&mut json!({ "segments": {} }), segment), None);
    }

    #[test]
    fn pretty_json_uses_four_spaces() -> anyhow::Result<()> {
        let result = to_pretty_json(&json!({ "groups": { "cwd": ["bold"] } }))?;
        let expect = indoc! {r#"
            {
                "groups": {
                    "cwd": [
                        "bold"
                    ]
                }
            }"#};
        assert_eq!(result, expect);
        Ok(())
    }

    #[sealed_test]
    fn copy_default_config_keeps_user_files() -> anyhow::Result<()> {
        create_dir_all("site/powerline/config_files/themes/shell")?;
        write("site/powerline/config_files/config.json", "{}")?;
        write("site/powerline/config_files/themes/shell/default.json", "{}")?;
        create_dir_all("user")?;
        write("user/config.json", r#"{"custom": true}"#)?;

        let powerline = Powerline::new("user", RecordingSyscaller::default());
        assert_eq!(powerline.copy_default_config(Path::new("site"))?, 1);
        assert_eq!(read_to_string("user/config.json")?, r#"{"custom": true}"#);
        assert!(Path::new("user/themes/shell/default.json").is_file());
        assert_eq!(powerline.copy_default_config(Path::new("site"))?, 0);

        let result = powerline.copy_default_config(Path::new("nowhere"));
        assert!(matches!(result, Err(PowerlineError::MissingDefaultConfig { .. })));
        Ok(())
    }

    #[sealed_test]
    fn configure_git_files_in_place() -> anyhow::Result<()> {
        create_dir_all("user/colorschemes")?;
        create_dir_all("user/themes/shell")?;
        write("user/colorschemes/default.json", r#"{"groups": {}}"#)?;
        write("user/themes/shell/default.json", r#"{"segments": {"left": []}}"#)?;
        write("color.json", r#"{"groups": {"gitstatus": {"fg": "gray8"}}}"#)?;
        write("shell.json", r#"{"function": "powerline_gitstatus.gitstatus"}"#)?;

        let powerline = Powerline::new("user", RecordingSyscaller::default());
        assert_eq!(powerline.configure_git_colorscheme("color.json")?, MergeOutcome::Merged);
        assert_eq!(
            powerline.configure_git_colorscheme("color.json")?,
            MergeOutcome::AlreadyConfigured
        );
        assert_eq!(powerline.configure_git_shell("shell.json")?, MergeOutcome::Merged);
        assert_eq!(
            read_to_string("user/themes/shell/default.json")?,
            indoc! {r#"
                {
                    "segments": {
                        "left": [
                            {
                                "function": "powerline_gitstatus.gitstatus"
                            }
                        ]
                    }
                }"#}
        );
        Ok(())
    }

    #[sealed_test]
    fn fonts_lifecycle_without_network() -> anyhow::Result<()> {
        create_dir_all("user/fonts")?;
        write("user/fonts/uninstall.sh", "#!/bin/bash\n")?;
        let syscaller = RecordingSyscaller::default();
        let powerline = Powerline::new("user", &syscaller);

        assert_eq!(powerline.install_fonts("https://example.org/fonts.git")?, FontsOutcome::AlreadyDone);
        assert_eq!(powerline.uninstall_fonts()?, FontsOutcome::Done);
        assert_eq!(*syscaller.calls.borrow(), vec!["bash user/fonts/uninstall.sh".to_string()]);
        assert!(!Path::new("user/fonts").exists());
        assert_eq!(powerline.uninstall_fonts()?, FontsOutcome::AlreadyDone);

        assert!(powerline.remove_config_dir()?);
        assert!(!powerline.remove_config_dir()?);
        Ok(())
    }
}

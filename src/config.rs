// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the settings file that devboot uses to figure out
//! where everything lives. Every field carries a sensible default, so a
//! missing or partial settings file is perfectly valid.
//!
//! # General Layout
//!
//! ```toml
//! credential_file = "config/git-credentials.txt"
//! log_dir = "logs"
//!
//! [packages]
//! formula = "config/brew/leaves"
//! cask = "config/brew/casks"
//! runtime = "config/pyp-leaves"
//!
//! [test_packages]
//! formula = "config/test/brew-leaves"
//! cask = "config/test/casks"
//! runtime = "config/test/pyp-leaves"
//!
//! [dotfiles]
//! repository = "dotfiles"
//! dir = "~/dotfiles"
//! ```
//!
//! Paths go through shell expansion after deserialization, so `~` and
//! environment variables like `$HOME` can be used freely.

use crate::package::PackageFamily;

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

/// Default location of the settings file.
pub const DEFAULT_SETTINGS_FILE: &str = "config/devboot.toml";

/// Devboot settings layout.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// File holding GitHub credential.
    pub credential_file: PathBuf,

    /// Root directory for log files.
    pub log_dir: PathBuf,

    /// Package wishlists for normal runs.
    pub packages: PackageLists,

    /// Package wishlists for `--test` runs.
    pub test_packages: PackageLists,

    pub dotfiles: DotfilesSettings,
    pub ssh: SshSettings,
    pub powerline: PowerlineSettings,
    pub github: GithubSettings,
}

impl Settings {
    /// Load settings from file at target path.
    ///
    /// A missing file yields default settings.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if the file exists but cannot be read.
    /// - Return [`ConfigError::Deserialize`] if the file is not valid TOML.
    /// - Return [`ConfigError::ShellExpansion`] if a path cannot be expanded.
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = match read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no settings at {:?}, using defaults", path.display());
                String::new()
            }
            Err(err) => {
                return Err(ConfigError::Read {
                    source: err,
                    path: path.to_path_buf(),
                })
            }
        };

        data.parse()
    }

    /// Select package wishlists for normal or test mode.
    pub fn package_lists(&self, test_mode: bool) -> &PackageLists {
        if test_mode {
            &self.test_packages
        } else {
            &self.packages
        }
    }

    fn expand(&mut self) -> Result<()> {
        for path in [
            &mut self.credential_file,
            &mut self.log_dir,
            &mut self.packages.formula,
            &mut self.packages.cask,
            &mut self.packages.runtime,
            &mut self.test_packages.formula,
            &mut self.test_packages.cask,
            &mut self.test_packages.runtime,
            &mut self.dotfiles.dir,
            &mut self.dotfiles.bash_profile,
            &mut self.dotfiles.vimrc,
            &mut self.dotfiles.emacs_dir,
            &mut self.dotfiles.emacs_init,
            &mut self.ssh.dir,
            &mut self.powerline.config_dir,
            &mut self.powerline.colorscheme_overlay,
            &mut self.powerline.shell_segment,
        ] {
            *path = expand_path(path)?;
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credential_file: "config/git-credentials.txt".into(),
            log_dir: "logs".into(),
            packages: PackageLists {
                formula: "config/brew/leaves".into(),
                cask: "config/brew/casks".into(),
                runtime: "config/pyp-leaves".into(),
            },
            test_packages: PackageLists {
                formula: "config/test/brew-leaves".into(),
                cask: "config/test/casks".into(),
                runtime: "config/test/pyp-leaves".into(),
            },
            dotfiles: DotfilesSettings::default(),
            ssh: SshSettings::default(),
            powerline: PowerlineSettings::default(),
            github: GithubSettings::default(),
        }
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut settings: Settings = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path field.
        settings.expand()?;

        Ok(settings)
    }
}

impl Display for Settings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Package wishlist files, one per package family.
///
/// A package table is all or nothing: when present, it must name the
/// wishlist of every family.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PackageLists {
    pub formula: PathBuf,
    pub cask: PathBuf,
    pub runtime: PathBuf,
}

impl PackageLists {
    /// Wishlist file of target package family.
    pub fn get(&self, family: PackageFamily) -> &Path {
        match family {
            PackageFamily::Formula => self.formula.as_path(),
            PackageFamily::Cask => self.cask.as_path(),
            PackageFamily::Runtime => self.runtime.as_path(),
        }
    }
}

/// Dotfiles repository and the user files it provides.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DotfilesSettings {
    /// Name of the repository under the user's GitHub account.
    pub repository: String,

    /// Where to clone the repository to.
    pub dir: PathBuf,

    pub bash_profile: PathBuf,
    pub vimrc: PathBuf,
    pub emacs_dir: PathBuf,
    pub emacs_init: PathBuf,
}

impl Default for DotfilesSettings {
    fn default() -> Self {
        Self {
            repository: "dotfiles".into(),
            dir: "~/dotfiles".into(),
            bash_profile: "~/.bash_profile".into(),
            vimrc: "~/.vimrc".into(),
            emacs_dir: "~/.emacs.d".into(),
            emacs_init: "~/.emacs.d/init.el".into(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SshSettings {
    pub dir: PathBuf,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self { dir: "~/.ssh".into() }
    }
}

/// Powerline prompt settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PowerlineSettings {
    /// User level configuration directory of powerline.
    pub config_dir: PathBuf,

    /// Colorscheme groups merged into the default colorscheme.
    pub colorscheme_overlay: PathBuf,

    /// Segment appended to the default shell theme.
    pub shell_segment: PathBuf,

    /// Repository providing patched fonts.
    pub fonts_repository: String,

    /// Runtime packages powerline needs.
    pub runtime_packages: Vec<String>,
}

impl Default for PowerlineSettings {
    fn default() -> Self {
        Self {
            config_dir: "~/.config/powerline".into(),
            colorscheme_overlay: "config/powerline/powerline_git_color.json".into(),
            shell_segment: "config/powerline/powerline_git_shell.json".into(),
            fonts_repository: "https://github.com/powerline/fonts.git".into(),
            runtime_packages: vec!["powerline-status".into(), "powerline-gitstatus".into()],
        }
    }
}

/// GitHub API settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GithubSettings {
    /// Base URL of the REST API.
    pub api_url: String,

    /// Title to register SSH public key under.
    pub key_title: String,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".into(),
            key_title: "devboot-pub-key".into(),
        }
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let expanded = shellexpand::full(path.to_string_lossy().as_ref())
        .map_err(ConfigError::ShellExpansion)?
        .into_owned();

    Ok(PathBuf::from(expanded))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read settings file.
    #[error("failed to read settings file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("HOME", "/home/blah"), ("DOTS", "/srv/dots")])]
    fn deserialize_partial_settings() -> anyhow::Result<()> {
        let result: Settings = indoc! {r#"
            log_dir = "~/logs"

            [packages]
            formula = "$DOTS/leaves"
            cask = "$DOTS/casks"
            runtime = "config/pyp-leaves"

            [dotfiles]
            repository = "my-dots"
        "#}
        .parse()?;

        assert_eq!(result.log_dir, PathBuf::from("/home/blah/logs"));
        assert_eq!(result.packages.formula, PathBuf::from("/srv/dots/leaves"));
        assert_eq!(result.packages.cask, PathBuf::from("/srv/dots/casks"));
        assert_eq!(result.test_packages.cask, PathBuf::from("config/test/casks"));
        assert_eq!(result.dotfiles.repository, "my-dots");
        assert_eq!(result.dotfiles.dir, PathBuf::from("/home/blah/dotfiles"));
        assert_eq!(result.ssh.dir, PathBuf::from("/home/blah/.ssh"));
        assert_eq!(result.github.api_url, "https://api.github.com");

        Ok(())
    }

    #[sealed_test(env = [("HOME", "/home/blah")])]
    fn missing_settings_file_yields_defaults() -> anyhow::Result<()> {
        let result = Settings::load("config/devboot.toml")?;
        let expect: Settings = "".parse()?;
        assert_eq!(result, expect);
        assert_eq!(
            result.powerline.config_dir,
            PathBuf::from("/home/blah/.config/powerline")
        );
        Ok(())
    }

    #[test]
    fn package_lists_select_test_mode() {
        let settings = Settings::default();
        assert_eq!(
            settings.package_lists(true).get(PackageFamily::Cask),
            Path::new("config/test/casks")
        );
        assert_eq!(
            settings.package_lists(false).get(PackageFamily::Runtime),
            Path::new("config/pyp-leaves")
        );
    }

    #[test]
    fn serialize_settings() {
        let mut settings = Settings::default();
        settings.powerline.runtime_packages = vec!["powerline-status".into()];
        let result = settings.to_string();

        let expect = indoc! {r#"
            credential_file = "config/git-credentials.txt"
            log_dir = "logs"

            [packages]
            formula = "config/brew/leaves"
            cask = "config/brew/casks"
            runtime = "config/pyp-leaves"

            [test_packages]
            formula = "config/test/brew-leaves"
            cask = "config/test/casks"
            runtime = "config/test/pyp-leaves"

            [dotfiles]
            repository = "dotfiles"
            dir = "~/dotfiles"
            bash_profile = "~/.bash_profile"
            vimrc = "~/.vimrc"
            emacs_dir = "~/.emacs.d"
            emacs_init = "~/.emacs.d/init.el"

            [ssh]
            dir = "~/.ssh"

            [powerline]
            config_dir = "~/.config/powerline"
            colorscheme_overlay = "config/powerline/powerline_git_color.json"
            shell_segment = "config/powerline/powerline_git_shell.json"
            fonts_repository = "https://github.com/powerline/fonts.git"
            runtime_packages = ["powerline-status"]

            [github]
            api_url = "https://api.github.com"
            key_title = "devboot-pub-key"
        "#};

        assert_eq!(result, expect);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let result = "log_dir = [1, 2]".parse::<Settings>();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));

        let result = "[packages]\nformula = \"leaves\"".parse::<Settings>();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }
}

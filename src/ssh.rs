// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! SSH key and agent management.
//!
//! Devboot manages a single RSA keypair named `id_rsa` inside the user's SSH
//! directory. The keypair is used to talk to GitHub, so besides generating
//! and deleting it, devboot also keeps two configuration blocks in sync:
//!
//! - An identity stanza in `~/.ssh/config` so that the key is picked up and
//!   handed to the agent automatically.
//! - GitHub's host key in `~/.ssh/known_hosts` so that the first clone does
//!   not stop at an interactive host verification prompt.

use crate::{
    patch::{self, BlockLine, BlockPatcher, ConfigBlock, RemoveOutcome, UpsertOutcome, LINE_SLOT},
    syscall::{Syscall, SyscallError, Syscaller, SystemSyscaller},
};

use std::{
    fs::{read_to_string, remove_file},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// File name of the managed private key.
pub const KEY_NAME: &str = "id_rsa";

/// Host whose key gets trusted in `known_hosts`.
pub const GITHUB_HOST: &str = "github.com";

/// Managed RSA keypair inside an SSH directory.
#[derive(Debug, Clone)]
pub struct SshKeys<S = SystemSyscaller>
where
    S: Syscaller,
{
    dir: PathBuf,
    syscaller: S,
}

impl<S> SshKeys<S>
where
    S: Syscaller,
{
    /// Construct new keypair handle for target SSH directory.
    pub fn new(dir: impl Into<PathBuf>, syscaller: S) -> Self {
        Self {
            dir: dir.into(),
            syscaller,
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.as_path()
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.dir.join(KEY_NAME)
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.dir.join(format!("{KEY_NAME}.pub"))
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config")
    }

    pub fn known_hosts_path(&self) -> PathBuf {
        self.dir.join("known_hosts")
    }

    /// Check if public key has been generated.
    pub fn exists(&self) -> bool {
        let exists = self.public_key_path().exists();
        if exists {
            info!("git SSH has already been configured locally");
        } else {
            info!("git SSH has not been configured locally");
        }

        exists
    }

    /// Generate new keypair protected by passphrase.
    ///
    /// # Errors
    ///
    /// - Return [`SshError::CreateDir`] if SSH directory cannot be made.
    /// - Return [`SshError::Syscall`] if `ssh-keygen` fails.
    #[instrument(skip(self, passphrase), level = "debug")]
    pub fn generate(&self, email: &str, passphrase: &str) -> Result<()> {
        mkdirp::mkdirp(&self.dir).map_err(|source| SshError::CreateDir {
            source,
            path: self.dir.clone(),
        })?;

        let syscall = Syscall::new("ssh-keygen")
            .args(["-q", "-t", "rsa", "-b", "4096", "-C", email, "-N"])
            .secret_arg(passphrase)
            .arg("-f")
            .arg(self.private_key_path())
            .stdin("y\n");
        let output = self.syscaller.call_checked(&syscall)?;
        debug!("{}", output.message());
        info!("RSA keypair for SSH has successfully been generated");

        Ok(())
    }

    /// Read public key as `type data`, stripped of its comment.
    ///
    /// # Errors
    ///
    /// - Return [`SshError::ReadPublicKey`] if public key cannot be read.
    /// - Return [`SshError::MalformedPublicKey`] if public key is not in
    ///   `type data [comment]` form.
    pub fn public_key(&self) -> Result<String> {
        let path = self.public_key_path();
        let content = read_to_string(&path).map_err(|source| SshError::ReadPublicKey {
            source,
            path: path.clone(),
        })?;

        let mut fields = content.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some(kind), Some(data)) => Ok(format!("{kind} {data}")),
            _ => Err(SshError::MalformedPublicKey { path }),
        }
    }

    /// Delete every file of the keypair.
    ///
    /// Returns the number of files deleted.
    ///
    /// # Errors
    ///
    /// - Return [`SshError::Glob`] if key files cannot be listed.
    /// - Return [`SshError::DeleteKey`] if a key file cannot be deleted.
    #[instrument(skip(self), level = "debug")]
    pub fn delete(&self) -> Result<usize> {
        let pattern = format!(
            "{}/{KEY_NAME}*",
            glob::Pattern::escape(self.dir.to_string_lossy().as_ref())
        );

        let mut count = 0;
        for entry in glob::glob(&pattern)? {
            let path = entry?;
            remove_file(&path).map_err(|source| SshError::DeleteKey {
                source,
                path: path.clone(),
            })?;
            debug!("deleted {:?}", path.display());
            count += 1;
        }

        if count == 0 {
            info!("RSA keypair for SSH has already been removed");
        } else {
            info!("RSA keypair for SSH has successfully been removed");
        }

        Ok(count)
    }

    /// Hand private key to the agent.
    ///
    /// Attached to the terminal, so `ssh-add` can ask for the passphrase. On
    /// macOS the passphrase is also stored in the keychain.
    ///
    /// # Errors
    ///
    /// - Return [`SshError::Syscall`] if `ssh-add` fails.
    #[instrument(skip(self), level = "debug")]
    pub fn add_to_agent(&self) -> Result<()> {
        let mut syscall = Syscall::new("ssh-add");
        if cfg!(target_os = "macos") {
            syscall = syscall.arg("--apple-use-keychain");
        }

        self.syscaller
            .call_interactive(&syscall.arg(self.private_key_path()))?;
        info!("SSH private key has successfully been added to the ssh-agent");

        Ok(())
    }

    /// Upsert identity stanza into SSH config file.
    ///
    /// # Errors
    ///
    /// - Return [`SshError::Patch`] if the config file cannot be patched.
    pub fn configure_identity(&self) -> Result<UpsertOutcome> {
        let patcher = BlockPatcher::new(self.config_path());
        patcher.touch()?;
        Ok(patcher.upsert(&identity_block(Some(&self.private_key_path()))?)?)
    }

    /// Remove identity stanza from SSH config file.
    ///
    /// # Errors
    ///
    /// - Return [`SshError::Patch`] if the config file cannot be patched.
    pub fn remove_identity(&self) -> Result<RemoveOutcome> {
        Ok(BlockPatcher::new(self.config_path()).remove(&identity_block(None)?)?)
    }

    /// Trust GitHub's host key by scanning it into `known_hosts`.
    ///
    /// # Errors
    ///
    /// - Return [`SshError::Syscall`] if `ssh-keyscan` fails.
    /// - Return [`SshError::NoHostKey`] if no host key was reported.
    /// - Return [`SshError::Patch`] if `known_hosts` cannot be patched.
    #[instrument(skip(self), level = "debug")]
    pub fn trust_github(&self) -> Result<UpsertOutcome> {
        let output = self
            .syscaller
            .call_checked(&Syscall::new("ssh-keyscan").args(["-t", "rsa", GITHUB_HOST]))?;
        let host_key = parse_host_key(&output.stdout).ok_or(SshError::NoHostKey {
            host: GITHUB_HOST.into(),
        })?;

        let patcher = BlockPatcher::new(self.known_hosts_path());
        patcher.touch()?;
        Ok(patcher.upsert(&known_host_block(Some(&host_key))?)?)
    }

    /// Remove GitHub's host key from `known_hosts`.
    ///
    /// # Errors
    ///
    /// - Return [`SshError::Patch`] if `known_hosts` cannot be patched.
    pub fn untrust_github(&self) -> Result<RemoveOutcome> {
        Ok(BlockPatcher::new(self.known_hosts_path()).remove(&known_host_block(None)?)?)
    }
}

/// One line of `known_hosts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostKey {
    pub host: String,
    pub kind: String,
    pub data: String,
}

/// Parse first host key reported by `ssh-keyscan`.
///
/// Comment lines are skipped.
pub fn parse_host_key(output: &str) -> Option<HostKey> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .find_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next(), fields.next()) {
                (Some(host), Some(kind), Some(data)) => Some(HostKey {
                    host: host.into(),
                    kind: kind.into(),
                    data: data.into(),
                }),
                _ => None,
            }
        })
}

/// Identity stanza of SSH config.
///
/// Without a key path the block can only be located and removed.
///
/// # Errors
///
/// - Return [`patch::Error`] if block cannot be built.
pub fn identity_block(private_key: Option<&Path>) -> patch::Result<ConfigBlock> {
    let identity = BlockLine::new().text("IdentityFile ");
    let identity = match private_key {
        Some(path) => identity.slot("identity", LINE_SLOT, path.to_string_lossy()),
        None => identity.unbound_slot("identity", LINE_SLOT),
    };

    ConfigBlock::new(
        "ssh identity",
        [
            BlockLine::from("Host *"),
            BlockLine::from("AddKeysToAgent yes"),
            BlockLine::from("UseKeychain yes"),
            identity,
        ],
    )
}

/// GitHub host key line of `known_hosts`.
///
/// The host field is `github.com`, optionally followed by `,<address>` as
/// `ssh-keyscan` may report it. Entries of other hosts, e.g.,
/// `gist.github.com`, are never matched.
///
/// Without a host key the block can only be located and removed.
///
/// # Errors
///
/// - Return [`patch::Error`] if block cannot be built.
pub fn known_host_block(host_key: Option<&HostKey>) -> patch::Result<ConfigBlock> {
    const ADDRESS: &str = r"(?:,\S+)?";

    let line = BlockLine::new().text(GITHUB_HOST);
    let line = match host_key {
        Some(key) => {
            let address = key
                .host
                .strip_prefix(GITHUB_HOST)
                .filter(|rest| rest.starts_with(','))
                .unwrap_or_default();
            line.slot("address", ADDRESS, address)
                .text(" ")
                .slot("kind", r"\S+", key.kind.as_str())
                .text(" ")
                .slot("data", r"\S+", key.data.as_str())
        }
        None => line
            .unbound_slot("address", ADDRESS)
            .text(" ")
            .unbound_slot("kind", r"\S+")
            .text(" ")
            .unbound_slot("data", r"\S+"),
    };

    ConfigBlock::new("github known host", [line])
}

/// Process identifiers of every `ssh-agent` owned by user.
///
/// # Errors
///
/// - Return [`SshError::Syscall`] if `ps aux` fails.
pub fn agent_pids(syscaller: &impl Syscaller, username: &str) -> Result<Vec<u32>> {
    let output = syscaller.call_checked(&Syscall::new("ps").arg("aux"))?;
    let pids = parse_agent_pids(&output.stdout, username);
    for pid in &pids {
        debug!("existing ssh-agent pid {pid}");
    }

    Ok(pids)
}

/// Parse `ps aux` listing for `ssh-agent` processes owned by user.
///
/// Only processes whose program, i.e., the first word of the `COMMAND`
/// column, is `ssh-agent` count. The column is located through the header
/// line, falling back to the eleventh column of the usual `ps aux` layout.
pub fn parse_agent_pids(listing: &str, username: &str) -> Vec<u32> {
    let command_column = listing
        .lines()
        .next()
        .and_then(|header| header.split_whitespace().position(|field| field == "COMMAND"))
        .unwrap_or(10);

    listing
        .lines()
        .filter_map(|line| {
            let fields = line.split_whitespace().collect::<Vec<_>>();
            let user = *fields.first()?;
            let pid = fields.get(1)?.parse::<u32>().ok()?;
            let program = fields.get(command_column)?.rsplit('/').next()?;
            (user == username && program == "ssh-agent").then_some(pid)
        })
        .collect()
}

/// Environment an agent publishes to its clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEnv {
    pub auth_sock: String,
    pub pid: u32,
}

impl AgentEnv {
    /// Publish agent to this process and its children.
    pub fn export(&self) {
        std::env::set_var("SSH_AUTH_SOCK", &self.auth_sock);
        std::env::set_var("SSH_AGENT_PID", self.pid.to_string());
    }
}

/// Parse Bourne shell output of `ssh-agent -s`.
pub fn parse_agent_env(output: &str) -> Option<AgentEnv> {
    let mut auth_sock = None;
    let mut pid = None;
    for statement in output.split([';', '\n']) {
        match statement.trim().split_once('=') {
            Some(("SSH_AUTH_SOCK", value)) => auth_sock = Some(value.to_owned()),
            Some(("SSH_AGENT_PID", value)) => pid = value.parse::<u32>().ok(),
            _ => {}
        }
    }

    Some(AgentEnv {
        auth_sock: auth_sock?,
        pid: pid?,
    })
}

/// State of the agent after [`start_agent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStatus {
    /// Agents owned by user were already running.
    AlreadyRunning(Vec<u32>),

    /// Fresh agent got started and exported.
    Started(AgentEnv),
}

/// Start an agent unless the user already has one running.
///
/// # Errors
///
/// - Return [`SshError::Syscall`] if `ps` or `ssh-agent` fails.
/// - Return [`SshError::AgentOutput`] if `ssh-agent` output is not
///   understood.
#[instrument(skip(syscaller), level = "debug")]
pub fn start_agent(syscaller: &impl Syscaller, username: &str) -> Result<AgentStatus> {
    let pids = agent_pids(syscaller, username)?;
    if !pids.is_empty() {
        info!("ssh-agent is already running");
        return Ok(AgentStatus::AlreadyRunning(pids));
    }

    let output = syscaller.call_checked(&Syscall::new("ssh-agent").arg("-s"))?;
    let env = parse_agent_env(&output.stdout).ok_or_else(|| SshError::AgentOutput {
        output: output.stdout.clone(),
    })?;
    env.export();
    info!("ssh-agent process has successfully started");

    Ok(AgentStatus::Started(env))
}

/// Stop every agent owned by user.
///
/// Returns the process identifiers that were terminated.
///
/// # Errors
///
/// - Return [`SshError::Syscall`] if `ps` or `kill` fails.
#[instrument(skip(syscaller), level = "debug")]
pub fn stop_agent(syscaller: &impl Syscaller, username: &str) -> Result<Vec<u32>> {
    let pids = agent_pids(syscaller, username)?;
    for pid in &pids {
        syscaller.call_checked(&Syscall::new("kill").arg(pid.to_string()))?;
        debug!("ssh-agent pid {pid} has been terminated");
    }

    if pids.is_empty() {
        info!("no ssh-agent process to stop");
    } else {
        info!("ssh-agent process has successfully been stopped");
    }

    Ok(pids)
}

/// SSH management error types.
#[derive(Debug, thiserror::Error)]
pub enum SshError {
    /// SSH directory could not be created.
    #[error("failed to create SSH directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Public key could not be read.
    #[error("failed to read SSH public key at {:?}", path.display())]
    ReadPublicKey {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Public key is not in `type data` form.
    #[error("SSH public key at {:?} is malformed", path.display())]
    MalformedPublicKey { path: PathBuf },

    /// Key file could not be deleted.
    #[error("failed to delete SSH key file {:?}", path.display())]
    DeleteKey {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Invalid glob pattern for key files.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Key file could not be listed.
    #[error(transparent)]
    Glob(#[from] glob::GlobError),

    /// Host key scan reported nothing.
    #[error("no host key reported for {host:?}")]
    NoHostKey { host: String },

    /// Agent printed something unexpected.
    #[error("cannot understand ssh-agent output:\n{output}")]
    AgentOutput { output: String },

    #[error(transparent)]
    Syscall(#[from] SyscallError),

    #[error(transparent)]
    Patch(#[from] patch::Error),
}

/// Friendly result alias :3
pub type Result<T, E = SshError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscall::SyscallOutput;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::{cell::RefCell, fs::write};

    #[derive(Default)]
    struct RecordingSyscaller {
        outputs: RefCell<Vec<SyscallOutput>>,
        calls: RefCell<Vec<String>>,
    }

    impl RecordingSyscaller {
        fn with(outputs: impl IntoIterator<Item = SyscallOutput>) -> Self {
            let mut outputs = outputs.into_iter().collect::<Vec<_>>();
            outputs.reverse();
            Self {
                outputs: RefCell::new(outputs),
                ..Default::default()
            }
        }
    }

    impl Syscaller for RecordingSyscaller {
        fn call(&self, syscall: &Syscall) -> crate::syscall::Result<SyscallOutput> {
            self.calls.borrow_mut().push(syscall.to_string());
            Ok(self
                .outputs
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| SyscallOutput::ok("")))
        }

        fn call_interactive(&self, syscall: &Syscall) -> crate::syscall::Result<()> {
            self.calls.borrow_mut().push(syscall.to_string());
            Ok(())
        }
    }

    const PS_AUX: &str = indoc! {"
        USER       PID  %CPU %MEM      VSZ    RSS   TT  STAT STARTED      TIME COMMAND
        octocat    412   0.0  0.0 408300800   1200   ??  S     9:00AM   0:00.01 /usr/bin/ssh-agent -l
        root       413   0.0  0.0 408300800   1200   ??  S     9:00AM   0:00.01 /usr/bin/ssh-agent
        octocat    999   0.0  0.0 408300800   1200   ??  S     9:00AM   0:00.01 vim ssh-agent.md
        octocat   1000   0.0  0.0 408300800   1200   ??  S     9:00AM   0:00.01 grep ssh-agent
        octocat   1024   0.0  0.0 408300800   1200   ??  S     9:00AM   0:00.01 ssh-agent -s
    "};

    #[test]
    fn parse_agent_pids_of_user() {
        assert_eq!(parse_agent_pids(PS_AUX, "octocat"), vec![412, 1024]);
        assert_eq!(parse_agent_pids(PS_AUX, "nobody"), Vec::<u32>::new());
    }

    #[test]
    fn parse_agent_pids_without_header() {
        let listing = "octocat 7 0.0 0.0 1 1 ?? S 9:00AM 0:00.01 ssh-agent\noctocat 8 0.0 0.0 1 1 ?? S 9:00AM 0:00.01 less ssh-agent\n";
        assert_eq!(parse_agent_pids(listing, "octocat"), vec![7]);
    }

    #[test]
    fn parse_agent_env_from_bourne_output() {
        let output = indoc! {"
            SSH_AUTH_SOCK=/tmp/ssh-XXXXabc/agent.1023; export SSH_AUTH_SOCK;
            SSH_AGENT_PID=1024; export SSH_AGENT_PID;
            echo Agent pid 1024;
        "};
        let expect = AgentEnv {
            auth_sock: "/tmp/ssh-XXXXabc/agent.1023".into(),
            pid: 1024,
        };
        assert_eq!(parse_agent_env(output), Some(expect));
        assert_eq!(parse_agent_env("echo nope;"), None);
    }

    #[test]
    fn start_agent_skips_when_running() -> anyhow::Result<()> {
        let syscaller = RecordingSyscaller::with([SyscallOutput::ok(PS_AUX)]);
        let result = start_agent(&syscaller, "octocat")?;
        assert_eq!(result, AgentStatus::AlreadyRunning(vec![412, 1024]));
        assert_eq!(*syscaller.calls.borrow(), vec!["ps aux".to_string()]);
        Ok(())
    }

    #[test]
    fn stop_agent_kills_every_user_agent() -> anyhow::Result<()> {
        let syscaller = RecordingSyscaller::with([SyscallOutput::ok(PS_AUX)]);
        let result = stop_agent(&syscaller, "octocat")?;
        assert_eq!(result, vec![412, 1024]);
        assert_eq!(
            *syscaller.calls.borrow(),
            vec!["ps aux".to_string(), "kill 412".into(), "kill 1024".into()]
        );
        Ok(())
    }

    #[test]
    fn parse_host_key_skips_comments() {
        let output = indoc! {"
            # github.com:22 SSH-2.0-babeld-2d5ee9e4
            github.com ssh-rsa AAAAB3NzaC1yc2E
        "};
        let expect = HostKey {
            host: "github.com".into(),
            kind: "ssh-rsa".into(),
            data: "AAAAB3NzaC1yc2E".into(),
        };
        assert_eq!(parse_host_key(output), Some(expect));
    }

    #[sealed_test]
    fn public_key_drops_comment() -> anyhow::Result<()> {
        write("id_rsa.pub", "ssh-rsa AAAAB3Nza octocat@github.com\n")?;
        let keys = SshKeys::new(".", SystemSyscaller);
        assert!(keys.exists());
        assert_eq!(keys.public_key()?, "ssh-rsa AAAAB3Nza");

        write("id_rsa.pub", "ssh-rsa\n")?;
        assert!(matches!(keys.public_key(), Err(SshError::MalformedPublicKey { .. })));
        Ok(())
    }

    #[sealed_test]
    fn delete_removes_whole_keypair() -> anyhow::Result<()> {
        std::fs::create_dir("ssh")?;
        write("ssh/id_rsa", "private")?;
        write("ssh/id_rsa.pub", "public")?;
        write("ssh/config", "Host *")?;

        let keys = SshKeys::new("ssh", SystemSyscaller);
        assert_eq!(keys.delete()?, 2);
        assert!(Path::new("ssh/config").exists());
        assert_eq!(keys.delete()?, 0);
        Ok(())
    }

    #[sealed_test]
    fn identity_stanza_round_trip() -> anyhow::Result<()> {
        let original = "Host example.org\n  User git\n";
        write("config", original)?;
        let keys = SshKeys::new(".", SystemSyscaller);

        assert_eq!(keys.configure_identity()?, UpsertOutcome::Inserted);
        assert_eq!(keys.configure_identity()?, UpsertOutcome::Unchanged);
        let content = read_to_string("config")?;
        assert!(content.contains("UseKeychain yes\nIdentityFile ./id_rsa"));

        assert_eq!(keys.remove_identity()?, RemoveOutcome::Removed);
        assert_eq!(read_to_string("config")?, original);
        Ok(())
    }

    #[sealed_test]
    fn trust_github_then_untrust() -> anyhow::Result<()> {
        let original = "gitlab.com ssh-ed25519 AAAAC3Nz\n";
        write("known_hosts", original)?;
        let syscaller = RecordingSyscaller::with([SyscallOutput::ok(
            "github.com ssh-rsa AAAAB3NzaC1yc2E\n",
        )]);
        let keys = SshKeys::new(".", &syscaller);

        assert_eq!(keys.trust_github()?, UpsertOutcome::Inserted);
        assert_eq!(
            read_to_string("known_hosts")?,
            "gitlab.com ssh-ed25519 AAAAC3Nz\n\ngithub.com ssh-rsa AAAAB3NzaC1yc2E\n"
        );

        assert_eq!(keys.untrust_github()?, RemoveOutcome::Removed);
        assert_eq!(read_to_string("known_hosts")?, original);
        assert_eq!(keys.untrust_github()?, RemoveOutcome::AlreadyAbsent);
        Ok(())
    }

    #[sealed_test]
    fn untrust_github_leaves_other_github_hosts() -> anyhow::Result<()> {
        let original = indoc! {"
            gist.github.com ssh-ed25519 GISTKEY
            [ssh.github.com]:443 ssh-ed25519 SSHKEY
        "};
        write("known_hosts", format!("{original}github.com,140.82.112.3 ssh-rsa GHKEY\n"))?;
        let keys = SshKeys::new(".", SystemSyscaller);

        assert_eq!(keys.untrust_github()?, RemoveOutcome::Removed);
        assert_eq!(read_to_string("known_hosts")?, original);
        assert_eq!(keys.untrust_github()?, RemoveOutcome::AlreadyAbsent);
        Ok(())
    }

    #[sealed_test]
    fn trust_github_appends_next_to_other_github_hosts() -> anyhow::Result<()> {
        let original = "[ssh.github.com]:443 ssh-ed25519 SSHKEY\ngist.github.com ssh-ed25519 GISTKEY\n";
        write("known_hosts", original)?;
        let syscaller = RecordingSyscaller::with([
            SyscallOutput::ok("github.com ssh-rsa NEWKEY\n"),
            SyscallOutput::ok("github.com ssh-rsa NEWERKEY\n"),
        ]);
        let keys = SshKeys::new(".", &syscaller);

        assert_eq!(keys.trust_github()?, UpsertOutcome::Inserted);
        assert_eq!(
            read_to_string("known_hosts")?,
            format!("{original}\ngithub.com ssh-rsa NEWKEY\n")
        );

        assert_eq!(keys.trust_github()?, UpsertOutcome::Updated);
        assert_eq!(
            read_to_string("known_hosts")?,
            format!("{original}\ngithub.com ssh-rsa NEWERKEY\n")
        );
        Ok(())
    }

    #[test]
    fn known_host_block_keeps_scanned_address() -> anyhow::Result<()> {
        let key = HostKey {
            host: "github.com,140.82.112.3".into(),
            kind: "ssh-rsa".into(),
            data: "AAAA".into(),
        };
        let block = known_host_block(Some(&key))?;
        assert_eq!(block.template(), Some("github.com,140.82.112.3 ssh-rsa AAAA"));
        Ok(())
    }

    #[test]
    fn identity_path_may_contain_spaces() -> anyhow::Result<()> {
        let block = identity_block(Some(Path::new("/Users/Jane Doe/.ssh/id_rsa")))?;
        let content = block.template().unwrap_or_default().to_owned();
        assert_eq!(
            block.capture(&content, "identity"),
            Some("/Users/Jane Doe/.ssh/id_rsa".into())
        );
        Ok(())
    }
}

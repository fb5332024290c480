// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap a personal development environment.
//!
//! Devboot brings a fresh machine to a known state in one go: it installs
//! wishlisted packages, generates an SSH keypair and registers it on GitHub,
//! clones dotfiles, and wires powerline into the shell and Vim. Every step
//! is idempotent, so running it again only does what is still missing. The
//! teardown flow undoes all of it.
//!
//! Files owned by the user are never rewritten wholesale. Devboot only
//! inserts, updates, or removes its own marked blocks inside them, see
//! [`patch`].

pub mod config;
pub mod context;
pub mod credential;
pub mod dotfiles;
pub mod flow;
pub mod git;
pub mod github;
pub mod logging;
pub mod package;
pub mod patch;
pub mod path;
pub mod powerline;
pub mod ssh;
pub mod syscall;

//! # Playtest - a test runner for Ansible roles and playbooks
//!
//! Playtest executes playbooks against a real local inventory and collects
//! pass/fail outcomes for tasks tagged `test`. It drives the external engine
//! (`ansible-playbook`) as a child process with a bundled event-emitting
//! callback plugin, and installs dependency roles (`ansible-galaxy`) into a
//! scoped directory before the run.
//!
//! ## Core flow
//!
//! 1. [`context::PlaybookContext::prepare`] resolves and installs the
//!    dependency closure of the role under test into a temporary
//!    installed-roles directory (removed on drop).
//! 2. [`tasks::list_test_tasks`] enumerates the playbook's test tasks via
//!    the engine's dry listing mode.
//! 3. [`runner::PlaybookRunner`] supervises the playbook execution,
//!    correlating structured events on the child's stdout with each test
//!    task, one task at a time, in enumeration order.
//!
//! ## Quick example
//!
//! ```rust,ignore
//! use playtest::config::EngineConfig;
//! use playtest::context::PlaybookContext;
//! use playtest::runner::PlaybookRunner;
//!
//! #[tokio::main]
//! async fn main() -> playtest::error::Result<()> {
//!     let ctx = PlaybookContext::prepare(
//!         "roles/role1/tests/test_playbook.yml",
//!         "roles/role1/tests/inventory",
//!         Some("roles/role1".into()),
//!         EngineConfig::default(),
//!     )
//!     .await?;
//!
//!     let tasks = playtest::tasks::list_test_tasks(&ctx).await?;
//!     let mut runner = PlaybookRunner::spawn(&ctx).await?;
//!     for task in &tasks {
//!         runner.wait_for_task_start(task).await?;
//!         let outcome = runner.wait_for_task_outcome(task).await?;
//!         println!("{} ... {}", task.name, outcome.as_str());
//!     }
//!     let report = runner.finish().await?;
//!     assert!(report.is_success());
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod installer;
pub mod meta;
pub mod requirements;
pub mod resolver;
pub mod runner;
pub mod tasks;

pub use config::EngineConfig;
pub use context::PlaybookContext;
pub use error::{Error, Result};
pub use events::{RunEvent, StreamLine, TaskOutcome};
pub use requirements::{RequirementsFile, RoleRequirement};
pub use resolver::{MetaSource, ResolvedDependencySet, Resolver};
pub use runner::{PlaybookRunner, RunReport};
pub use tasks::{list_test_tasks, Task};

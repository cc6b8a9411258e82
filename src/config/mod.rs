//! Layered configuration.
//!
//! Tiers, lowest priority first, merged field-by-field:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `$CWD/taskflow/config.yaml`
//! 3. **User** - `~/.taskflow/config.yaml`
//! 4. **Environment** - see below
//!
//! Command-line flags are applied on top by the binary.
//!
//! ## Environment Variables
//! - `TASKFLOW_CONFIG_PATH` - Explicit config file (skips tiers 2 and 3)
//! - `TASKFLOW_DB_PATH` - Database path
//! - `TASKFLOW_HOST` / `TASKFLOW_PORT` - Bind address
//! - `TASKFLOW_JWT_SECRET` - Token signing secret
//! - `TASKFLOW_JWT_ISSUER` - Expected token issuer
//! - `TASKFLOW_SERVER_URL` - Server used by client subcommands

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;

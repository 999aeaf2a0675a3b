//! Host platform utility functions

use std::{env, path::PathBuf};

/// Environment variable pointing at the root of the software checkout.
pub const SW_ROOT_VAR: &str = "ARM_SW_ROOT";

/// Get the software root directory, which holds the `params` and `sessions` directories.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_VAR).map(PathBuf::from)
}

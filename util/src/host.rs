//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "KESTREL_SW_ROOT";

/// Get the software root directory from the environment.
///
/// Sessions are created under `<root>/sessions` and parameter files are
/// loaded from `<root>/params`.
pub fn get_kestrel_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Describe the host platform.
pub fn get_platform() -> String {
    format!("{} {}", env::consts::OS, env::consts::ARCH)
}

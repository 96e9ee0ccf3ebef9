// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use path_clean::clean;
use std::path::{Path, PathBuf};

/// Where the configuration file was taken from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Passed with `--config`
    CommandLine(PathBuf),
    /// Found in the working directory or one of its parents
    Discovered(PathBuf),
    /// Nothing found. The file in the OS config dir, which may not exist.
    Default(PathBuf),
}

impl ConfigLocation {
    pub fn path(&self) -> &Path {
        match self {
            ConfigLocation::CommandLine(path)
            | ConfigLocation::Discovered(path)
            | ConfigLocation::Default(path) => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            ConfigLocation::CommandLine(path)
            | ConfigLocation::Discovered(path)
            | ConfigLocation::Default(path) => path,
        }
    }
}

pub type Discover = fn(&Path, &str) -> Option<PathBuf>;

/// The nearest `filename` in `start` or any directory above it
pub fn find_in_ancestors(start: &Path, filename: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.is_file())
}

/// Pick the config file: `--config` first, then the nearest `filename` above `cwd`, then the OS
/// config dir.
pub fn locate_config(
    discover: Discover,
    cwd: &Path,
    config_dir: &Path,
    filename: &str,
    cli_file: Option<&Path>,
) -> ConfigLocation {
    if let Some(file) = cli_file {
        let file = if file.is_absolute() {
            file.to_path_buf()
        } else {
            clean(cwd.join(file))
        };
        return ConfigLocation::CommandLine(file);
    }

    match discover(cwd, filename) {
        Some(found) => ConfigLocation::Discovered(found),
        None => ConfigLocation::Default(clean(config_dir.join(filename))),
    }
}

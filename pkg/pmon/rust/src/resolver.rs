// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::{Path, PathBuf};

/// File name of the supervisor executable, without platform suffix.
pub const PMON_EXECUTABLE: &str = "WCCILpmon";

/// Finds the supervisor executable for an installed product version.
///
/// Discovery itself (registry probing, install directory scans, caching) lives
/// outside this crate; implementations are injected into
/// [`crate::PmonClient::from_resolver`].
pub trait ExecutableResolver: Send + Sync {
    fn resolve(&self, version: Option<&str>) -> Option<PathBuf>;
}

/// Always answers with one path, whatever the version.
#[derive(Debug, Clone)]
pub struct FixedPathResolver {
    path: PathBuf,
}

impl FixedPathResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ExecutableResolver for FixedPathResolver {
    fn resolve(&self, _version: Option<&str>) -> Option<PathBuf> {
        self.path.exists().then(|| self.path.clone())
    }
}

/// Looks for `<root>/<version>/bin/WCCILpmon`, with `.exe` as a fallback.
#[derive(Debug, Clone)]
pub struct InstallRootResolver {
    root: PathBuf,
}

impl InstallRootResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ExecutableResolver for InstallRootResolver {
    fn resolve(&self, version: Option<&str>) -> Option<PathBuf> {
        let version = version.filter(|v| !v.trim().is_empty())?;
        let candidate = self.root.join(version).join("bin").join(PMON_EXECUTABLE);
        if candidate.exists() {
            return Some(candidate);
        }
        let with_exe = candidate.with_extension("exe");
        with_exe.exists().then_some(with_exe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_install_root_resolves_versioned_binary() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("3.20").join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join(PMON_EXECUTABLE), "").unwrap();

        let resolver = InstallRootResolver::new(dir.path());
        assert_eq!(
            resolver.resolve(Some("3.20")),
            Some(bin.join(PMON_EXECUTABLE))
        );
        assert_eq!(resolver.resolve(Some("3.19")), None);
        assert_eq!(resolver.resolve(None), None);
        assert_eq!(resolver.resolve(Some("")), None);
    }

    #[test]
    fn test_install_root_falls_back_to_exe() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("3.21").join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("WCCILpmon.exe"), "").unwrap();

        let resolver = InstallRootResolver::new(dir.path());
        assert_eq!(
            resolver.resolve(Some("3.21")),
            Some(bin.join("WCCILpmon.exe"))
        );
    }

    #[test]
    fn test_fixed_path_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PMON_EXECUTABLE);
        let resolver = FixedPathResolver::new(&path);
        assert_eq!(resolver.resolve(Some("3.20")), None);

        fs::write(&path, "").unwrap();
        assert_eq!(resolver.resolve(None), Some(path));
    }
}

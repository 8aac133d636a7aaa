//! Locations of the Go installation and module cache.

use std::path::PathBuf;
use std::process::Command;

/// Where packages outside the current module are looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoEnv {
    /// `$GOROOT`; standard library sources live under `src/`.
    pub goroot: Option<PathBuf>,
    /// `$GOMODCACHE`, holding `<module>@<version>` directories.
    pub mod_cache: Option<PathBuf>,
}

impl GoEnv {
    /// Read `GOROOT` and `GOMODCACHE` from the environment, asking `go env`
    /// for whatever is unset, and falling back to `$GOPATH/pkg/mod` (or
    /// `~/go/pkg/mod`) for the module cache.
    pub fn detect() -> Self {
        let mut env = Self {
            goroot: env_dir("GOROOT"),
            mod_cache: env_dir("GOMODCACHE").or_else(gopath_mod_cache),
        };
        if (env.goroot.is_none() || env.mod_cache.is_none())
            && let Some(reported) = go_env()
        {
            env.goroot = env.goroot.or(reported.goroot);
            env.mod_cache = env.mod_cache.or(reported.mod_cache);
        }
        if env.mod_cache.is_none() {
            env.mod_cache = dirs::home_dir().map(|home| home.join("go").join("pkg").join("mod"));
        }
        tracing::debug!(goroot = ?env.goroot, mod_cache = ?env.mod_cache, "go environment");
        env
    }

    /// Source directory of a standard library package.
    pub fn std_dir(&self, import_path: &str) -> Option<PathBuf> {
        let src = self.goroot.as_ref()?.join("src");
        let dir = import_path.split('/').fold(src, |dir, part| dir.join(part));
        dir.is_dir().then_some(dir)
    }
}

fn env_dir(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn gopath_mod_cache() -> Option<PathBuf> {
    let gopath = std::env::var_os("GOPATH")?;
    std::env::split_paths(&gopath)
        .next()
        .filter(|first| !first.as_os_str().is_empty())
        .map(|first| first.join("pkg").join("mod"))
}

fn go_env() -> Option<GoEnv> {
    let output = Command::new("go")
        .args(["env", "GOROOT", "GOMODCACHE"])
        .output()
        .ok()?;
    if !output.status.success() {
        tracing::debug!(status = %output.status, "go env failed");
        return None;
    }
    Some(parse_go_env(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse the two lines printed by `go env GOROOT GOMODCACHE`.
fn parse_go_env(stdout: &str) -> GoEnv {
    let mut lines = stdout
        .lines()
        .map(str::trim)
        .map(|line| (!line.is_empty()).then(|| PathBuf::from(line)));
    GoEnv {
        goroot: lines.next().flatten(),
        mod_cache: lines.next().flatten(),
    }
}

//! `go.mod` discovery and import path mapping.

use std::path::{Component, Path, PathBuf};

use crate::error::{GoError, Result};

pub const GO_MOD: &str = "go.mod";

/// A Go module rooted at the directory holding its `go.mod`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    pub root: PathBuf,
    pub path: String,
    pub requires: Vec<Requirement>,
    pub replaces: Vec<Replacement>,
}

/// A `require` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub path: String,
    pub version: String,
}

/// A `replace` directive. A missing `version` replaces every version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub path: String,
    pub version: Option<String>,
    pub target: ReplaceTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceTarget {
    /// A directory, relative to the replacing module's root.
    Dir(PathBuf),
    Module { path: String, version: String },
}

impl Module {
    /// Find the module containing `dir` by walking up to the nearest `go.mod`.
    pub fn discover(dir: &Path) -> Result<Option<Self>> {
        for candidate in dir.ancestors() {
            let go_mod = candidate.join(GO_MOD);
            if !go_mod.is_file() {
                continue;
            }
            let contents =
                std::fs::read_to_string(&go_mod).map_err(|e| GoError::io(&go_mod, e))?;
            let mut module = parse_go_mod(&go_mod, &contents)?;
            tracing::debug!(
                module = %module.path,
                root = %candidate.display(),
                requires = module.requires.len(),
                "found go.mod"
            );
            module.root = candidate.to_path_buf();
            return Ok(Some(module));
        }
        Ok(None)
    }

    /// Import path of a directory inside this module.
    pub fn import_path_for(&self, dir: &Path) -> Option<String> {
        let relative = dir.strip_prefix(&self.root).ok()?;
        let mut path = self.path.clone();
        for component in relative.components() {
            let Component::Normal(part) = component else {
                return None;
            };
            path.push('/');
            path.push_str(&part.to_string_lossy());
        }
        Some(path)
    }

    /// Directory of an import path that belongs to this module.
    pub fn dir_for(&self, import_path: &str) -> Option<PathBuf> {
        if import_path == self.path {
            return Some(self.root.clone());
        }
        let rest = import_path.strip_prefix(&self.path)?.strip_prefix('/')?;
        Some(join_import_path(self.root.clone(), rest))
    }

    /// Directory of `import_path` under this module's `vendor/`, if present.
    pub fn vendor_dir(&self, import_path: &str) -> Option<PathBuf> {
        let dir = join_import_path(self.root.join("vendor"), import_path);
        dir.is_dir().then_some(dir)
    }

    /// Directory of `import_path` inside a required module, honoring
    /// `replace` directives. Module cache paths need `mod_cache`.
    pub fn required_dir(&self, import_path: &str, mod_cache: Option<&Path>) -> Option<PathBuf> {
        let requirement = self
            .requires
            .iter()
            .filter(|r| within(import_path, &r.path))
            .max_by_key(|r| r.path.len())?;
        let rest = import_path[requirement.path.len()..].trim_start_matches('/');

        let replacement = self.replaces.iter().find(|r| {
            r.path == requirement.path
                && r.version.as_ref().is_none_or(|v| *v == requirement.version)
        });
        let root = match replacement.map(|r| &r.target) {
            Some(ReplaceTarget::Dir(dir)) => self.root.join(dir),
            Some(ReplaceTarget::Module { path, version }) => {
                mod_cache?.join(cache_dir_name(path, version))
            }
            None => mod_cache?.join(cache_dir_name(&requirement.path, &requirement.version)),
        };
        Some(join_import_path(root, rest))
    }
}

/// Whether `import_path` is `module` or a package below it.
pub fn within(import_path: &str, module: &str) -> bool {
    import_path
        .strip_prefix(module)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Whether an import path names a standard library package (no dot in the
/// first path element).
pub fn is_standard_library(import_path: &str) -> bool {
    !import_path.split('/').next().unwrap_or_default().contains('.')
}

fn join_import_path(root: PathBuf, import_path: &str) -> PathBuf {
    import_path
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root, |dir, part| dir.join(part))
}

/// `<path>@<version>` as laid out in the module cache, where upper-case
/// letters are written as `!` plus the lower-case letter.
pub fn cache_dir_name(path: &str, version: &str) -> PathBuf {
    PathBuf::from(format!("{}@{}", escape_case(path), escape_case(version)))
}

fn escape_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Package name conventionally used for an import path whose package
/// clause is unknown: the last segment without a major-version suffix or
/// `go-`/`-go` affixes.
pub fn default_package_name(import_path: &str) -> String {
    let mut segments = import_path.rsplit('/');
    let mut last = segments.next().unwrap_or(import_path);
    if is_major_version(last)
        && let Some(previous) = segments.next()
    {
        last = previous;
    }
    if let Some((stem, version)) = last.split_once(".v")
        && version.chars().all(|c| c.is_ascii_digit())
        && !version.is_empty()
    {
        last = stem;
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    let last = last.strip_suffix("-go").unwrap_or(last);
    last.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// Parse the `module`, `require` and `replace` directives of a `go.mod`.
/// The returned module's `root` is left empty.
pub fn parse_go_mod(go_mod: &Path, contents: &str) -> Result<Module> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Block {
        None,
        Require,
        Replace,
        Other,
    }

    let mut module = Module {
        path: parse_module_path(go_mod, contents)?,
        ..Module::default()
    };
    let mut block = Block::None;
    for (index, line) in contents.lines().enumerate() {
        let line = line.split("//").next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let (kind, rest) = match block {
            Block::None => {
                let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
                let kind = match keyword {
                    "require" => Block::Require,
                    "replace" => Block::Replace,
                    _ => Block::Other,
                };
                let rest = rest.trim();
                if rest == "(" {
                    block = kind;
                    continue;
                }
                (kind, rest)
            }
            _ if line == ")" => {
                block = Block::None;
                continue;
            }
            kind => (kind, line),
        };

        let malformed = |what: &str| GoError::Module {
            path: go_mod.to_path_buf(),
            message: format!("line {}: malformed {what} directive", index + 1),
        };
        let fields: Vec<&str> = rest.split_whitespace().map(unquote).collect();
        match kind {
            Block::Require => match fields.as_slice() {
                [path, version, ..] => module.requires.push(Requirement {
                    path: (*path).to_string(),
                    version: (*version).to_string(),
                }),
                _ => return Err(malformed("require")),
            },
            Block::Replace => {
                let arrow = fields
                    .iter()
                    .position(|f| *f == "=>")
                    .ok_or_else(|| malformed("replace"))?;
                let (old, new) = (&fields[..arrow], &fields[arrow + 1..]);
                let target = match new {
                    [dir] if is_local_path(dir) => ReplaceTarget::Dir(PathBuf::from(dir)),
                    [path, version] => ReplaceTarget::Module {
                        path: (*path).to_string(),
                        version: (*version).to_string(),
                    },
                    _ => return Err(malformed("replace")),
                };
                let (path, version) = match old {
                    [path] => (*path, None),
                    [path, version] => (*path, Some((*version).to_string())),
                    _ => return Err(malformed("replace")),
                };
                module.replaces.push(Replacement {
                    path: path.to_string(),
                    version,
                    target,
                });
            }
            Block::None | Block::Other => {}
        }
    }
    Ok(module)
}

fn unquote(field: &str) -> &str {
    field.trim_matches(|c| c == '"' || c == '`')
}

fn is_local_path(target: &str) -> bool {
    target.starts_with("./") || target.starts_with("../") || Path::new(target).is_absolute()
}

/// Extract the module path from `go.mod` contents.
pub fn parse_module_path(go_mod: &Path, contents: &str) -> Result<String> {
    for line in contents.lines() {
        let line = line.split("//").next().unwrap_or_default().trim();
        let Some(rest) = line.strip_prefix("module") else {
            continue;
        };
        if !rest.starts_with(char::is_whitespace) {
            continue;
        }
        let path = rest.trim().trim_matches(|c| c == '"' || c == '`');
        if path.is_empty() {
            break;
        }
        return Ok(path.to_string());
    }
    Err(GoError::Module {
        path: go_mod.to_path_buf(),
        message: "missing module directive".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> Module {
        Module {
            root: PathBuf::from("/src/svc"),
            path: "example.com/svc".into(),
            ..Module::default()
        }
    }

    #[test]
    fn parses_module_directive() {
        let path = Path::new("go.mod");
        assert_eq!(
            parse_module_path(path, "// comment\nmodule example.com/svc // trailing\n\ngo 1.22\n")
                .unwrap(),
            "example.com/svc"
        );
        assert_eq!(
            parse_module_path(path, "module \"example.com/quoted\"\n").unwrap(),
            "example.com/quoted"
        );
        assert!(parse_module_path(path, "go 1.22\n").is_err());
        assert!(parse_module_path(path, "modulex foo\n").is_err());
    }

    #[test]
    fn maps_directories_to_import_paths() {
        let m = module();
        assert_eq!(m.import_path_for(Path::new("/src/svc")).unwrap(), "example.com/svc");
        assert_eq!(
            m.import_path_for(Path::new("/src/svc/internal/client")).unwrap(),
            "example.com/svc/internal/client"
        );
        assert!(m.import_path_for(Path::new("/elsewhere")).is_none());
    }

    #[test]
    fn maps_import_paths_to_directories() {
        let m = module();
        assert_eq!(m.dir_for("example.com/svc").unwrap(), PathBuf::from("/src/svc"));
        assert_eq!(
            m.dir_for("example.com/svc/internal/client").unwrap(),
            PathBuf::from("/src/svc/internal/client")
        );
        assert!(m.dir_for("example.com/svcx").is_none());
        assert!(m.dir_for("github.com/other").is_none());
    }

    #[test]
    fn guesses_package_names() {
        assert_eq!(default_package_name("time"), "time");
        assert_eq!(default_package_name("github.com/efritz/imperial/red"), "red");
        assert_eq!(default_package_name("github.com/jackc/pgx/v5"), "pgx");
        assert_eq!(default_package_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(default_package_name("github.com/efritz/go-mockgen"), "mockgen");
        assert_eq!(default_package_name("github.com/aws/aws-sdk-go"), "aws_sdk");
        assert_eq!(default_package_name("example.com/my.pkg"), "my_pkg");
    }

    #[test]
    fn discovers_nearest_go_mod() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join(GO_MOD), "module example.com/root\n").unwrap();
        let nested = temp.path().join("pkg").join("client");
        std::fs::create_dir_all(&nested).unwrap();

        let found = Module::discover(&nested).unwrap().unwrap();
        assert_eq!(found.path, "example.com/root");
        assert_eq!(found.root, temp.path());
        assert_eq!(
            found.import_path_for(&nested).unwrap(),
            "example.com/root/pkg/client"
        );
    }

    const GO_MOD_WITH_DEPENDENCIES: &str = r#"module example.com/svc

go 1.22

require github.com/efritz/go-mockgen v1.0.0

require (
	github.com/BurntSushi/toml v1.3.2 // indirect
	k8s.io/api v0.29.0
	example.com/local v0.0.0
)

replace example.com/local => ../local

replace (
	k8s.io/api v0.29.0 => k8s.io/api v0.29.1
)
"#;

    #[test]
    fn parses_require_and_replace_directives() {
        let parsed = parse_go_mod(Path::new("go.mod"), GO_MOD_WITH_DEPENDENCIES).unwrap();
        assert_eq!(parsed.path, "example.com/svc");
        let requires: Vec<_> = parsed
            .requires
            .iter()
            .map(|r| (r.path.as_str(), r.version.as_str()))
            .collect();
        assert_eq!(
            requires,
            [
                ("github.com/efritz/go-mockgen", "v1.0.0"),
                ("github.com/BurntSushi/toml", "v1.3.2"),
                ("k8s.io/api", "v0.29.0"),
                ("example.com/local", "v0.0.0"),
            ]
        );
        assert_eq!(
            parsed.replaces,
            [
                Replacement {
                    path: "example.com/local".into(),
                    version: None,
                    target: ReplaceTarget::Dir(PathBuf::from("../local")),
                },
                Replacement {
                    path: "k8s.io/api".into(),
                    version: Some("v0.29.0".into()),
                    target: ReplaceTarget::Module {
                        path: "k8s.io/api".into(),
                        version: "v0.29.1".into(),
                    },
                },
            ]
        );

        let err = parse_go_mod(Path::new("go.mod"), "module a\nrequire onlypath\n").unwrap_err();
        assert!(err.to_string().contains("malformed require"), "got: {err}");
    }

    #[test]
    fn maps_required_packages_into_the_module_cache() {
        let mut m = parse_go_mod(Path::new("go.mod"), GO_MOD_WITH_DEPENDENCIES).unwrap();
        m.root = PathBuf::from("/src/svc");
        let cache = Path::new("/cache");

        assert_eq!(
            m.required_dir("github.com/efritz/go-mockgen/error", Some(cache)).unwrap(),
            PathBuf::from("/cache/github.com/efritz/go-mockgen@v1.0.0/error")
        );
        assert_eq!(
            m.required_dir("github.com/BurntSushi/toml", Some(cache)).unwrap(),
            PathBuf::from("/cache/github.com/!burnt!sushi/toml@v1.3.2")
        );
        assert_eq!(
            m.required_dir("k8s.io/api/core/v1", Some(cache)).unwrap(),
            PathBuf::from("/cache/k8s.io/api@v0.29.1/core/v1")
        );
        assert_eq!(
            m.required_dir("example.com/local/pkg", None).unwrap(),
            PathBuf::from("/src/svc/../local/pkg")
        );
        assert!(m.required_dir("github.com/efritz/go-mockgen/error", None).is_none());
        assert!(m.required_dir("github.com/efritz/go-mockgenx", Some(cache)).is_none());
    }

    #[test]
    fn classifies_standard_library_paths() {
        assert!(is_standard_library("net/url"));
        assert!(is_standard_library("io"));
        assert!(!is_standard_library("github.com/efritz/imperial/red"));
        assert!(!is_standard_library("k8s.io/api/core/v1"));
    }
}

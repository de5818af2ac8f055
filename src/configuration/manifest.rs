use crate::configuration::constants::common::{DEFAULT_SHELL, ENV_PREFIX};
use crate::error::{Error, Result};
use config::{Config, Environment, File};
use serde_derive::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub name: String,
    /// Command prefix used to run case command lines, split on whitespace.
    #[serde(default = "default_shell")]
    pub shell: String,
    pub suites: Vec<NodeEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NodeEntry {
    pub name: String,
    pub run: Option<String>,
    pub tests: Option<Vec<NodeEntry>>,
    pub skip: Option<String>,
    pub workdir: Option<PathBuf>,
}

fn default_shell() -> String {
    DEFAULT_SHELL.to_owned()
}

impl Manifest {
    pub fn from(file: PathBuf) -> Result<Self> {
        let mut config = Config::new();
        config.merge(File::from(file))?;
        config.merge(Environment::with_prefix(ENV_PREFIX))?;
        Self::finish(config)
    }

    #[cfg(test)]
    pub fn from_content(content: &str, format: config::FileFormat) -> Result<Self> {
        let mut config = Config::new();
        config.merge(File::from_str(content, format))?;
        Self::finish(config)
    }

    fn finish(config: Config) -> Result<Self> {
        let manifest: Manifest = config.try_into()?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn shell_command(&self) -> Vec<String> {
        self.shell.split_whitespace().map(str::to_owned).collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.shell_command().is_empty() {
            return Err(Error::Manifest("`shell` must name a program".to_owned()));
        }
        validate_siblings(&self.name, &self.suites)
    }
}

impl NodeEntry {
    #[inline]
    pub fn is_container(&self) -> bool {
        self.tests.is_some()
    }

    pub fn children(&self) -> &[NodeEntry] {
        self.tests.as_deref().unwrap_or(&[])
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Manifest("test names must not be empty".to_owned()));
        }
        if self.name.contains(&['[', ']'][..]) {
            return Err(Error::Manifest(format!(
                "`{}`: test names must not contain `[` or `]`",
                self.name
            )));
        }
        match (&self.run, &self.tests) {
            (Some(_), Some(_)) => Err(Error::Manifest(format!(
                "`{}` declares both `run` and `tests`",
                self.name
            ))),
            (None, None) => Err(Error::Manifest(format!(
                "`{}` declares neither `run` nor `tests`",
                self.name
            ))),
            (None, Some(children)) => validate_siblings(&self.name, children),
            (Some(_), None) => Ok(()),
        }
    }
}

fn validate_siblings(parent: &str, entries: &[NodeEntry]) -> Result<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        entry.validate()?;
        if !seen.insert(entry.name.as_str()) {
            return Err(Error::Manifest(format!(
                "`{}` declares `{}` more than once",
                parent, entry.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use config::FileFormat;

    const MANIFEST: &str = r#"
name: calculator
suites:
  - name: Math
    tests:
      - name: adds
        run: "true"
      - name: nested
        tests:
          - name: divides
            run: "exit 3"
            workdir: /tmp
      - name: pending
        run: "true"
        skip: not implemented
"#;

    #[test]
    fn test_load_yaml_manifest() {
        let manifest = Manifest::from_content(MANIFEST, FileFormat::Yaml).unwrap();
        let math = &manifest.suites[0];

        assert_eq!(manifest.name, "calculator");
        assert_eq!(manifest.shell_command(), vec!["sh", "-c"]);
        assert!(math.is_container());
        assert_eq!(math.children().len(), 3);
        assert_eq!(math.children()[1].children()[0].run.as_deref(), Some("exit 3"));
        assert_eq!(
            math.children()[1].children()[0].workdir,
            Some(PathBuf::from("/tmp"))
        );
        assert_eq!(math.children()[2].skip.as_deref(), Some("not implemented"));
    }

    #[test]
    fn test_rejects_node_with_run_and_tests() {
        let content = r#"{"name": "x", "suites": [{"name": "a", "run": "true", "tests": [{"name": "b", "run": "true"}]}]}"#;
        let result = Manifest::from_content(content, FileFormat::Json);

        assert!(matches!(result, Err(Error::Manifest(_))));
    }

    #[test]
    fn test_rejects_duplicate_siblings() {
        let content = r#"{"name": "x", "suites": [{"name": "a", "run": "true"}, {"name": "a", "run": "false"}]}"#;
        let result = Manifest::from_content(content, FileFormat::Json);

        assert!(matches!(result, Err(Error::Manifest(_))));
    }

    #[test]
    fn test_rejects_bracketed_names() {
        let content = r#"{"name": "x", "suites": [{"name": "a[1]", "run": "true"}]}"#;
        let result = Manifest::from_content(content, FileFormat::Json);

        assert!(matches!(result, Err(Error::Manifest(_))));
    }
}

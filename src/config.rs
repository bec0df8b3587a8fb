use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    error::{Error, Result, Stage},
    page::{AccessClass, PageSize, DEFAULT_PAGE_SIZE},
    replace::{fifo::Fifo, lru::Lru, optimal::Optimal, random::Random, PolicyKind},
    tlb::{IsTlb, Tlb},
};

/// An external program and its argument template. `{name}` placeholders are
/// substituted before the program is run.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolConfig {
    pub fn render_args(&self, vars: &HashMap<&str, String>) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                vars.iter().fold(arg.clone(), |arg, (name, value)| {
                    arg.replace(&format!("{{{name}}}"), value)
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub page_size: u64,
    pub capacity: Option<usize>,
    pub policies: Vec<PolicyKind>,
    pub seed: u64,
    pub heartbeat: u64,
    pub work_dir: PathBuf,
    pub executable: String,
    pub instruction_refs: String,
    pub data_refs: String,
    pub skip_profile: bool,
    pub compiler: ToolConfig,
    pub profiler: ToolConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            page_size: DEFAULT_PAGE_SIZE,
            capacity: None,
            policies: PolicyKind::ALL.to_vec(),
            seed: 0,
            heartbeat: 0,
            work_dir: PathBuf::from("."),
            executable: "main".into(),
            instruction_refs: "instruction_reference_string.txt".into(),
            data_refs: "data_reference_string.txt".into(),
            skip_profile: false,
            compiler: ToolConfig {
                program: "gcc".into(),
                args: vec!["{source}".into(), "-o".into(), "{output}".into()],
            },
            profiler: ToolConfig {
                program: "valgrind".into(),
                args: vec![
                    "--log-file={trace}".into(),
                    "--tool=lackey".into(),
                    "--trace-mem=yes".into(),
                    "{exe}".into(),
                ],
            },
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Config> {
        serde_json::from_str(json).map_err(|source| Error::Json {
            stage: Stage::Config,
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        if !path.is_file() {
            return Err(Error::MissingResource {
                stage: Stage::Config,
                path: path.to_owned(),
            });
        }
        let json = fs::read_to_string(path).map_err(Error::io(Stage::Config, path))?;
        Config::from_json(&json)
    }

    /// Validates everything that can be checked before any processing starts.
    pub fn check(&self) -> Result<PageSize> {
        let page_size = PageSize::new(self.page_size)?;
        match self.capacity {
            None => {
                return Err(Error::Configuration("TLB capacity is not set".into()));
            }
            Some(0) => {
                return Err(Error::Configuration(
                    "TLB capacity must be a positive integer".into(),
                ));
            }
            Some(_) => {}
        }
        if self.policies.is_empty() {
            return Err(Error::Configuration(
                "at least one replacement policy is required".into(),
            ));
        }
        if self.instruction_refs == self.data_refs {
            return Err(Error::Configuration(format!(
                "instruction and data reference strings both map to `{}`",
                self.data_refs
            )));
        }
        Ok(page_size)
    }

    pub fn refs_path(&self, class: AccessClass) -> PathBuf {
        self.work_dir.join(match class {
            AccessClass::Instruction => &self.instruction_refs,
            AccessClass::Data => &self.data_refs,
        })
    }

    pub fn executable_path(&self) -> PathBuf {
        self.work_dir.join(&self.executable)
    }

    /// Builds one fresh TLB per configured policy.
    pub fn to_tlbs(&self, class: AccessClass) -> Result<Vec<Box<dyn IsTlb>>> {
        let capacity = self.capacity.unwrap_or(0);
        let prefix = match class {
            AccessClass::Instruction => "itlb",
            AccessClass::Data => "dtlb",
        };
        self.policies
            .iter()
            .map(|&kind| {
                let name = format!("{prefix}-{}", kind.to_string().to_lowercase());
                let tlb: Box<dyn IsTlb> = match kind {
                    PolicyKind::Fifo => Box::new(Tlb::new(name, capacity, Fifo::new())?),
                    PolicyKind::Lru => Box::new(Tlb::new(name, capacity, Lru::new())?),
                    PolicyKind::Optimal => Box::new(Tlb::new(name, capacity, Optimal::new())?),
                    PolicyKind::Random => {
                        Box::new(Tlb::new(name, capacity, Random::new(self.seed))?)
                    }
                };
                Ok(tlb)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_lackey_pipeline() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.page_size, 4096);
        assert_eq!(config.policies, PolicyKind::ALL.to_vec());
        assert_eq!(
            config.refs_path(AccessClass::Instruction),
            Path::new(".").join("instruction_reference_string.txt")
        );
        assert_eq!(config.executable_path(), Path::new("./main"));
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let config = Config::from_json(
            r#"{
                "page_size": 8192,
                "capacity": 16,
                "policies": ["lru", "optimal"],
                "work_dir": "/tmp/run",
                "profiler": { "program": "cat" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.check().unwrap().bytes(), 8192);
        assert_eq!(config.capacity, Some(16));
        assert_eq!(config.profiler.program, "cat");
        assert!(config.profiler.args.is_empty());
        assert_eq!(config.compiler.program, "gcc");
        assert_eq!(
            config.refs_path(AccessClass::Data),
            Path::new("/tmp/run/data_reference_string.txt")
        );

        let tlbs = config.to_tlbs(AccessClass::Data).unwrap();
        let names: Vec<_> = tlbs.iter().map(|tlb| tlb.name().to_owned()).collect();
        assert_eq!(names, vec!["dtlb-lru", "dtlb-optimal"]);
        assert!(tlbs.iter().all(|tlb| tlb.capacity() == 16));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::from_json(r#"{ "tlb_size": 4 }"#).unwrap_err();
        assert_eq!(err.stage(), Stage::Config);
    }

    #[test]
    fn check_catches_bad_settings() {
        let mut config = Config {
            capacity: Some(4),
            ..Config::default()
        };
        assert!(config.check().is_ok());

        config.page_size = 1000;
        assert!(matches!(config.check(), Err(Error::Configuration(_))));
        config.page_size = 4096;

        config.capacity = Some(0);
        assert!(matches!(config.check(), Err(Error::Configuration(_))));
        config.capacity = None;
        assert!(matches!(config.check(), Err(Error::Configuration(_))));
        config.capacity = Some(4);

        config.policies.clear();
        assert!(matches!(config.check(), Err(Error::Configuration(_))));
    }

    #[test]
    fn tool_args_are_rendered() {
        let config = Config::default();
        let vars = HashMap::from([
            ("exe", "./main".to_owned()),
            ("trace", "out/trace.log".to_owned()),
        ]);
        assert_eq!(
            config.profiler.render_args(&vars),
            vec![
                "--log-file=out/trace.log",
                "--tool=lackey",
                "--trace-mem=yes",
                "./main"
            ]
        );
    }
}

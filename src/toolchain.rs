//! Compiler and profiler invocation. Both run to completion before the
//! pipeline moves on; a non-zero exit aborts the run.

use std::{collections::HashMap, path::Path, process::Command};

use crate::{
    config::ToolConfig,
    error::{Error, Result, Stage},
};

pub fn compile(tool: &ToolConfig, source: &Path, output: &Path) -> Result<()> {
    if !source.is_file() {
        return Err(Error::MissingResource {
            stage: Stage::Compile,
            path: source.to_owned(),
        });
    }
    let vars = HashMap::from([
        ("source", source.display().to_string()),
        ("output", output.display().to_string()),
    ]);
    log::info!("Compiling {}", source.display());
    run(Stage::Compile, tool, &vars)
}

pub fn profile(tool: &ToolConfig, exe: &Path, trace: &Path) -> Result<()> {
    if !exe.is_file() {
        return Err(Error::MissingResource {
            stage: Stage::Profile,
            path: exe.to_owned(),
        });
    }
    let vars = HashMap::from([
        ("exe", exe.display().to_string()),
        ("trace", trace.display().to_string()),
    ]);
    log::info!("Profiling {} into {}", exe.display(), trace.display());
    run(Stage::Profile, tool, &vars)
}

fn run(stage: Stage, tool: &ToolConfig, vars: &HashMap<&str, String>) -> Result<()> {
    let args = tool.render_args(vars);
    log::debug!("running {} {}", tool.program, args.join(" "));

    let output = Command::new(&tool.program)
        .args(&args)
        .output()
        .map_err(|source| Error::Spawn {
            stage,
            tool: tool.program.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(Error::ExternalTool {
            stage,
            tool: tool.program.clone(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_owned(),
        });
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        log::debug!("{}: {}", tool.program, line);
    }
    Ok(())
}

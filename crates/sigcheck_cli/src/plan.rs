//! `sigcheck plan`: shows how each compilation unit would be checked.
//!
//! For every selected unit this resolves the configuration, applies the
//! exclude patterns, splits the classpath into module and external entries,
//! and compares the cached signature on disk against the current inputs.
//! No class file or signature is read.

use serde_json::json;
use sigcheck_check::{cache_status, plan_unit, CheckPlan, ModuleArtifacts};
use sigcheck_common::FileRef;
use sigcheck_config::{resolve_modules, resolve_unit};

use crate::pipeline::{load_project, select_units};
use crate::{GlobalArgs, OutputFormat, PlanArgs};

/// Runs the `sigcheck plan` command. Returns exit code 0 on success.
pub fn run(args: &PlanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (project_dir, config) = load_project(global)?;
    let units = select_units(&config, &args.units)?;
    let modules = ModuleArtifacts::new(resolve_modules(&config, &project_dir));

    let mut entries = Vec::with_capacity(units.len());
    for name in &units {
        let unit = resolve_unit(&config, &project_dir, name)?;
        let plan = plan_unit(&unit, &modules)?;
        let status = cache_status(&unit, &plan).map(|s| s.to_string());
        entries.push((plan, status));
    }

    match args.format {
        OutputFormat::Text => {
            if !global.quiet {
                for (plan, status) in &entries {
                    print!("{}", render_text(plan, status.as_deref()));
                }
            }
        }
        OutputFormat::Json => {
            let json: Vec<_> = entries
                .iter()
                .map(|(plan, status)| render_json(plan, status.as_deref()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(0)
}

fn render_text(plan: &CheckPlan, status: Option<&str>) -> String {
    let mut out = format!("{}: {}\n", plan.unit, plan.mode);
    let mut section = |label: &str, files: &[FileRef]| {
        if !files.is_empty() {
            out.push_str(&format!("  {label}:\n"));
            for file in files {
                out.push_str(&format!("    {}\n", file.path().display()));
            }
        }
    };
    section("modules", &plan.modules);
    section("external", &plan.external);
    section("excluded", &plan.excluded);
    if let Some(status) = status {
        out.push_str(&format!("  cache: {status}\n"));
    }
    out
}

fn render_json(plan: &CheckPlan, status: Option<&str>) -> serde_json::Value {
    let paths = |files: &[FileRef]| -> Vec<String> {
        files.iter().map(FileRef::to_slash_string).collect()
    };
    json!({
        "unit": plan.unit,
        "mode": plan.mode.to_string(),
        "classpath": paths(&plan.classpath),
        "modules": paths(&plan.modules),
        "external": paths(&plan.external),
        "excluded": paths(&plan.excluded),
        "cache": status,
    })
}

//! Per-unit check orchestration.
//!
//! For each compilation unit the orchestrator walks a small state machine:
//!
//! ```text
//! Skipped                          (no signatures or nothing to check)
//! CacheBuild -> Checking -> Done | Failed     (caching enabled)
//!               Checking -> Done | Failed     (caching disabled)
//! ```
//!
//! With caching, the engine sees only the live module subset of the
//! classpath plus the cached signature. Without it, the engine sees the
//! whole exclude-filtered classpath and every declared signature, one pass
//! per signature in declaration order.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use rayon::prelude::*;
use sigcheck_cache::{ArtifactStore, CacheRequest, CacheStatus, SignatureCacheBuilder};
use sigcheck_common::FileRef;
use sigcheck_config::CheckConfig;
use sigcheck_signature::{CheckRequest, SignatureEngine, SignatureSet, Violation};
use tracing::{debug, info, warn};

use crate::artifact_set::ModuleArtifacts;
use crate::classpath::{partition, ExcludePatterns};
use crate::error::CheckError;
use crate::report::ReportSink;
use crate::suppress::Suppressions;

/// Pipeline state of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Nothing to check.
    Skipped,
    /// Building or loading the cached signature.
    CacheBuild,
    /// Running the engine.
    Checking,
    /// Finished without build-breaking violations.
    Done,
    /// Finished with violations and failures are not ignored.
    Failed,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitState::Skipped => "skipped",
            UnitState::CacheBuild => "cache-build",
            UnitState::Checking => "checking",
            UnitState::Done => "done",
            UnitState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why a unit was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No signatures are declared.
    NoSignatures,
    /// The unit has no compiled outputs.
    NoClasses,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoSignatures => write!(f, "no signatures declared"),
            SkipReason::NoClasses => write!(f, "no compiled classes"),
        }
    }
}

/// How a unit will be checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// The unit is skipped.
    Skipped(SkipReason),
    /// Against the cached signature with only module entries live.
    Cached,
    /// Against each declared signature with the full classpath.
    Sequential,
}

impl fmt::Display for CheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckMode::Skipped(reason) => write!(f, "skipped ({reason})"),
            CheckMode::Cached => write!(f, "cached"),
            CheckMode::Sequential => write!(f, "sequential"),
        }
    }
}

/// The resolved inputs of one unit's check, before anything is scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckPlan {
    /// Compilation unit name.
    pub unit: String,
    /// Selected mode.
    pub mode: CheckMode,
    /// Classpath after file exclusion, in original order.
    pub classpath: Vec<FileRef>,
    /// Entries removed by exclude patterns.
    pub excluded: Vec<FileRef>,
    /// Module subset of the filtered classpath.
    pub modules: Vec<FileRef>,
    /// External subset of the filtered classpath.
    pub external: Vec<FileRef>,
}

/// Result of one unit's check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Compilation unit name.
    pub unit: String,
    /// Terminal state: `Skipped`, `Done`, or `Failed`.
    pub state: UnitState,
    /// Reported violations in encounter order.
    pub violations: Vec<Violation>,
    /// Number of violations removed by suppressions.
    pub suppressed: usize,
    /// Where the report was written, when a sink is configured.
    pub report: Option<PathBuf>,
}

impl CheckOutcome {
    fn skipped(unit: &str) -> Self {
        Self {
            unit: unit.to_string(),
            state: UnitState::Skipped,
            violations: Vec::new(),
            suppressed: 0,
            report: None,
        }
    }

    /// Returns `true` unless violations should break the build.
    pub fn is_success(&self) -> bool {
        self.state != UnitState::Failed
    }
}

/// Runs the check pipeline for compilation units.
///
/// Holds only shared references, so one orchestrator can drive many units
/// concurrently.
pub struct CheckOrchestrator<'a> {
    engine: &'a dyn SignatureEngine,
    modules: &'a ModuleArtifacts,
    reports: Option<&'a dyn ReportSink>,
}

impl<'a> CheckOrchestrator<'a> {
    /// Creates an orchestrator over `engine` and the build's module artifacts.
    pub fn new(engine: &'a dyn SignatureEngine, modules: &'a ModuleArtifacts) -> Self {
        Self {
            engine,
            modules,
            reports: None,
        }
    }

    /// Writes each checked unit's report to `sink`.
    pub fn with_reports(mut self, sink: &'a dyn ReportSink) -> Self {
        self.reports = Some(sink);
        self
    }

    /// Resolves mode and classpath subsets for `config`. See [`plan_unit`].
    pub fn plan(&self, config: &CheckConfig) -> Result<CheckPlan, CheckError> {
        plan_unit(config, self.modules)
    }

    /// Checks one compilation unit.
    pub fn check(&self, config: &CheckConfig) -> Result<CheckOutcome, CheckError> {
        let unit = config.unit.as_str();
        let plan = self.plan(config)?;
        info!(
            unit,
            mode = %plan.mode,
            modules = plan.modules.len(),
            external = plan.external.len(),
            excluded = plan.excluded.len(),
            "planned check"
        );

        let found = match (plan.mode, config.cache.as_ref()) {
            (CheckMode::Skipped(reason), _) => {
                info!(unit, %reason, state = %UnitState::Skipped, "skipping unit");
                return Ok(CheckOutcome::skipped(unit));
            }
            (CheckMode::Cached, Some(cache)) => {
                debug!(unit, state = %UnitState::CacheBuild, "entering state");
                let builder =
                    SignatureCacheBuilder::new(self.engine, ArtifactStore::new(&cache.cache_dir));
                let artifact = builder
                    .build_or_reuse(&CacheRequest {
                        unit,
                        signatures: &config.signatures,
                        external_classpath: &plan.external,
                        exclude_classes: &cache.exclude_classes,
                        merge_signatures: cache.merge_signatures,
                    })
                    .map_err(|e| CheckError::from_cache(unit, e))?;
                let Some(artifact) = artifact else {
                    return Ok(CheckOutcome::skipped(unit));
                };

                debug!(unit, state = %UnitState::Checking, "entering state");
                self.run_passes(unit, &config.classes, &plan.modules, &artifact.signatures)?
            }
            _ => {
                debug!(unit, state = %UnitState::Checking, "entering state");
                let signatures = self.load_signatures(config)?;
                self.run_passes(unit, &config.classes, &plan.classpath, &signatures)?
            }
        };

        self.finish(config, found)
    }

    fn load_signatures(&self, config: &CheckConfig) -> Result<Vec<SignatureSet>, CheckError> {
        config
            .signatures
            .iter()
            .map(|signature| {
                self.engine
                    .load_signature(signature)
                    .map_err(|source| CheckError::Resolution {
                        unit: config.unit.clone(),
                        signature: signature.to_string(),
                        source,
                    })
            })
            .collect()
    }

    /// Runs one engine pass per signature.
    ///
    /// A reference is reported only if every pass flags it, so a symbol
    /// available in any declared signature is never a violation, matching
    /// merged mode. The first pass's encounter order is kept.
    fn run_passes(
        &self,
        unit: &str,
        classes: &[FileRef],
        classpath: &[FileRef],
        signatures: &[SignatureSet],
    ) -> Result<Vec<Violation>, CheckError> {
        let engine_err = |source| CheckError::Engine {
            unit: unit.to_string(),
            source,
        };
        let pass = |signature: &SignatureSet| {
            self.engine.check(&CheckRequest {
                unit,
                classes,
                classpath,
                signature,
            })
        };

        let Some((first, rest)) = signatures.split_first() else {
            return Ok(Vec::new());
        };
        let mut candidates = pass(first).map_err(engine_err)?;
        for (index, signature) in rest.iter().enumerate() {
            if candidates.is_empty() {
                break;
            }
            let flagged: HashSet<Violation> =
                pass(signature).map_err(engine_err)?.into_iter().collect();
            candidates.retain(|v| flagged.contains(v));
            debug!(unit, pass = index + 2, remaining = candidates.len(), "signature pass");
        }
        Ok(candidates)
    }

    fn finish(
        &self,
        config: &CheckConfig,
        mut violations: Vec<Violation>,
    ) -> Result<CheckOutcome, CheckError> {
        let unit = config.unit.as_str();
        let suppressions =
            Suppressions::new(config.ignore_classes.clone(), config.annotation.clone());
        let suppressed = suppressions.apply(&mut violations);

        for violation in &violations {
            warn!(unit, "{violation}");
        }

        let report = match self.reports {
            Some(sink) => Some(sink.emit(unit, &violations)?),
            None => None,
        };

        let state = if violations.is_empty() || config.ignore_failures {
            UnitState::Done
        } else {
            UnitState::Failed
        };
        info!(
            unit,
            violations = violations.len(),
            suppressed,
            state = %state,
            "check finished"
        );

        Ok(CheckOutcome {
            unit: unit.to_string(),
            state,
            violations,
            suppressed,
            report,
        })
    }
}

/// Resolves mode and classpath subsets for `config` without scanning.
///
/// Excludes are applied first; the module/external split is computed on
/// the filtered classpath. The artifact set is only computed for cached
/// units.
pub fn plan_unit(
    config: &CheckConfig,
    modules: &ModuleArtifacts,
) -> Result<CheckPlan, CheckError> {
    let excludes = ExcludePatterns::new(&config.exclude_jars)?;
    let classpath = excludes.apply(&config.classpath);
    let excluded = excludes.excluded(&config.classpath);

    let mode = if config.signatures.is_empty() {
        CheckMode::Skipped(SkipReason::NoSignatures)
    } else if config.classes.is_empty() {
        CheckMode::Skipped(SkipReason::NoClasses)
    } else if config.cache.is_some() {
        CheckMode::Cached
    } else {
        CheckMode::Sequential
    };

    let (module_entries, external) = match mode {
        CheckMode::Cached => {
            let split = partition(&classpath, modules.get());
            (split.modules, split.external.into_owned())
        }
        _ => (Vec::new(), Vec::new()),
    };

    Ok(CheckPlan {
        unit: config.unit.clone(),
        mode,
        classpath: classpath.into_owned(),
        excluded,
        modules: module_entries,
        external,
    })
}

/// Reports whether the unit's cached signature on disk matches `plan`.
///
/// Returns `None` unless the plan uses the cache. Nothing is loaded or
/// scanned.
pub fn cache_status(config: &CheckConfig, plan: &CheckPlan) -> Option<CacheStatus> {
    let cache = config.cache.as_ref()?;
    if plan.mode != CheckMode::Cached {
        return None;
    }
    let request = CacheRequest {
        unit: &config.unit,
        signatures: &config.signatures,
        external_classpath: &plan.external,
        exclude_classes: &cache.exclude_classes,
        merge_signatures: cache.merge_signatures,
    };
    Some(request.status(&ArtifactStore::new(&cache.cache_dir)))
}

/// Checks `configs` concurrently on the rayon pool.
///
/// One unit's error never aborts the others. Results are returned in input
/// order.
pub fn check_units(
    orchestrator: &CheckOrchestrator<'_>,
    configs: &[CheckConfig],
) -> Vec<Result<CheckOutcome, CheckError>> {
    configs
        .par_iter()
        .map(|config| orchestrator.check(config))
        .collect()
}

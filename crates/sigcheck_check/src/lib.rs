//! Classpath partitioning and per-unit check orchestration.
//!
//! Given a resolved [`CheckConfig`](sigcheck_config::CheckConfig), the
//! [`CheckOrchestrator`] filters the classpath, splits it into module and
//! external entries, builds or reuses the unit's cached signature, drives
//! the checking engine, and filters and reports the resulting violations.

#![warn(missing_docs)]

pub mod artifact_set;
pub mod classpath;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod suppress;

pub use artifact_set::{collect_module_artifacts, ArtifactSet, ModuleArtifacts};
pub use classpath::{partition, ExcludePatterns, Partition};
pub use error::CheckError;
pub use orchestrator::{
    cache_status, check_units, plan_unit, CheckMode, CheckOrchestrator, CheckOutcome, CheckPlan,
    SkipReason, UnitState,
};
pub use report::{render_text, FileReportSink, ReportSink};
pub use suppress::Suppressions;

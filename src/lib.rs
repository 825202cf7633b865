//! # Workbook Rollover
//!
//! Weekly workbook rotation and embedded-query patching automation.
//!
//! Workbook Rollover advances a family of versioned spreadsheet artifacts
//! (`PREFIX_S07.xlsx`, `PREFIX_S08.xlsx`, ...) to the next reporting week:
//! it resolves the latest artifact, duplicates it under the successor name,
//! advances the embedded reporting date, rewrites embedded query text and
//! external links to point at the new data window, refreshes all live data
//! connections, and saves.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌───────────────────────────┐
//! │  Resolver  │──▶│ Duplicator │──▶│      Workbook Driver       │
//! │ max S{n}   │   │ byte-exact │   │ date ▸ queries ▸ links ▸   │
//! └────────────┘   └────────────┘   │ refresh ▸ save             │
//!        ▲                          └────────────┬──────────────┘
//!        │                                       │
//!   ┌────┴──────┐                         ┌──────┴──────┐
//!   │ Job Runner │◀────── summary ────────│   Library    │
//!   │ (rollover) │                        │ (optional)   │
//!   └───────────┘                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rollover jobs                  # folder health + latest week per job
//! rollover run --dry-run        # resolve without touching anything
//! rollover run                  # rotate every configured job
//! rollover run SUIVI_KPIS       # rotate one job
//! rollover clean SUIVI_KPIS     # drop the newest artifact to redo a week
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`resolve`] | Latest-week resolution over a filename series |
//! | [`duplicate`] | Byte-exact artifact duplication |
//! | [`advance`] | Reporting-date advancement |
//! | [`patch`] | Embedded-query and external-link rewriting |
//! | [`refresh`] | Data-connection refresh orchestration |
//! | [`runner`] | Per-job pipeline and run summary |
//! | [`driver`] | Workbook driver seam |
//! | [`driver_json`] | JSON-backed reference driver |
//! | [`library`] | Document-library client |
//! | [`error`] | Rotation failure taxonomy |

pub mod advance;
pub mod clean;
pub mod config;
pub mod driver;
pub mod driver_json;
pub mod duplicate;
pub mod error;
pub mod jobs_cmd;
pub mod library;
pub mod models;
pub mod patch;
pub mod refresh;
pub mod resolve;
pub mod runner;

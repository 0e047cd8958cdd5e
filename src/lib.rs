#![forbid(unsafe_code)]
//! Dutypool — répartition équitable d'astreintes quotidiennes entre groupes.
//!
//! - Répartition des quotas entre groupes (moyenne cible, plafonds, correction
//!   par résidus).
//! - Sélection par rang dans chaque groupe, avec compensation des absences.
//! - Repos minimal entre deux sélections d'une même personne.
//! - Report d'équité d'un run à l'autre (precounts CSV).
//! - Dates calendaires simples, sans fuseau horaire.

pub mod config;
pub mod io;
pub mod model;
pub mod pool;
pub mod schedule;
pub mod storage;

pub use config::{DateSpec, Document, GroupSpec, MemberSpec, Period, Policy, Tier, TierOrder};
pub use model::{DateInterval, Group, GroupId, Person, PersonRef};
pub use pool::{GroupTally, LaborPool, MemberTally, PoolError};
pub use schedule::{period_dates, run, schedule_pass, DayKind, DayPicks, DayRoster, ScheduleRun};
pub use storage::{CsvPrecountStore, PrecountStore};

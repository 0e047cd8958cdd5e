use crate::config::{Document, Tier, TierOrder};
use crate::model::{GroupId, PersonRef};
use crate::pool::{GroupTally, LaborPool, MemberTally, PoolError};
use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    Weekday,
    Weekend,
}

impl DayKind {
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => Self::Weekend,
            _ => Self::Weekday,
        }
    }
}

/// Sélections d'un jour, par référence dans le pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayPicks {
    pub date: NaiveDate,
    pub standby: Vec<PersonRef>,
    pub backup: Vec<PersonRef>,
}

/// Planning d'un jour, par nom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRoster {
    pub date: NaiveDate,
    pub standby: Vec<String>,
    pub backup: Vec<String>,
}

/// Résultat d'un run réussi.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRun {
    pub days: Vec<DayRoster>,
    pub tallies: Vec<MemberTally>,
    pub group_tallies: Vec<GroupTally>,
    pub gap_size: i64,
    /// Nombre de tentatives, la dernière comprise.
    pub attempts: u32,
}

impl ScheduleRun {
    /// Report pour le run suivant : `mode(count) - count` par personne.
    ///
    /// Le mode retenu est le premier rencontré en cas d'égalité.
    pub fn carry_over(&self) -> Vec<(String, i64)> {
        let mut freq: Vec<(i64, usize)> = Vec::new();
        for t in &self.tallies {
            match freq.iter_mut().find(|(c, _)| *c == t.count) {
                Some(entry) => entry.1 += 1,
                None => freq.push((t.count, 1)),
            }
        }
        let mode = freq
            .iter()
            .fold(None::<(i64, usize)>, |best, &(c, n)| match best {
                Some((_, bn)) if bn >= n => best,
                _ => Some((c, n)),
            })
            .map(|(c, _)| c);
        let Some(mode) = mode else {
            return Vec::new();
        };
        self.tallies
            .iter()
            .map(|t| (t.name.clone(), mode - t.count))
            .collect()
    }
}

/// Dates de la période correspondant au type de jour demandé.
///
/// Avec `period.days` : chaque date couverte entre le plus petit début et la
/// plus grande fin. Sinon : tout le mois configuré (ou celui de la référence).
pub fn period_dates(doc: &Document, reference: NaiveDate, kind: DayKind) -> Result<Vec<NaiveDate>> {
    let ctx = doc.date_context(reference);
    let wanted = |d: &NaiveDate| DayKind::of(*d) == kind;

    if let Some(specs) = doc.period.days.as_ref().filter(|s| !s.is_empty()) {
        let ranges = specs
            .iter()
            .map(|s| s.resolve(&ctx))
            .collect::<Result<Vec<_>>>()
            .context("period days")?;
        let (Some(start), Some(end)) = (
            ranges.iter().map(|r| r.0).min(),
            ranges.iter().map(|r| r.1).max(),
        ) else {
            return Ok(Vec::new());
        };
        return Ok(start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| ranges.iter().any(|(s, e)| s <= d && d <= e))
            .filter(wanted)
            .collect());
    }

    let month = doc.period.month.unwrap_or_else(|| reference.month());
    let first = NaiveDate::from_ymd_opt(ctx.year, month, 1)
        .with_context(|| format!("invalid period {}-{month}", ctx.year))?;
    Ok(first
        .iter_days()
        .take_while(|d| d.month() == month)
        .filter(wanted)
        .collect())
}

fn standby(
    pool: &mut LaborPool,
    tier: &Tier,
    pinned: Option<GroupId>,
    date: NaiveDate,
) -> Result<Vec<PersonRef>, PoolError> {
    match pinned {
        Some(group) if tier.number_of_standby > 0 => {
            let mut picks = pool.take(1, date, Some(&[group]))?;
            pool.exclude(&[], &[group]);
            picks.extend(pool.take(tier.number_of_standby - 1, date, None)?);
            Ok(picks)
        }
        _ => pool.take(tier.number_of_standby, date, None),
    }
}

fn backup(
    pool: &mut LaborPool,
    tier: &Tier,
    standby: &[PersonRef],
    date: NaiveDate,
) -> Result<Vec<PersonRef>, PoolError> {
    pool.exclude(standby, &[]);
    pool.decrease(standby);
    pool.take(tier.number_of_backup, date, None)
}

/// Planifie titulaires et remplaçants sur `dates`.
///
/// Le groupe `start_group` fournit le premier titulaire du premier jour ; les
/// remplaçants d'un jour ne peuvent pas être ses titulaires et consomment les
/// places restantes de leur groupe.
pub fn schedule_pass(
    pool: &mut LaborPool,
    dates: &[NaiveDate],
    tier: &Tier,
    order: TierOrder,
) -> Result<Vec<DayPicks>, PoolError> {
    let pinned = tier
        .start_group
        .as_deref()
        .map(|name| pool.find_group(name))
        .transpose()?;

    let mut days = Vec::with_capacity(dates.len());
    match order {
        TierOrder::Interleaved => {
            for (i, &date) in dates.iter().enumerate() {
                let first = if i == 0 { pinned } else { None };
                let standby = standby(pool, tier, first, date)?;
                let backup = backup(pool, tier, &standby, date)?;
                days.push(DayPicks {
                    date,
                    standby,
                    backup,
                });
            }
        }
        TierOrder::StandbyFirst => {
            for (i, &date) in dates.iter().enumerate() {
                let first = if i == 0 { pinned } else { None };
                days.push(DayPicks {
                    date,
                    standby: standby(pool, tier, first, date)?,
                    backup: Vec::new(),
                });
            }
            for day in &mut days {
                day.backup = backup(pool, tier, &day.standby, day.date)?;
            }
        }
    }
    Ok(days)
}

fn attempt(
    pool: &mut LaborPool,
    doc: &Document,
    weekend: &[NaiveDate],
    weekday: &[NaiveDate],
) -> Result<Vec<DayPicks>, PoolError> {
    let order = doc.config.tier_order;
    let mut days = schedule_pass(pool, weekend, &doc.config.weekend, order)?;
    days.extend(schedule_pass(pool, weekday, &doc.config.weekday, order)?);
    days.sort_by_key(|d| d.date);
    Ok(days)
}

/// Run complet avec reprises : le pool est reconstruit (et remélangé via
/// `rng`) après chaque échec `RanOutOfMember` / `RanOutOfGroup`.
pub fn run<R: Rng + ?Sized>(
    doc: &Document,
    carried: &[(String, i64)],
    reference: NaiveDate,
    rng: &mut R,
) -> Result<ScheduleRun> {
    let weekend = period_dates(doc, reference, DayKind::Weekend)?;
    let weekday = period_dates(doc, reference, DayKind::Weekday)?;
    let max = doc.config.retry_on_error;
    info!(
        weekend = weekend.len(),
        weekday = weekday.len(),
        max_attempts = max,
        "scheduling"
    );

    for n in 1..=max {
        let mut pool = doc.build_pool(carried, reference, rng)?;
        match attempt(&mut pool, doc, &weekend, &weekday) {
            Ok(picks) => {
                info!(attempts = n, days = picks.len(), "schedule ready");
                let days = picks
                    .iter()
                    .map(|d| DayRoster {
                        date: d.date,
                        standby: pool.names(&d.standby),
                        backup: pool.names(&d.backup),
                    })
                    .collect();
                return Ok(ScheduleRun {
                    days,
                    tallies: pool.tallies(),
                    group_tallies: pool.group_tallies(),
                    gap_size: pool.gap_size(),
                    attempts: n,
                });
            }
            Err(err) if err.is_retryable() => {
                warn!(attempt = n, error = %err, "scheduling attempt failed");
            }
            Err(err) => return Err(err.into()),
        }
        debug!(attempt = n, "rebuilding pool");
    }
    bail!("not able to make schedule after {max} attempt(s)")
}

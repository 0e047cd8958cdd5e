use crate::schedule::ScheduleRun;
use crate::storage;
use anyhow::{bail, Context};
use chrono::{Datelike, NaiveDate};
use csv::WriterBuilder;
use std::fmt::Write as _;
use std::path::Path;

/// Contexte de résolution des dates partielles.
#[derive(Debug, Clone)]
pub struct DateContext<'a> {
    /// Date de référence (« aujourd'hui »).
    pub reference: NaiveDate,
    /// Année des dates `M-D` et `D`.
    pub year: i32,
    /// Mois des dates `D` ; à défaut, le mois suivant la référence.
    pub month: Option<u32>,
    pub delimiter: &'a str,
}

/// Parse `Y-M-D`, `M-D` ou `D` (séparateur configurable).
pub fn parse_date(raw: &str, ctx: &DateContext) -> anyhow::Result<NaiveDate> {
    let parts = raw
        .trim()
        .split(ctx.delimiter)
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("'{raw}' is not a valid date format"))?;

    let (year, month, day) = match parts.as_slice() {
        [y, m, d] => {
            let y = i32::try_from(*y).with_context(|| format!("invalid year in '{raw}'"))?;
            (y, *m, *d)
        }
        [m, d] => (ctx.year, *m, *d),
        [d] => match ctx.month {
            Some(m) => (ctx.year, m, *d),
            None => {
                let (y, m) = next_month(ctx.reference);
                (y, m, *d)
            }
        },
        _ => bail!("'{raw}' is not a valid date format"),
    };
    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("'{raw}' is not a valid date"))
}

fn next_month(reference: NaiveDate) -> (i32, u32) {
    if reference.month() == 12 {
        (reference.year() + 1, 1)
    } else {
        (reference.year(), reference.month() + 1)
    }
}

/// Écrit le planning puis le bilan par personne.
///
/// En-tête `date,standby,…,backup,…` ; une ligne par jour ; une ligne vide ;
/// `summary` ; `name,real_count,precount,removed_count,count`.
pub fn write_roster_csv<W: std::io::Write>(out: W, run: &ScheduleRun) -> anyhow::Result<()> {
    let standby_width = run.days.iter().map(|d| d.standby.len()).max().unwrap_or(0).max(1);
    let backup_width = run.days.iter().map(|d| d.backup.len()).max().unwrap_or(0);

    let mut w = WriterBuilder::new().flexible(true).from_writer(out);
    let mut header = vec!["date"];
    header.push("standby");
    header.extend(std::iter::repeat("").take(standby_width - 1));
    if backup_width > 0 {
        header.push("backup");
        header.extend(std::iter::repeat("").take(backup_width - 1));
    }
    w.write_record(&header)?;

    for day in &run.days {
        let date = day.date.to_string();
        let mut row = vec![date.as_str()];
        row.extend(day.standby.iter().map(String::as_str));
        row.extend(day.backup.iter().map(String::as_str));
        w.write_record(&row)?;
    }

    w.write_record([""])?;
    w.write_record(["summary"])?;
    w.write_record(["name", "real_count", "precount", "removed_count", "count"])?;
    let mut bufs = [
        itoa::Buffer::new(),
        itoa::Buffer::new(),
        itoa::Buffer::new(),
        itoa::Buffer::new(),
    ];
    for t in &run.tallies {
        let [a, b, c, d] = &mut bufs;
        w.write_record([
            t.name.as_str(),
            a.format(t.real_count),
            b.format(t.precount),
            c.format(t.removed_count),
            d.format(t.count),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV du planning, écriture atomique.
pub fn export_roster_csv<P: AsRef<Path>>(path: P, run: &ScheduleRun) -> anyhow::Result<()> {
    let mut buf = Vec::new();
    write_roster_csv(&mut buf, run)?;
    storage::write_atomic(path, &buf)
}

/// Export JSON du planning (jolie mise en forme)
pub fn export_roster_json<P: AsRef<Path>>(path: P, run: &ScheduleRun) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(run)?;
    storage::write_atomic(path, &json)
}

/// Rendu texte compact pour la sortie standard.
pub fn render_text(run: &ScheduleRun) -> String {
    let mut out = String::new();
    for day in &run.days {
        let _ = write!(out, "{} | {}", day.date, day.standby.join(", "));
        if !day.backup.is_empty() {
            let _ = write!(out, " | {}", day.backup.join(", "));
        }
        out.push('\n');
    }
    out.push('\n');
    for g in &run.group_tallies {
        let _ = writeln!(out, "{}: {}", g.name, g.real_count);
    }
    for t in &run.tallies {
        let _ = writeln!(
            out,
            "{} ({}) real={} pre={} removed={} count={}",
            t.name, t.group, t.real_count, t.precount, t.removed_count, t.count
        );
    }
    out
}

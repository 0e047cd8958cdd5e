use crate::io::{self, DateContext};
use crate::model::{DateInterval, Group, GroupId, Person, PersonRef};
use crate::pool::LaborPool;
use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Document d'entrée complet : politique, période et groupes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub config: Policy,
    #[serde(default)]
    pub period: Period,
    pub groups: Vec<GroupSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_retry")]
    pub retry_on_error: u32,
    #[serde(default)]
    pub date_gap_size: Option<i64>,
    #[serde(default = "default_delimiter")]
    pub date_delimiter: String,
    #[serde(default)]
    pub output_filename: Option<String>,
    #[serde(default)]
    pub tier_order: TierOrder,
    pub weekday: Tier,
    pub weekend: Tier,
}

fn default_retry() -> u32 {
    3
}

fn default_delimiter() -> String {
    "-".to_string()
}

/// Ordre des deux niveaux (titulaires puis remplaçants) sur une période.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierOrder {
    /// Pour chaque jour : titulaires, puis remplaçants.
    #[default]
    Interleaved,
    /// Tous les titulaires de la période, puis tous les remplaçants.
    StandbyFirst,
}

/// Quotas quotidiens d'un type de jour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tier {
    pub number_of_standby: i64,
    #[serde(default)]
    pub number_of_backup: i64,
    /// Groupe qui fournit le premier titulaire du premier jour.
    #[serde(default)]
    pub start_group: Option<String>,
}

impl Tier {
    pub fn daily_total(&self) -> i64 {
        self.number_of_standby + self.number_of_backup
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Period {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub days: Option<Vec<DateSpec>>,
}

/// Un jour (`"2022-03-05"`, `"3-5"`, `"5"`) ou un intervalle `[début, fin]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateSpec {
    Day(String),
    Range(String, String),
}

impl DateSpec {
    /// Bornes incluses de la spécification.
    pub fn resolve(&self, ctx: &DateContext) -> Result<(NaiveDate, NaiveDate)> {
        let (start, end) = match self {
            Self::Day(raw) => {
                let d = io::parse_date(raw, ctx)?;
                (d, d)
            }
            Self::Range(a, b) => (io::parse_date(a, ctx)?, io::parse_date(b, ctx)?),
        };
        if end < start {
            bail!("date range ends ({end}) before it starts ({start})");
        }
        Ok((start, end))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    pub max_available: i64,
    #[serde(default)]
    pub order_by_index: bool,
    pub members: Vec<MemberSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSpec {
    pub name: String,
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default)]
    pub precount: Option<i64>,
    #[serde(default)]
    pub dayoffs: Vec<DateSpec>,
    #[serde(default)]
    pub vacants: Vec<DateSpec>,
}

impl Document {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let doc: Document = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", path.display()))?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let doc: Document = serde_json::from_str(raw).context("parsing input document")?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            bail!("input must contain at least one group");
        }
        let mut names = HashSet::new();
        for group in &self.groups {
            if group.name.trim().is_empty() {
                bail!("group name cannot be empty");
            }
            if !names.insert(group.name.as_str()) {
                bail!("duplicate group name: {}", group.name);
            }
            if group.max_available < 0 {
                bail!("max_available of {} must be >= 0", group.name);
            }
            for member in &group.members {
                if member.name.trim().is_empty() {
                    bail!("member name cannot be empty in group {}", group.name);
                }
                if group.order_by_index && member.index.is_none() {
                    bail!(
                        "member {} of {} has no index but order_by_index is set",
                        member.name,
                        group.name
                    );
                }
            }
        }
        for (label, tier) in [("weekday", &self.config.weekday), ("weekend", &self.config.weekend)] {
            if tier.number_of_standby < 0 || tier.number_of_backup < 0 {
                bail!("{label} quotas must be >= 0");
            }
            if let Some(start) = &tier.start_group {
                if !names.contains(start.as_str()) {
                    bail!("{label} start_group {start} is not a known group");
                }
            }
        }
        if let Some(month) = self.period.month {
            if !(1..=12).contains(&month) {
                bail!("period month must be within 1..=12, got {month}");
            }
        }
        Ok(())
    }

    /// Nombre total de personnes déclarées.
    pub fn people_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }

    /// Plus grand nombre de personnes requises sur une journée.
    pub fn max_daily_quota(&self) -> i64 {
        self.config
            .weekday
            .daily_total()
            .max(self.config.weekend.daily_total())
    }

    /// Écart minimal entre deux sélections d'une même personne, en jours.
    pub fn gap_size(&self) -> i64 {
        match self.config.date_gap_size {
            Some(gap) if gap >= 0 => gap,
            _ => {
                let alloc = self.max_daily_quota();
                if alloc <= 0 {
                    return 0;
                }
                self.people_count() as i64 / alloc / 3
            }
        }
    }

    pub fn date_context(&self, reference: NaiveDate) -> DateContext<'_> {
        DateContext {
            reference,
            year: self.period.year.unwrap_or_else(|| reference.year()),
            month: self.period.month,
            delimiter: &self.config.date_delimiter,
        }
    }

    /// Construit un pool neuf.
    ///
    /// Les groupes (et leurs membres, sauf `order_by_index`) sont mélangés
    /// avec `rng` quand `shuffle` est actif ; la position finale d'un membre
    /// donne sa `fraction` de départage. Un `precount` explicite l'emporte sur
    /// le report `carried`.
    pub fn build_pool<R: Rng + ?Sized>(
        &self,
        carried: &[(String, i64)],
        reference: NaiveDate,
        rng: &mut R,
    ) -> Result<LaborPool> {
        let ctx = self.date_context(reference);
        let mut specs: Vec<&GroupSpec> = self.groups.iter().collect();
        if self.config.shuffle {
            specs.shuffle(rng);
        }

        let mut groups = Vec::with_capacity(specs.len());
        for (gi, spec) in specs.into_iter().enumerate() {
            let gid = GroupId(gi);
            let mut members: Vec<&MemberSpec> = spec.members.iter().collect();
            if spec.order_by_index {
                members.sort_by_key(|m| m.index.unwrap_or(i64::MAX));
            } else if self.config.shuffle {
                members.shuffle(rng);
            }

            let size = members.len();
            let mut group = Group::new(gid, spec.name.clone(), spec.max_available);
            for (mi, member) in members.into_iter().enumerate() {
                let owner = PersonRef::new(gid, mi);
                let precount = member
                    .precount
                    .unwrap_or_else(|| carried_precount(carried, &member.name));
                let fraction = mi as f64 / size as f64;
                let mut person = Person::new(member.name.clone(), gid, precount, fraction);
                person.dayoffs = intervals(&member.dayoffs, &ctx, owner)
                    .with_context(|| format!("dayoffs of {}", member.name))?;
                person.vacancies = intervals(&member.vacants, &ctx, owner)
                    .with_context(|| format!("vacants of {}", member.name))?;
                group.push_member(person);
            }
            groups.push(group);
        }

        Ok(LaborPool::new(groups, self.gap_size()))
    }
}

fn carried_precount(carried: &[(String, i64)], name: &str) -> i64 {
    carried
        .iter()
        .filter(|(n, _)| n == name)
        .map(|(_, c)| *c)
        .sum()
}

fn intervals(specs: &[DateSpec], ctx: &DateContext, owner: PersonRef) -> Result<Vec<DateInterval>> {
    specs
        .iter()
        .map(|spec| -> Result<DateInterval> {
            let (start, end) = spec.resolve(ctx)?;
            Ok(DateInterval::new(start, end, owner)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SAMPLE: &str = r#"{
        "config": {
            "date_gap_size": 1,
            "weekday": { "number_of_standby": 2, "number_of_backup": 1 },
            "weekend": { "number_of_standby": 1, "number_of_backup": 1, "start_group": "B" }
        },
        "period": { "year": 2022, "month": 3 },
        "groups": [
            { "name": "A", "max_available": 2, "members": [
                { "name": "ann", "dayoffs": ["5", ["8", "10"]] },
                { "name": "abe", "precount": 2 },
                { "name": "amy", "vacants": ["3-20"] }
            ]},
            { "name": "B", "max_available": 1, "order_by_index": true, "members": [
                { "name": "bob", "index": 2 },
                { "name": "bea", "index": 1 }
            ]}
        ]
    }"#;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 2, 14).unwrap()
    }

    #[test]
    fn builds_pool_in_declared_order() {
        let doc = Document::from_json(SAMPLE).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let carried = vec![("ann".to_string(), 1), ("ann".to_string(), 2), ("abe".to_string(), 9)];
        let pool = doc.build_pool(&carried, reference(), &mut rng).unwrap();

        assert_eq!(pool.gap_size(), 1);
        let a = &pool.groups()[0];
        assert_eq!(a.name, "A");
        let ann = &a.members[0];
        assert_eq!(ann.precount, 3);
        assert_eq!(ann.dayoffs.len(), 2);
        assert_eq!(ann.dayoffs[1].start, NaiveDate::from_ymd_opt(2022, 3, 8).unwrap());
        assert_eq!(ann.dayoffs[1].end, NaiveDate::from_ymd_opt(2022, 3, 10).unwrap());
        // precount explicite prioritaire sur le report
        assert_eq!(a.members[1].precount, 2);
        assert!((a.members[1].fraction - 1.0 / 3.0).abs() < 1e-9);
        assert!(a.members[2].is_vacant(NaiveDate::from_ymd_opt(2022, 3, 20).unwrap()));

        let b = &pool.groups()[1];
        let names: Vec<_> = b.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["bea", "bob"]);
    }

    #[test]
    fn shuffle_depends_only_on_seed() {
        let mut doc = Document::from_json(SAMPLE).unwrap();
        doc.config.shuffle = true;
        let order = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let pool = doc.build_pool(&[], reference(), &mut rng).unwrap();
            pool.tallies().into_iter().map(|t| t.name).collect::<Vec<_>>()
        };
        assert_eq!(order(11), order(11));
    }

    #[test]
    fn derived_gap_size() {
        let mut doc = Document::from_json(SAMPLE).unwrap();
        doc.config.date_gap_size = None;
        // 5 personnes, 3 par jour au plus : 5 / 3 / 3 = 0
        assert_eq!(doc.gap_size(), 0);
        doc.config.date_gap_size = Some(-1);
        assert_eq!(doc.gap_size(), 0);
        doc.config.weekday.number_of_standby = 0;
        doc.config.weekday.number_of_backup = 0;
        doc.config.weekend.number_of_standby = 1;
        doc.config.weekend.number_of_backup = 0;
        assert_eq!(doc.gap_size(), 1);
    }

    #[test]
    fn rejects_unknown_start_group() {
        let raw = SAMPLE.replace("\"start_group\": \"B\"", "\"start_group\": \"Z\"");
        let err = Document::from_json(&raw).unwrap_err();
        assert!(err.to_string().contains("start_group"));
    }

    #[test]
    fn rejects_duplicate_groups() {
        let raw = SAMPLE.replace("\"name\": \"B\"", "\"name\": \"A\"");
        assert!(Document::from_json(&raw).is_err());
    }

    #[test]
    fn reversed_range_fails_to_build() {
        let raw = SAMPLE.replace("[\"8\", \"10\"]", "[\"10\", \"8\"]");
        let doc = Document::from_json(&raw).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(doc.build_pool(&[], reference(), &mut rng).is_err());
    }
}

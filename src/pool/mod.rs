mod apportion;
mod availability;
mod selection;
mod types;
mod util;

pub use types::{GroupTally, MemberTally, PoolError};

use crate::model::{Group, GroupId, Person, PersonRef};
use availability::Availability;
use chrono::NaiveDate;
use tracing::debug;

/// Pool de groupes : répartition des quotas et protocole de disponibilité.
///
/// Les compteurs des personnes persistent d'un appel à l'autre ; la
/// disponibilité (membres, groupes, places restantes) est remise à plein
/// après chaque [`LaborPool::take`].
#[derive(Debug, Clone)]
pub struct LaborPool {
    groups: Vec<Group>,
    available: Availability,
    gap_size: i64,
}

impl LaborPool {
    pub fn new(groups: Vec<Group>, gap_size: i64) -> Self {
        let available = Availability::full(&groups);
        Self {
            groups,
            available,
            gap_size,
        }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.index())
    }

    pub fn find_group(&self, name: &str) -> Result<GroupId, PoolError> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.id)
            .ok_or_else(|| PoolError::UnknownGroup(name.to_string()))
    }

    pub fn person(&self, person: PersonRef) -> Option<&Person> {
        self.groups
            .get(person.group.index())
            .and_then(|g| g.members.get(person.member))
    }

    pub fn person_mut(&mut self, person: PersonRef) -> Option<&mut Person> {
        self.groups
            .get_mut(person.group.index())
            .and_then(|g| g.members.get_mut(person.member))
    }

    pub fn find_person(&self, name: &str) -> Option<PersonRef> {
        self.groups.iter().find_map(|g| g.find_member(name))
    }

    pub fn names(&self, people: &[PersonRef]) -> Vec<String> {
        people
            .iter()
            .filter_map(|&p| self.person(p))
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn gap_size(&self) -> i64 {
        self.gap_size
    }

    /// Nombre total de personnes.
    pub fn size(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    pub fn available_groups(&self) -> &[GroupId] {
        self.available.groups()
    }

    pub fn is_available(&self, person: PersonRef) -> bool {
        self.available.is_member_available(person)
    }

    pub fn available_members(&self, group: GroupId) -> Vec<PersonRef> {
        self.available
            .mask(group)
            .iter()
            .enumerate()
            .filter(|(_, a)| **a)
            .map(|(m, _)| PersonRef::new(group, m))
            .collect()
    }

    pub fn now_available(&self, group: GroupId) -> i64 {
        self.available.now_available(group)
    }

    /// Somme des `count` des membres disponibles du groupe.
    pub fn group_count(&self, group: GroupId) -> i64 {
        let mask = self.available.mask(group);
        self.group(group)
            .map(|g| {
                g.members
                    .iter()
                    .zip(mask)
                    .filter(|(_, a)| **a)
                    .map(|(p, _)| p.count)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Tire `quota` personnes pour `date`, éventuellement restreint à `subset`.
    ///
    /// Les congés et absences du jour sont retirés de la disponibilité, les
    /// quotas répartis, puis chaque groupe disponible tire sa part dans l'ordre
    /// d'itération. La disponibilité est remise à plein avant de rendre la main,
    /// y compris en cas d'erreur.
    pub fn take(
        &mut self,
        quota: i64,
        date: NaiveDate,
        subset: Option<&[GroupId]>,
    ) -> Result<Vec<PersonRef>, PoolError> {
        let result = self.take_available(quota, date, subset);
        self.reset();
        result
    }

    fn take_available(
        &mut self,
        quota: i64,
        date: NaiveDate,
        subset: Option<&[GroupId]>,
    ) -> Result<Vec<PersonRef>, PoolError> {
        if quota <= 0 {
            return Ok(Vec::new());
        }
        if let Some(subset) = subset.filter(|s| !s.is_empty()) {
            self.available.replace_groups(subset);
        }

        let away: Vec<PersonRef> = self
            .groups
            .iter()
            .flat_map(|g| {
                g.members
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.is_away(date))
                    .map(move |(m, _)| PersonRef::new(g.id, m))
            })
            .collect();
        self.exclude(&away, &[]);

        self.set_quotas(quota)?;

        let wanted = usize::try_from(quota).unwrap_or(0);
        let mut picked = Vec::with_capacity(wanted.min(self.size()));
        for group in self.available.groups().to_vec() {
            picked.extend(self.take_from_group(group, None, date)?);
        }
        debug!(%date, quota, picked = picked.len(), "pool take");
        Ok(picked)
    }

    /// Retire des personnes et des groupes de la disponibilité courante.
    pub fn exclude(&mut self, people: &[PersonRef], groups: &[GroupId]) {
        for &p in people {
            self.available.exclude_member(p);
        }
        for &g in groups {
            self.available.exclude_group(g);
        }
    }

    /// Une place de moins dans le groupe de chaque personne donnée.
    pub fn decrease(&mut self, people: &[PersonRef]) {
        for p in people {
            self.available.decrease(p.group);
        }
    }

    pub fn reset(&mut self) {
        self.available = Availability::full(&self.groups);
    }

    pub fn tallies(&self) -> Vec<MemberTally> {
        self.groups
            .iter()
            .flat_map(|g| {
                g.members.iter().map(move |p| MemberTally {
                    name: p.name.clone(),
                    group: g.name.clone(),
                    real_count: p.real_count,
                    precount: p.precount,
                    removed_count: p.removed_count(),
                    count: p.count,
                })
            })
            .collect()
    }

    pub fn group_tallies(&self) -> Vec<GroupTally> {
        self.groups
            .iter()
            .map(|g| GroupTally {
                name: g.name.clone(),
                real_count: g.real_count(),
            })
            .collect()
    }
}

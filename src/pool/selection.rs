use super::{util, LaborPool, PoolError};
use crate::model::{DateInterval, Group, GroupId, PersonRef};
use chrono::NaiveDate;
use tracing::debug;

/// Vues ordonnées par rang, figées avant toute mise à jour du tirage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Queues {
    /// Tous les membres.
    pub total: Vec<usize>,
    /// Membres disponibles, ni en congé ni en absence ce jour-là.
    pub available: Vec<usize>,
}

impl Group {
    pub(crate) fn queues(&mut self, date: NaiveDate, mask: &[bool]) -> Queues {
        util::sort_by_rank(&mut self.priority, &self.members);
        let total = self.priority.clone();
        let available = total
            .iter()
            .copied()
            .filter(|&m| mask.get(m).copied().unwrap_or(false) && !self.members[m].is_away(date))
            .collect();
        Queues { total, available }
    }

    /// Comptabilité virtuelle : les membres en absence dans la fenêtre des
    /// `ddnw` premiers rangs sont comptés comme s'ils avaient été choisis.
    /// Retourne le nombre de compensations appliquées.
    pub(crate) fn virtual_pass(&mut self, queues: &Queues, date: NaiveDate) -> usize {
        let window = usize::try_from(self.ddnw).unwrap_or(0);
        if window == 0 {
            return 0;
        }
        let mut seen = 0usize;
        let mut compensated = 0usize;
        for &m in &queues.total {
            let member = &mut self.members[m];
            if member.has_dayoff(date) {
                continue;
            }
            if member.is_vacant(date) {
                member.bump();
                compensated += 1;
            } else if !queues.available.contains(&m) {
                continue;
            }
            seen += 1;
            if seen >= window {
                break;
            }
        }
        compensated
    }

    /// Sélection réelle des `ddnw` premiers disponibles, avec repos imposé
    /// `[date - gap, date + gap]` ajouté aux congés de chaque élu.
    pub(crate) fn real_pass(
        &mut self,
        queues: &Queues,
        date: NaiveDate,
        gap: i64,
    ) -> Result<Vec<PersonRef>, PoolError> {
        let quota = usize::try_from(self.ddnw).unwrap_or(0);
        let (start, end) = util::gap_bounds(date, gap)?;
        let mut picked = Vec::with_capacity(queues.available.len().min(quota));
        for &m in queues.available.iter().take(quota) {
            let owner = PersonRef::new(self.id, m);
            let member = &mut self.members[m];
            member.pick();
            member.dayoffs.push(DateInterval { start, end, owner });
            picked.push(owner);
        }
        if picked.len() < quota {
            return Err(PoolError::RanOutOfMember {
                group: self.name.clone(),
            });
        }
        Ok(picked)
    }

    /// Tire `quota` membres (ou `ddnw` si absent) pour `date`.
    pub(crate) fn take(
        &mut self,
        quota: Option<i64>,
        date: NaiveDate,
        mask: &[bool],
        gap: i64,
    ) -> Result<Vec<PersonRef>, PoolError> {
        if let Some(q) = quota {
            self.ddnw = q;
        }
        if self.ddnw <= 0 {
            return Ok(Vec::new());
        }
        let queues = self.queues(date, mask);
        let compensated = self.virtual_pass(&queues, date);
        let picked = self.real_pass(&queues, date, gap)?;
        debug!(
            group = %self.name,
            %date,
            picked = picked.len(),
            compensated,
            "group take"
        );
        Ok(picked)
    }
}

impl LaborPool {
    /// Tirage direct dans un groupe, selon la disponibilité courante du pool.
    pub fn take_from_group(
        &mut self,
        group: GroupId,
        quota: Option<i64>,
        date: NaiveDate,
    ) -> Result<Vec<PersonRef>, PoolError> {
        let gap = self.gap_size;
        let mask = self.available.mask(group);
        let target = self
            .groups
            .get_mut(group.index())
            .ok_or_else(|| PoolError::UnknownGroup(format!("#{}", group.index())))?;
        target.take(quota, date, mask, gap)
    }
}

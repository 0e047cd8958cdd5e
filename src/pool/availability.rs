use crate::model::{Group, GroupId, PersonRef};

/// État de disponibilité transitoire d'un passage de sélection.
///
/// Reconstruit à partir des groupes après chaque `take` du pool ; seuls les
/// compteurs des personnes survivent d'un jour à l'autre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Availability {
    groups: Vec<GroupId>,
    members: Vec<Vec<bool>>,
    now_available: Vec<i64>,
}

impl Availability {
    pub(super) fn full(groups: &[Group]) -> Self {
        Self {
            groups: groups.iter().map(|g| g.id).collect(),
            members: groups.iter().map(|g| vec![true; g.len()]).collect(),
            now_available: groups.iter().map(|g| g.max_available).collect(),
        }
    }

    pub(super) fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    pub(super) fn mask(&self, group: GroupId) -> &[bool] {
        self.members
            .get(group.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(super) fn is_member_available(&self, person: PersonRef) -> bool {
        self.members
            .get(person.group.index())
            .and_then(|m| m.get(person.member))
            .copied()
            .unwrap_or(false)
    }

    pub(super) fn member_count(&self, group: GroupId) -> usize {
        self.mask(group).iter().filter(|a| **a).count()
    }

    pub(super) fn now_available(&self, group: GroupId) -> i64 {
        self.now_available.get(group.index()).copied().unwrap_or(0)
    }

    pub(super) fn exclude_member(&mut self, person: PersonRef) {
        if let Some(slot) = self
            .members
            .get_mut(person.group.index())
            .and_then(|m| m.get_mut(person.member))
        {
            *slot = false;
        }
    }

    pub(super) fn exclude_group(&mut self, group: GroupId) {
        self.groups.retain(|g| *g != group);
    }

    /// Remplace l'ensemble des groupes disponibles, dans l'ordre donné.
    pub(super) fn replace_groups(&mut self, subset: &[GroupId]) {
        self.groups = subset.to_vec();
    }

    pub(super) fn decrease(&mut self, group: GroupId) {
        if let Some(n) = self.now_available.get_mut(group.index()) {
            *n -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Person;

    fn groups() -> Vec<Group> {
        let mut a = Group::new(GroupId(0), "A", 2);
        a.push_member(Person::new("a0", GroupId(0), 0, 0.0));
        a.push_member(Person::new("a1", GroupId(0), 0, 0.5));
        let mut b = Group::new(GroupId(1), "B", 1);
        b.push_member(Person::new("b0", GroupId(1), 0, 0.0));
        vec![a, b]
    }

    #[test]
    fn exclusions_are_scoped_to_the_scratch_state() {
        let groups = groups();
        let pristine = Availability::full(&groups);
        let mut avail = pristine.clone();

        avail.exclude_member(PersonRef::new(GroupId(0), 1));
        avail.exclude_group(GroupId(1));
        avail.decrease(GroupId(0));
        assert_eq!(avail.member_count(GroupId(0)), 1);
        assert_eq!(avail.groups(), &[GroupId(0)]);
        assert_eq!(avail.now_available(GroupId(0)), 1);
        assert!(!avail.is_member_available(PersonRef::new(GroupId(0), 1)));

        assert_eq!(Availability::full(&groups), pristine);
    }

    #[test]
    fn excluding_twice_is_harmless() {
        let groups = groups();
        let mut avail = Availability::full(&groups);
        let p = PersonRef::new(GroupId(1), 0);
        avail.exclude_member(p);
        avail.exclude_member(p);
        avail.exclude_group(GroupId(1));
        avail.exclude_group(GroupId(1));
        assert_eq!(avail.member_count(GroupId(1)), 0);
        assert_eq!(avail.groups(), &[GroupId(0)]);
    }
}

//! Houses and encounter sites placed on the map.

use std::collections::BTreeMap;

use candy_quest_core::{
    CellCoord, CharacterId, ConditionDescriptor, EncounterId, EncounterSiteSnapshot, HouseId,
    HouseSnapshot, SiteId, SiteRef, Stance, TriggerDescriptor,
};

/// House stored inside the world.
///
/// Visitor lists are weak backlinks to characters; entries are only appended.
#[derive(Clone, Debug)]
pub(crate) struct House {
    pub(crate) id: HouseId,
    pub(crate) cell: CellCoord,
    pub(crate) encounter: EncounterId,
    pub(crate) conditions: Vec<ConditionDescriptor>,
    pub(crate) triggers: Vec<TriggerDescriptor>,
    pub(crate) visitors: Vec<CharacterId>,
    pub(crate) trickers: Vec<CharacterId>,
    pub(crate) treaters: Vec<CharacterId>,
}

impl House {
    pub(crate) fn snapshot(&self) -> HouseSnapshot {
        HouseSnapshot {
            id: self.id,
            cell: self.cell,
            encounter: self.encounter.clone(),
            visitors: self.visitors.clone(),
            trickers: self.trickers.clone(),
            treaters: self.treaters.clone(),
        }
    }

    /// Appends the character to the list matching the stance.
    ///
    /// Neutral stances are not recorded.
    pub(crate) fn record_stance(&mut self, character: CharacterId, stance: Stance) -> bool {
        match stance {
            Stance::Trick => self.trickers.push(character),
            Stance::Treat => self.treaters.push(character),
            Stance::Neutral => return false,
        }
        true
    }
}

/// Encounter site stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct EncounterSite {
    pub(crate) id: SiteId,
    pub(crate) cell: CellCoord,
    pub(crate) encounter: EncounterId,
    pub(crate) conditions: Vec<ConditionDescriptor>,
    pub(crate) triggers: Vec<TriggerDescriptor>,
    pub(crate) visitors: Vec<CharacterId>,
}

impl EncounterSite {
    pub(crate) fn snapshot(&self) -> EncounterSiteSnapshot {
        EncounterSiteSnapshot {
            id: self.id,
            cell: self.cell,
            encounter: self.encounter.clone(),
            visitors: self.visitors.clone(),
        }
    }
}

/// Registry that stores placed sites and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct SiteRegistry {
    houses: BTreeMap<HouseId, House>,
    encounters: BTreeMap<SiteId, EncounterSite>,
    next_house_id: HouseId,
    next_site_id: SiteId,
}

impl SiteRegistry {
    pub(crate) fn new() -> Self {
        Self {
            houses: BTreeMap::new(),
            encounters: BTreeMap::new(),
            next_house_id: HouseId::new(0),
            next_site_id: SiteId::new(0),
        }
    }

    pub(crate) fn place_house(
        &mut self,
        cell: CellCoord,
        encounter: EncounterId,
        conditions: Vec<ConditionDescriptor>,
        triggers: Vec<TriggerDescriptor>,
    ) -> HouseId {
        let id = self.next_house_id;
        self.next_house_id = HouseId::new(id.get().saturating_add(1));
        let house = House {
            id,
            cell,
            encounter,
            conditions,
            triggers,
            visitors: Vec::new(),
            trickers: Vec::new(),
            treaters: Vec::new(),
        };
        let _ = self.houses.insert(id, house);
        id
    }

    pub(crate) fn place_encounter(
        &mut self,
        cell: CellCoord,
        encounter: EncounterId,
        conditions: Vec<ConditionDescriptor>,
        triggers: Vec<TriggerDescriptor>,
    ) -> SiteId {
        let id = self.next_site_id;
        self.next_site_id = SiteId::new(id.get().saturating_add(1));
        let site = EncounterSite {
            id,
            cell,
            encounter,
            conditions,
            triggers,
            visitors: Vec::new(),
        };
        let _ = self.encounters.insert(id, site);
        id
    }

    pub(crate) fn house(&self, id: HouseId) -> Option<&House> {
        self.houses.get(&id)
    }

    pub(crate) fn house_mut(&mut self, id: HouseId) -> Option<&mut House> {
        self.houses.get_mut(&id)
    }

    pub(crate) fn encounter(&self, id: SiteId) -> Option<&EncounterSite> {
        self.encounters.get(&id)
    }

    pub(crate) fn houses(&self) -> impl Iterator<Item = &House> {
        self.houses.values()
    }

    pub(crate) fn encounters(&self) -> impl Iterator<Item = &EncounterSite> {
        self.encounters.values()
    }

    /// Site occupying the cell; houses take precedence over encounter sites.
    pub(crate) fn at(&self, cell: CellCoord) -> Option<SiteRef> {
        self.houses
            .values()
            .find(|house| house.cell == cell)
            .map(|house| SiteRef::House(house.id))
            .or_else(|| {
                self.encounters
                    .values()
                    .find(|site| site.cell == cell)
                    .map(|site| SiteRef::Encounter(site.id))
            })
    }

    pub(crate) fn is_occupied(&self, cell: CellCoord) -> bool {
        self.at(cell).is_some()
    }

    /// Appends a visitor, reporting whether the site exists.
    pub(crate) fn record_visit(&mut self, site: SiteRef, character: CharacterId) -> bool {
        let visitors = match site {
            SiteRef::House(id) => self.houses.get_mut(&id).map(|house| &mut house.visitors),
            SiteRef::Encounter(id) => self
                .encounters
                .get_mut(&id)
                .map(|site| &mut site.visitors),
        };
        match visitors {
            Some(visitors) => {
                visitors.push(character);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_allocates_sequential_identifiers() {
        let mut registry = SiteRegistry::new();
        let first = registry.place_house(
            CellCoord::new(1, 1),
            EncounterId::new("porch"),
            Vec::new(),
            Vec::new(),
        );
        let second = registry.place_house(
            CellCoord::new(3, 1),
            EncounterId::new("porch"),
            Vec::new(),
            Vec::new(),
        );
        assert_eq!((first.get(), second.get()), (0, 1));
    }

    #[test]
    fn houses_shadow_encounters_on_the_same_cell() {
        let mut registry = SiteRegistry::new();
        let cell = CellCoord::new(2, 2);
        let site = registry.place_encounter(cell, EncounterId::new("owl"), Vec::new(), Vec::new());
        assert_eq!(registry.at(cell), Some(SiteRef::Encounter(site)));

        let house = registry.place_house(cell, EncounterId::new("porch"), Vec::new(), Vec::new());
        assert_eq!(registry.at(cell), Some(SiteRef::House(house)));
        assert!(registry.is_occupied(cell));
        assert!(!registry.is_occupied(CellCoord::new(0, 0)));
    }

    #[test]
    fn visits_and_stances_append_single_entries() {
        let mut registry = SiteRegistry::new();
        let house = registry.place_house(
            CellCoord::new(1, 1),
            EncounterId::new("porch"),
            Vec::new(),
            Vec::new(),
        );
        let kid = CharacterId::new(4);

        assert!(registry.record_visit(SiteRef::House(house), kid));
        assert!(registry.record_visit(SiteRef::House(house), kid));
        assert!(!registry.record_visit(SiteRef::Encounter(SiteId::new(9)), kid));

        let stored = registry.house_mut(house).expect("placed");
        assert!(stored.record_stance(kid, Stance::Trick));
        assert!(!stored.record_stance(kid, Stance::Neutral));

        let snapshot = registry.house(house).expect("placed").snapshot();
        assert_eq!(snapshot.visitors, vec![kid, kid]);
        assert_eq!(snapshot.trickers, vec![kid]);
        assert!(snapshot.treaters.is_empty());
    }
}

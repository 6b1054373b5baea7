//! Flattening a parse into atomic `slot=value` facts.
//!
//! Comparing two structured parses reduces to comparing two sets of facts.
//! Tag lists become independent facts, so order within a category never
//! affects a score and duplicate tags count once.

use crate::schema::{FilterCategory, ParsedQuery};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// One attribute category of the schema; the unit of per-slot reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Location,
    DatesCheckin,
    DatesCheckout,
    GuestsAdults,
    GuestsChildren,
    PriceMaxEur,
    StarsMin,
    RatingMin,
    FamilyFriendly,
    Ui(FilterCategory),
    Unsupported,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::Location => "location",
            Slot::DatesCheckin => "dates.checkin",
            Slot::DatesCheckout => "dates.checkout",
            Slot::GuestsAdults => "guests.adults",
            Slot::GuestsChildren => "guests.children",
            Slot::PriceMaxEur => "price_max_eur",
            Slot::StarsMin => "stars_min",
            Slot::RatingMin => "rating_min",
            Slot::FamilyFriendly => "family_friendly",
            Slot::Ui(category) => return write!(f, "ui.{}", category.key()),
            Slot::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An asserted attribute value, rendered as `slot=value`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fact {
    pub slot: Slot,
    pub value: String,
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.slot, self.value)
    }
}

/// The facts of one parse. Order is irrelevant and duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactSet {
    facts: BTreeSet<Fact>,
}

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: Slot, value: impl Into<String>) {
        self.facts.insert(Fact {
            slot,
            value: value.into(),
        });
    }

    /// Insert a scalar string as given; blank values are dropped.
    fn insert_scalar(&mut self, slot: Slot, value: &str) {
        if !value.trim().is_empty() {
            self.insert(slot, value);
        }
    }

    /// Insert a tag, trimmed; blank tags are dropped.
    fn insert_tag(&mut self, slot: Slot, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            self.insert(slot, value);
        }
    }

    pub fn contains(&self, fact: &Fact) -> bool {
        self.facts.contains(fact)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter()
    }

    /// Number of facts present in both sets.
    pub fn intersection_count(&self, other: &FactSet) -> usize {
        self.facts.intersection(&other.facts).count()
    }
}

/// Flatten a parse into its canonical fact set.
pub fn flatten(parse: &ParsedQuery) -> FactSet {
    let mut facts = FactSet::new();

    facts.insert_scalar(Slot::Location, &parse.location);
    facts.insert_scalar(Slot::DatesCheckin, &parse.dates.checkin);
    facts.insert_scalar(Slot::DatesCheckout, &parse.dates.checkout);

    if parse.guests.adults != 0 {
        facts.insert(Slot::GuestsAdults, parse.guests.adults.to_string());
    }
    if parse.guests.children != 0 {
        facts.insert(Slot::GuestsChildren, parse.guests.children.to_string());
    }
    if parse.price_max_eur != 0.0 {
        facts.insert(Slot::PriceMaxEur, format!("{:.0}", parse.price_max_eur));
    }
    if parse.stars_min != 0 {
        facts.insert(Slot::StarsMin, parse.stars_min.to_string());
    }
    if parse.rating_min != 0.0 {
        facts.insert(Slot::RatingMin, format!("{:.1}", parse.rating_min));
    }

    // A boolean's false state is meaningful, so it is always asserted.
    facts.insert(Slot::FamilyFriendly, parse.family_friendly.to_string());

    for category in FilterCategory::ALL {
        for tag in parse.ui_filters.tags(category) {
            facts.insert_tag(Slot::Ui(category), tag);
        }
    }

    for criterion in &parse.unsupported_criteria {
        facts.insert_tag(Slot::Unsupported, criterion);
    }

    facts
}

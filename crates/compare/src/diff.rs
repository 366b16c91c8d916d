use std::collections::BTreeSet;

/// One entity's name and derived amenity set, input to `compare`.
#[derive(Debug, Clone)]
pub struct EntityAmenities {
    pub name: String,
    pub amenities: BTreeSet<String>,
}

impl EntityAmenities {
    pub fn new(name: &str, labels: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            amenities: labels.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityReport {
    pub name: String,
    pub amenities: BTreeSet<String>,
    /// Present in this entity and absent from every other one.
    pub unique: BTreeSet<String>,
}

/// Purely derived comparison output; inputs are never mutated and
/// nothing is cached between invocations.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub common_to_all: BTreeSet<String>,
    pub entities: Vec<EntityReport>,
    pub union_all: BTreeSet<String>,
    /// `|common| / |union|`; 0.0 when the union is empty.
    pub agreement_rate: f64,
}

pub fn compare(entries: &[EntityAmenities]) -> Comparison {
    let union_all: BTreeSet<String> = entries
        .iter()
        .flat_map(|e| e.amenities.iter().cloned())
        .collect();

    let common_to_all: BTreeSet<String> = match entries.first() {
        Some(first) => first
            .amenities
            .iter()
            .filter(|a| entries.iter().all(|e| e.amenities.contains(*a)))
            .cloned()
            .collect(),
        None => BTreeSet::new(),
    };

    let entities = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let unique = entry
                .amenities
                .iter()
                .filter(|a| {
                    entries
                        .iter()
                        .enumerate()
                        .all(|(j, other)| j == i || !other.amenities.contains(*a))
                })
                .cloned()
                .collect();
            EntityReport {
                name: entry.name.clone(),
                amenities: entry.amenities.clone(),
                unique,
            }
        })
        .collect();

    let agreement_rate = if union_all.is_empty() {
        0.0
    } else {
        common_to_all.len() as f64 / union_all.len() as f64
    };

    Comparison {
        common_to_all,
        entities,
        union_all,
        agreement_rate,
    }
}

//! Availability Aggregator
//!
//! Catalog listings are per-location; callers want to know which entries are
//! offered everywhere. The aggregator groups raw rows by their composite key
//! (size name for hardware, offer+sku for images) and flags an entry as
//! globally available iff its location set covers every location discovered
//! in the same listing. Pure and order-independent: permuting the input
//! never changes the result.

use crate::api::{ImageRow, VmSizeRow};
use std::collections::{BTreeMap, BTreeSet};

/// A hardware size annotated with where it is offered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeAvailability {
    /// Size name
    pub name: String,
    /// Locations offering the size
    pub locations: BTreeSet<String>,
    /// True iff offered in every location seen in the listing
    pub globally_available: bool,
}

/// An image annotated with where it is offered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAvailability {
    /// Image publisher
    pub publisher: String,
    /// Image offer
    pub offer: String,
    /// Image SKU
    pub sku: String,
    /// Locations offering the image
    pub locations: BTreeSet<String>,
    /// True iff offered in every location seen in the listing
    pub globally_available: bool,
}

/// Annotate hardware sizes with global availability
pub fn aggregate_sizes(rows: &[VmSizeRow]) -> Vec<SizeAvailability> {
    let all_locations = location_union(rows.iter().map(|r| r.location.as_str()));

    let mut by_name: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for row in rows {
        by_name
            .entry(row.name.clone())
            .or_default()
            .insert(row.location.clone());
    }

    by_name
        .into_iter()
        .map(|(name, locations)| {
            let globally_available = locations.is_superset(&all_locations);
            SizeAvailability {
                name,
                locations,
                globally_available,
            }
        })
        .collect()
}

/// Annotate images with global availability; keyed by offer+sku
pub fn aggregate_images(rows: &[ImageRow]) -> Vec<ImageAvailability> {
    let all_locations = location_union(rows.iter().map(|r| r.location.as_str()));

    let mut grouped: BTreeMap<(String, String), (String, BTreeSet<String>)> = BTreeMap::new();
    for row in rows {
        let entry = grouped
            .entry((row.offer.clone(), row.sku.clone()))
            .or_insert_with(|| (row.publisher.clone(), BTreeSet::new()));
        entry.1.insert(row.location.clone());
    }

    grouped
        .into_iter()
        .map(|((offer, sku), (publisher, locations))| {
            let globally_available = locations.is_superset(&all_locations);
            ImageAvailability {
                publisher,
                offer,
                sku,
                locations,
                globally_available,
            }
        })
        .collect()
}

fn location_union<'a>(locations: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    locations.map(|l| l.to_string()).collect()
}

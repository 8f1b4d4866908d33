//! Flattening of parsed responses into [`crate::FlatTable`]s.

pub mod error;
pub mod geometry;
pub mod scalar;
pub mod time_series;

use crate::flatten::error::FlattenError;
use crate::types::location::{Location, LocationKey};
use log::debug;

/// How values of several measures are combined into tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// One table per measure name. Nothing is merged.
    Separate,
    /// One table; rows are merged on identical location keys and fields of
    /// measures absent at a location are missing.
    ByLocation,
    /// The caller declares the measures share one grid. Checked: every measure
    /// must list the same locations in the same order, otherwise
    /// [`FlattenError::MisalignedGrid`]. Rows are then merged as for
    /// [`Alignment::ByLocation`].
    CoRegistered,
}

/// Requested names with duplicates removed, first occurrence kept.
pub(crate) fn unique_names<'a>(names: &[&'a str]) -> Vec<&'a str> {
    let mut unique: Vec<&str> = Vec::with_capacity(names.len());
    for &name in names {
        if unique.contains(&name) {
            debug!("Ignoring repeated measure name '{}'", name);
        } else {
            unique.push(name);
        }
    }
    unique
}

/// Checks that every grid lists the same location keys, in the same order, as the first one.
pub(crate) fn check_co_registration(grids: &[(&str, Vec<&Location>)]) -> Result<(), FlattenError> {
    let Some(((reference, reference_grid), rest)) = grids.split_first() else {
        return Ok(());
    };
    for (measure, grid) in rest {
        let misaligned = |detail: String| FlattenError::MisalignedGrid {
            measure: measure.to_string(),
            reference: reference.to_string(),
            detail,
        };
        if grid.len() != reference_grid.len() {
            return Err(misaligned(format!(
                "{} locations versus {}",
                grid.len(),
                reference_grid.len()
            )));
        }
        let keys = grid.iter().map(|l| l.key());
        let reference_keys = reference_grid.iter().map(|l| l.key());
        if let Some((index, (key, expected))) = keys
            .zip(reference_keys)
            .enumerate()
            .find(|(_, (key, expected))| key != expected)
        {
            return Err(misaligned(format!(
                "location {index} is '{key}' but '{expected}' in the reference grid"
            )));
        }
    }
    Ok(())
}

/// Assigns each distinct location key a row slot in first-encounter order.
#[derive(Debug, Default)]
pub(crate) struct LocationIndex {
    slots: std::collections::HashMap<LocationKey, usize>,
    locations: Vec<Location>,
}

impl LocationIndex {
    pub(crate) fn slot(&mut self, location: &Location) -> usize {
        if let Some(slot) = self.slots.get(location.key()) {
            return *slot;
        }
        let slot = self.locations.len();
        self.slots.insert(location.key().clone(), slot);
        self.locations.push(location.clone());
        slot
    }

    pub(crate) fn into_locations(self) -> Vec<Location> {
        self.locations
    }
}

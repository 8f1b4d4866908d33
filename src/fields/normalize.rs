//! Name-based, collision-checked shortening of field names for writers with a
//! field-name length limit (10 characters for shapefile DBF tables).

use crate::fields::error::FieldNameError;
use log::debug;
use std::collections::HashSet;

/// Field-name length limit of shapefile attribute tables.
pub const SHAPEFILE_FIELD_LENGTH: usize = 10;

/// A validated mapping from original to normalized field names.
///
/// Entries keep the order of the names passed to [`normalize_field_names`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNameMap {
    entries: Vec<(String, String)>,
    max_length: usize,
}

impl FieldNameMap {
    /// The normalized name of `original`, if it was part of the input.
    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(from, _)| from == original)
            .map(|(_, to)| to.as_str())
    }

    /// `(original, normalized)` pairs in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(from, to)| (from.as_str(), to.as_str()))
    }

    pub fn normalized_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, to)| to.as_str()).collect()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Maps every name to a unique name of at most `max_length` characters.
///
/// Names that already fit are kept verbatim and reserved before any other
/// name is shortened, so normalizing an already-normalized list is the
/// identity. Longer names are truncated; when a truncation is taken, the
/// smallest numeric suffix that yields a free name is used instead. Names are
/// processed in input order and duplicates in the input map once.
///
/// # Errors
///
/// [`FieldNameError::ZeroLength`] for a zero budget, and
/// [`FieldNameError::FieldNameCollision`] when no unique name fits.
///
/// # Examples
///
/// ```
/// use geomeasures::normalize_field_names;
///
/// let names = ["soilMoistureMean", "soilMoistureMax", "soilPH"];
/// let map = normalize_field_names(&names, 10).unwrap();
/// assert_eq!(map.get("soilMoistureMean"), Some("soilMoistu"));
/// assert_eq!(map.get("soilMoistureMax"), Some("soilMoist1"));
/// assert_eq!(map.get("soilPH"), Some("soilPH"));
/// ```
pub fn normalize_field_names<S: AsRef<str>>(
    names: &[S],
    max_length: usize,
) -> Result<FieldNameMap, FieldNameError> {
    if max_length == 0 {
        return Err(FieldNameError::ZeroLength);
    }

    let mut taken: HashSet<String> = names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| name.chars().count() <= max_length)
        .map(str::to_string)
        .collect();

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(names.len());
    for name in names.iter().map(AsRef::as_ref) {
        if !seen.insert(name) {
            continue;
        }
        let normalized = if name.chars().count() <= max_length {
            name.to_string()
        } else {
            let short = shorten(name, max_length, &mut taken)?;
            debug!("Shortened field '{}' to '{}'", name, short);
            short
        };
        entries.push((name.to_string(), normalized));
    }

    Ok(FieldNameMap {
        entries,
        max_length,
    })
}

fn shorten(
    name: &str,
    max_length: usize,
    taken: &mut HashSet<String>,
) -> Result<String, FieldNameError> {
    let truncated = truncate_chars(name, max_length).to_string();
    if taken.insert(truncated.clone()) {
        return Ok(truncated);
    }

    // Terminates: each iteration either succeeds, or hits a name in `taken`,
    // which is finite, or runs out of room for the suffix.
    for counter in 1usize.. {
        let suffix = counter.to_string();
        if suffix.len() >= max_length {
            break;
        }
        let candidate = format!("{}{}", truncate_chars(name, max_length - suffix.len()), suffix);
        if taken.insert(candidate.clone()) {
            return Ok(candidate);
        }
    }

    Err(FieldNameError::FieldNameCollision {
        name: name.to_string(),
        max_length,
    })
}

fn truncate_chars(name: &str, length: usize) -> &str {
    match name.char_indices().nth(length) {
        Some((byte_index, _)) => &name[..byte_index],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names_are_kept() -> Result<(), FieldNameError> {
        let map = normalize_field_names(&["geometry", "date", "soilPH"], 10)?;
        assert_eq!(map.normalized_names(), vec!["geometry", "date", "soilPH"]);
        Ok(())
    }

    #[test]
    fn test_truncation_collision_gets_suffix() -> Result<(), FieldNameError> {
        let names = [
            "temperatureMean",
            "temperatureMin",
            "temperatureMax",
        ];
        let map = normalize_field_names(&names, SHAPEFILE_FIELD_LENGTH)?;
        dbg!(&map);
        assert_eq!(map.get("temperatureMean"), Some("temperatur"));
        assert_eq!(map.get("temperatureMin"), Some("temperatu1"));
        assert_eq!(map.get("temperatureMax"), Some("temperatu2"));
        Ok(())
    }

    #[test]
    fn test_suffix_skips_names_already_in_input() -> Result<(), FieldNameError> {
        // "temperatu1" fits and is reserved, so the shortened name moves on to 2.
        let names = ["temperatureMean", "temperatureMin", "temperatu1"];
        let map = normalize_field_names(&names, 10)?;
        assert_eq!(map.get("temperatureMean"), Some("temperatur"));
        assert_eq!(map.get("temperatureMin"), Some("temperatu2"));
        assert_eq!(map.get("temperatu1"), Some("temperatu1"));
        Ok(())
    }

    #[test]
    fn test_ph_value_names_stay_distinct() -> Result<(), FieldNameError> {
        let map = normalize_field_names(&["soilPHValue", "soilPHVal2"], 10)?;
        assert_eq!(map.get("soilPHValue"), Some("soilPHValu"));
        assert_eq!(map.get("soilPHVal2"), Some("soilPHVal2"));
        let unique: HashSet<&str> = map.normalized_names().into_iter().collect();
        assert_eq!(unique.len(), 2);
        Ok(())
    }

    #[test]
    fn test_collision_when_budget_too_small() {
        let result = normalize_field_names(&["ab", "ac"], 1);
        assert_eq!(
            result,
            Err(FieldNameError::FieldNameCollision {
                name: "ac".to_string(),
                max_length: 1
            })
        );
    }

    #[test]
    fn test_collision_when_suffixes_run_out() {
        // Two characters leave room for suffixes 1..=9 only.
        let names: Vec<String> = (0..11).map(|i| format!("field{i:02}")).collect();
        let result = normalize_field_names(&names, 2);
        assert!(matches!(
            result,
            Err(FieldNameError::FieldNameCollision { max_length: 2, .. })
        ));
    }

    #[test]
    fn test_zero_length_budget() {
        assert_eq!(
            normalize_field_names(&["a"], 0),
            Err(FieldNameError::ZeroLength)
        );
    }

    #[test]
    fn test_idempotent_and_deterministic() -> Result<(), FieldNameError> {
        let names = [
            "soilTotalAbundanceOfInvertebrates",
            "soilTotalAbundanceOfEarthworms",
            "soilPH",
            "soilOrganicMatter",
        ];
        let first = normalize_field_names(&names, 10)?;
        let second = normalize_field_names(&names, 10)?;
        assert_eq!(first, second);

        let normalized = first.normalized_names();
        let again = normalize_field_names(&normalized, 10)?;
        for (original, short) in again.iter() {
            assert_eq!(original, short);
        }
        Ok(())
    }

    #[test]
    fn test_duplicates_map_once() -> Result<(), FieldNameError> {
        let map = normalize_field_names(&["soilPH", "soilPH"], 10)?;
        assert_eq!(map.len(), 1);
        Ok(())
    }

    #[test]
    fn test_truncates_on_char_boundary() -> Result<(), FieldNameError> {
        let map = normalize_field_names(&["débitMoyenJournalier"], 6)?;
        assert_eq!(map.get("débitMoyenJournalier"), Some("débitM"));
        Ok(())
    }
}

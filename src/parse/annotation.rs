// src/parse/annotation.rs
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::MalformedCell;

/// Placeholder for a species slot nobody filled in.
pub const NONE: &str = "NONE";
/// Placeholder for a contextual answer that was never given.
pub const NODATA: &str = "NODATA";
/// Number of species observations kept per annotation.
pub const SPECIES_SLOTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesSlot {
    pub species: String,
    pub how_many: String,
}

impl Default for SpeciesSlot {
    fn default() -> Self {
        Self {
            species: NONE.to_string(),
            how_many: NONE.to_string(),
        }
    }
}

/// One reviewer's annotation of a subject, flattened to a fixed width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub species: [SpeciesSlot; SPECIES_SLOTS],
    pub time_of_day: String,
    pub temperature: String,
    pub month: String,
    pub habitat: String,
    /// Observations past the last slot; not part of the output schema.
    pub overflow: usize,
}

impl Default for AnnotationRecord {
    fn default() -> Self {
        Self {
            species: Default::default(),
            time_of_day: NODATA.to_string(),
            temperature: NODATA.to_string(),
            month: NODATA.to_string(),
            habitat: String::new(),
            overflow: 0,
        }
    }
}

impl AnnotationRecord {
    /// The eight output fields in column order.
    pub fn fields(&self) -> [&str; 8] {
        [
            self.species[0].species.as_str(),
            self.species[0].how_many.as_str(),
            self.species[1].species.as_str(),
            self.species[1].how_many.as_str(),
            self.time_of_day.as_str(),
            self.temperature.as_str(),
            self.month.as_str(),
            self.habitat.as_str(),
        ]
    }
}

/// First task of an annotation list. Only the species survey task is read.
#[derive(Deserialize)]
struct SurveyTask {
    value: Vec<Map<String, Value>>,
}

/// Render a JSON scalar as cell text; `null` counts as absent.
pub(crate) fn cell_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn text_or(v: Option<&Value>, default: &str) -> String {
    cell_text(v).unwrap_or_else(|| default.to_string())
}

/// Decode an annotation cell, reporting why it could not be read.
///
/// The record is built in full or not at all: any structural problem anywhere
/// in the observation list rejects the whole cell.
pub fn try_parse_annotations(cell: &str) -> Result<AnnotationRecord, MalformedCell> {
    let tasks: Vec<Value> = serde_json::from_str(cell)?;
    let first = tasks
        .into_iter()
        .next()
        .ok_or_else(|| MalformedCell("empty annotation list".into()))?;
    let task: SurveyTask = serde_json::from_value(first)?;

    let mut record = AnnotationRecord::default();
    for (i, obs) in task.value.iter().enumerate() {
        let answers = match obs.get("answers") {
            None | Some(Value::Null) => None,
            Some(Value::Object(m)) => Some(m),
            Some(_) => {
                return Err(MalformedCell(format!(
                    "observation {} has non-object answers",
                    i
                )))
            }
        };
        let answer = |key: &str| answers.and_then(|m| m.get(key));

        if i >= SPECIES_SLOTS {
            record.overflow += 1;
            continue;
        }

        record.species[i] = SpeciesSlot {
            species: text_or(obs.get("choice"), NONE),
            how_many: text_or(answer("HOWMANY"), NONE),
        };

        // context comes from the first observation only
        if i == 0 {
            record.time_of_day = text_or(answer("TIMEOFDAY"), NODATA);
            record.temperature = text_or(answer("TEMPERATURE"), NODATA);
            record.month = text_or(answer("MONTHOFTHEYEAR"), NODATA);
            record.habitat = text_or(answer("HABITAT"), "");
        }
    }

    Ok(record)
}

/// Decode an annotation cell; malformed input yields the all-defaults record.
pub fn parse_annotations(cell: &str) -> AnnotationRecord {
    try_parse_annotations(cell).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> AnnotationRecord {
        AnnotationRecord::default()
    }

    #[test]
    fn malformed_cells_yield_defaults() {
        for cell in [
            "",
            "not json",
            "{}",
            "[]",
            "[{}]",
            r#"[{"value": "Fox"}]"#,
            r#"[{"value": [{"choice": "Fox", "answers": "x"}]}]"#,
            r#"[{"value": [{"choice": "Fox"}, 7]}]"#,
        ] {
            assert_eq!(parse_annotations(cell), defaults(), "cell {:?}", cell);
            assert!(try_parse_annotations(cell).is_err(), "cell {:?}", cell);
        }

        let d = defaults();
        assert_eq!(
            d.fields(),
            ["NONE", "NONE", "NONE", "NONE", "NODATA", "NODATA", "NODATA", ""]
        );
    }

    #[test]
    fn single_observation() {
        let cell = r#"[{"value":[{"choice":"Fox","answers":{"HOWMANY":"1","TIMEOFDAY":"Night"}}]}]"#;
        let r = parse_annotations(cell);
        assert_eq!(r.species[0].species, "Fox");
        assert_eq!(r.species[0].how_many, "1");
        assert_eq!(r.species[1], SpeciesSlot::default());
        assert_eq!(r.time_of_day, "Night");
        assert_eq!(r.temperature, "NODATA");
        assert_eq!(r.month, "NODATA");
        assert_eq!(r.habitat, "");
        assert_eq!(r.overflow, 0);
    }

    #[test]
    fn context_only_from_first_observation() {
        let cell = r#"[{"value":[
            {"choice":"Deer","answers":{"HOWMANY":"2","TIMEOFDAY":"Day","TEMPERATURE":"Warm","MONTHOFTHEYEAR":"May","HABITAT":"Scrub"}},
            {"choice":"Coyote","answers":{"HOWMANY":"1","TIMEOFDAY":"Night","TEMPERATURE":"Cold","MONTHOFTHEYEAR":"June","HABITAT":"Oak"}}
        ]}]"#;
        let r = parse_annotations(cell);
        assert_eq!(r.species[1].species, "Coyote");
        assert_eq!(r.species[1].how_many, "1");
        assert_eq!(r.time_of_day, "Day");
        assert_eq!(r.temperature, "Warm");
        assert_eq!(r.month, "May");
        assert_eq!(r.habitat, "Scrub");
    }

    #[test]
    fn extra_observations_are_counted() {
        let cell = r#"[{"value":[{"choice":"A"},{"choice":"B"},{"choice":"C"},{"choice":"D"}]}]"#;
        let r = parse_annotations(cell);
        assert_eq!(r.species[0].species, "A");
        assert_eq!(r.species[1].species, "B");
        assert_eq!(r.overflow, 2);
    }

    #[test]
    fn missing_keys_and_non_string_scalars() {
        let cell = r#"[{"value":[{"answers":{"HOWMANY":3,"TIMEOFDAY":null}}]}, {"value": "ignored"}]"#;
        let r = parse_annotations(cell);
        assert_eq!(r.species[0].species, "NONE");
        assert_eq!(r.species[0].how_many, "3");
        assert_eq!(r.time_of_day, "NODATA");
    }

    #[test]
    fn empty_value_list_is_all_defaults() {
        let r = try_parse_annotations(r#"[{"value":[]}]"#).unwrap();
        assert_eq!(r, defaults());
    }
}

//! The immutable snapshot produced by a load.

use std::collections::{BTreeMap, BTreeSet};

use bubble_map_geography_models::{GeoFeature, GeoPoint, StateCode, StateNameLookup};
use bubble_map_stats_models::{CategoryKey, DataYear, StatRecord};

use crate::{DatasetKind, LoadError, features};

/// How the selectable crime categories are determined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategorySchema {
    /// Every `*_rate` field of the first record except `Unemployment_Rate`,
    /// in payload order.
    #[default]
    Inferred,
    /// An explicit list, validated against the first record.
    Declared(Vec<String>),
}

impl CategorySchema {
    /// `Declared` when a list is configured, `Inferred` otherwise.
    #[must_use]
    pub fn from_config(categories: Option<&[String]>) -> Self {
        categories.map_or(Self::Inferred, |keys| Self::Declared(keys.to_vec()))
    }
}

/// Loaded statistics and geometry, joined by state code.
///
/// Never mutated after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<StatRecord>,
    features: Vec<GeoFeature>,
    name_lookup: StateNameLookup,
    geometry: BTreeMap<StateCode, GeoPoint>,
    categories: Vec<CategoryKey>,
    years: Vec<DataYear>,
}

impl Dataset {
    /// Builds a snapshot from the two raw response bodies.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if either body fails to parse, the statistics
    /// payload is not a non-empty array of records, or a declared schema
    /// does not match the first record.
    pub fn from_bodies(
        stats_body: &str,
        geo_body: &str,
        schema: &CategorySchema,
    ) -> Result<Self, LoadError> {
        let records = parse_records(stats_body)?;
        let features = features::parse_features(geo_body)?;
        Self::from_parts(records, features, schema)
    }

    /// Builds a snapshot from already-parsed records and features.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Shape`] if `records` is empty and
    /// [`LoadError::Schema`] if a declared schema does not match.
    pub fn from_parts(
        records: Vec<StatRecord>,
        features: Vec<GeoFeature>,
        schema: &CategorySchema,
    ) -> Result<Self, LoadError> {
        let first = records.first().ok_or_else(|| LoadError::Shape {
            message: "statistics array is empty".to_string(),
        })?;

        let categories = resolve_categories(first, schema)?;
        report_nonuniform_fields(&records);

        let years = records
            .iter()
            .map(|r| r.data_year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let name_lookup = StateNameLookup::from_features(&features);
        if name_lookup.is_empty() {
            log::warn!("Geography dataset has no usable state features; nothing can be drawn");
        } else {
            log::debug!("Built name lookup for {} states", name_lookup.len());
        }
        let geometry = build_geometry_index(&features);

        Ok(Self {
            records,
            features,
            name_lookup,
            geometry,
            categories,
            years,
        })
    }

    /// All statistics records, in payload order.
    #[must_use]
    pub fn records(&self) -> &[StatRecord] {
        &self.records
    }

    /// All parsed geography features, in payload order.
    #[must_use]
    pub fn features(&self) -> &[GeoFeature] {
        &self.features
    }

    /// State code to name lookup.
    #[must_use]
    pub const fn name_lookup(&self) -> &StateNameLookup {
        &self.name_lookup
    }

    /// Selectable crime categories.
    #[must_use]
    pub fn categories(&self) -> &[CategoryKey] {
        &self.categories
    }

    /// Distinct data years, ascending.
    #[must_use]
    pub fn years(&self) -> &[DataYear] {
        &self.years
    }

    /// Representative point for a state, if its feature had geometry.
    #[must_use]
    pub fn location(&self, code: &StateCode) -> Option<GeoPoint> {
        self.geometry.get(code).copied()
    }
}

/// Parses the statistics body into records.
///
/// # Errors
///
/// Returns [`LoadError::Parse`] for invalid JSON and [`LoadError::Shape`]
/// when the payload is not an array of objects with `state_abbr` and
/// `data_year`.
pub fn parse_records(body: &str) -> Result<Vec<StatRecord>, LoadError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| LoadError::Parse {
        dataset: DatasetKind::Stats,
        message: e.to_string(),
    })?;

    let serde_json::Value::Array(items) = value else {
        return Err(LoadError::Shape {
            message: "Invalid JSON format for crime data: expected an array".to_string(),
        });
    };

    if items.is_empty() {
        return Err(LoadError::Shape {
            message: "statistics array is empty".to_string(),
        });
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| LoadError::Shape {
                message: format!("record {index}: {e}"),
            })
        })
        .collect()
}

fn resolve_categories(
    first: &StatRecord,
    schema: &CategorySchema,
) -> Result<Vec<CategoryKey>, LoadError> {
    match schema {
        CategorySchema::Inferred => {
            let categories = first
                .rate_fields()
                .map(CategoryKey::parse)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| LoadError::Schema {
                    message: e.to_string(),
                })?;
            if categories.is_empty() {
                log::warn!("First statistics record has no '*_rate' fields; no categories");
            }
            Ok(categories)
        }
        CategorySchema::Declared(keys) => {
            let mut categories = Vec::with_capacity(keys.len());
            for key in keys {
                let category = CategoryKey::parse(key).map_err(|e| LoadError::Schema {
                    message: e.to_string(),
                })?;
                if !first.fields.contains_key(category.as_str()) {
                    return Err(LoadError::Schema {
                        message: format!("declared category '{category}' is not in the data"),
                    });
                }
                if !categories.contains(&category) {
                    categories.push(category);
                }
            }
            Ok(categories)
        }
    }
}

/// Records whose rate columns differ from the first record's are counted
/// and reported. They are kept: a missing rate simply filters the record
/// out of that category.
fn report_nonuniform_fields(records: &[StatRecord]) -> usize {
    let Some((first, rest)) = records.split_first() else {
        return 0;
    };
    let expected: BTreeSet<&str> = first.rate_fields().collect();

    let mismatched = rest
        .iter()
        .filter(|r| r.rate_fields().collect::<BTreeSet<_>>() != expected)
        .count();

    if mismatched > 0 {
        log::warn!(
            "{mismatched} of {} statistics records have a different set of rate fields \
             than the first record",
            records.len()
        );
    }
    mismatched
}

fn build_geometry_index(features: &[GeoFeature]) -> BTreeMap<StateCode, GeoPoint> {
    let mut index = BTreeMap::new();
    for feature in features {
        let Some(location) = feature.location else {
            continue;
        };
        if index.insert(feature.code.clone(), location).is_some() {
            log::warn!(
                "Duplicate geometry for state {} ({}); keeping the last one",
                feature.code,
                feature.raw_code
            );
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEO: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"STATE": "CA", "NAME": "California"},
         "geometry": {"type": "Point", "coordinates": [-119.4, 36.7]}}
    ]}"#;

    fn code(s: &str) -> StateCode {
        StateCode::normalize(s)
    }

    #[test]
    fn derives_categories_and_years() {
        let dataset = Dataset::from_bodies(
            r#"[
                {"state_abbr": "CA", "data_year": 2020, "Population": 1, "Unemployment_Rate": 4.0,
                 "Violent_rate": 1.0, "Burglary_rate": 2.0},
                {"state_abbr": "CA", "data_year": 2019, "Population": 1, "Unemployment_Rate": 4.0,
                 "Violent_rate": 1.0, "Burglary_rate": 2.0},
                {"state_abbr": "NY", "data_year": 2020, "Population": 1, "Unemployment_Rate": 4.0,
                 "Violent_rate": 1.0, "Burglary_rate": 2.0}
            ]"#,
            GEO,
            &CategorySchema::Inferred,
        )
        .unwrap();

        let categories: Vec<&str> = dataset.categories().iter().map(CategoryKey::as_str).collect();
        assert_eq!(categories, vec!["Violent_rate", "Burglary_rate"]);
        assert_eq!(dataset.years(), &[2019, 2020]);
        assert_eq!(dataset.records().len(), 3);
    }

    #[test]
    fn non_array_is_shape_error() {
        let result = Dataset::from_bodies(r#"{"state_abbr": "CA"}"#, GEO, &CategorySchema::Inferred);
        assert!(matches!(result, Err(LoadError::Shape { .. })));
    }

    #[test]
    fn empty_array_is_shape_error() {
        let result = Dataset::from_bodies("[]", GEO, &CategorySchema::Inferred);
        assert!(matches!(result, Err(LoadError::Shape { .. })));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let result = Dataset::from_bodies("[{", GEO, &CategorySchema::Inferred);
        assert!(matches!(
            result,
            Err(LoadError::Parse {
                dataset: DatasetKind::Stats,
                ..
            })
        ));

        let result = Dataset::from_bodies(
            r#"[{"state_abbr": "CA", "data_year": 2019}]"#,
            "<html>",
            &CategorySchema::Inferred,
        );
        assert!(matches!(
            result,
            Err(LoadError::Parse {
                dataset: DatasetKind::Geo,
                ..
            })
        ));
    }

    #[test]
    fn record_without_join_key_names_its_index() {
        let err = Dataset::from_bodies(
            r#"[{"state_abbr": "CA", "data_year": 2019}, {"data_year": 2019}]"#,
            GEO,
            &CategorySchema::Inferred,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Shape { .. }));
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn integral_float_years_load() {
        let dataset = Dataset::from_bodies(
            r#"[
                {"state_abbr": "CA", "data_year": 2019.0, "Violent_rate": 1.0},
                {"state_abbr": "NY", "data_year": 2019, "Violent_rate": 2.0},
                {"state_abbr": "TX", "data_year": 2020.0, "Violent_rate": 3.0}
            ]"#,
            GEO,
            &CategorySchema::Inferred,
        )
        .unwrap();

        assert_eq!(dataset.years(), &[2019, 2020]);
        assert_eq!(dataset.records()[0].data_year, 2019);
    }

    #[test]
    fn fractional_year_is_shape_error() {
        let err = Dataset::from_bodies(
            r#"[{"state_abbr": "CA", "data_year": 2019.5, "Violent_rate": 1.0}]"#,
            GEO,
            &CategorySchema::Inferred,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Shape { .. }));
        assert!(err.to_string().contains("record 0"));
    }

    #[test]
    fn declared_schema_is_validated() {
        let stats = r#"[{"state_abbr": "CA", "data_year": 2019,
                         "Violent_rate": 1.0, "Property_rate": 2.0}]"#;

        let dataset = Dataset::from_bodies(
            stats,
            GEO,
            &CategorySchema::Declared(vec!["Property_rate".to_string()]),
        )
        .unwrap();
        assert_eq!(dataset.categories().len(), 1);
        assert_eq!(dataset.categories()[0].as_str(), "Property_rate");

        let unknown = Dataset::from_bodies(
            stats,
            GEO,
            &CategorySchema::Declared(vec!["Arson_rate".to_string()]),
        );
        assert!(matches!(unknown, Err(LoadError::Schema { .. })));

        let unemployment = Dataset::from_bodies(
            stats,
            GEO,
            &CategorySchema::Declared(vec!["Unemployment_Rate".to_string()]),
        );
        assert!(matches!(unemployment, Err(LoadError::Schema { .. })));
    }

    #[test]
    fn schema_from_config() {
        assert_eq!(CategorySchema::from_config(None), CategorySchema::Inferred);
        let keys = vec!["Violent_rate".to_string()];
        assert_eq!(
            CategorySchema::from_config(Some(keys.as_slice())),
            CategorySchema::Declared(keys.clone())
        );
    }

    #[test]
    fn counts_records_with_different_rate_fields() {
        let records = parse_records(
            r#"[
                {"state_abbr": "CA", "data_year": 2019, "Violent_rate": 1.0},
                {"state_abbr": "NY", "data_year": 2019, "Violent_rate": 1.0},
                {"state_abbr": "TX", "data_year": 2019, "Property_rate": 1.0}
            ]"#,
        )
        .unwrap();
        assert_eq!(report_nonuniform_fields(&records), 1);
    }

    #[test]
    fn joins_fips_geometry_with_duplicates_last_wins() {
        let dataset = Dataset::from_bodies(
            r#"[{"state_abbr": "ca", "data_year": 2019, "Violent_rate": 1.0}]"#,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"STATE": "06", "NAME": "Old California"},
                 "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}},
                {"type": "Feature", "properties": {"STATE": "06", "NAME": "California"},
                 "geometry": {"type": "Point", "coordinates": [-119.4, 36.7]}},
                {"type": "Feature", "properties": {"STATE": "48", "NAME": "Texas"},
                 "geometry": null}
            ]}"#,
            &CategorySchema::Inferred,
        )
        .unwrap();

        assert_eq!(dataset.name_lookup().get(&code("CA")), Some("California"));
        assert_eq!(dataset.name_lookup().get(&code("TX")), Some("Texas"));
        assert_eq!(
            dataset.location(&code("ca")),
            Some(GeoPoint {
                longitude: -119.4,
                latitude: 36.7
            })
        );
        assert_eq!(dataset.location(&code("TX")), None);
        assert_eq!(dataset.features().len(), 3);
    }
}

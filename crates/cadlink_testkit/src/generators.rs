//! Property-based test generators using proptest.
//!
//! Coordinates are multiples of 1/8 so they survive a JSON round trip
//! exactly.

use crate::fixtures::model_space_with;
use cadlink_codec::Field;
use cadlink_protocol::{
    Arc, Circle, Database, Entity, LayerTableRecord, Line, Polyline, Vector3d,
};
use proptest::prelude::*;

/// Strategy for generating a coordinate.
pub fn coordinate_strategy() -> impl Strategy<Value = f64> {
    (-8000i32..8000).prop_map(|n| f64::from(n) / 8.0)
}

/// Strategy for generating a strictly positive length.
pub fn length_strategy() -> impl Strategy<Value = f64> {
    (1i32..800).prop_map(|n| f64::from(n) / 8.0)
}

/// Strategy for generating a point in the XY plane.
pub fn point_strategy() -> impl Strategy<Value = Vector3d> {
    (coordinate_strategy(), coordinate_strategy()).prop_map(|(x, y)| Vector3d::new(x, y, 0.0))
}

/// Strategy for generating valid symbol names.
pub fn symbol_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_-]{0,15}").expect("Invalid regex")
}

/// Strategy for generating layers that only reference default linetypes.
pub fn layer_strategy() -> impl Strategy<Value = LayerTableRecord> {
    (
        symbol_name_strategy(),
        prop::sample::select(vec!["ByLayer", "Continuous"]),
        any::<bool>(),
    )
        .prop_map(|(name, linetype, off)| {
            let mut layer = LayerTableRecord::named(name);
            layer.linetype = Field::Value(linetype.to_string());
            layer.is_off = Field::Value(off);
            layer
        })
}

/// Strategy for generating a curve entity on layer `0`.
pub fn entity_strategy() -> impl Strategy<Value = Entity> {
    prop_oneof![
        (point_strategy(), point_strategy()).prop_map(|(a, b)| Entity::from(Line::new(a, b))),
        (point_strategy(), length_strategy()).prop_map(|(c, r)| Entity::from(Circle::new(c, r))),
        (point_strategy(), length_strategy(), 0i32..8).prop_map(|(c, r, quarter)| {
            let start = f64::from(quarter) * std::f64::consts::FRAC_PI_4;
            Entity::from(Arc {
                center: Field::Value(c),
                radius: Field::Value(r),
                start_angle: Field::Value(start),
                end_angle: Field::Value(start + std::f64::consts::FRAC_PI_2),
                ..Arc::default()
            })
        }),
        prop::collection::vec((coordinate_strategy(), coordinate_strategy()), 2..6)
            .prop_map(|points| Entity::from(Polyline::through(&points))),
    ]
    .prop_map(|mut entity| {
        entity.props_mut().layer = Field::Value("0".to_string());
        entity
    })
}

/// Strategy for generating a snapshot with uniquely named layers and a
/// model space of curves.
pub fn database_strategy() -> impl Strategy<Value = Database> {
    (
        prop::collection::btree_map(symbol_name_strategy(), layer_strategy(), 0..6),
        prop::collection::vec(entity_strategy(), 0..12),
    )
        .prop_map(|(layers, entities)| {
            let mut db = model_space_with(entities);
            let mut seen = Vec::<String>::new();
            for (key, mut layer) in layers {
                if seen.iter().any(|s| s.eq_ignore_ascii_case(&key)) || key == "0" {
                    continue;
                }
                layer.symbol.name = Field::Value(key.clone());
                seen.push(key.clone());
                db.insert_layer(key, layer);
            }
            db
        })
}

/// Strategy for generating frame payloads, including multi-byte text.
pub fn payload_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        any::<String>(),
        prop::string::string_regex("[a-z:0-9 ]{0,64}").expect("Invalid regex"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn coordinates_are_exact(x in coordinate_strategy()) {
            let text = serde_json::to_string(&x).unwrap();
            let back: f64 = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(back, x);
        }

        #[test]
        fn generated_layer_names_are_unique(db in database_strategy()) {
            let names: Vec<String> = db.layers().map(|(k, _)| k.to_ascii_lowercase()).collect();
            let mut deduped = names.clone();
            deduped.sort();
            deduped.dedup();
            prop_assert_eq!(names.len(), deduped.len());
        }

        #[test]
        fn entities_stay_on_default_layer(entity in entity_strategy()) {
            prop_assert_eq!(entity.props().layer.value().map(String::as_str), Some("0"));
        }
    }
}

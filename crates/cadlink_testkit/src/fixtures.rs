//! Sample snapshots and socket helpers.
//!
//! Fixture snapshots only reference symbols that either exist in a fresh
//! drawing or are defined by the snapshot itself.

use cadlink_codec::{Envelope, Field};
use cadlink_protocol::{
    AlignedDimension, BlockReference, BlockTableRecord, Circle, Database, DbInsertQuery, DbText,
    Entity, Group, LayerTableRecord, Line, LinetypeSegment, LinetypeTableRecord,
    TextStyleTableRecord, Vector3d, MODEL_SPACE,
};
use std::io;
use std::net::{TcpListener, TcpStream};

/// Prior id carried by the sample line.
pub const SAMPLE_LINE_ID: i64 = 101;

/// Prior id carried by the sample circle.
pub const SAMPLE_CIRCLE_ID: i64 = 102;

/// A layer called `name` drawn with `linetype`.
pub fn layer_with_linetype(name: &str, linetype: &str) -> LayerTableRecord {
    let mut layer = LayerTableRecord::named(name);
    layer.linetype = Field::Value(linetype.to_string());
    layer
}

/// A line on `layer` from `start` to `end`.
pub fn line_on(layer: &str, start: Vector3d, end: Vector3d) -> Entity {
    let mut line = Line::new(start, end);
    line.entity.layer = Field::Value(layer.to_string());
    line.into()
}

/// A snapshot whose model space holds `entities`.
pub fn model_space_with(entities: impl IntoIterator<Item = Entity>) -> Database {
    let mut block = BlockTableRecord::named(MODEL_SPACE);
    for entity in entities {
        block.push(entity);
    }
    let mut db = Database::new();
    db.insert_block(MODEL_SPACE, block);
    db
}

/// A small but complete drawing.
///
/// - linetype `dashed`, text style `notes`
/// - layers `walls` (dashed) and `doors` (Continuous)
/// - block `door` holding one line
/// - model space: a line and a circle on `walls` carrying prior ids, a text
///   in `notes`, a reference to `door` and an aligned dimension
/// - group `outline` listing the line and circle
pub fn sample_database() -> Database {
    let mut db = Database::new();

    let mut dashed = LinetypeTableRecord::named("dashed");
    dashed.comments = Field::Value("__ __ __".to_string());
    dashed.pattern_length = Field::Value(0.75);
    dashed.segments = Field::Value(vec![
        Envelope(LinetypeSegment {
            dash_length: Field::Value(0.5),
            ..LinetypeSegment::default()
        }),
        Envelope(LinetypeSegment {
            dash_length: Field::Value(-0.25),
            ..LinetypeSegment::default()
        }),
    ]);
    db.insert_linetype("dashed", dashed);

    let mut notes = TextStyleTableRecord::named("notes");
    notes.text_size = Field::Value(2.5);
    db.insert_text_style("notes", notes);

    db.insert_layer("walls", layer_with_linetype("walls", "dashed"));
    db.insert_layer("doors", layer_with_linetype("doors", "Continuous"));

    let mut door = BlockTableRecord::named("door");
    door.push(Line::new(Vector3d::ZERO, Vector3d::new(0.9, 0.0, 0.0)));
    db.insert_block("door", door);

    let mut line = Line::new(Vector3d::ZERO, Vector3d::new(10.0, 0.0, 0.0));
    line.entity.id = Field::Value(SAMPLE_LINE_ID);
    line.entity.layer = Field::Value("walls".to_string());

    let mut circle = Circle::new(Vector3d::new(5.0, 5.0, 0.0), 2.0);
    circle.entity.id = Field::Value(SAMPLE_CIRCLE_ID);
    circle.entity.layer = Field::Value("walls".to_string());

    let mut text = DbText::default();
    text.position = Field::Value(Vector3d::new(1.0, 8.0, 0.0));
    text.text_string = Field::Value("LOBBY".to_string());
    text.height = Field::Value(1.0);
    text.text_style_name = Field::Value("notes".to_string());

    let mut reference = BlockReference::new("door", Vector3d::new(10.0, 0.0, 0.0));
    reference.entity.layer = Field::Value("doors".to_string());

    let dimension = AlignedDimension::new(
        Vector3d::ZERO,
        Vector3d::new(10.0, 0.0, 0.0),
        Vector3d::new(5.0, -2.0, 0.0),
    );

    let mut model_space = BlockTableRecord::named(MODEL_SPACE);
    model_space.push(line);
    model_space.push(circle);
    model_space.push(text);
    model_space.push(reference);
    model_space.push(dimension);
    db.insert_block(MODEL_SPACE, model_space);

    db.insert_group(
        "outline",
        Group::with_members("outline", vec![SAMPLE_LINE_ID, SAMPLE_CIRCLE_ID]),
    );
    db
}

/// An insert of `db` with every option left unset.
pub fn insert_query(db: Database) -> DbInsertQuery {
    DbInsertQuery::new(db)
}

/// A connected TCP pair on the loopback interface.
///
/// Returns `(listener side, connecting side)`.
pub fn loopback_pair() -> io::Result<(TcpStream, TcpStream)> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let client = TcpStream::connect(listener.local_addr()?)?;
    let (server, _) = listener.accept()?;
    Ok((server, client))
}

/// A listener on an ephemeral loopback port.
pub fn loopback_listener() -> io::Result<TcpListener> {
    TcpListener::bind("127.0.0.1:0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn sample_references_are_self_contained() {
        let db = sample_database();
        assert_eq!(db.layers().count(), 2);
        assert_eq!(db.model_space().unwrap().entity_list().len(), 5);
        let (_, group) = db.groups().next().unwrap();
        assert!(group.contains(SAMPLE_LINE_ID));
        assert!(!group.contains(7));
    }

    #[test]
    fn loopback_pair_is_connected() {
        let (mut server, mut client) = loopback_pair().unwrap();
        client.write_all(b"4:ping").unwrap();
        let mut buf = [0u8; 6];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"4:ping");
    }
}

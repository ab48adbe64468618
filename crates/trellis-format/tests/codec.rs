//! Integration tests for the public codec API.

use trellis_core::{
    diagram::Diagram,
    entity::{Entity, EntityShape},
    geometry::{Dimension, Point},
    relation::{ArrowStyle, Relation, RoutingAlgorithm},
};
use trellis_format::{FormatErrorKind, decode, decode_bytes, encode};

/// Entity A at (5,10) 30x40 ellipse, entity B at (15,20) 130x140, and a
/// direct relation A -> B through (71,72) and (73,74).
fn scenario() -> Diagram {
    let mut d = Diagram::new();
    let a = d.add_entity(
        Entity::new(Point::new(5, 10), Dimension::new(30, 40)).with_shape(EntityShape::Ellipse),
    );
    let b = d.add_entity(Entity::new(Point::new(15, 20), Dimension::new(130, 140)));
    let mut rel = Relation::between_entities(a, b);
    rel.control_pts = vec![Point::new(71, 72), Point::new(73, 74)];
    rel.routing = RoutingAlgorithm::Direct;
    d.add_relation(rel).unwrap();
    d
}

const SCENARIO_JSON: &str = r#"{
  "drawFileName": true,
  "entities": [
    {
      "attributes": "",
      "loc": {
        "x": 5,
        "y": 10
      },
      "name": "",
      "shape": "ES_ELLIPSE",
      "size": {
        "h": 40,
        "w": 30
      }
    },
    {
      "attributes": "",
      "loc": {
        "x": 15,
        "y": 20
      },
      "name": "",
      "shape": "ES_RECTANGLE",
      "size": {
        "h": 140,
        "w": 130
      }
    }
  ],
  "inheritances": [],
  "relations": [
    {
      "controlPts": [
        {
          "x": 71,
          "y": 72
        },
        {
          "x": 73,
          "y": 74
        }
      ],
      "end": {
        "entityRef": 1
      },
      "label": "",
      "routingAlg": "RA_DIRECT",
      "start": {
        "entityRef": 0
      }
    }
  ],
  "type": "Diagram Editor Diagram",
  "version": 12,
  "windowSize": {
    "h": 500,
    "w": 700
  }
}
"#;

#[test]
fn test_scenario_encoding_is_stable() {
    assert_eq!(encode(&scenario()), SCENARIO_JSON);
}

#[test]
fn test_scenario_round_trip() {
    let d = scenario();
    let text = encode(&d);
    let decoded = decode(&text).expect("scenario should decode");
    assert_eq!(decoded, d);
    assert_eq!(encode(&decoded), text);
}

#[test]
fn test_version_5_document() {
    let text = r#"{
        "type": "Diagram Editor Diagram",
        "version": 5,
        "windowSize": {"w": 800, "h": 600},
        "drawFileName": false,
        "backgroundColor": "Red",
        "entities": [
            {"loc": {"x": 0, "y": 0}, "size": {"w": 60, "h": 60},
             "shape": "ES_POLYGON", "name": "hex", "attributes": "",
             "fillColor": "Blue"},
            {"loc": {"x": 100, "y": 0}, "size": {"w": 60, "h": 60},
             "shape": "ES_CUBOID", "name": "box", "attributes": "",
             "shapeParams": [4, 8]}
        ],
        "inheritances": [
            {"parentRef": 0, "open": false, "pt": {"x": 30, "y": 90}}
        ],
        "relations": [
            {"start": {"entityRef": 1, "arrowStyle": "AS_DOUBLE_ANGLE"},
             "end": {"inheritanceRef": 0},
             "controlPts": [], "routingAlg": "RA_MANHATTAN_VERT",
             "label": "kind of", "lineWidth": 4, "owning": true}
        ]
    }"#;

    let d = decode(text).unwrap();
    assert!(!d.draw_file_name());
    // backgroundColor arrived in version 8.
    assert_eq!(d.background_color(), "White");

    let (_, hex) = d.entity_at(0).unwrap();
    assert_eq!(hex.shape, EntityShape::Polygon);
    assert_eq!(hex.fill_color, "Blue");
    assert_eq!(hex.shape_params, vec![6, 0]);

    let (_, cuboid) = d.entity_at(1).unwrap();
    assert_eq!(cuboid.shape_params, vec![4, 8]);

    let (_, rel) = d.relations().next().unwrap();
    // arrowStyle and lineWidth postdate version 5; owning still applies.
    assert_eq!(rel.start.arrow_style, ArrowStyle::None);
    assert_eq!(rel.end.arrow_style, ArrowStyle::DoubleAngle);
    assert_eq!(rel.line_width, None);
    assert_eq!(rel.label, "kind of");

    // Re-encoding upgrades the document to the current version.
    let upgraded = encode(&d);
    assert!(upgraded.contains("\"version\": 12"));
    assert_eq!(decode(&upgraded).unwrap(), d);
}

#[test]
fn test_decode_bytes_reads_legacy() {
    let mut bytes = Vec::new();
    for value in [0x2B04_4C63_i32, 3, 700, 500, 1, 5, 6, 10, 10, 1] {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    // name "X" plus terminator, then zero attribute lines
    bytes.extend_from_slice(b"X\0");
    for value in [0, 0x64E2_C40F, 0, 0x3782_64D9_i32] {
        bytes.extend_from_slice(&value.to_le_bytes());
    }

    let d = decode_bytes(&bytes).expect("legacy stream should decode");
    assert_eq!(d.entity_count(), 1);
    let (_, e) = d.entity_at(0).unwrap();
    assert_eq!(e.name, "X");
    assert_eq!(e.loc, Point::new(5, 6));
    assert!(!d.draw_file_name());

    // Re-encoding in JSON keeps everything, including the legacy flag.
    let reencoded = decode(&encode(&d)).unwrap();
    assert_eq!(reencoded, d);
}

#[test]
fn test_errors_carry_kind() {
    let err = decode_bytes(b"{\"type\": \"Diagram Editor Diagram\", \"version\": 99}").unwrap_err();
    assert_eq!(err.kind(), FormatErrorKind::UnsupportedVersion);
    assert_eq!(err.kind().code(), "unsupported_version");
}

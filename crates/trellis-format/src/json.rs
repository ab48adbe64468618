//! The current, JSON-based document format.
//!
//! Documents are a single JSON object tagged with a fixed `type` literal and
//! an integer `version`. Each version only ever adds fields, so a decoder
//! for version N reads every older document by filling in the documented
//! default for each field the document predates.
//!
//! | field            | since | default when absent          |
//! |------------------|-------|------------------------------|
//! | `windowSize`     | 1     | required                     |
//! | `entities`       | 1     | required                     |
//! | `inheritances`   | 2     | empty                        |
//! | `relations`      | 2     | empty                        |
//! | `drawFileName`   | 3     | `true`                       |
//! | `backgroundColor`| 8     | `"White"`                    |
//! | `namedColors`    | 8     | built-in palette             |
//!
//! Entity and relation fields follow the same scheme; see the decode
//! functions below.
//!
//! Encoding always writes [`CURRENT_VERSION`] and omits optional fields
//! whose value equals the default, so decoding and re-encoding a document
//! reproduces it byte for byte.

use std::collections::HashMap;

use log::debug;
use serde_json::{Map, Value, json};
use trellis_core::{
    color::{DEFAULT_BACKGROUND_COLOR, DEFAULT_FILL_COLOR, DEFAULT_LINE_COLOR, NamedColors},
    diagram::Diagram,
    entity::{Entity, HTextAlign, ShapeFlags, VTextAlign},
    geometry::{Dimension, Point},
    identifier::{EntityId, InheritanceId},
    inheritance::Inheritance,
    relation::{
        ArrowStyle, EndpointRole, EndpointTarget, Relation, RelationEndpoint,
        is_valid_dash_pattern,
    },
};

use crate::{
    color_literal::parse_color_literal,
    error::{FormatError, FormatErrorKind, Result},
    names,
};

/// Version written by [`encode`] and the highest version [`decode`] accepts.
pub const CURRENT_VERSION: u32 = 12;

/// Value of the top-level `type` field.
pub const TYPE_TAG: &str = "Diagram Editor Diagram";

// Versions that introduced each optional field.
const V_RELATIONS: u32 = 2;
const V_DRAW_FILE_NAME: u32 = 3;
const V_FILL_COLOR: u32 = 4;
const V_SHAPE_PARAMS: u32 = 5;
const V_ARROW_STYLE: u32 = 6;
const V_LINE_WIDTH: u32 = 7;
const V_COLOR_TABLE: u32 = 8;
const V_ELEMENT_COLORS: u32 = 9;
const V_DASH_STRUCTURE: u32 = 10;
const V_TEXT_ALIGN: u32 = 11;
const V_SHAPE_FLAGS: u32 = 12;

// ----------------------------------------------------------------------
// Encoding
// ----------------------------------------------------------------------

/// Encodes `diagram` in the current format.
///
/// The output is pretty-printed with sorted keys and ends with a newline.
pub fn encode(diagram: &Diagram) -> String {
    let value = Encoder::new(diagram).diagram();
    let mut text =
        serde_json::to_string_pretty(&value).expect("a JSON value tree always serializes");
    text.push('\n');
    text
}

struct Encoder<'a> {
    diagram: &'a Diagram,
    entity_refs: HashMap<EntityId, usize>,
    inheritance_refs: HashMap<InheritanceId, usize>,
}

impl<'a> Encoder<'a> {
    /// Builds the key -> position tables before anything is written.
    fn new(diagram: &'a Diagram) -> Self {
        let entity_refs = diagram
            .entity_ids()
            .enumerate()
            .map(|(pos, id)| (id, pos))
            .collect();
        let inheritance_refs = diagram
            .inheritance_ids()
            .enumerate()
            .map(|(pos, id)| (id, pos))
            .collect();
        Self {
            diagram,
            entity_refs,
            inheritance_refs,
        }
    }

    fn diagram(&self) -> Value {
        let d = self.diagram;
        let mut obj = Map::new();
        obj.insert("type".into(), json!(TYPE_TAG));
        obj.insert("version".into(), json!(CURRENT_VERSION));
        obj.insert("windowSize".into(), dimension(d.window_size()));
        obj.insert("drawFileName".into(), json!(d.draw_file_name()));
        if d.background_color() != DEFAULT_BACKGROUND_COLOR {
            obj.insert("backgroundColor".into(), json!(d.background_color()));
        }
        if !d.named_colors().is_default() {
            let colors: Vec<Value> = d
                .named_colors()
                .iter()
                .map(|(name, rgb)| json!({ "name": name, "color": rgb.to_string() }))
                .collect();
            obj.insert("namedColors".into(), Value::Array(colors));
        }

        let entities: Vec<Value> = d.entities().map(|(_, e)| entity(e)).collect();
        obj.insert("entities".into(), Value::Array(entities));

        let inheritances: Vec<Value> = d
            .inheritances()
            .map(|(_, inh)| self.inheritance(inh))
            .collect();
        obj.insert("inheritances".into(), Value::Array(inheritances));

        let relations: Vec<Value> = d.relations().map(|(_, rel)| self.relation(rel)).collect();
        obj.insert("relations".into(), Value::Array(relations));

        Value::Object(obj)
    }

    fn entity_ref(&self, id: EntityId) -> usize {
        *self
            .entity_refs
            .get(&id)
            .expect("diagram references are live")
    }

    fn inheritance_ref(&self, id: InheritanceId) -> usize {
        *self
            .inheritance_refs
            .get(&id)
            .expect("diagram references are live")
    }

    fn inheritance(&self, inh: &Inheritance) -> Value {
        json!({
            "parentRef": self.entity_ref(inh.parent),
            "open": inh.open,
            "pt": point(inh.pt),
        })
    }

    fn relation(&self, rel: &Relation) -> Value {
        let mut obj = Map::new();
        obj.insert("start".into(), self.endpoint(&rel.start, EndpointRole::Start));
        obj.insert("end".into(), self.endpoint(&rel.end, EndpointRole::End));
        obj.insert(
            "controlPts".into(),
            Value::Array(rel.control_pts.iter().copied().map(point).collect()),
        );
        obj.insert(
            "routingAlg".into(),
            json!(names::routing_name(rel.routing)),
        );
        obj.insert("label".into(), json!(rel.label));
        if let Some(width) = rel.line_width {
            obj.insert("lineWidth".into(), json!(width));
        }
        if rel.line_color != DEFAULT_LINE_COLOR {
            obj.insert("lineColor".into(), json!(rel.line_color));
        }
        if rel.text_color != DEFAULT_LINE_COLOR {
            obj.insert("textColor".into(), json!(rel.text_color));
        }
        if !rel.dash_structure.is_empty() {
            obj.insert("dashStructure".into(), json!(rel.dash_structure));
        }
        Value::Object(obj)
    }

    fn endpoint(&self, endpoint: &RelationEndpoint, role: EndpointRole) -> Value {
        let mut obj = Map::new();
        match endpoint.target {
            EndpointTarget::Entity(id) => {
                obj.insert("entityRef".into(), json!(self.entity_ref(id)));
            }
            EndpointTarget::Inheritance(id) => {
                obj.insert("inheritanceRef".into(), json!(self.inheritance_ref(id)));
            }
            EndpointTarget::Point(pt) => {
                obj.insert("pt".into(), point(pt));
            }
        }
        if endpoint.arrow_style != role.default_arrow_style() {
            obj.insert(
                "arrowStyle".into(),
                json!(names::arrow_name(endpoint.arrow_style)),
            );
        }
        Value::Object(obj)
    }
}

fn point(pt: Point) -> Value {
    json!({ "x": pt.x(), "y": pt.y() })
}

fn dimension(dim: Dimension) -> Value {
    json!({ "w": dim.width(), "h": dim.height() })
}

fn entity(e: &Entity) -> Value {
    let mut obj = Map::new();
    obj.insert("loc".into(), point(e.loc));
    obj.insert("size".into(), dimension(e.size));
    obj.insert("shape".into(), json!(names::shape_name(e.shape)));
    obj.insert("name".into(), json!(e.name));
    obj.insert("attributes".into(), json!(e.attributes));
    if e.fill_color != DEFAULT_FILL_COLOR {
        obj.insert("fillColor".into(), json!(e.fill_color));
    }
    if !e.has_default_params() {
        obj.insert("shapeParams".into(), json!(e.shape_params));
    }
    if !e.has_default_flags() {
        let flags: Vec<_> = e.shape_flags.iter().map(names::shape_flag_name).collect();
        obj.insert("shapeFlags".into(), json!(flags));
    }
    if e.line_color != DEFAULT_LINE_COLOR {
        obj.insert("lineColor".into(), json!(e.line_color));
    }
    if e.text_color != DEFAULT_LINE_COLOR {
        obj.insert("textColor".into(), json!(e.text_color));
    }
    if e.h_text_align != HTextAlign::default() {
        obj.insert(
            "hTextAlign".into(),
            json!(names::h_align_name(e.h_text_align)),
        );
    }
    if e.v_text_align != VTextAlign::default() {
        obj.insert(
            "vTextAlign".into(),
            json!(names::v_align_name(e.v_text_align)),
        );
    }
    Value::Object(obj)
}

// ----------------------------------------------------------------------
// Decoding
// ----------------------------------------------------------------------

/// Decodes a document in the current format, or any older JSON version.
///
/// # Errors
///
/// Fails on invalid JSON, a foreign `type`, an unsupported `version`,
/// missing or mistyped fields, unknown enum names, out-of-range integers,
/// unresolved references, malformed colors or dash patterns, and duplicate
/// color names.
pub fn decode(text: &str) -> Result<Diagram> {
    let value: Value = serde_json::from_str(text)?;
    let root = value
        .as_object()
        .ok_or_else(|| FormatError::malformed("document is not a JSON object"))?;

    match root.get("type").and_then(Value::as_str) {
        Some(TYPE_TAG) => {}
        Some(other) => {
            return Err(FormatError::new(
                FormatErrorKind::WrongType,
                format!("unrecognized document type \"{other}\""),
            ));
        }
        None => {
            return Err(FormatError::new(
                FormatErrorKind::WrongType,
                "missing document type",
            ));
        }
    }

    let version = root
        .get("version")
        .and_then(Value::as_i64)
        .ok_or_else(|| FormatError::malformed("missing or non-integer \"version\""))?;
    let version = u32::try_from(version)
        .ok()
        .filter(|v| (1..=CURRENT_VERSION).contains(v))
        .ok_or_else(|| {
            FormatError::new(
                FormatErrorKind::UnsupportedVersion,
                format!("version {version} is not in the supported range 1..={CURRENT_VERSION}"),
            )
        })?;

    let diagram = Decoder::new(version).diagram(Fields::new(root, "document", version))?;

    debug!(
        version = version,
        entities = diagram.entity_count(),
        inheritances = diagram.inheritance_count(),
        relations = diagram.relation_count();
        "Decoded JSON diagram"
    );
    Ok(diagram)
}

/// Typed access to the fields of one JSON object.
#[derive(Clone, Copy)]
struct Fields<'v> {
    obj: &'v Map<String, Value>,
    what: &'static str,
    version: u32,
}

impl<'v> Fields<'v> {
    fn new(obj: &'v Map<String, Value>, what: &'static str, version: u32) -> Self {
        Self { obj, what, version }
    }

    fn of(value: &'v Value, what: &'static str, version: u32) -> Result<Self> {
        value
            .as_object()
            .map(|obj| Self::new(obj, what, version))
            .ok_or_else(|| FormatError::malformed(format!("{what} is not a JSON object")))
    }

    fn has(&self, key: &str) -> bool {
        self.obj.contains_key(key)
    }

    fn required(&self, key: &str) -> Result<&'v Value> {
        self.obj
            .get(key)
            .ok_or_else(|| FormatError::malformed(format!("{} is missing \"{key}\"", self.what)))
    }

    /// A field introduced in version `since`; `None` when absent or when the
    /// document predates it.
    fn since(&self, key: &str, since: u32) -> Option<&'v Value> {
        if self.version < since {
            None
        } else {
            self.obj.get(key)
        }
    }

    fn mistyped(&self, key: &str, expected: &str) -> FormatError {
        FormatError::malformed(format!("{} field \"{key}\" must be {expected}", self.what))
    }

    fn int_value<T: TryFrom<i64>>(&self, key: &str, value: &Value) -> Result<T> {
        let raw = value
            .as_i64()
            .ok_or_else(|| self.mistyped(key, "an integer"))?;
        T::try_from(raw).map_err(|_| {
            FormatError::malformed(format!(
                "{} field \"{key}\" value {raw} is out of range",
                self.what
            ))
        })
    }

    fn int<T: TryFrom<i64>>(&self, key: &str) -> Result<T> {
        self.int_value(key, self.required(key)?)
    }

    fn bool_value(&self, key: &str, value: &Value) -> Result<bool> {
        value.as_bool().ok_or_else(|| self.mistyped(key, "a boolean"))
    }

    fn bool(&self, key: &str) -> Result<bool> {
        self.bool_value(key, self.required(key)?)
    }

    fn str_value(&self, key: &str, value: &'v Value) -> Result<&'v str> {
        value.as_str().ok_or_else(|| self.mistyped(key, "a string"))
    }

    fn str(&self, key: &str) -> Result<&'v str> {
        self.str_value(key, self.required(key)?)
    }

    /// A string field introduced in `since`, with its default.
    fn string_since(&self, key: &str, since: u32, default: &str) -> Result<String> {
        match self.since(key, since) {
            Some(value) => Ok(self.str_value(key, value)?.to_string()),
            None => Ok(default.to_string()),
        }
    }

    fn array_value(&self, key: &str, value: &'v Value) -> Result<&'v [Value]> {
        value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.mistyped(key, "an array"))
    }

    fn array(&self, key: &str) -> Result<&'v [Value]> {
        self.array_value(key, self.required(key)?)
    }

    fn int_list<T: TryFrom<i64>>(&self, key: &str, value: &'v Value) -> Result<Vec<T>> {
        self.array_value(key, value)?
            .iter()
            .map(|item| self.int_value(key, item))
            .collect()
    }

    fn point_value(&self, value: &'v Value) -> Result<Point> {
        let f = Fields::of(value, "point", self.version)?;
        Ok(Point::new(f.int("x")?, f.int("y")?))
    }

    fn point(&self, key: &str) -> Result<Point> {
        self.point_value(self.required(key)?)
    }

    fn dimension(&self, key: &str) -> Result<Dimension> {
        let f = Fields::of(self.required(key)?, "dimension", self.version)?;
        Ok(Dimension::new(f.int("w")?, f.int("h")?))
    }
}

/// Decoding state: position -> key tables, filled before anything that
/// references them is read.
struct Decoder {
    version: u32,
    entity_keys: Vec<EntityId>,
    inheritance_keys: Vec<InheritanceId>,
}

impl Decoder {
    fn new(version: u32) -> Self {
        Self {
            version,
            entity_keys: Vec::new(),
            inheritance_keys: Vec::new(),
        }
    }

    fn diagram(mut self, root: Fields<'_>) -> Result<Diagram> {
        let mut diagram = Diagram::new();
        diagram.set_window_size(root.dimension("windowSize")?);

        if let Some(value) = root.since("drawFileName", V_DRAW_FILE_NAME) {
            diagram.set_draw_file_name(root.bool_value("drawFileName", value)?);
        }
        diagram.set_background_color(root.string_since(
            "backgroundColor",
            V_COLOR_TABLE,
            DEFAULT_BACKGROUND_COLOR,
        )?);
        if let Some(value) = root.since("namedColors", V_COLOR_TABLE) {
            diagram.set_named_colors(self.named_colors(root.array_value("namedColors", value)?)?);
        }

        for value in root.array("entities")? {
            let entity = self.entity(Fields::of(value, "entity", self.version)?)?;
            self.entity_keys.push(diagram.add_entity(entity));
        }

        if self.version >= V_RELATIONS {
            for value in root.array("inheritances")? {
                let inh = self.inheritance(Fields::of(value, "inheritance", self.version)?)?;
                let id = diagram
                    .add_inheritance(inh)
                    .expect("parent resolved from the entity table");
                self.inheritance_keys.push(id);
            }

            for value in root.array("relations")? {
                let relation = self.relation(Fields::of(value, "relation", self.version)?)?;
                diagram
                    .add_relation(relation)
                    .expect("endpoints resolved and dash pattern checked");
            }
        }

        Ok(diagram)
    }

    fn named_colors(&self, entries: &[Value]) -> Result<NamedColors> {
        let mut colors = NamedColors::empty();
        for value in entries {
            let f = Fields::of(value, "named color", self.version)?;
            let name = f.str("name")?;
            let rgb = parse_color_literal(f.str("color")?)?;
            if colors.insert(name, rgb).is_some() {
                return Err(FormatError::new(
                    FormatErrorKind::DuplicateColor,
                    format!("color \"{name}\" is defined more than once"),
                ));
            }
        }
        Ok(colors)
    }

    fn entity(&self, f: Fields<'_>) -> Result<Entity> {
        let shape = names::parse_shape(f.str("shape")?, self.version)?;

        let shape_params = match f.since("shapeParams", V_SHAPE_PARAMS) {
            Some(value) => f.int_list("shapeParams", value)?,
            None => shape.default_params().to_vec(),
        };
        let shape_flags = match f.since("shapeFlags", V_SHAPE_FLAGS) {
            Some(value) => f
                .array_value("shapeFlags", value)?
                .iter()
                .map(|item| names::parse_shape_flag(f.str_value("shapeFlags", item)?))
                .collect::<Result<ShapeFlags>>()?,
            None => ShapeFlags::defaults_for(shape),
        };
        let h_text_align = match f.since("hTextAlign", V_TEXT_ALIGN) {
            Some(value) => names::parse_h_align(f.str_value("hTextAlign", value)?)?,
            None => HTextAlign::default(),
        };
        let v_text_align = match f.since("vTextAlign", V_TEXT_ALIGN) {
            Some(value) => names::parse_v_align(f.str_value("vTextAlign", value)?)?,
            None => VTextAlign::default(),
        };

        Ok(Entity {
            loc: f.point("loc")?,
            size: f.dimension("size")?,
            shape,
            fill_color: f.string_since("fillColor", V_FILL_COLOR, DEFAULT_FILL_COLOR)?,
            line_color: f.string_since("lineColor", V_ELEMENT_COLORS, DEFAULT_LINE_COLOR)?,
            text_color: f.string_since("textColor", V_ELEMENT_COLORS, DEFAULT_LINE_COLOR)?,
            name: f.str("name")?.to_string(),
            attributes: f.str("attributes")?.to_string(),
            h_text_align,
            v_text_align,
            shape_params,
            shape_flags,
        })
    }

    fn entity_key(&self, index: usize) -> Result<EntityId> {
        self.entity_keys.get(index).copied().ok_or_else(|| {
            FormatError::unresolved(format!(
                "entity reference {index} is out of range (have {})",
                self.entity_keys.len()
            ))
        })
    }

    fn inheritance_key(&self, index: usize) -> Result<InheritanceId> {
        self.inheritance_keys.get(index).copied().ok_or_else(|| {
            FormatError::unresolved(format!(
                "inheritance reference {index} is out of range (have {})",
                self.inheritance_keys.len()
            ))
        })
    }

    fn inheritance(&self, f: Fields<'_>) -> Result<Inheritance> {
        Ok(Inheritance::new(
            self.entity_key(f.int("parentRef")?)?,
            f.bool("open")?,
            f.point("pt")?,
        ))
    }

    fn relation(&self, f: Fields<'_>) -> Result<Relation> {
        let start = self.endpoint(
            Fields::of(f.required("start")?, "relation endpoint", self.version)?,
            EndpointRole::Start,
        )?;
        let mut end = self.endpoint(
            Fields::of(f.required("end")?, "relation endpoint", self.version)?,
            EndpointRole::End,
        )?;

        // Before per-endpoint arrow styles, "owning" picked the end arrow.
        if self.version < V_ARROW_STYLE {
            if let Some(value) = f.obj.get("owning") {
                if f.bool_value("owning", value)? {
                    end.arrow_style = ArrowStyle::DoubleAngle;
                }
            }
        }

        let control_pts = f
            .array("controlPts")?
            .iter()
            .map(|value| f.point_value(value))
            .collect::<Result<Vec<_>>>()?;

        let line_width = match f.since("lineWidth", V_LINE_WIDTH) {
            Some(value) => Some(f.int_value("lineWidth", value)?),
            None => None,
        };

        let dash_structure: Vec<u32> = match f.since("dashStructure", V_DASH_STRUCTURE) {
            Some(value) => f.int_list("dashStructure", value)?,
            None => Vec::new(),
        };
        if !is_valid_dash_pattern(&dash_structure) {
            return Err(FormatError::malformed(format!(
                "dash pattern {dash_structure:?} has no positive length"
            )));
        }

        Ok(Relation {
            start,
            end,
            control_pts,
            routing: names::parse_routing(f.str("routingAlg")?)?,
            label: f.str("label")?.to_string(),
            line_width,
            line_color: f.string_since("lineColor", V_ELEMENT_COLORS, DEFAULT_LINE_COLOR)?,
            text_color: f.string_since("textColor", V_ELEMENT_COLORS, DEFAULT_LINE_COLOR)?,
            dash_structure,
        })
    }

    fn endpoint(&self, f: Fields<'_>, role: EndpointRole) -> Result<RelationEndpoint> {
        let present = ["entityRef", "inheritanceRef", "pt"]
            .iter()
            .filter(|key| f.has(key))
            .count();
        if present != 1 {
            return Err(FormatError::malformed(format!(
                "relation endpoint must have exactly one of \"entityRef\", \"inheritanceRef\" \
                 or \"pt\", found {present}"
            )));
        }

        let target = if f.has("entityRef") {
            EndpointTarget::Entity(self.entity_key(f.int("entityRef")?)?)
        } else if f.has("inheritanceRef") {
            EndpointTarget::Inheritance(self.inheritance_key(f.int("inheritanceRef")?)?)
        } else {
            EndpointTarget::Point(f.point("pt")?)
        };

        let arrow_style = match f.since("arrowStyle", V_ARROW_STYLE) {
            Some(value) => names::parse_arrow(f.str_value("arrowStyle", value)?)?,
            None => role.default_arrow_style(),
        };

        Ok(RelationEndpoint::new(target, arrow_style))
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::{
        color::Rgb,
        entity::{EntityShape, ShapeFlag},
        relation::{DashStyle, RoutingAlgorithm},
    };

    use super::*;

    /// Two entities and a direct relation with two control points.
    fn two_entity_diagram() -> Diagram {
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

    fn rich_diagram() -> Diagram {
        let mut d = two_entity_diagram();
        d.set_window_size(Dimension::new(1024, 768));
        d.set_draw_file_name(false);
        d.set_background_color("Mint");
        d.named_colors_mut().insert("Mint", Rgb::new(170, 255, 200));

        let (a, _) = d.entity_at(0).unwrap();
        let c = d.add_entity(
            Entity::new(Point::new(300, 300), Dimension::new(80, 60))
                .with_name("Cylinder \u{2713}")
                .with_attributes("id: u64\nname: String")
                .with_shape(EntityShape::Cylinder),
        );
        {
            let entity = d.entity_mut(c).unwrap();
            entity.shape_params = vec![14];
            entity.fill_color = "Mint".to_string();
            entity.h_text_align = HTextAlign::Left;
            entity.v_text_align = VTextAlign::Bottom;
        }
        let inh = d
            .add_inheritance(Inheritance::new(a, true, Point::new(20, 100)))
            .unwrap();

        let mut rel = Relation::new(
            RelationEndpoint::entity(c, EndpointRole::Start),
            RelationEndpoint::inheritance(inh, EndpointRole::End),
        );
        rel.label = "is a".to_string();
        rel.line_width = Some(3);
        rel.line_color = "Red".to_string();
        rel.set_dash_style(DashStyle::DashDot);
        d.add_relation(rel).unwrap();

        let mut free = Relation::new(
            RelationEndpoint::point(Point::new(-4, 9), EndpointRole::Start),
            RelationEndpoint::entity(c, EndpointRole::End),
        );
        free.start.arrow_style = ArrowStyle::FilledTriangle;
        free.end.arrow_style = ArrowStyle::None;
        free.routing = RoutingAlgorithm::ManhattanVert;
        d.add_relation(free).unwrap();
        d
    }

    #[test]
    fn test_two_entity_round_trip() {
        let d = two_entity_diagram();
        let text = encode(&d);
        let decoded = decode(&text).unwrap();
        assert_eq!(decoded, d);
        assert_eq!(encode(&decoded), text);
    }

    #[test]
    fn test_rich_round_trip() {
        let d = rich_diagram();
        let text = encode(&d);
        let decoded = decode(&text).unwrap();
        assert_eq!(decoded, d);
        assert_eq!(encode(&decoded), text);
    }

    #[test]
    fn test_encoding_elides_defaults() {
        let text = encode(&two_entity_diagram());
        assert!(text.ends_with("}\n"));
        for absent in [
            "backgroundColor",
            "namedColors",
            "fillColor",
            "shapeParams",
            "arrowStyle",
            "lineWidth",
            "dashStructure",
            "hTextAlign",
            "shapeFlags",
            "owning",
        ] {
            assert!(!text.contains(absent), "{absent} should be elided");
        }
        assert!(text.contains("\"version\": 12"));
        assert!(text.contains("\"routingAlg\": \"RA_DIRECT\""));
    }

    #[test]
    fn test_encoding_keys_are_sorted() {
        let text = encode(&two_entity_diagram());
        let top_keys: Vec<usize> = [
            "\"drawFileName\"",
            "\"entities\"",
            "\"inheritances\"",
            "\"relations\"",
            "\"type\"",
            "\"version\"",
            "\"windowSize\"",
        ]
        .iter()
        .map(|key| text.rfind(key).unwrap())
        .collect();
        assert!(top_keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_arrow_style_elision_is_role_sensitive() {
        let mut d = two_entity_diagram();
        let id = d.relation_ids().next().unwrap();
        // FilledTriangle is the end default but not the start default.
        d.relation_mut(id).unwrap().start.arrow_style = ArrowStyle::FilledTriangle;
        let text = encode(&d);
        assert_eq!(text.matches("arrowStyle").count(), 1);
        assert_eq!(decode(&text).unwrap(), d);
    }

    #[test]
    fn test_version_1_defaults() {
        let text = r#"{
            "type": "Diagram Editor Diagram",
            "version": 1,
            "windowSize": {"w": 400, "h": 300},
            "entities": [
                {"loc": {"x": 1, "y": 2}, "size": {"w": 3, "h": 4},
                 "shape": "ES_NO_SHAPE", "name": "n", "attributes": "a",
                 "fillColor": "Red", "lineColor": "Red"}
            ],
            "relations": "ignored before version 2"
        }"#;
        let d = decode(text).unwrap();
        assert_eq!(d.window_size(), Dimension::new(400, 300));
        assert!(d.draw_file_name());
        assert_eq!(d.background_color(), "White");
        assert!(d.named_colors().is_default());
        assert_eq!(d.relation_count(), 0);

        let (_, e) = d.entity_at(0).unwrap();
        assert_eq!(e.shape, EntityShape::NoShape);
        // Both colors postdate version 1 and are ignored.
        assert_eq!(e.fill_color, "Gray");
        assert_eq!(e.line_color, "Black");
    }

    #[test]
    fn test_version_2_document() {
        let text = concat!(
            r#"{"type":"Diagram Editor Diagram","version":2,"#,
            r#""windowSize":{"w":800,"h":800},"#,
            r#""entities":[],"inheritances":[],"relations":[]}"#,
        );
        let d = decode(text).unwrap();
        assert!(d.is_empty());
        assert_eq!(d.window_size(), Dimension::new(800, 800));
        assert!(d.draw_file_name());
    }

    #[test]
    fn test_shape_flags_round_trip() {
        let mut d = Diagram::new();
        let mut window = Entity::default().with_shape(EntityShape::Window);
        window.shape_flags.remove(ShapeFlag::HasMaximize);
        window.shape_flags.insert(ShapeFlag::Checked);
        d.add_entity(window);
        d.add_entity(Entity::default().with_shape(EntityShape::Window));

        let mut bare = Entity::default().with_shape(EntityShape::Window);
        bare.shape_flags = ShapeFlags::empty();
        d.add_entity(bare);

        let text = encode(&d);
        assert_eq!(text.matches("\"shapeFlags\"").count(), 2);
        assert!(text.contains("\"shapeFlags\": []"));
        let order: Vec<usize> = [
            "SF_HAS_MINIMIZE",
            "SF_HAS_CLOSE",
            "SF_HAS_WINDOW_OPS",
            "SF_CHECKED",
        ]
        .iter()
        .map(|name| text.find(name).unwrap())
        .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert!(!text.contains("SF_HAS_MAXIMIZE"));

        let decoded = decode(&text).unwrap();
        assert_eq!(decoded, d);
        let (_, bare) = decoded.entity_at(2).unwrap();
        assert!(bare.shape_flags.is_empty());
    }

    #[test]
    fn test_shape_flags_version_gate() {
        let doc = |version: u32, flags: &str| {
            format!(
                r#"{{
                "type": "Diagram Editor Diagram", "version": {version},
                "windowSize": {{"w": 10, "h": 10}},
                "entities": [
                    {{"loc": {{"x": 0, "y": 0}}, "size": {{"w": 9, "h": 9}},
                      "shape": "ES_WINDOW", "name": "w", "attributes": "",
                      "shapeFlags": {flags}}}
                ]
            }}"#
            )
        };
        // Before version 12 the field is ignored and the window defaults apply.
        let d = decode(&doc(11, r#"["SF_TRI_STATE"]"#)).unwrap();
        let (_, e) = d.entity_at(0).unwrap();
        assert_eq!(e.shape_flags, ShapeFlags::defaults_for(EntityShape::Window));

        let d = decode(&doc(12, r#"["SF_TRI_STATE"]"#)).unwrap();
        let (_, e) = d.entity_at(0).unwrap();
        assert_eq!(e.shape_flags.iter().collect::<Vec<_>>(), [ShapeFlag::TriState]);

        expect_error(&doc(12, r#"["SF_HAS_HELP"]"#), FormatErrorKind::Malformed);
        expect_error(&doc(12, r#""SF_CHECKED""#), FormatErrorKind::Malformed);
    }

    #[test]
    fn test_owning_sets_end_arrow_before_version_6() {
        let doc = |version: u32| {
            format!(
                r#"{{
                "type": "Diagram Editor Diagram", "version": {version},
                "windowSize": {{"w": 10, "h": 10}},
                "entities": [],
                "inheritances": [],
                "relations": [
                    {{"start": {{"pt": {{"x": 0, "y": 0}}}}, "end": {{"pt": {{"x": 1, "y": 1}}}},
                      "controlPts": [], "routingAlg": "RA_MANHATTAN_HORIZ", "label": "",
                      "owning": true}}
                ]
            }}"#
            )
        };
        let d = decode(&doc(5)).unwrap();
        let (_, rel) = d.relations().next().unwrap();
        assert_eq!(rel.end.arrow_style, ArrowStyle::DoubleAngle);
        assert_eq!(rel.start.arrow_style, ArrowStyle::None);

        let d = decode(&doc(6)).unwrap();
        let (_, rel) = d.relations().next().unwrap();
        assert_eq!(rel.end.arrow_style, ArrowStyle::FilledTriangle);
    }

    fn expect_error(text: &str, kind: FormatErrorKind) {
        let err = decode(text).unwrap_err();
        assert_eq!(err.kind(), kind, "{err}");
    }

    #[test]
    fn test_rejects_bad_headers() {
        expect_error("not json", FormatErrorKind::InvalidJson);
        expect_error("[]", FormatErrorKind::Malformed);
        expect_error(
            r#"{"type": "Other Diagram", "version": 1}"#,
            FormatErrorKind::WrongType,
        );
        expect_error(
            r#"{"type": "Diagram Editor Diagram", "version": 13}"#,
            FormatErrorKind::UnsupportedVersion,
        );
        expect_error(
            r#"{"type": "Diagram Editor Diagram", "version": 0}"#,
            FormatErrorKind::UnsupportedVersion,
        );
        expect_error(
            r#"{"type": "Diagram Editor Diagram", "version": 12}"#,
            FormatErrorKind::Malformed,
        );
    }

    /// Replaces the first occurrence of `from` in the encoded sample.
    fn tamper(from: &str, to: &str) -> String {
        let text = encode(&rich_diagram());
        assert!(text.contains(from), "sample lacks {from}");
        text.replacen(from, to, 1)
    }

    #[test]
    fn test_rejects_unresolved_references() {
        expect_error(
            &tamper("\"entityRef\": 0", "\"entityRef\": 9"),
            FormatErrorKind::UnresolvedReference,
        );
        expect_error(
            &tamper("\"parentRef\": 0", "\"parentRef\": 3"),
            FormatErrorKind::UnresolvedReference,
        );
        expect_error(
            &tamper("\"inheritanceRef\": 0", "\"inheritanceRef\": 1"),
            FormatErrorKind::UnresolvedReference,
        );
    }

    #[test]
    fn test_rejects_malformed_fields() {
        expect_error(
            &tamper("\"ES_ELLIPSE\"", "\"ES_HEXAGON\""),
            FormatErrorKind::Malformed,
        );
        expect_error(
            &tamper("\"RGB(170,255,200)\"", "\"RGB(170,256,200)\""),
            FormatErrorKind::Malformed,
        );
        expect_error(
            &tamper("\"x\": 5", "\"x\": 5000000000"),
            FormatErrorKind::Malformed,
        );
        expect_error(
            &tamper("\"label\": \"is a\"", "\"label\": 7"),
            FormatErrorKind::Malformed,
        );
        expect_error(
            &tamper("\"entityRef\": 0", "\"entityRef\": 0, \"pt\": {\"x\": 0, \"y\": 0}"),
            FormatErrorKind::Malformed,
        );
    }

    #[test]
    fn test_rejects_malformed_dash_pattern() {
        let text = tamper("\"dashStructure\": [", "\"dashStructure\": [0, 0], \"_\": [");
        expect_error(&text, FormatErrorKind::Malformed);
    }

    #[test]
    fn test_rejects_duplicate_color_names() {
        expect_error(
            &tamper("\"name\": \"Black\"", "\"name\": \"White\""),
            FormatErrorKind::DuplicateColor,
        );
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;
    use trellis_core::{
        color::Rgb,
        entity::EntityShape,
        relation::{DashStyle, RoutingAlgorithm},
    };

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn text_strategy() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-zA-Z0-9 \"\\\\\n\u{e9}\u{2192}]{0,12}").unwrap()
    }

    fn color_name_strategy() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["Gray", "Black", "White", "Red", "Custom"])
            .prop_map(str::to_string)
    }

    fn entity_strategy() -> impl Strategy<Value = Entity> {
        (
            (any::<i16>(), any::<i16>(), 0i32..2000, 0i32..2000),
            prop::sample::select(EntityShape::ALL.to_vec()),
            (text_strategy(), text_strategy()),
            (color_name_strategy(), color_name_strategy()),
            any::<bool>(),
        )
            .prop_map(|((x, y, w, h), shape, (name, attributes), (fill, line), tweak)| {
                let mut e = Entity::new(Point::new(x.into(), y.into()), Dimension::new(w, h))
                    .with_shape(shape)
                    .with_name(name)
                    .with_attributes(attributes);
                e.fill_color = fill;
                e.line_color = line;
                if tweak {
                    e.shape_params.push(3);
                    e.h_text_align = HTextAlign::Right;
                    e.v_text_align = VTextAlign::Center;
                }
                e
            })
    }

    #[derive(Debug, Clone)]
    struct RelationRecipe {
        ends: (u8, usize, u8, usize),
        arrows: (u8, u8),
        routing: u8,
        label: String,
        line_width: Option<u32>,
        dash: u8,
        control_pts: Vec<(i16, i16)>,
    }

    fn relation_recipe_strategy() -> impl Strategy<Value = RelationRecipe> {
        (
            (0u8..3, 0usize..50, 0u8..3, 0usize..50),
            (0u8..3, 0u8..3),
            0u8..3,
            text_strategy(),
            prop::option::of(0u32..20),
            0u8..4,
            prop::collection::vec((any::<i16>(), any::<i16>()), 0..4),
        )
            .prop_map(
                |(ends, arrows, routing, label, line_width, dash, control_pts)| RelationRecipe {
                    ends,
                    arrows,
                    routing,
                    label,
                    line_width,
                    dash,
                    control_pts,
                },
            )
    }

    fn diagram_strategy() -> impl Strategy<Value = Diagram> {
        (
            prop::collection::vec(entity_strategy(), 1..6),
            prop::collection::vec((0usize..50, any::<bool>()), 0..3),
            prop::collection::vec(relation_recipe_strategy(), 0..6),
            any::<bool>(),
        )
            .prop_map(|(entities, inheritances, relations, custom_colors)| {
                let mut d = Diagram::new();
                if custom_colors {
                    d.named_colors_mut().insert("Custom", Rgb::new(1, 2, 3));
                    d.set_background_color("Custom");
                }
                let entity_ids: Vec<EntityId> =
                    entities.into_iter().map(|e| d.add_entity(e)).collect();
                let inheritance_ids: Vec<InheritanceId> = inheritances
                    .into_iter()
                    .map(|(parent, open)| {
                        let parent = entity_ids[parent % entity_ids.len()];
                        d.add_inheritance(Inheritance::new(parent, open, Point::new(1, 1)))
                            .unwrap()
                    })
                    .collect();

                let arrows = [
                    ArrowStyle::None,
                    ArrowStyle::FilledTriangle,
                    ArrowStyle::DoubleAngle,
                ];
                let routings = [
                    RoutingAlgorithm::Direct,
                    RoutingAlgorithm::ManhattanHoriz,
                    RoutingAlgorithm::ManhattanVert,
                ];
                let dashes = [
                    DashStyle::Solid,
                    DashStyle::Dashed,
                    DashStyle::Dotted,
                    DashStyle::DashDot,
                ];
                for r in relations {
                    let target = |kind: u8, index: usize| match kind {
                        0 => EndpointTarget::Entity(entity_ids[index % entity_ids.len()]),
                        1 if !inheritance_ids.is_empty() => EndpointTarget::Inheritance(
                            inheritance_ids[index % inheritance_ids.len()],
                        ),
                        _ => EndpointTarget::Point(Point::new(index as i32, 7)),
                    };
                    let (sk, si, ek, ei) = r.ends;
                    let mut rel = Relation::new(
                        RelationEndpoint::new(target(sk, si), arrows[r.arrows.0 as usize]),
                        RelationEndpoint::new(target(ek, ei), arrows[r.arrows.1 as usize]),
                    );
                    rel.routing = routings[r.routing as usize];
                    rel.label = r.label;
                    rel.line_width = r.line_width;
                    rel.set_dash_style(dashes[r.dash as usize]);
                    rel.control_pts = r
                        .control_pts
                        .into_iter()
                        .map(|(x, y)| Point::new(x.into(), y.into()))
                        .collect();
                    d.add_relation(rel).unwrap();
                }
                d
            })
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Decoding an encoding yields an equal diagram that re-encodes to the
    /// same bytes.
    fn check_round_trip(diagram: Diagram) -> std::result::Result<(), TestCaseError> {
        let text = encode(&diagram);
        let decoded = decode(&text).map_err(|err| TestCaseError::fail(err.to_string()))?;
        prop_assert_eq!(&decoded, &diagram);
        prop_assert_eq!(encode(&decoded), text);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn round_trip(diagram in diagram_strategy()) {
            check_round_trip(diagram)?;
        }
    }
}

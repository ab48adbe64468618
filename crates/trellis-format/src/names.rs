//! Wire names of enumerated values in the JSON format.
//!
//! Each enum has a fixed table of names. Names are part of the file format
//! and must never change; new variants only ever get new names.

use trellis_core::{
    entity::{EntityShape, HTextAlign, ShapeFlag, VTextAlign},
    relation::{ArrowStyle, RoutingAlgorithm},
};

use crate::error::{FormatError, Result};

/// First version in which shapes beyond no-shape, rectangle and ellipse
/// exist.
const EXTENDED_SHAPES_VERSION: u32 = 5;

const SHAPES: &[(EntityShape, &str)] = &[
    (EntityShape::NoShape, "ES_NO_SHAPE"),
    (EntityShape::Rectangle, "ES_RECTANGLE"),
    (EntityShape::Ellipse, "ES_ELLIPSE"),
    (EntityShape::Actor, "ES_ACTOR"),
    (EntityShape::Window, "ES_WINDOW"),
    (EntityShape::Polygon, "ES_POLYGON"),
    (EntityShape::Cuboid, "ES_CUBOID"),
    (EntityShape::Cylinder, "ES_CYLINDER"),
];

const SHAPE_FLAGS: &[(ShapeFlag, &str)] = &[
    (ShapeFlag::HasMaximize, "SF_HAS_MAXIMIZE"),
    (ShapeFlag::HasMinimize, "SF_HAS_MINIMIZE"),
    (ShapeFlag::HasClose, "SF_HAS_CLOSE"),
    (ShapeFlag::HasWindowOps, "SF_HAS_WINDOW_OPS"),
    (ShapeFlag::Checked, "SF_CHECKED"),
    (ShapeFlag::TriState, "SF_TRI_STATE"),
];

const ROUTINGS: &[(RoutingAlgorithm, &str)] = &[
    (RoutingAlgorithm::Direct, "RA_DIRECT"),
    (RoutingAlgorithm::ManhattanHoriz, "RA_MANHATTAN_HORIZ"),
    (RoutingAlgorithm::ManhattanVert, "RA_MANHATTAN_VERT"),
];

const ARROWS: &[(ArrowStyle, &str)] = &[
    (ArrowStyle::None, "AS_NONE"),
    (ArrowStyle::FilledTriangle, "AS_FILLED_TRIANGLE"),
    (ArrowStyle::DoubleAngle, "AS_DOUBLE_ANGLE"),
];

const H_ALIGNS: &[(HTextAlign, &str)] = &[
    (HTextAlign::Left, "TA_LEFT"),
    (HTextAlign::Center, "TA_CENTER"),
    (HTextAlign::Right, "TA_RIGHT"),
];

const V_ALIGNS: &[(VTextAlign, &str)] = &[
    (VTextAlign::Top, "VTA_TOP"),
    (VTextAlign::Center, "VTA_CENTER"),
    (VTextAlign::Bottom, "VTA_BOTTOM"),
];

fn name_of<T: PartialEq + Copy>(table: &[(T, &'static str)], value: T) -> &'static str {
    table
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, name)| *name)
        .expect("every variant has a wire name")
}

fn parse<T: Copy>(table: &[(T, &'static str)], what: &str, name: &str) -> Result<T> {
    table
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(v, _)| *v)
        .ok_or_else(|| FormatError::malformed(format!("unknown {what} \"{name}\"")))
}

pub fn shape_name(shape: EntityShape) -> &'static str {
    name_of(SHAPES, shape)
}

/// Parses a shape name, rejecting shapes the declared `version` predates.
pub fn parse_shape(name: &str, version: u32) -> Result<EntityShape> {
    let shape = parse(SHAPES, "entity shape", name)?;
    let basic = matches!(
        shape,
        EntityShape::NoShape | EntityShape::Rectangle | EntityShape::Ellipse
    );
    if !basic && version < EXTENDED_SHAPES_VERSION {
        return Err(FormatError::malformed(format!(
            "entity shape \"{name}\" is not valid in version {version}"
        )));
    }
    Ok(shape)
}

pub fn shape_flag_name(flag: ShapeFlag) -> &'static str {
    name_of(SHAPE_FLAGS, flag)
}

pub fn parse_shape_flag(name: &str) -> Result<ShapeFlag> {
    parse(SHAPE_FLAGS, "shape flag", name)
}

pub fn routing_name(routing: RoutingAlgorithm) -> &'static str {
    name_of(ROUTINGS, routing)
}

pub fn parse_routing(name: &str) -> Result<RoutingAlgorithm> {
    parse(ROUTINGS, "routing algorithm", name)
}

pub fn arrow_name(style: ArrowStyle) -> &'static str {
    name_of(ARROWS, style)
}

pub fn parse_arrow(name: &str) -> Result<ArrowStyle> {
    parse(ARROWS, "arrow style", name)
}

pub fn h_align_name(align: HTextAlign) -> &'static str {
    name_of(H_ALIGNS, align)
}

pub fn parse_h_align(name: &str) -> Result<HTextAlign> {
    parse(H_ALIGNS, "horizontal text alignment", name)
}

pub fn v_align_name(align: VTextAlign) -> &'static str {
    name_of(V_ALIGNS, align)
}

pub fn parse_v_align(name: &str) -> Result<VTextAlign> {
    parse(V_ALIGNS, "vertical text alignment", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_shape_has_a_name() {
        for shape in EntityShape::ALL {
            assert_eq!(parse_shape(shape_name(shape), 12).unwrap(), shape);
        }
    }

    #[test]
    fn test_extended_shapes_gated_by_version() {
        assert_eq!(parse_shape("ES_ELLIPSE", 1).unwrap(), EntityShape::Ellipse);
        assert!(parse_shape("ES_CUBOID", 4).is_err());
        assert_eq!(parse_shape("ES_CUBOID", 5).unwrap(), EntityShape::Cuboid);
    }

    #[test]
    fn test_every_shape_flag_has_a_name() {
        for flag in ShapeFlag::ALL {
            assert_eq!(parse_shape_flag(shape_flag_name(flag)).unwrap(), flag);
        }
    }

    #[test]
    fn test_unknown_names_rejected() {
        assert!(parse_shape_flag("SF_HAS_HELP").is_err());
        assert!(parse_routing("RA_DIAGONAL").is_err());
        assert!(parse_arrow("as_none").is_err());
        let err = parse_h_align("TA_JUSTIFY").unwrap_err();
        assert_eq!(
            err.message(),
            "unknown horizontal text alignment \"TA_JUSTIFY\""
        );
    }
}

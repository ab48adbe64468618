//! Reader for the legacy binary document format.
//!
//! The legacy format is a flat little-endian stream. Sections are laid out
//! positionally and every field added after version 1 is gated on the
//! stream's version, so the reader is a cursor that consults the version
//! before each optional read.
//!
//! ```text
//! magic  version  windowSize
//! entities      [checkpoint]
//! inheritances  [checkpoint]    (version 7 and later)
//! relations     [checkpoint]
//! ```
//!
//! Entities and inheritance nodes are registered in one owner table as they
//! are read; later fields refer back to them by 1-based position ("serf"
//! references), with 0 meaning none.
//!
//! Only decoding is supported. Documents are always written back in the
//! JSON format.

use log::{debug, info, trace};
use trellis_core::{
    diagram::Diagram,
    entity::{Entity, EntityShape},
    geometry::{Dimension, Point},
    identifier::{EntityId, InheritanceId},
    inheritance::Inheritance,
    relation::{
        ArrowStyle, EndpointRole, EndpointTarget, Relation, RelationEndpoint, RoutingAlgorithm,
    },
};

use crate::error::{FormatError, FormatErrorKind, Result};

/// First four bytes of every legacy document.
pub const LEGACY_MAGIC: i32 = 0x2B04_4C63;

/// Highest legacy version understood.
pub const LEGACY_MAX_VERSION: i32 = 8;

const ENTITIES_CHECKPOINT: i32 = 0x64E2_C40F;
const INHERITANCES_CHECKPOINT: i32 = 0x144C_B789;
const FINAL_CHECKPOINT: i32 = 0x3782_64D9;

// Versions that introduced each field.
const V_ATTRIBUTES: i32 = 2;
const V_CONTROL_POINTS: i32 = 3;
const V_ROUTING: i32 = 4;
const V_LABEL: i32 = 5;
const V_SHAPE: i32 = 6;
const V_INHERITANCES: i32 = 7;
const V_OWNING: i32 = 8;

/// Returns `true` if `bytes` starts with the legacy magic number.
pub fn is_legacy(bytes: &[u8]) -> bool {
    bytes.starts_with(&LEGACY_MAGIC.to_le_bytes())
}

/// An element registered in the owner table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Entity(EntityId),
    Inheritance(InheritanceId),
}

/// Version-gated cursor over a legacy stream.
#[derive(Debug)]
pub struct LegacyReader<'a> {
    input: &'a [u8],
    pos: usize,
    version: i32,
    owners: Vec<Owner>,
}

impl<'a> LegacyReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            version: 0,
            owners: Vec::new(),
        }
    }

    /// Version read from the header, or 0 before the header is read.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// `true` if fields introduced in `since` are present in this stream.
    pub fn has(&self, since: i32) -> bool {
        self.version >= since
    }

    /// Byte offset of the next read.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or_else(|| {
                FormatError::new(
                    FormatErrorKind::UnexpectedEof,
                    format!("stream ended at byte {} while reading {what}", self.pos),
                )
            })?;
        let bytes = &self.input[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_int(&mut self) -> Result<i32> {
        let bytes = self.take(4, "an integer")?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(bytes);
        Ok(i32::from_le_bytes(buf))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.take(1, "a boolean")?[0] != 0)
    }

    /// Reads a length-prefixed, NUL-terminated Latin-1 string.
    ///
    /// A length of -1 is a null string and reads as empty.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_int()?;
        if len == -1 {
            return Ok(String::new());
        }
        let len = usize::try_from(len)
            .map_err(|_| FormatError::malformed(format!("invalid string length {len}")))?;
        let start = self.pos;
        let bytes = self.take(len + 1, "a string")?;
        let (terminator, text) = bytes
            .split_last()
            .expect("at least the terminator was read");
        if *terminator != 0 {
            return Err(FormatError::malformed(format!(
                "string at byte {start} is missing its terminator"
            )));
        }
        Ok(text.iter().map(|&b| char::from(b)).collect())
    }

    pub fn read_point(&mut self) -> Result<Point> {
        Ok(Point::new(self.read_int()?, self.read_int()?))
    }

    pub fn read_dimension(&mut self) -> Result<Dimension> {
        Ok(Dimension::new(self.read_int()?, self.read_int()?))
    }

    /// Reads an element count.
    pub fn read_count(&mut self, what: &str) -> Result<usize> {
        let count = self.read_int()?;
        usize::try_from(count)
            .map_err(|_| FormatError::malformed(format!("negative {what} count {count}")))
    }

    /// Adds an element to the owner table.
    pub fn register(&mut self, owner: Owner) {
        self.owners.push(owner);
    }

    /// Reads a back reference into the owner table.
    pub fn read_serf(&mut self) -> Result<Option<Owner>> {
        let index = self.read_int()?;
        if index == 0 {
            return Ok(None);
        }
        usize::try_from(index)
            .ok()
            .and_then(|index| self.owners.get(index - 1))
            .copied()
            .map(Some)
            .ok_or_else(|| {
                FormatError::unresolved(format!(
                    "reference {index} does not name one of the {} earlier elements",
                    self.owners.len()
                ))
            })
    }

    fn read_entity_serf(&mut self) -> Result<Option<EntityId>> {
        match self.read_serf()? {
            None => Ok(None),
            Some(Owner::Entity(id)) => Ok(Some(id)),
            Some(Owner::Inheritance(id)) => Err(FormatError::unresolved(format!(
                "expected an entity reference, found {id}"
            ))),
        }
    }

    fn read_inheritance_serf(&mut self) -> Result<Option<InheritanceId>> {
        match self.read_serf()? {
            None => Ok(None),
            Some(Owner::Inheritance(id)) => Ok(Some(id)),
            Some(Owner::Entity(id)) => Err(FormatError::unresolved(format!(
                "expected an inheritance reference, found {id}"
            ))),
        }
    }

    /// Reads a section checkpoint and fails if it is not `expected`.
    pub fn checkpoint(&mut self, expected: i32, section: &str) -> Result<()> {
        let at = self.pos;
        let found = self.read_int()?;
        if found != expected {
            return Err(FormatError::new(
                FormatErrorKind::Desynchronized,
                format!(
                    "checkpoint after {section} at byte {at} is {found:#010x}, expected {expected:#010x}"
                ),
            ));
        }
        trace!(section = section, at = at; "Checkpoint passed");
        Ok(())
    }

    fn header(&mut self) -> Result<()> {
        let magic = self.read_int()?;
        if magic != LEGACY_MAGIC {
            return Err(FormatError::new(
                FormatErrorKind::BadMagic,
                format!("bad magic number {magic:#010x}"),
            ));
        }
        let version = self.read_int()?;
        if !(1..=LEGACY_MAX_VERSION).contains(&version) {
            return Err(FormatError::new(
                FormatErrorKind::UnsupportedVersion,
                format!(
                    "legacy version {version} is not in the supported range 1..={LEGACY_MAX_VERSION}"
                ),
            ));
        }
        self.version = version;
        Ok(())
    }

    fn entity(&mut self) -> Result<Entity> {
        let loc = self.read_point()?;
        let size = self.read_dimension()?;
        let mut entity = Entity::new(loc, size).with_name(self.read_string()?);

        if self.has(V_ATTRIBUTES) {
            let lines = self.read_count("attribute line")?;
            let mut attributes = Vec::with_capacity(lines.min(1024));
            for _ in 0..lines {
                attributes.push(self.read_string()?);
            }
            entity.attributes = attributes.join("\n");
        }

        if self.has(V_SHAPE) {
            let shape = match self.read_int()? {
                0 => EntityShape::NoShape,
                1 => EntityShape::Rectangle,
                2 => EntityShape::Ellipse,
                other => {
                    return Err(FormatError::malformed(format!(
                        "invalid legacy entity shape {other}"
                    )));
                }
            };
            entity.set_shape(shape);
        }

        Ok(entity)
    }

    fn inheritance(&mut self) -> Result<Inheritance> {
        let parent = self
            .read_entity_serf()?
            .ok_or_else(|| FormatError::unresolved("inheritance has no parent entity"))?;
        let open = self.read_bool()?;
        let pt = self.read_point()?;
        Ok(Inheritance::new(parent, open, pt))
    }

    fn endpoint(&mut self, role: EndpointRole) -> Result<RelationEndpoint> {
        let entity = self.read_entity_serf()?;
        let inheritance = if self.has(V_INHERITANCES) {
            self.read_inheritance_serf()?
        } else {
            None
        };

        let target = match (entity, inheritance) {
            (Some(_), Some(_)) => {
                return Err(FormatError::malformed(
                    "relation endpoint refers to both an entity and an inheritance node",
                ));
            }
            (Some(id), None) => EndpointTarget::Entity(id),
            (None, inheritance) => {
                // Writers always emitted a point when no entity was
                // referenced, even if an inheritance node was.
                let pt = self.read_point()?;
                match inheritance {
                    Some(id) => EndpointTarget::Inheritance(id),
                    None => EndpointTarget::Point(pt),
                }
            }
        };
        Ok(RelationEndpoint::new(target, role.default_arrow_style()))
    }

    fn relation(&mut self) -> Result<Relation> {
        let start = self.endpoint(EndpointRole::Start)?;
        let end = self.endpoint(EndpointRole::End)?;
        let mut relation = Relation::new(start, end);

        if self.has(V_CONTROL_POINTS) {
            let count = self.read_count("control point")?;
            for _ in 0..count {
                relation.control_pts.push(self.read_point()?);
            }
        }

        if self.has(V_ROUTING) {
            relation.routing = match self.read_int()? {
                0 => RoutingAlgorithm::Direct,
                1 => RoutingAlgorithm::ManhattanHoriz,
                2 => RoutingAlgorithm::ManhattanVert,
                other => {
                    return Err(FormatError::malformed(format!(
                        "invalid legacy routing algorithm {other}"
                    )));
                }
            };
        }

        if self.has(V_LABEL) {
            relation.label = self.read_string()?;
        }

        if self.has(V_OWNING) && self.read_bool()? {
            relation.end.arrow_style = ArrowStyle::DoubleAngle;
        }

        Ok(relation)
    }

    /// Reads a whole document.
    fn diagram(&mut self) -> Result<Diagram> {
        self.header()?;

        let mut diagram = Diagram::new();
        diagram.set_window_size(self.read_dimension()?);
        diagram.set_draw_file_name(false);

        let entities = self.read_count("entity")?;
        for _ in 0..entities {
            let entity = self.entity()?;
            let id = diagram.add_entity(entity);
            self.register(Owner::Entity(id));
        }
        self.checkpoint(ENTITIES_CHECKPOINT, "entities")?;

        if self.has(V_INHERITANCES) {
            let inheritances = self.read_count("inheritance")?;
            for _ in 0..inheritances {
                let inh = self.inheritance()?;
                let id = diagram
                    .add_inheritance(inh)
                    .expect("parent came from the owner table");
                self.register(Owner::Inheritance(id));
            }
            self.checkpoint(INHERITANCES_CHECKPOINT, "inheritances")?;
        }

        let relations = self.read_count("relation")?;
        for _ in 0..relations {
            let relation = self.relation()?;
            diagram
                .add_relation(relation)
                .expect("endpoints came from the owner table");
        }
        self.checkpoint(FINAL_CHECKPOINT, "relations")?;

        if self.pos < self.input.len() {
            debug!(trailing = self.input.len() - self.pos; "Ignoring bytes after final checkpoint");
        }

        Ok(diagram)
    }
}

/// Decodes a legacy binary document.
///
/// The synthetic title placeholder that old editors inserted is removed
/// from the result.
///
/// # Errors
///
/// Fails on a bad magic number or version, a truncated stream, a
/// checkpoint mismatch, an invalid serf reference, or an invalid field.
///
/// # Panics
///
/// Panics if the diagram fails its integrity check after the title
/// placeholder is removed.
pub fn decode_legacy(bytes: &[u8]) -> Result<Diagram> {
    let mut reader = LegacyReader::new(bytes);
    let mut diagram = reader.diagram()?;

    if remove_title_placeholder(&mut diagram) {
        debug!("Removed legacy title placeholder");
    }
    diagram.assert_valid();

    info!(
        version = reader.version(),
        entities = diagram.entity_count(),
        inheritances = diagram.inheritance_count(),
        relations = diagram.relation_count();
        "Decoded legacy diagram"
    );
    Ok(diagram)
}

/// Removes the first entity that is an old-style title placeholder: at the
/// origin, without outline, named by a single space, and with no
/// attributes.
fn remove_title_placeholder(diagram: &mut Diagram) -> bool {
    let placeholder = diagram
        .entities()
        .find(|(_, e)| {
            e.loc.is_zero()
                && e.shape == EntityShape::NoShape
                && e.name == " "
                && e.attributes.is_empty()
        })
        .map(|(id, _)| id);

    match placeholder {
        Some(id) => {
            diagram
                .remove_entity(id)
                .expect("placeholder was just found in the diagram");
            true
        }
        None => false,
    }
}

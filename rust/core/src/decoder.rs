// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity Decoder - materializes a STEP file into an immutable entity graph
//!
//! Every record is decoded once up front. The resulting [`EntityGraph`] holds
//! no interior mutability, so it can be shared across threads while several
//! alignments are analyzed at once.

use crate::accessor::{EntityAccessor, EntityRef};
use crate::entity::{AttributeValue, DecodedEntity};
use crate::error::{Error, Result};
use crate::parser::{parse_entity, EntityScanner};
use crate::schema::IfcType;
use rustc_hash::FxHashMap;

/// Decode a single record (`#id=TYPE(...);`)
#[inline]
pub fn decode_entity(record: &str) -> Result<DecodedEntity> {
    let (id, type_name, tokens) = parse_entity(record).map_err(|e| {
        Error::parse(
            0,
            format!("{}, input: {:?}", e, &record[..record.len().min(100)]),
        )
    })?;
    let attributes = tokens.iter().map(AttributeValue::from_token).collect();
    Ok(DecodedEntity::new(id, type_name, attributes))
}

/// Detect the schema declared in the FILE_SCHEMA header
pub fn detect_schema_version(content: &str) -> &'static str {
    let header_end = memchr::memmem::find(content.as_bytes(), b"DATA;").unwrap_or(content.len());
    let header = &content[..header_end];
    if header.contains("IFC4X3") {
        "IFC4X3"
    } else if header.contains("IFC4") {
        "IFC4"
    } else if header.contains("IFC2X3") {
        "IFC2X3"
    } else {
        "UNKNOWN"
    }
}

/// Fully decoded, immutable entity graph
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    entities: FxHashMap<u32, DecodedEntity>,
    by_type: FxHashMap<IfcType, Vec<u32>>,
    skipped: Vec<(u32, Error)>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every record in `content`.
    ///
    /// Records that fail to decode are skipped and listed in [`Self::skipped`];
    /// one bad line never discards the rest of the file.
    pub fn from_step(content: &str) -> Self {
        let mut graph = Self::new();
        let mut scanner = EntityScanner::new(content);

        while let Some((id, _type_name, start, end)) = scanner.next_entity() {
            match decode_entity(&content[start..end]) {
                Ok(entity) => graph.insert(entity),
                Err(e) => graph.skipped.push((id, Error::parse(start, e.to_string()))),
            }
        }

        graph
    }

    /// Decode a complete STEP physical file, rejecting content without the
    /// `ISO-10303-21` magic line
    pub fn parse(content: &str) -> Result<Self> {
        if !content.trim_start().starts_with("ISO-10303-21") {
            return Err(Error::parse(0, "missing ISO-10303-21 header"));
        }
        Ok(Self::from_step(content))
    }

    /// Insert or replace an entity
    pub fn insert(&mut self, entity: DecodedEntity) {
        let id = entity.id;
        if let Some(previous) = self.entities.get(&id) {
            if let Some(ids) = self.by_type.get_mut(&previous.ifc_type) {
                ids.retain(|existing| *existing != id);
            }
        }

        let ids = self.by_type.entry(entity.ifc_type).or_default();
        if let Err(pos) = ids.binary_search(&id) {
            ids.insert(pos, id);
        }
        self.entities.insert(id, entity);
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&DecodedEntity> {
        self.entities.get(&id)
    }

    /// Get an entity or fail with [`Error::UnknownEntity`]
    pub fn require(&self, id: u32) -> Result<&DecodedEntity> {
        self.get(id).ok_or(Error::UnknownEntity(id))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Records that could not be decoded, with the reason
    pub fn skipped(&self) -> &[(u32, Error)] {
        &self.skipped
    }
}

impl EntityAccessor for EntityGraph {
    fn entities_of_type(&self, ifc_type: IfcType) -> Vec<EntityRef> {
        self.by_type
            .get(&ifc_type)
            .map(|ids| ids.iter().copied().map(EntityRef).collect())
            .unwrap_or_default()
    }

    fn type_of(&self, entity: EntityRef) -> Option<IfcType> {
        self.get(entity.0).map(|e| e.ifc_type)
    }

    fn attribute(&self, entity: EntityRef, name: &str) -> Option<&AttributeValue> {
        self.get(entity.0)?.get_named(name)
    }

    fn type_name(&self, entity: EntityRef) -> Option<&str> {
        self.get(entity.0).map(|e| e.type_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4X3_ADD2'));
ENDSEC;
DATA;
#1=IFCCARTESIANPOINT((0.,0.));
#2=IFCDIRECTION((1.,0.));
#3=IFCAXIS2PLACEMENT2D(#1,#2);
#4=IFCLINE(#1,#9);
#5=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,$,$,$,$,$,$);
#6=IFCCIRCLE(#3,250.);
#7=IFCBROKEN((1.,;
#8=IFCCIRCLE(#3,100.);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn decodes_all_well_formed_records() {
        let graph = EntityGraph::from_step(CONTENT);
        assert_eq!(graph.len(), 7);
        assert_eq!(graph.skipped().len(), 1);
        assert_eq!(graph.skipped()[0].0, 7);
        assert_eq!(detect_schema_version(CONTENT), "IFC4X3");
    }

    #[test]
    fn parse_requires_step_header() {
        assert!(EntityGraph::parse(CONTENT).is_ok());
        assert!(EntityGraph::parse("#1=IFCDIRECTION((1.,0.));").is_err());
    }

    #[test]
    fn entities_of_type_is_sorted_and_typed() {
        let graph = EntityGraph::from_step(CONTENT);
        assert_eq!(
            graph.entities_of_type(IfcType::IfcCircle),
            vec![EntityRef(6), EntityRef(8)]
        );
        assert_eq!(graph.type_of(EntityRef(5)), Some(IfcType::Unknown));
        assert_eq!(graph.type_name(EntityRef(5)), Some("IFCWALL"));
    }

    #[test]
    fn named_attributes_and_references() {
        let graph = EntityGraph::from_step(CONTENT);
        let placement = graph.resolve(EntityRef(6), "Position").unwrap();
        assert_eq!(placement, EntityRef(3));
        assert_eq!(graph.attribute_f64(EntityRef(6), "Radius"), Some(250.0));

        let location = graph.resolve(placement, "Location").unwrap();
        let coords = graph.attribute_floats(location, "Coordinates").unwrap();
        assert_eq!(coords.as_slice(), &[0.0, 0.0]);

        // #9 does not exist
        assert_eq!(graph.resolve(EntityRef(4), "Dir"), None);
        assert!(graph.require(9).is_err());
    }

    #[test]
    fn insert_replaces_and_reindexes() {
        let mut graph = EntityGraph::from_step(CONTENT);
        graph.insert(DecodedEntity::new(
            6,
            "IFCDIRECTION",
            vec![AttributeValue::List(vec![AttributeValue::Float(0.0)])],
        ));
        assert_eq!(graph.entities_of_type(IfcType::IfcCircle), vec![EntityRef(8)]);
        assert_eq!(
            graph.entities_of_type(IfcType::IfcDirection),
            vec![EntityRef(2), EntityRef(6)]
        );
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity Accessor - the narrow read interface over a decoded entity graph
//!
//! Analysis code depends on this trait only. [`crate::EntityGraph`] implements
//! it for decoded STEP files; tests can implement it over hand-built maps.

use crate::entity::AttributeValue;
use crate::schema::IfcType;
use smallvec::SmallVec;

/// Handle to an entity in a decoded graph (the STEP instance number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityRef(pub u32);

impl EntityRef {
    #[inline]
    pub fn id(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read access to a decoded entity graph
pub trait EntityAccessor {
    /// All entities of the given type, in ascending instance order
    fn entities_of_type(&self, ifc_type: IfcType) -> Vec<EntityRef>;

    /// Type of an entity, or None if the handle is dangling
    fn type_of(&self, entity: EntityRef) -> Option<IfcType>;

    /// Named attribute; null and derived values read as None
    fn attribute(&self, entity: EntityRef, name: &str) -> Option<&AttributeValue>;

    /// Type name as written in the source, for diagnostics
    fn type_name(&self, entity: EntityRef) -> Option<&str> {
        self.type_of(entity).map(|t| t.as_str())
    }

    /// Follow a single entity reference
    fn resolve(&self, entity: EntityRef, name: &str) -> Option<EntityRef> {
        let target = EntityRef(self.attribute(entity, name)?.as_entity_ref()?);
        self.type_of(target).map(|_| target)
    }

    /// Follow a list of entity references, dropping dangling members
    fn resolve_list(&self, entity: EntityRef, name: &str) -> Vec<EntityRef> {
        self.attribute(entity, name)
            .and_then(|v| v.as_list())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_entity_ref())
                    .map(EntityRef)
                    .filter(|r| self.type_of(*r).is_some())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn attribute_f64(&self, entity: EntityRef, name: &str) -> Option<f64> {
        self.attribute(entity, name)?.as_float()
    }

    fn attribute_str(&self, entity: EntityRef, name: &str) -> Option<&str> {
        self.attribute(entity, name)?.as_string()
    }

    fn attribute_enum(&self, entity: EntityRef, name: &str) -> Option<&str> {
        self.attribute(entity, name)?.as_enum()
    }

    fn attribute_floats(&self, entity: EntityRef, name: &str) -> Option<SmallVec<[f64; 4]>> {
        self.attribute(entity, name)?.as_float_list()
    }
}

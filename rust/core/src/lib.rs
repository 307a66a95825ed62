// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Align Core
//!
//! STEP/IFC decoding built with [nom](https://docs.rs/nom), and the
//! [`EntityAccessor`] capability through which alignment analysis reads the
//! decoded graph.
//!
//! ## Overview
//!
//! - **STEP Tokenization**: zero-copy parsing of entity records
//! - **Entity Scanning**: [memchr](https://docs.rs/memchr)-accelerated record discovery
//! - **Entity Graph**: every record decoded once into an immutable, thread-safe graph
//! - **Named Attributes**: IFC 4.3 attribute layouts for alignment geometry types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_align_core::{EntityAccessor, EntityGraph, IfcType};
//!
//! let graph = EntityGraph::from_step(&content);
//! for alignment in graph.entities_of_type(IfcType::IfcAlignment) {
//!     let name = graph.attribute_str(alignment, "Name").unwrap_or_default();
//!     println!("{} {}", alignment, name);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for decoded values

pub mod accessor;
pub mod decoder;
pub mod entity;
pub mod error;
pub mod parser;
pub mod schema;

pub use accessor::{EntityAccessor, EntityRef};
pub use decoder::{decode_entity, detect_schema_version, EntityGraph};
pub use entity::{AttributeValue, DecodedEntity};
pub use error::{Error, Result};
pub use parser::{parse_entity, EntityScanner, Token};
pub use schema::IfcType;

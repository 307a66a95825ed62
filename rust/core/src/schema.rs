// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC 4.3 schema subset for alignment geometry
//!
//! STEP attributes are positional. This module maps attribute names to
//! positions for the entity types the alignment engine reads, so callers
//! can ask for `"Placement"` instead of index 1.

/// IFC entity types understood by name-based attribute access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IfcType {
    IfcAlignment,
    IfcProductDefinitionShape,
    IfcShapeRepresentation,
    IfcCompositeCurve,
    IfcGradientCurve,
    IfcSegmentedReferenceCurve,
    IfcCurveSegment,
    IfcAxis2Placement2D,
    IfcAxis2Placement3D,
    IfcCartesianPoint,
    IfcDirection,
    IfcVector,
    IfcLine,
    IfcCircle,
    IfcClothoid,
    IfcPolynomialCurve,
    /// Any type outside this subset; the original name lives on the entity
    Unknown,
}

impl IfcType {
    /// Look up a type by its STEP name (case-insensitive)
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "IFCALIGNMENT" => IfcType::IfcAlignment,
            "IFCPRODUCTDEFINITIONSHAPE" => IfcType::IfcProductDefinitionShape,
            "IFCSHAPEREPRESENTATION" => IfcType::IfcShapeRepresentation,
            "IFCCOMPOSITECURVE" => IfcType::IfcCompositeCurve,
            "IFCGRADIENTCURVE" => IfcType::IfcGradientCurve,
            "IFCSEGMENTEDREFERENCECURVE" => IfcType::IfcSegmentedReferenceCurve,
            "IFCCURVESEGMENT" => IfcType::IfcCurveSegment,
            "IFCAXIS2PLACEMENT2D" => IfcType::IfcAxis2Placement2D,
            "IFCAXIS2PLACEMENT3D" => IfcType::IfcAxis2Placement3D,
            "IFCCARTESIANPOINT" => IfcType::IfcCartesianPoint,
            "IFCDIRECTION" => IfcType::IfcDirection,
            "IFCVECTOR" => IfcType::IfcVector,
            "IFCLINE" => IfcType::IfcLine,
            "IFCCIRCLE" => IfcType::IfcCircle,
            "IFCCLOTHOID" => IfcType::IfcClothoid,
            "IFCPOLYNOMIALCURVE" => IfcType::IfcPolynomialCurve,
            _ => IfcType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IfcType::IfcAlignment => "IFCALIGNMENT",
            IfcType::IfcProductDefinitionShape => "IFCPRODUCTDEFINITIONSHAPE",
            IfcType::IfcShapeRepresentation => "IFCSHAPEREPRESENTATION",
            IfcType::IfcCompositeCurve => "IFCCOMPOSITECURVE",
            IfcType::IfcGradientCurve => "IFCGRADIENTCURVE",
            IfcType::IfcSegmentedReferenceCurve => "IFCSEGMENTEDREFERENCECURVE",
            IfcType::IfcCurveSegment => "IFCCURVESEGMENT",
            IfcType::IfcAxis2Placement2D => "IFCAXIS2PLACEMENT2D",
            IfcType::IfcAxis2Placement3D => "IFCAXIS2PLACEMENT3D",
            IfcType::IfcCartesianPoint => "IFCCARTESIANPOINT",
            IfcType::IfcDirection => "IFCDIRECTION",
            IfcType::IfcVector => "IFCVECTOR",
            IfcType::IfcLine => "IFCLINE",
            IfcType::IfcCircle => "IFCCIRCLE",
            IfcType::IfcClothoid => "IFCCLOTHOID",
            IfcType::IfcPolynomialCurve => "IFCPOLYNOMIALCURVE",
            IfcType::Unknown => "UNKNOWN",
        }
    }

    /// Attribute names in STEP order (inherited attributes first)
    pub fn attribute_names(&self) -> &'static [&'static str] {
        match self {
            IfcType::IfcAlignment => &[
                "GlobalId",
                "OwnerHistory",
                "Name",
                "Description",
                "ObjectType",
                "ObjectPlacement",
                "Representation",
                "PredefinedType",
            ],
            IfcType::IfcProductDefinitionShape => &["Name", "Description", "Representations"],
            IfcType::IfcShapeRepresentation => &[
                "ContextOfItems",
                "RepresentationIdentifier",
                "RepresentationType",
                "Items",
            ],
            IfcType::IfcCompositeCurve => &["Segments", "SelfIntersect"],
            IfcType::IfcGradientCurve | IfcType::IfcSegmentedReferenceCurve => {
                &["Segments", "SelfIntersect", "BaseCurve", "EndPoint"]
            }
            IfcType::IfcCurveSegment => &[
                "Transition",
                "Placement",
                "SegmentStart",
                "SegmentLength",
                "ParentCurve",
            ],
            IfcType::IfcAxis2Placement2D => &["Location", "RefDirection"],
            IfcType::IfcAxis2Placement3D => &["Location", "Axis", "RefDirection"],
            IfcType::IfcCartesianPoint => &["Coordinates"],
            IfcType::IfcDirection => &["DirectionRatios"],
            IfcType::IfcVector => &["Orientation", "Magnitude"],
            IfcType::IfcLine => &["Pnt", "Dir"],
            IfcType::IfcCircle => &["Position", "Radius"],
            IfcType::IfcClothoid => &["Position", "ClothoidConstant"],
            IfcType::IfcPolynomialCurve => {
                &["Position", "CoefficientsX", "CoefficientsY", "CoefficientsZ"]
            }
            IfcType::Unknown => &[],
        }
    }

    /// Position of a named attribute, if the type declares it
    #[inline]
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attribute_names().iter().position(|n| *n == name)
    }

    /// Curves that own an ordered `Segments` list of IfcCurveSegment
    #[inline]
    pub fn is_segmented_curve(&self) -> bool {
        matches!(
            self,
            IfcType::IfcCompositeCurve
                | IfcType::IfcGradientCurve
                | IfcType::IfcSegmentedReferenceCurve
        )
    }
}

impl std::fmt::Display for IfcType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_for_known_types() {
        for ty in [
            IfcType::IfcAlignment,
            IfcType::IfcCurveSegment,
            IfcType::IfcGradientCurve,
            IfcType::IfcPolynomialCurve,
        ] {
            assert_eq!(IfcType::from_name(ty.as_str()), ty);
        }
        assert_eq!(IfcType::from_name("IfcWall"), IfcType::Unknown);
    }

    #[test]
    fn curve_segment_layout() {
        let ty = IfcType::IfcCurveSegment;
        assert_eq!(ty.attribute_index("Placement"), Some(1));
        assert_eq!(ty.attribute_index("SegmentLength"), Some(3));
        assert_eq!(ty.attribute_index("ParentCurve"), Some(4));
        assert_eq!(ty.attribute_index("Radius"), None);
    }

    #[test]
    fn gradient_curve_shares_segments_position() {
        assert_eq!(IfcType::IfcGradientCurve.attribute_index("Segments"), Some(0));
        assert_eq!(IfcType::IfcGradientCurve.attribute_index("BaseCurve"), Some(2));
        assert!(IfcType::IfcGradientCurve.is_segmented_curve());
        assert!(!IfcType::IfcLine.is_segmented_curve());
    }
}

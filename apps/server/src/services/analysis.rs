// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alignment analysis over uploaded files.
//!
//! Every request decodes the stored file again; reports are not cached.

use crate::error::ApiError;
use ifc_align_core::{detect_schema_version, EntityGraph};
use ifc_align_geometry::{Alignment, AlignmentAnalyzer, AnalysisConfig, ReportOutcome};

/// Decoded file ready for analysis.
pub struct LoadedFile {
    pub graph: EntityGraph,
    pub schema: &'static str,
}

/// Decode raw file content.
pub fn load(data: Vec<u8>) -> Result<LoadedFile, ApiError> {
    let start = std::time::Instant::now();
    let content = String::from_utf8(data)?;
    let schema = detect_schema_version(&content);
    let graph = EntityGraph::parse(&content)?;

    if !graph.skipped().is_empty() {
        tracing::warn!(
            skipped = graph.skipped().len(),
            "Some STEP records could not be decoded"
        );
    }
    tracing::debug!(
        entities = graph.len(),
        schema,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Decoded IFC content"
    );

    Ok(LoadedFile { graph, schema })
}

/// Alignments in a decoded file.
pub fn list_alignments(file: &LoadedFile, config: AnalysisConfig) -> Vec<Alignment> {
    AlignmentAnalyzer::with_config(&file.graph, config).list_alignments()
}

/// Report for one alignment.
pub fn build_report(
    file: &LoadedFile,
    config: AnalysisConfig,
    alignment_id: u32,
) -> Result<ReportOutcome, ApiError> {
    Ok(AlignmentAnalyzer::with_config(&file.graph, config).build_report(alignment_id)?)
}

/// Reports for every alignment, built in parallel.
///
/// An alignment whose report fails is logged and left out; the others are
/// still returned.
pub fn build_all_reports(file: &LoadedFile, config: AnalysisConfig) -> Vec<ReportOutcome> {
    AlignmentAnalyzer::with_config(&file.graph, config)
        .build_all_reports()
        .into_iter()
        .filter_map(|(id, outcome)| match outcome {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(alignment_id = id, error = %e, "Failed to build report");
                None
            }
        })
        .collect()
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
#4=IFCLINE(#1,#5);
#5=IFCVECTOR(#2,1.);
#10=IFCCURVESEGMENT(.CONTINUOUS.,#3,IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(100.),#4);
#11=IFCCOMPOSITECURVE((#10),.F.);
#12=IFCSHAPEREPRESENTATION($,'Axis','Curve2D',(#11));
#13=IFCPRODUCTDEFINITIONSHAPE($,$,(#12));
#20=IFCALIGNMENT('1F8XyUi0nDtxyU7DNIjKV1',$,'Main',$,$,$,#13,.USERDEFINED.);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn lists_alignments_from_raw_bytes() {
        let file = load(CONTENT.as_bytes().to_vec()).unwrap();
        assert_eq!(file.schema, "IFC4X3");

        let alignments = list_alignments(&file, AnalysisConfig::default());
        assert_eq!(alignments.len(), 1);
        assert_eq!(alignments[0].id, 20);
        assert_eq!(alignments[0].name, "Main");
        assert!(alignments[0].has_base_curve);
        assert!(!alignments[0].has_gradient_curve);
    }

    #[test]
    fn base_only_alignment_is_incomplete() {
        let file = load(CONTENT.as_bytes().to_vec()).unwrap();
        let outcome = build_report(&file, AnalysisConfig::default(), 20).unwrap();
        assert!(!outcome.is_complete());
        assert_eq!(build_all_reports(&file, AnalysisConfig::default()).len(), 1);
    }

    #[test]
    fn unknown_alignment_is_not_found() {
        let file = load(CONTENT.as_bytes().to_vec()).unwrap();
        let err = build_report(&file, AnalysisConfig::default(), 999).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn rejects_non_step_content() {
        assert!(matches!(
            load(b"not an ifc file".to_vec()),
            Err(ApiError::Processing(_))
        ));
        assert!(matches!(
            load(vec![0xff, 0xfe]),
            Err(ApiError::InvalidUtf8(_))
        ));
    }
}

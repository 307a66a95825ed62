// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Benchmark for alignment decoding and report building.
//!
//! Run with: cargo bench -p ifc-align-geometry --bench report

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ifc_align_core::EntityGraph;
use ifc_align_geometry::{AlignmentAnalyzer, AnalysisConfig};
use std::fmt::Write;

/// Synthetic file with `alignments` alignments of `segments` segments per curve.
///
/// Plan segments cycle line, circle, clothoid; profile segments alternate
/// line and CIVIL3D-style polynomial.
fn generate_step(alignments: usize, segments: usize) -> String {
    let mut out = String::from(
        "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC4X3_ADD2'));\nENDSEC;\nDATA;\n",
    );
    let mut id = 1u32;
    let mut next = || {
        id += 1;
        id
    };

    let origin = next();
    let x_axis = next();
    let frame = next();
    let line = next();
    let circle = next();
    let clothoid = next();
    let polynomial = next();
    let _ = writeln!(out, "#{}=IFCCARTESIANPOINT((0.,0.));", origin);
    let _ = writeln!(out, "#{}=IFCDIRECTION((1.,0.));", x_axis);
    let _ = writeln!(out, "#{}=IFCAXIS2PLACEMENT2D(#{},#{});", frame, origin, x_axis);
    let _ = writeln!(out, "#{}=IFCLINE(#{},$);", line, origin);
    let _ = writeln!(out, "#{}=IFCCIRCLE(#{},450.);", circle, frame);
    let _ = writeln!(out, "#{}=IFCCLOTHOID(#{},180.);", clothoid, frame);
    let _ = writeln!(
        out,
        "#{}=IFCPOLYNOMIALCURVE(#{},(0.,1.),(52.3,0.012,-0.00004),$);",
        polynomial, frame
    );

    for _ in 0..alignments {
        let mut plan = Vec::with_capacity(segments);
        let mut profile = Vec::with_capacity(segments);
        for i in 0..segments {
            let distance = i as f64 * 60.0;

            let point = next();
            let placement = next();
            let segment = next();
            let parent = [line, circle, clothoid][i % 3];
            let _ = writeln!(
                out,
                "#{}=IFCCARTESIANPOINT(({:.1},{:.1}));",
                point,
                distance,
                i as f64,
            );
            let _ = writeln!(out, "#{}=IFCAXIS2PLACEMENT2D(#{},#{});", placement, point, x_axis);
            let _ = writeln!(
                out,
                "#{}=IFCCURVESEGMENT(.CONTINUOUS.,#{},IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(60.),#{});",
                segment, placement, parent
            );
            plan.push(segment);

            let point = next();
            let placement = next();
            let segment = next();
            let parent = if i % 2 == 0 { line } else { polynomial };
            let _ = writeln!(out, "#{}=IFCCARTESIANPOINT(({:.1},52.3));", point, distance);
            let _ = writeln!(out, "#{}=IFCAXIS2PLACEMENT2D(#{},#{});", placement, point, x_axis);
            let _ = writeln!(
                out,
                "#{}=IFCCURVESEGMENT(.CONTINUOUS.,#{},IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(60.),#{});",
                segment, placement, parent
            );
            profile.push(segment);
        }

        let refs = |ids: &[u32]| {
            ids.iter()
                .map(|id| format!("#{}", id))
                .collect::<Vec<_>>()
                .join(",")
        };
        let base = next();
        let gradient = next();
        let axis = next();
        let gradient_rep = next();
        let shape = next();
        let alignment = next();
        let _ = writeln!(out, "#{}=IFCCOMPOSITECURVE(({}),.F.);", base, refs(&plan));
        let _ = writeln!(
            out,
            "#{}=IFCGRADIENTCURVE(({}),.F.,#{},$);",
            gradient,
            refs(&profile),
            base,
        );
        let _ = writeln!(out, "#{}=IFCSHAPEREPRESENTATION($,'Axis','Curve2D',(#{}));", axis, base);
        let _ = writeln!(
            out,
            "#{}=IFCSHAPEREPRESENTATION($,'Axis','Curve3D',(#{}));",
            gradient_rep,
            gradient,
        );
        let _ = writeln!(
            out,
            "#{}=IFCPRODUCTDEFINITIONSHAPE($,$,(#{},#{}));",
            shape,
            axis,
            gradient_rep,
        );
        let _ = writeln!(
            out,
            "#{}=IFCALIGNMENT('0Bench{:016}',$,'Bench {}',$,$,$,#{},$);",
            alignment, alignment, alignment, shape
        );
    }

    out.push_str("ENDSEC;\nEND-ISO-10303-21;\n");
    out
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for (alignments, segments) in [(1, 50), (10, 50), (10, 500)] {
        let content = generate_step(alignments, segments);
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", alignments, segments)),
            &content,
            |b, content| b.iter(|| EntityGraph::from_step(black_box(content))),
        );
    }
    group.finish();
}

fn bench_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_report");
    let graph = EntityGraph::from_step(&generate_step(1, 200));
    let id = AlignmentAnalyzer::new(&graph).list_alignments()[0].id;

    for budget in [100, 1_000, 10_000] {
        let analyzer = AlignmentAnalyzer::with_config(
            &graph,
            AnalysisConfig::default().with_point_budget(budget),
        );
        group.bench_with_input(BenchmarkId::new("budget", budget), &analyzer, |b, analyzer| {
            b.iter(|| analyzer.build_report(black_box(id)))
        });
    }
    group.finish();
}

fn bench_all_reports(c: &mut Criterion) {
    let graph = EntityGraph::from_step(&generate_step(32, 100));
    let analyzer = AlignmentAnalyzer::new(&graph);
    c.bench_function("build_all_reports/32x100", |b| b.iter(|| analyzer.build_all_reports()));
}

criterion_group!(benches, bench_decode, bench_report, bench_all_reports);
criterion_main!(benches);

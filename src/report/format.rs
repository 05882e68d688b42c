//! Formatted terminal output.
//!
//! Formatting lives here so the model code stays free of presentation and
//! output changes are localized.

use crate::correlate::BiozoneTie;
use crate::domain::ControlPointSequence;
use crate::io::HiatusRunFile;
use crate::report::SectionReport;

/// Format the `build` summary for every section.
pub fn format_build_summary(reports: &[SectionReport]) -> String {
    let mut out = String::new();

    out.push_str("=== strat-age - Age Models ===\n");
    let aged = reports.iter().filter(|r| r.error.is_none()).count();
    out.push_str(&format!("Sections: {} ({} aged)\n", reports.len(), aged));

    for r in reports {
        out.push('\n');
        out.push_str(&format_section(r));
    }

    out
}

fn format_section(r: &SectionReport) -> String {
    let mut out = String::new();

    let tag = if r.is_reference { " (reference)" } else { "" };
    out.push_str(&format!("[{}]{tag}\n", r.name));
    out.push_str(&format!(
        "Rows: n={} | with height={} | height={}\n",
        r.rows,
        r.rows_with_height,
        fmt_range(r.height_range)
    ));

    if let Some(err) = &r.error {
        out.push_str(&format!("Not aged: {err}\n"));
        return out;
    }

    out.push_str(&format!("Ages: {}\n", fmt_range(r.age_range)));

    out.push_str("Control points:\n");
    for cp in &r.control_points {
        out.push_str(&format!("- h={:>10.3}  age={:>10.4}\n", cp.height, cp.age));
    }

    if !r.sedimentation_rates.is_empty() {
        out.push_str("Sedimentation rates (age/height):\n");
        for s in &r.sedimentation_rates {
            out.push_str(&format!(
                "- [{:.3}, {:.3}]  {:.6}\n",
                s.from_height, s.to_height, s.rate
            ));
        }
    }

    if !r.biozone_ages.is_empty() {
        out.push_str("Biozone ages:\n");
        for (marker, age) in &r.biozone_ages {
            out.push_str(&format!("- {:<28} {:>10.4}\n", truncate(marker, 28), age));
        }
    }

    out
}

/// Format the tie table and resulting control points for one target section.
pub fn format_ties(target: &str, reference: &str, ties: &[BiozoneTie], cps: &ControlPointSequence) -> String {
    let mut out = String::new();

    out.push_str(&format!("Correlation: '{target}' against reference '{reference}'\n"));
    out.push_str(
        format!(
            "{:<24} {:>10} {:>6} {:>10} {:>10} {:>10}\n",
            "marker", "ref_event", "row", "ref_h", "age", "target_h"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<24} {:-<10} {:-<6} {:-<10} {:-<10} {:-<10}\n",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for t in ties {
        out.push_str(
            format!(
                "{:<24} {:>10.3} {:>6} {:>10.3} {:>10.4} {:>10.3}\n",
                truncate(&t.marker, 24),
                t.reference_event_height,
                t.reference_row,
                t.reference_height,
                t.age,
                t.target_height,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out.push_str(&format!("\nControl points: {}\n", fmt_points(cps)));
    out
}

/// Format a hiatus run's settings and summary statistics.
pub fn format_hiatus_summary(run: &HiatusRunFile) -> String {
    let s = &run.summary;
    let mut out = String::new();

    out.push_str("=== strat-age - Hiatus Estimate ===\n");
    out.push_str(&format!(
        "Gap: '{}' row {} -> '{}' row {}\n",
        run.lower_section, run.lower_sample, run.upper_section, run.upper_sample
    ));
    out.push_str(&format!(
        "Draws: {} accepted | {} rejected | {} requested | seed={}\n",
        s.n, run.rejected, run.iterations, run.seed
    ));
    out.push_str(&format!("Mean   : {:.4}\n", s.mean));
    out.push_str(&format!("Median : {:.4}\n", s.median));
    out.push_str(&format!("Std dev: {:.4}\n", s.std_dev));
    out.push_str(&format!("5-95%  : [{:.4}, {:.4}]\n", s.p05, s.p95));
    out.push_str(&format!("Range  : [{:.4}, {:.4}]\n", s.min, s.max));

    out
}

fn fmt_range(r: Option<(f64, f64)>) -> String {
    match r {
        Some((lo, hi)) => format!("[{lo:.3}, {hi:.3}]"),
        None => "n/a".to_string(),
    }
}

fn fmt_points(cps: &ControlPointSequence) -> String {
    let parts: Vec<String> = cps
        .points()
        .iter()
        .map(|p| format!("({:.3}, {:.4})", p.height, p.age))
        .collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ControlPoint;

    #[test]
    fn tie_table_layout() {
        let ties = vec![BiozoneTie {
            marker: "G. texanus".to_string(),
            reference_event_height: 5.0,
            reference_row: 1,
            reference_height: 4.0,
            age: 96.0,
            target_height: 2.0,
        }];
        let cps = ControlPointSequence::from_pairs(&[(2.0, 96.0), (30.0, 84.0)]).unwrap();
        let txt = format_ties("tgt", "ref", &ties, &cps);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "Correlation: 'tgt' against reference 'ref'");
        assert!(lines[1].starts_with("marker"));
        assert!(lines[2].starts_with("-----"));
        assert_eq!(
            lines[3],
            "G. texanus                    5.000      1      4.000    96.0000      2.000"
        );
        assert_eq!(lines[5], "Control points: [(2.000, 96.0000), (30.000, 84.0000)]");
    }

    #[test]
    fn failed_sections_skip_model_details() {
        let report = SectionReport {
            name: "lonely".to_string(),
            is_reference: false,
            rows: 1,
            rows_with_height: 1,
            height_range: Some((0.0, 0.0)),
            age_range: None,
            control_points: Vec::new(),
            sedimentation_rates: Vec::new(),
            biozone_ages: Vec::new(),
            error: Some("too few markers".to_string()),
        };
        let txt = format_build_summary(&[report]);
        assert!(txt.contains("Sections: 1 (0 aged)"));
        assert!(txt.contains("[lonely]\n"));
        assert!(txt.contains("Not aged: too few markers"));
        assert!(!txt.contains("Control points"));
    }

    #[test]
    fn section_block_lists_control_points() {
        let report = SectionReport {
            name: "ref".to_string(),
            is_reference: true,
            rows: 2,
            rows_with_height: 2,
            height_range: Some((0.0, 4.0)),
            age_range: Some((96.0, 100.0)),
            control_points: vec![ControlPoint::new(0.0, 100.0), ControlPoint::new(4.0, 96.0)],
            sedimentation_rates: Vec::new(),
            biozone_ages: vec![("A".to_string(), 96.0)],
            error: None,
        };
        let txt = format_build_summary(&[report]);
        assert!(txt.contains("[ref] (reference)\n"));
        assert!(txt.contains("Ages: [96.000, 100.000]"));
        assert!(txt.contains("- h=     0.000  age=  100.0000\n"));
        assert!(txt.contains("Biozone ages:\n"));
    }
}

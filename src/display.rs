use chrono::{DateTime, SecondsFormat, Utc};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use crate::stats::{TrialResult, format_ms, improvement_percent};
use crate::types::{AccelerationMode, Target};

const RULE_WIDTH: usize = 80;

/// A target together with its measured result.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub target: Target,
    pub result: TrialResult,
}

impl Measurement {
    pub fn new(target: Target, result: TrialResult) -> Self {
        Measurement { target, result }
    }
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// "12.34% faster" / "5.00% slower", or "n/a" when undefined.
pub fn describe_improvement(pct: Option<f64>) -> String {
    match pct {
        Some(p) if p > 0.0 => format!("{}% faster", format_ms(p)),
        Some(p) => format!("{}% slower", format_ms(p)),
        None => "n/a".to_string(),
    }
}

fn improvement_vs(baseline: &Measurement, candidate: &Measurement) -> Option<f64> {
    improvement_percent(baseline.result.average, candidate.result.average)
}

fn heading(text: &str) -> String {
    text.if_supports_color(Stream::Stdout, |s| s.bold())
        .to_string()
}

/// Title block printed before any measurement starts.
pub fn format_banner(title: &str) -> String {
    format!("{}\n{}\n{}\n", rule(), heading(title), rule())
}

pub fn format_measuring(label: &str) -> String {
    format!(
        "\n{} {}...",
        "Measuring".if_supports_color(Stream::Stdout, |s| s.cyan()),
        label
    )
}

pub fn format_trial_progress(iteration: usize, runs: usize) -> String {
    format!("  Run {}/{}", iteration, runs)
}

/// Pipe-delimited comparison table. The first measurement is the baseline;
/// the improvement column compares the last measurement against it.
pub fn format_table(measurements: &[Measurement]) -> String {
    let Some(baseline) = measurements.first() else {
        return String::new();
    };
    let last = measurements.last().unwrap_or(baseline);

    let mut headers = vec!["Metric".to_string()];
    for (i, m) in measurements.iter().enumerate() {
        if i == 0 {
            headers.push(format!("Before ({})", m.target.label));
        } else {
            headers.push(format!("After ({})", m.target.label));
        }
    }
    headers.push("Improvement".to_string());

    let improvement = if measurements.len() > 1 {
        describe_improvement(improvement_vs(baseline, last))
    } else {
        "-".to_string()
    };

    let rows = vec![
        stat_row("Build Time (ms)", measurements, |r| r.average, improvement),
        stat_row("Min Time (ms)", measurements, |r| r.minimum, "-".to_string()),
        stat_row("Max Time (ms)", measurements, |r| r.maximum, "-".to_string()),
    ];

    let widths: Vec<usize> = (0..headers.len())
        .map(|col| {
            rows.iter()
                .map(|r| r[col].chars().count())
                .chain(std::iter::once(headers[col].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let numeric = |col: usize| col > 0 && col < headers.len() - 1;

    let mut out = String::new();
    push_row(&mut out, &headers, &widths, |_| false);
    out.push('|');
    for w in &widths {
        out.push_str(&"-".repeat(w + 2));
        out.push('|');
    }
    out.push('\n');
    for r in &rows {
        push_row(&mut out, r, &widths, numeric);
    }
    out
}

fn stat_row(
    name: &str,
    measurements: &[Measurement],
    pick: impl Fn(&TrialResult) -> f64,
    extra: String,
) -> Vec<String> {
    let mut cells = vec![name.to_string()];
    cells.extend(measurements.iter().map(|m| format_ms(pick(&m.result))));
    cells.push(extra);
    cells
}

fn push_row(
    out: &mut String,
    cells: &[String],
    widths: &[usize],
    right_align: impl Fn(usize) -> bool,
) {
    out.push('|');
    for (col, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if right_align(col) {
            out.push_str(&format!(" {:>width$} |", cell, width = width));
        } else {
            out.push_str(&format!(" {:<width$} |", cell, width = width));
        }
    }
    out.push('\n');
}

/// Per-target sample lists and improvements.
pub fn format_details(measurements: &[Measurement]) -> String {
    let Some(baseline) = measurements.first() else {
        return String::new();
    };

    let mut out = String::new();
    for (i, m) in measurements.iter().enumerate() {
        let times: Vec<String> = m.result.samples.iter().map(|s| format_ms(*s)).collect();
        out.push_str(&format!("\n{}:\n", heading(&m.target.label)));
        out.push_str(&format!("  Times: [{}] ms\n", times.join(", ")));
        if i > 0 {
            let improvement = describe_improvement(improvement_vs(baseline, m));
            let colored = match improvement_vs(baseline, m) {
                Some(p) if p > 0.0 => improvement
                    .if_supports_color(Stream::Stdout, |s| s.green())
                    .to_string(),
                Some(_) => improvement
                    .if_supports_color(Stream::Stdout, |s| s.red())
                    .to_string(),
                None => improvement,
            };
            out.push_str(&format!("  Improvement: {}\n", colored));
        }
    }
    out
}

/// Full text report: results table followed by detailed results.
pub fn format_report(measurements: &[Measurement], runs: usize) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format_banner(&format!(
        "BENCHMARK RESULTS (Average of {} runs)",
        runs
    )));
    out.push('\n');
    out.push_str(&format_table(measurements));
    out.push('\n');
    out.push_str(&format_banner("DETAILED RESULTS"));
    out.push_str(&format_details(measurements));
    out.push('\n');
    out.push_str(&rule());
    out.push('\n');
    out
}

#[derive(Serialize)]
struct JsonReport {
    generated_at: String,
    runs: usize,
    targets: Vec<JsonTarget>,
}

#[derive(Serialize)]
struct JsonTarget {
    label: String,
    command: String,
    acceleration: Option<AccelerationMode>,
    samples_ms: Vec<f64>,
    average_ms: f64,
    min_ms: f64,
    max_ms: f64,
    improvement_percent: Option<f64>,
}

pub fn format_json(measurements: &[Measurement], runs: usize, now: DateTime<Utc>) -> String {
    let baseline = measurements.first();
    let targets = measurements
        .iter()
        .enumerate()
        .map(|(i, m)| JsonTarget {
            label: m.target.label.clone(),
            command: m.target.command.clone(),
            acceleration: m.target.acceleration,
            samples_ms: m.result.samples.clone(),
            average_ms: m.result.average,
            min_ms: m.result.minimum,
            max_ms: m.result.maximum,
            improvement_percent: match baseline {
                Some(b) if i > 0 => improvement_vs(b, m),
                _ => None,
            },
        })
        .collect();

    let report = JsonReport {
        generated_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        runs,
        targets,
    };
    serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
}

use std::io::Write;

use serde::Serialize;

use crate::simulation::{GenerationOutcome, Termination};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MetricAggregator {
    samples: Vec<f64>,
    sum: f64,
    min: f64,
    max: f64,
}

impl MetricAggregator {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.samples.push(value);
    }

    pub fn summary(&self) -> MetricSummary {
        if self.samples.is_empty() {
            return MetricSummary::default();
        }

        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        MetricSummary {
            count: self.samples.len(),
            min: self.min,
            max: self.max,
            mean: self.sum / self.samples.len() as f64,
            p50: percentile_nearest_rank(&sorted, 0.50),
            p90: percentile_nearest_rank(&sorted, 0.90),
        }
    }
}

fn percentile_nearest_rank(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let p = p.clamp(0.0, 1.0);
    let rank = ((p * sorted.len() as f64).ceil() as usize).saturating_sub(1);
    sorted[rank.min(sorted.len() - 1)]
}

/// One JSON line per evaluated generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub generation: u64,
    pub ticks: u32,
    pub termination: Termination,
    pub survivors: usize,
    pub best_agent: Option<usize>,
    pub fitness_summary: MetricSummary,
    pub fitness: Vec<f32>,
}

impl GenerationReport {
    pub fn from_outcome(outcome: &GenerationOutcome) -> Self {
        let mut agg = MetricAggregator::new();
        for (_, f) in &outcome.fitness {
            agg.push(*f as f64);
        }
        Self {
            generation: outcome.generation,
            ticks: outcome.ticks,
            termination: outcome.termination,
            survivors: outcome.alive,
            best_agent: outcome.best().map(|(idx, _)| idx),
            fitness_summary: agg.summary(),
            fitness: outcome.fitness.iter().map(|(_, f)| *f).collect(),
        }
    }

    pub fn write_json_line(&self, out: &mut impl Write) -> std::io::Result<()> {
        serde_json::to_writer(&mut *out, self)?;
        out.write_all(b"\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_summary_is_reasonable() {
        let mut agg = MetricAggregator::new();
        for i in 1..=100 {
            agg.push(i as f64);
        }
        let s = agg.summary();
        assert_eq!(s.count, 100);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 100.0);
        assert!((s.mean - 50.5).abs() < 1e-6);
        assert_eq!(s.p50, 50.0);
        assert_eq!(s.p90, 90.0);
    }

    #[test]
    fn empty_aggregator_summarises_to_zero() {
        assert_eq!(MetricAggregator::new().summary(), MetricSummary::default());
    }

    #[test]
    fn report_serialises_as_single_json_line() {
        let outcome = GenerationOutcome {
            generation: 7,
            ticks: 42,
            termination: Termination::AllEliminated,
            alive: 0,
            fitness: vec![(0, 1.5), (1, 4.0), (2, 0.0)],
            agents: Vec::new(),
        };
        let report = GenerationReport::from_outcome(&outcome);
        assert_eq!(report.best_agent, Some(1));
        assert_eq!(report.fitness_summary.max, 4.0);

        let mut buf = Vec::new();
        report.write_json_line(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["generation"], 7);
        assert_eq!(value["termination"], "AllEliminated");
        assert_eq!(value["fitness"].as_array().unwrap().len(), 3);
    }
}

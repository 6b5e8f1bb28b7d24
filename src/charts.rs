use crate::balance::{Calculations, FaseBreakdown};
use crate::grouping::ContraidoGroup;
use serde::{Deserialize, Serialize};

pub const COLOR_POSITIVE: &str = "#10b981";
pub const COLOR_VALID_NEGATIVE: &str = "#3b82f6";
pub const COLOR_INVALID: &str = "#ef4444";

/// Contraídos shown in the top-balance series.
pub const TOP_CONTRAIDOS_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ChartPoint {
    fn new(label: &str, value: f64, color: Option<&str>) -> Self {
        Self {
            label: label.to_string(),
            value,
            color: color.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub chart_type: String,
    pub title: String,
    pub data: Vec<ChartPoint>,
}

impl ChartSeries {
    fn new(chart_type: &str, title: &str, data: Vec<ChartPoint>) -> Self {
        Self {
            chart_type: chart_type.to_string(),
            title: title.to_string(),
            data,
        }
    }
}

/// The three presentation-ready series of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub fase_distribution: ChartSeries,
    pub balance_summary: ChartSeries,
    pub top_contraidos: ChartSeries,
}

/// Derives the chart series from already-computed aggregates. No business
/// logic is recomputed here.
pub fn build_chart_data(
    breakdown: &FaseBreakdown,
    calculations: &Calculations,
    groups: &[ContraidoGroup],
) -> ChartData {
    let has_operations = breakdown.arqueo.count + breakdown.cargo.count > 0;

    let fase_points = if has_operations {
        vec![
            ChartPoint::new(
                "Arqueo (AINP)",
                breakdown.arqueo.count as f64,
                Some(COLOR_POSITIVE),
            ),
            ChartPoint::new(
                "Cargo (M;P)",
                breakdown.cargo.count as f64,
                Some(COLOR_VALID_NEGATIVE),
            ),
        ]
    } else {
        Vec::new()
    };
    let fase_distribution = ChartSeries::new("pie", "Distribution by phase", fase_points);

    let balance_points = if has_operations {
        let net_color = if calculations.net_balance >= 0.0 {
            COLOR_POSITIVE
        } else {
            COLOR_INVALID
        };
        vec![
            ChartPoint::new(
                "Total arqueo",
                calculations.total_arqueo_positive,
                Some(COLOR_POSITIVE),
            ),
            ChartPoint::new(
                "Valid cargo",
                calculations.total_cargo_negative,
                Some(COLOR_VALID_NEGATIVE),
            ),
            ChartPoint::new(
                "Invalid cargo",
                calculations.total_cargo_invalid,
                Some(COLOR_INVALID),
            ),
            ChartPoint::new("Net balance", calculations.net_balance, Some(net_color)),
        ]
    } else {
        Vec::new()
    };
    let balance_summary = ChartSeries::new("bar", "Balance summary", balance_points);

    let mut ranked: Vec<&ContraidoGroup> = groups.iter().collect();
    ranked.sort_by(|a, b| {
        b.net_balance
            .abs()
            .total_cmp(&a.net_balance.abs())
            .then_with(|| a.contraido_id.cmp(&b.contraido_id))
    });
    let top_contraidos = ChartSeries::new(
        "bar",
        "Top contraídos by balance",
        ranked
            .into_iter()
            .take(TOP_CONTRAIDOS_LIMIT)
            .map(|g| ChartPoint::new(&g.contraido_id, g.net_balance, None))
            .collect(),
    );

    ChartData {
        fase_distribution,
        balance_summary,
        top_contraidos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::{compute_calculations, compute_fase_breakdown, compute_group_totals};
    use crate::grouping::partition_by_contraido;
    use crate::model::{Operation, Phase};

    fn op(number: i64, phase: Phase, status: Option<i64>, amount: f64, id: &str) -> Operation {
        Operation {
            operation_number: number,
            year: 2024,
            application_code: 100,
            phase,
            status,
            amount,
            cost_center: 570,
            date: String::new(),
            third_party: String::new(),
            description: String::new(),
            contraido_id: Some(id.to_string()),
            is_valid: false,
        }
    }

    fn charts_for(ops: &[Operation]) -> ChartData {
        let mut grouped = partition_by_contraido(ops);
        compute_group_totals(&mut grouped);
        let breakdown = compute_fase_breakdown(&grouped);
        let calcs = compute_calculations(&breakdown);
        build_chart_data(&breakdown, &calcs, &grouped.groups)
    }

    #[test]
    fn test_fase_distribution_counts() {
        let charts = charts_for(&[
            op(1, Phase::Arqueo, None, 100.0, "C1"),
            op(2, Phase::Cargo, Some(4), -40.0, "C1"),
            op(3, Phase::Cargo, Some(2), -10.0, "C1"),
        ]);

        assert_eq!(charts.fase_distribution.chart_type, "pie");
        assert_eq!(charts.fase_distribution.data[0].value, 1.0);
        assert_eq!(charts.fase_distribution.data[1].value, 2.0);
    }

    #[test]
    fn test_balance_summary_colors() {
        let charts = charts_for(&[
            op(1, Phase::Arqueo, None, 30.0, "C1"),
            op(2, Phase::Cargo, Some(4), -50.0, "C1"),
        ]);

        let net = &charts.balance_summary.data[3];
        assert_eq!(net.label, "Net balance");
        assert_eq!(net.value, -20.0);
        assert_eq!(net.color.as_deref(), Some(COLOR_INVALID));
    }

    #[test]
    fn test_top_contraidos_ordering_and_ties() {
        let charts = charts_for(&[
            op(1, Phase::Arqueo, None, 50.0, "B"),
            op(2, Phase::Arqueo, None, 50.0, "A"),
            op(3, Phase::Arqueo, None, 200.0, "C"),
            op(4, Phase::Cargo, Some(4), -90.0, "D"),
        ]);

        let labels: Vec<&str> = charts
            .top_contraidos
            .data
            .iter()
            .map(|p| p.label.as_str())
            .collect();
        // C (200) first, D (|-90|) next, then the 50/50 tie broken by id.
        assert_eq!(labels, vec!["C", "D", "A", "B"]);
    }

    #[test]
    fn test_top_contraidos_limit() {
        let ops: Vec<Operation> = (0..15)
            .map(|i| op(i, Phase::Arqueo, None, i as f64 + 1.0, &format!("C{i:02}")))
            .collect();
        let charts = charts_for(&ops);

        assert_eq!(charts.top_contraidos.data.len(), TOP_CONTRAIDOS_LIMIT);
    }

    #[test]
    fn test_empty_input_series_are_empty() {
        let charts = charts_for(&[]);
        assert!(charts.top_contraidos.data.is_empty());
        assert!(charts.fase_distribution.data.is_empty());
        assert!(charts.balance_summary.data.is_empty());
    }
}

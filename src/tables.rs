use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::{comparison::ComparisonRow, consistency::Finding, tax::TaxTable},
    fmt::FormattedPrice,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

/// Market price cell, green when it beats the official price.
fn market_cell(market: Option<f64>, official: Option<f64>) -> Cell {
    let cell = Cell::new(FormattedPrice(market)).set_alignment(CellAlignment::Right);
    match (market, official) {
        (Some(market), Some(official)) if market < official => cell.fg(Color::Green),
        (Some(_), Some(_)) => cell.fg(Color::Red),
        _ => cell,
    }
}

pub fn build_comparison_table(rows: &[ComparisonRow]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Month", "CBS stroom", "ANWB stroom", "CBS gas", "ANWB gas"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(row.month.label()).add_attribute(Attribute::Dim),
            Cell::new(FormattedPrice(row.cbs_electricity)).set_alignment(CellAlignment::Right),
            market_cell(row.anwb_electricity, row.cbs_electricity),
            Cell::new(FormattedPrice(row.cbs_gas)).set_alignment(CellAlignment::Right),
            market_cell(row.anwb_gas, row.cbs_gas),
        ]);
    }
    table
}

pub fn build_rates_table(tax_table: &TaxTable) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Month", "Electricity", "Tax", "Total", "Gas", "Tax", "Total"]);
    for rate in tax_table.rates() {
        let mut row = vec![Cell::new(rate.period).add_attribute(Attribute::Dim)];
        for tariff in [rate.electricity, rate.gas] {
            let [base_rate, energy_tax, total] = tariff.map_or([None; 3], |tariff| {
                [Some(tariff.base_rate), Some(tariff.energy_tax), Some(tariff.total)]
            });
            row.extend([
                Cell::new(FormattedPrice(base_rate)).set_alignment(CellAlignment::Right),
                Cell::new(FormattedPrice(energy_tax))
                    .set_alignment(CellAlignment::Right)
                    .add_attribute(Attribute::Dim),
                Cell::new(FormattedPrice(total)).set_alignment(CellAlignment::Right),
            ]);
        }
        table.add_row(row);
    }
    table
}

pub fn build_findings_table(findings: &[Finding]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["List", "Finding"]);
    for finding in findings {
        table.add_row(vec![Cell::new(finding.list()), Cell::new(finding).fg(Color::Red)]);
    }
    table
}

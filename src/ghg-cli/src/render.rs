// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::io::Write;

use anyhow::Result;

use ghg_engine::summary::SummaryTable;
use ghg_engine::{Calculator, Contribution, Sign};

/// What gets printed for one restored snapshot.
pub struct Report {
    pub source: String,
    pub industry: String,
    pub name: String,
    pub breakdown: Vec<Contribution>,
    pub total: f64,
    pub needs_factor: Vec<String>,
}

impl Report {
    pub fn new(source: String, calc: &Calculator) -> Report {
        Report {
            source,
            industry: calc.industry().to_owned(),
            name: calc.schema().name.clone(),
            breakdown: calc.breakdown(),
            total: calc.grand_total(),
            needs_factor: calc
                .entities_needing_factors()
                .map(|e| {
                    let factors: Vec<&str> = e.needs_factor.iter().map(|f| f.as_str()).collect();
                    format!("{} {} ({})", e.id, e.name, factors.join(", "))
                })
                .collect(),
        }
    }
}

pub fn sign_symbol(sign: Sign) -> char {
    match sign {
        Sign::Additive => '+',
        Sign::Subtractive => '-',
    }
}

// sums of nothing come out as -0.0
fn clean(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

pub fn table(out: &mut dyn Write, reports: &[Report], summary: &SummaryTable) -> Result<()> {
    for report in reports.iter() {
        writeln!(out, "{}: {} ({})", report.source, report.name, report.industry)?;
        for c in report.breakdown.iter() {
            writeln!(
                out,
                "    {} {:<24} {:>16.3} x {:<10.6} = {:>16.3}",
                sign_symbol(c.sign),
                c.category_key,
                clean(c.category_total),
                c.conversion_factor,
                clean(c.weighted)
            )?;
        }
        writeln!(out, "    {:<26} {:>47.3}", "total tCO2e", clean(report.total))?;
        for entity in report.needs_factor.iter() {
            writeln!(out, "    needs factor: {entity}")?;
        }
        writeln!(out)?;
    }

    writeln!(out, "summary")?;
    for (industry, total) in summary.by_industry() {
        writeln!(out, "    {:<26} {:>16.3}", industry, clean(total))?;
    }
    writeln!(out, "    {:<26} {:>16.3}", "all industries", clean(summary.total()))?;
    Ok(())
}

pub fn csv(out: &mut dyn Write, reports: &[Report]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "source",
        "industry",
        "category",
        "category_total",
        "conversion_factor",
        "sign",
        "weighted",
    ])?;
    for report in reports.iter() {
        for c in report.breakdown.iter() {
            writer.write_record([
                report.source.as_str(),
                report.industry.as_str(),
                c.category_key.as_str(),
                &clean(c.category_total).to_string(),
                &c.conversion_factor.to_string(),
                &sign_symbol(c.sign).to_string(),
                &clean(c.weighted).to_string(),
            ])?;
        }
        writer.write_record([
            report.source.as_str(),
            report.industry.as_str(),
            "total",
            "",
            "",
            "",
            &clean(report.total).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghg_engine::{Month, ReferenceTables};

    fn cement_report() -> Report {
        let mut calc = Calculator::for_profile("cement", ReferenceTables::builtin()).unwrap();
        let row = calc.add_child(None, "limestone").unwrap();
        let jan = Month::new(1).unwrap();
        calc.set_value(row, "consumption", jan, 10.0).unwrap();
        calc.set_value(row, "purity", jan, 100.0).unwrap();
        calc.add_custom_child(None, "electricity", "Site grid", &[])
            .unwrap();
        Report::new("plant.json".to_owned(), &calc)
    }

    #[test]
    fn csv_has_one_row_per_rule_and_a_total() {
        let mut buf = vec![];
        csv(&mut buf, &[cement_report()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<Vec<&str>> = text.lines().map(|l| l.split(',').collect()).collect();
        // header, four rules, total
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0][2], "category");
        assert_eq!(lines[2][..3], ["plant.json", "cement", "carbonate"]);
        assert_eq!(lines[2][5], "+");
        let weighted: f64 = lines[2][6].parse().unwrap();
        assert!((weighted - 4.397).abs() < 1e-9);
        assert_eq!(lines[4][2], "exported_electricity");
        assert_eq!(lines[4][5], "-");
        assert_eq!(lines[5][2], "total");
        let total: f64 = lines[5][6].parse().unwrap();
        assert!((total - 4.397).abs() < 1e-9);
        assert_eq!(lines[1][3], "0");
    }

    #[test]
    fn table_lists_entities_needing_factors() {
        let summary = SummaryTable::new();
        let mut buf = vec![];
        table(&mut buf, &[cement_report()], &summary).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("plant.json: Cement (cement)"));
        assert!(text.contains("needs factor: #1 Site grid (emission_factor)"));
        assert!(!text.contains("-0.000"));
    }
}

//! Typst report generation.
//!
//! Orchestrates placeholder resolution: reads a Typst template (either the
//! built-in default or a custom file via `template_path`), resolves all
//! `{{PLACEHOLDER}}` markers by calling helpers from `chart_svg` and `tables`,
//! and writes the final `.typ` file.

pub mod chart_svg;
pub mod default_template;
pub mod tables;

use std::fs;

use crate::domain::error::LabError;
use crate::domain::labeling::LabeledRun;
use crate::domain::labeling_config::LabelingConfig;
use crate::domain::metrics::LabelMetrics;
use crate::ports::report_port::ReportPort;

/// Context for resolving template placeholders.
pub struct ReportContext<'a> {
    pub run: &'a LabeledRun,
    pub metrics: &'a LabelMetrics,
    pub config: &'a LabelingConfig,
    pub strategy: &'a str,
}

/// Resolve all `{{PLACEHOLDER}}`s in the given template string and return
/// the final Typst markup ready to be written to a `.typ` file.
pub fn resolve(template: &str, ctx: &ReportContext) -> String {
    let mut output = template.to_string();

    let summary = tables::render_run_summary(ctx.run, ctx.config, ctx.strategy);
    output = output.replace("{{RUN_SUMMARY}}", &summary);

    let metrics_table = tables::render_metrics_table(ctx.metrics);
    output = output.replace("{{METRICS_TABLE}}", &metrics_table);

    let breakdown = tables::render_exit_breakdown(ctx.metrics);
    output = output.replace("{{EXIT_BREAKDOWN}}", &breakdown);

    let curve: Vec<_> = ctx
        .run
        .bars
        .iter()
        .filter_map(|b| b.cumulative_pnl.map(|v| (b.timestamp, v)))
        .collect();
    let pnl_svg = chart_svg::generate_pnl_svg(&curve);
    let pnl_typst = if pnl_svg.is_empty() {
        "_Not enough realized trades for a PnL chart._".to_string()
    } else {
        format!(
            "#image(bytes(\n\"{}\"),\n  format: \"svg\",\n  width: 100%,\n)",
            pnl_svg.replace('\\', "\\\\").replace('"', "\\\"")
        )
    };
    output = output.replace("{{PNL_CHART_SVG}}", &pnl_typst);

    let trade_log = tables::render_trade_log(&ctx.run.bars);
    output = output.replace("{{TRADE_LOG}}", &trade_log);

    output
}

/// Writes a Typst report for a labeling run.
pub struct TypstReportAdapter {
    template_path: Option<String>,
    strategy: String,
}

impl TypstReportAdapter {
    pub fn new(template_path: Option<String>, strategy: impl Into<String>) -> Self {
        Self {
            template_path,
            strategy: strategy.into(),
        }
    }

    fn load_template(&self) -> Result<String, LabError> {
        match &self.template_path {
            Some(path) => fs::read_to_string(path).map_err(|e| LabError::ConfigInvalid {
                section: "report".to_string(),
                key: "template_path".to_string(),
                reason: format!("failed to read {}: {}", path, e),
            }),
            None => Ok(default_template::template().to_string()),
        }
    }
}

impl ReportPort for TypstReportAdapter {
    fn write(
        &self,
        run: &LabeledRun,
        metrics: &LabelMetrics,
        config: &LabelingConfig,
        output_path: &str,
    ) -> Result<(), LabError> {
        let template = self.load_template()?;
        let ctx = ReportContext {
            run,
            metrics,
            config,
            strategy: &self.strategy,
        };
        fs::write(output_path, resolve(&template, &ctx))?;
        log::info!("wrote Typst report to {}", output_path);
        Ok(())
    }
}

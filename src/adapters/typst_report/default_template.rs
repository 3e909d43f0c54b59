//! Default Typst report template.
//!
//! Built-in Typst report markup with `{{PLACEHOLDER}}` substitution.
//! Recognised placeholders: `RUN_SUMMARY`, `METRICS_TABLE`,
//! `EXIT_BREAKDOWN`, `PNL_CHART_SVG`, `TRADE_LOG`.

const TEMPLATE: &str = r#"#set page(paper: "a4", margin: 2cm)
#set text(size: 10pt)
#set table(stroke: 0.5pt + gray, inset: 5pt)

= Triple-Barrier Labeling Report

== Run

{{RUN_SUMMARY}}

== Metrics

{{METRICS_TABLE}}

== Exit Breakdown

{{EXIT_BREAKDOWN}}

== Cumulative PnL

{{PNL_CHART_SVG}}

#pagebreak()

== Trade Log

{{TRADE_LOG}}
"#;

pub fn template() -> &'static str {
    TEMPLATE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_has_every_placeholder() {
        for name in [
            "RUN_SUMMARY",
            "METRICS_TABLE",
            "EXIT_BREAKDOWN",
            "PNL_CHART_SVG",
            "TRADE_LOG",
        ] {
            assert!(template().contains(&format!("{{{{{}}}}}", name)), "{name}");
        }
    }

    #[test]
    fn template_sets_page() {
        assert!(template().starts_with("#set page("));
    }
}

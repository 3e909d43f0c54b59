//! SVG chart rendering for reports.

use chrono::{DateTime, Utc};

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 240.0;
const PADDING: f64 = 40.0;

/// Cumulative PnL as a polyline over time, with a dashed zero line
/// when zero lies inside the plotted range. Empty string for fewer than two
/// points.
pub fn generate_pnl_svg(curve: &[(DateTime<Utc>, f64)]) -> String {
    if curve.len() < 2 {
        return String::new();
    }

    let min_v = curve.iter().map(|p| p.1).fold(0.0_f64, f64::min);
    let max_v = curve.iter().map(|p| p.1).fold(0.0_f64, f64::max);
    let t0 = curve[0].0.timestamp() as f64;
    let t1 = curve[curve.len() - 1].0.timestamp() as f64;

    let plot_w = WIDTH - 2.0 * PADDING;
    let plot_h = HEIGHT - 2.0 * PADDING;
    let span_t = if t1 > t0 { t1 - t0 } else { 1.0 };
    let span_v = if max_v > min_v { max_v - min_v } else { 1.0 };

    let x = |t: DateTime<Utc>| PADDING + (t.timestamp() as f64 - t0) / span_t * plot_w;
    let y = |v: f64| HEIGHT - PADDING - (v - min_v) / span_v * plot_h;

    let points: Vec<String> = curve
        .iter()
        .map(|&(t, v)| format!("{:.1},{:.1}", x(t), y(v)))
        .collect();

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = WIDTH,
        h = HEIGHT
    );
    svg.push_str(&format!(
        r#"<rect x="0" y="0" width="{}" height="{}" fill="white"/>"#,
        WIDTH, HEIGHT
    ));
    svg.push_str(&format!(
        r##"<line x1="{p}" y1="{b}" x2="{r}" y2="{b}" stroke="#888" stroke-width="1"/>"##,
        p = PADDING,
        b = HEIGHT - PADDING,
        r = WIDTH - PADDING
    ));
    svg.push_str(&format!(
        r##"<line x1="{p}" y1="{p}" x2="{p}" y2="{b}" stroke="#888" stroke-width="1"/>"##,
        p = PADDING,
        b = HEIGHT - PADDING
    ));
    if min_v < 0.0 && max_v > 0.0 {
        svg.push_str(&format!(
            r##"<line x1="{p}" y1="{z:.1}" x2="{r}" y2="{z:.1}" stroke="#bbb" stroke-dasharray="4 3"/>"##,
            p = PADDING,
            z = y(0.0),
            r = WIDTH - PADDING
        ));
    }
    svg.push_str(&format!(
        r##"<polyline fill="none" stroke="#1f77b4" stroke-width="1.5" points="{}"/>"##,
        points.join(" ")
    ));
    svg.push_str(&format!(
        r#"<text x="4" y="{:.1}" font-size="10">{:.2}</text>"#,
        PADDING + 4.0,
        max_v
    ));
    svg.push_str(&format!(
        r#"<text x="4" y="{:.1}" font-size="10">{:.2}</text>"#,
        HEIGHT - PADDING,
        min_v
    ));
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" font-size="10">{}</text>"#,
        PADDING,
        HEIGHT - PADDING / 3.0,
        curve[0].0.format("%Y-%m-%d %H:%M")
    ));
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" font-size="10" text-anchor="end">{}</text>"#,
        WIDTH - PADDING,
        HEIGHT - PADDING / 3.0,
        curve[curve.len() - 1].0.format("%Y-%m-%d %H:%M")
    ));
    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn curve(values: &[f64]) -> Vec<(DateTime<Utc>, f64)> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (start + Duration::minutes(i as i64 * 5), v))
            .collect()
    }

    #[test]
    fn too_few_points_is_empty() {
        assert!(generate_pnl_svg(&[]).is_empty());
        assert!(generate_pnl_svg(&curve(&[1.0])).is_empty());
    }

    #[test]
    fn renders_polyline() {
        let svg = generate_pnl_svg(&curve(&[0.5, 1.0, 0.8]));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("2024-01-01 00:00"));
        assert!(svg.contains("2024-01-01 00:10"));
        // all positive: no zero line
        assert!(!svg.contains("stroke-dasharray"));
    }

    #[test]
    fn zero_line_when_crossing_zero() {
        let svg = generate_pnl_svg(&curve(&[0.3, -0.2, 0.1]));
        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains(">-0.20<"));
    }

    #[test]
    fn flat_curve_does_not_divide_by_zero() {
        let svg = generate_pnl_svg(&curve(&[0.0, 0.0]));
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
    }
}

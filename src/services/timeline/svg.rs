//! SVG serialization of layout primitives

use super::{Anchor, DrawPrimitive, LayoutConfig, Style, Swatch, TimeMark};
use crate::types::EntryKind;

const FONT_FAMILY: &str = "sans-serif";

/// Serialize `primitives` in order as one standalone SVG document.
pub fn render_svg(primitives: &[DrawPrimitive], config: &LayoutConfig) -> String {
    let mut svg = String::with_capacity(256 + primitives.len() * 96);
    let (width, height) = (config.width, config.height);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" font-family=\"{FONT_FAMILY}\">\n",
    ));

    for primitive in primitives {
        match primitive {
            DrawPrimitive::Rect {
                x,
                y,
                width,
                height,
                style,
            } => svg.push_str(&format!(
                "<rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" {}/>\n",
                shape_paint(*style)
            )),
            DrawPrimitive::Line {
                x1,
                y1,
                x2,
                y2,
                style,
            } => svg.push_str(&format!(
                "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\" {}/>\n",
                shape_paint(*style)
            )),
            DrawPrimitive::Text {
                x,
                y,
                text,
                anchor,
                style,
            } => svg.push_str(&format!(
                "<text x=\"{x}\" y=\"{y}\" text-anchor=\"{}\" {}>{}</text>\n",
                anchor_name(*anchor),
                text_paint(*style),
                escape_xml(text)
            )),
        }
    }

    svg.push_str("</svg>\n");
    svg
}

/// Legend swatches share arms with the shapes they describe.
fn shape_paint(style: Style) -> &'static str {
    match style {
        Style::Background => r#"fill="none" stroke="black""#,
        Style::GridLine => r#"stroke="gray" stroke-dasharray="2,2""#,
        Style::RowBackground => r##"fill="#f3f3f3""##,
        Style::VisitFill | Style::LegendSwatch(Swatch::Fill(EntryKind::Visit)) => {
            r#"fill="green""#
        }
        Style::BreakFill | Style::LegendSwatch(Swatch::Fill(EntryKind::Break)) => {
            r#"fill="orange""#
        }
        Style::WindowOutline | Style::LegendSwatch(Swatch::Window) => {
            r#"fill="none" stroke="blue""#
        }
        Style::AxisLabel
        | Style::EntryLabel
        | Style::TimeLabel(_)
        | Style::LegendLabel => r#"fill="black""#,
    }
}

fn text_paint(style: Style) -> &'static str {
    match style {
        Style::TimeLabel(mark) if mark.is_planned() => r#"font-size="10" fill="blue""#,
        Style::TimeLabel(TimeMark::ActualStart | TimeMark::ActualEnd) => {
            r#"font-size="10" fill="black""#
        }
        _ => r#"font-size="12" fill="black""#,
    }
}

fn anchor_name(anchor: Anchor) -> &'static str {
    match anchor {
        Anchor::Start => "start",
        Anchor::Middle => "middle",
        Anchor::End => "end",
    }
}

fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

//! Minimal SVG canvas. Coordinates in points (1pt = 1/72").

use super::color::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(&self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub size: f64,
    pub color: Color,
    pub anchor: Anchor,
    pub bold: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 10.0,
            color: Color::BLACK,
            anchor: Anchor::Start,
            bold: false,
        }
    }
}

#[derive(Debug, Clone)]
enum Element {
    Rect { x: f64, y: f64, w: f64, h: f64, fill: Color },
    Line { x1: f64, y1: f64, x2: f64, y2: f64, color: Color, width: f64 },
    Text { x: f64, y: f64, content: String, style: TextStyle, rotate: Option<f64> },
}

pub struct Canvas {
    pub width: f64,
    pub height: f64,
    elements: Vec<Element>,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
        }
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: Color) {
        self.elements.push(Element::Rect { x, y, w, h, fill });
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color, width: f64) {
        self.elements.push(Element::Line { x1, y1, x2, y2, color, width });
    }

    /// Text vertically centered on `y`.
    pub fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) {
        self.elements.push(Element::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: None,
        });
    }

    pub fn text_rotated(&mut self, x: f64, y: f64, content: &str, style: &TextStyle, angle: f64) {
        self.elements.push(Element::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: Some(angle),
        });
    }

    pub fn finish_svg(&self) -> String {
        let mut out = String::with_capacity(256 + self.elements.len() * 96);
        out.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            w = self.width,
            h = self.height,
        ));
        out.push_str(&format!(
            "<rect width=\"{}\" height=\"{}\" fill=\"white\" />\n",
            self.width, self.height
        ));
        for element in &self.elements {
            render_element(&mut out, element);
        }
        out.push_str("</svg>\n");
        out
    }
}

fn render_element(out: &mut String, element: &Element) {
    match element {
        Element::Rect { x, y, w, h, fill } => {
            out.push_str(&format!(
                "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" fill=\"{fill}\" />\n"
            ));
        }
        Element::Line { x1, y1, x2, y2, color, width } => {
            out.push_str(&format!(
                "<line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" stroke=\"{color}\" stroke-width=\"{width:.2}\" />\n"
            ));
        }
        Element::Text { x, y, content, style, rotate } => {
            out.push_str(&format!(
                "<text x=\"{x:.2}\" y=\"{y:.2}\" font-family=\"DejaVu Sans, Arial, sans-serif\" font-size=\"{:.1}\" fill=\"{}\" text-anchor=\"{}\" dominant-baseline=\"central\"",
                style.size,
                style.color,
                style.anchor.as_str(),
            ));
            if style.bold {
                out.push_str(" font-weight=\"bold\"");
            }
            if let Some(angle) = rotate {
                out.push_str(&format!(" transform=\"rotate({angle:.1},{x:.2},{y:.2})\""));
            }
            out.push('>');
            push_escaped(out, content);
            out.push_str("</text>\n");
        }
    }
}

fn push_escaped(out: &mut String, content: &str) {
    for ch in content.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

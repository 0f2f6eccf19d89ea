//! Scripted user actions, replayed through the input pipeline.
//!
//! Coordinates are display pixels.
//!
//! ```text
//! fill@x,y                 tap with the current tool
//! draw@x,y;x,y;...         press, drag through the points, release
//! color=#rrggbb            pick a color (also #rgb or r,g,b)
//! mode=fill | mode=draw    pick a tool
//! toggle                   switch tool
//! undo
//! zoom-in@x,y | zoom-out@x,y   one wheel notch at x,y
//! pinch@x,y:factor         two-finger pinch centred at x,y
//! pan@dx,dy                two-finger pan
//! resize=WxH               new display size
//! clear                    delete saved progress and start over
//! ```

use colorbook_core::{Rgba, ToolMode};
use kurbo::{Point, Vec2};
use std::str::FromStr;
use thiserror::Error;

/// Invalid action text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("Unknown action: {0}")]
    Unknown(String),
    #[error("Invalid point in {0}")]
    InvalidPoint(String),
    #[error("Invalid number in {0}")]
    InvalidNumber(String),
    #[error("Invalid color in {0}")]
    InvalidColor(String),
    #[error("Stroke needs at least one point: {0}")]
    EmptyStroke(String),
}

/// One user action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Tap(Point),
    Stroke(Vec<Point>),
    SetColor(Rgba),
    SetMode(ToolMode),
    ToggleMode,
    Undo,
    ZoomIn(Point),
    ZoomOut(Point),
    Pinch { center: Point, factor: f64 },
    Pan(Vec2),
    Resize { width: f64, height: f64 },
    ClearProgress,
}

impl FromStr for Action {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let unknown = || ScriptError::Unknown(s.to_string());

        match s {
            "toggle" => return Ok(Action::ToggleMode),
            "undo" => return Ok(Action::Undo),
            "clear" => return Ok(Action::ClearProgress),
            _ => {}
        }

        if let Some((verb, args)) = s.split_once('@') {
            return match verb {
                "fill" | "tap" => Ok(Action::Tap(parse_point(args, s)?)),
                "draw" => {
                    let points = args
                        .split(';')
                        .filter(|p| !p.trim().is_empty())
                        .map(|p| parse_point(p, s))
                        .collect::<Result<Vec<_>, _>>()?;
                    if points.is_empty() {
                        return Err(ScriptError::EmptyStroke(s.to_string()));
                    }
                    Ok(Action::Stroke(points))
                }
                "zoom-in" => Ok(Action::ZoomIn(parse_point(args, s)?)),
                "zoom-out" => Ok(Action::ZoomOut(parse_point(args, s)?)),
                "pinch" => {
                    let (center, factor) = args
                        .split_once(':')
                        .ok_or_else(|| ScriptError::InvalidNumber(s.to_string()))?;
                    let factor = parse_number(factor, s)?;
                    if factor <= 0.0 {
                        return Err(ScriptError::InvalidNumber(s.to_string()));
                    }
                    Ok(Action::Pinch {
                        center: parse_point(center, s)?,
                        factor,
                    })
                }
                "pan" => Ok(Action::Pan(parse_point(args, s)?.to_vec2())),
                _ => Err(unknown()),
            };
        }

        if let Some((name, value)) = s.split_once('=') {
            return match name {
                "color" => parse_color(value)
                    .map(Action::SetColor)
                    .ok_or_else(|| ScriptError::InvalidColor(s.to_string())),
                "mode" => match value {
                    "fill" => Ok(Action::SetMode(ToolMode::Fill)),
                    "draw" => Ok(Action::SetMode(ToolMode::Draw)),
                    _ => Err(unknown()),
                },
                "resize" => {
                    let (w, h) = value
                        .split_once('x')
                        .ok_or_else(|| ScriptError::InvalidNumber(s.to_string()))?;
                    let width = parse_number(w, s)?;
                    let height = parse_number(h, s)?;
                    if width <= 0.0 || height <= 0.0 {
                        return Err(ScriptError::InvalidNumber(s.to_string()));
                    }
                    Ok(Action::Resize { width, height })
                }
                _ => Err(unknown()),
            };
        }

        Err(unknown())
    }
}

/// Parse a list of actions, failing on the first bad one.
pub fn parse_actions<S: AsRef<str>>(items: &[S]) -> Result<Vec<Action>, ScriptError> {
    items.iter().map(|item| item.as_ref().parse()).collect()
}

fn parse_number(s: &str, context: &str) -> Result<f64, ScriptError> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ScriptError::InvalidNumber(context.to_string()))
}

fn parse_point(s: &str, context: &str) -> Result<Point, ScriptError> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| ScriptError::InvalidPoint(context.to_string()))?;
    let x = parse_number(x, context).map_err(|_| ScriptError::InvalidPoint(context.to_string()))?;
    let y = parse_number(y, context).map_err(|_| ScriptError::InvalidPoint(context.to_string()))?;
    Ok(Point::new(x, y))
}

/// Hex (`#rgb`, `#rrggbb`) or an `r,g,b` triple.
fn parse_color(s: &str) -> Option<Rgba> {
    let parts: Vec<&str> = s.split(',').collect();
    if let [r, g, b] = parts.as_slice() {
        let channel = |c: &str| c.trim().parse::<u8>().ok();
        return Some(Rgba::from([channel(r)?, channel(g)?, channel(b)?]));
    }
    Rgba::from_hex(s).ok()
}

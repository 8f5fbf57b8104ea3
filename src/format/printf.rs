use std::iter::Peekable;
use std::str::Chars;

use super::{OUTPUT_LIMIT, truncate_to_limit};

#[derive(Debug, Default, PartialEq)]
struct Spec {
    left: bool,
    zero: bool,
    plus: bool,
    width: usize,
    precision: Option<usize>,
}

/// Renders a printf-style template holding a single floating point value,
/// e.g. `"CPU: %.0f%%"`.
///
/// Supported conversions are `f`/`F` and the integer forms `d`/`i` (value
/// rounded), with the `-`, `0` and `+` flags, a width and a precision. Every
/// conversion prints the same value. Anything else is copied verbatim.
///
/// The result is cut to fit [`OUTPUT_LIMIT`]; widths and precisions beyond it
/// are clamped before anything is formatted.
pub fn format_scalar(template: &str, value: f64) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let (spec, raw) = parse_spec(&mut chars);
        match chars.peek().copied() {
            Some(conv @ ('f' | 'F' | 'd' | 'i')) => {
                chars.next();
                out.push_str(&render(&spec, conv, value));
            }
            _ => {
                out.push('%');
                out.push_str(&raw);
            }
        }
        if out.len() >= OUTPUT_LIMIT {
            break;
        }
    }

    truncate_to_limit(&mut out, OUTPUT_LIMIT);
    out
}

fn parse_spec(chars: &mut Peekable<Chars<'_>>) -> (Spec, String) {
    let mut spec = Spec::default();
    let mut raw = String::new();

    while let Some(&ch) = chars.peek() {
        match ch {
            '-' => spec.left = true,
            '0' => spec.zero = true,
            '+' => spec.plus = true,
            _ => break,
        }
        raw.push(ch);
        chars.next();
    }
    spec.width = take_number(chars, &mut raw).unwrap_or(0).min(OUTPUT_LIMIT);
    if chars.peek() == Some(&'.') {
        raw.push('.');
        chars.next();
        let precision = take_number(chars, &mut raw).unwrap_or(0);
        spec.precision = Some(precision.min(OUTPUT_LIMIT));
    }

    (spec, raw)
}

fn take_number(chars: &mut Peekable<Chars<'_>>, raw: &mut String) -> Option<usize> {
    let mut digits = String::new();
    while let Some(&ch) = chars.peek() {
        if !ch.is_ascii_digit() {
            break;
        }
        digits.push(ch);
        chars.next();
    }
    raw.push_str(&digits);
    digits.parse().ok()
}

fn render(spec: &Spec, conv: char, value: f64) -> String {
    let mut body = match conv {
        'd' | 'i' => format!("{}", value.round() as i64),
        _ => {
            let precision = spec.precision.unwrap_or(6);
            format!("{value:.precision$}")
        }
    };
    if spec.plus && !body.starts_with('-') {
        body.insert(0, '+');
    }

    let width = spec.width;
    if body.len() >= width {
        return body;
    }
    if spec.left {
        format!("{body:<width$}")
    } else if spec.zero && value.is_finite() {
        let split = usize::from(body.starts_with(['-', '+']));
        let padding = "0".repeat(width - body.len());
        body.insert_str(split, &padding);
        body
    } else {
        format!("{body:>width$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cpu_template() {
        assert_eq!(format_scalar("CPU: %.0f%%", 59.6), "CPU: 60%");
    }

    #[test]
    fn default_precision_is_six() {
        assert_eq!(format_scalar("%f", 1.5), "1.500000");
    }

    #[test]
    fn width_and_flags() {
        assert_eq!(format_scalar("[%5.1f]", 3.14159), "[  3.1]");
        assert_eq!(format_scalar("[%-5.1f]", 3.14159), "[3.1  ]");
        assert_eq!(format_scalar("[%05.1f]", -3.14159), "[-03.1]");
        assert_eq!(format_scalar("[%+.0f]", 7.0), "[+7]");
    }

    #[test]
    fn integer_conversions_round() {
        assert_eq!(format_scalar("procs: %d", 2.6), "procs: 3");
        assert_eq!(format_scalar("procs: %i", 4.0), "procs: 4");
    }

    #[test]
    fn huge_widths_stay_within_the_line_limit() {
        let out = format_scalar("%999999999f", 1.0);
        assert_eq!(out.len(), OUTPUT_LIMIT - 1);
        assert!(out.ends_with(' ') || out.ends_with('0'));

        let out = format_scalar("x%.999999999f", 1.0);
        assert_eq!(out.len(), OUTPUT_LIMIT - 1);
        assert!(out.starts_with("x1."));

        let out = format_scalar(&"%d ".repeat(200), 42.0);
        assert_eq!(out.len(), OUTPUT_LIMIT - 1);
    }

    #[test]
    fn unknown_conversions_are_copied() {
        assert_eq!(format_scalar("%s and %3q", 1.0), "%s and %3q");
        assert_eq!(format_scalar("tail %", 1.0), "tail %");
    }
}

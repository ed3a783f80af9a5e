/// One sensor value reported by the microcontroller, e.g. `sm,14,22`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub code: String,
    pub address: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// `ok...`: the exchange is complete.
    Ack,
    /// `fail...`: the exchange ended without a usable result.
    Fail(String),
    Reading(Reading),
    /// Anything else, including the empty line left by a read timeout.
    Malformed(String),
}

impl Response {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();

        if starts_with_ignore_case(line, "ok") {
            return Response::Ack;
        }
        if starts_with_ignore_case(line, "fail") {
            return Response::Fail(line.to_string());
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [code, address, value] = fields.as_slice() else {
            return Response::Malformed(line.to_string());
        };

        match value.parse::<f64>() {
            Ok(value) if value.is_finite() => Response::Reading(Reading {
                code: code.to_string(),
                address: address.to_string(),
                value,
            }),
            _ => Response::Malformed(line.to_string()),
        }
    }

    /// Whether this line ends the read loop for the current command.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Response::Ack | Response::Fail(_))
    }
}

fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// What a reading code measures, as far as display is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Temperature,
    Percent,
}

impl Quantity {
    pub fn of_code(code: &str) -> Option<Self> {
        if code.starts_with('t') {
            Some(Quantity::Temperature)
        } else if code.starts_with('h') || code.starts_with("sm") {
            Some(Quantity::Percent)
        } else {
            None
        }
    }
}

pub fn to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// Display label for a value: `21.5°C`, `70.7°F`, `45.0%`. `None` for unknown codes.
pub fn format_label(code: &str, value: f64, fahrenheit: bool) -> Option<String> {
    match Quantity::of_code(code)? {
        Quantity::Temperature => {
            let unit = if fahrenheit { 'F' } else { 'C' };
            Some(format!("{:.1}\u{00B0}{}", value, unit))
        }
        Quantity::Percent => Some(format!("{:.1}%", value)),
    }
}

use thiserror::Error;

use crate::signal::{GapRecord, RateRecord, Record};

/// Marker for a line that matches neither record grammar.
///
/// Expected on every boot (banner text, button logs, partial reads), so callers drop it
/// without reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("line does not match a record grammar")]
pub struct Unparseable;

/// Decode raw serial bytes into a trimmed line, dropping invalid UTF-8 sequences.
pub fn decode_line(bytes: &[u8]) -> String {
    let text: String = String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect();
    text.trim().to_string()
}

/// Parse one telemetry line into a rate or gap record.
pub fn parse_line(line: &str) -> Result<Record, Unparseable> {
    let (tag, rest) = line.trim().split_once(',').ok_or(Unparseable)?;
    match tag {
        "rate" => parse_rate_fields(rest).map(Record::Rate),
        "gap" => parse_gap_fields(rest).map(Record::Gap),
        _ => Err(Unparseable),
    }
}

/// `rate,<rawRate>,<emaFast>,<emaSlow>[,...]`
fn parse_rate_fields(rest: &str) -> Result<RateRecord, Unparseable> {
    let mut fields = rest.split(',');
    let raw_rate = finite(fields.next())?;
    let ema_fast = finite(fields.next())?;
    let ema_slow = finite(fields.next())?;
    Ok(RateRecord {
        raw_rate,
        ema_fast,
        ema_slow,
    })
}

/// `gap,<emaDiff>,<variance>[,...]`, empty fields skipped before counting.
fn parse_gap_fields(rest: &str) -> Result<GapRecord, Unparseable> {
    let mut fields = rest.split(',').filter(|f| !f.is_empty());
    let ema_diff = finite(fields.next())?;
    let variance = finite(fields.next())?;
    Ok(GapRecord { ema_diff, variance })
}

fn finite(field: Option<&str>) -> Result<f64, Unparseable> {
    let value: f64 = field
        .ok_or(Unparseable)?
        .trim()
        .parse()
        .map_err(|_| Unparseable)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Unparseable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(line: &str) -> Option<RateRecord> {
        match parse_line(line) {
            Ok(Record::Rate(r)) => Some(r),
            _ => None,
        }
    }

    fn gap(line: &str) -> Option<GapRecord> {
        match parse_line(line) {
            Ok(Record::Gap(g)) => Some(g),
            _ => None,
        }
    }

    #[test]
    fn parses_firmware_rate_line() {
        let r = rate("rate,1.250000,0.980000,0.700000").expect("rate record");
        assert_eq!(r.raw_rate, 1.25);
        assert_eq!(r.ema_fast, 0.98);
        assert_eq!(r.ema_slow, 0.7);
    }

    #[test]
    fn rate_ignores_trailing_fields() {
        let r = rate("rate,1,2,3,extra,99").expect("rate record");
        assert_eq!((r.raw_rate, r.ema_fast, r.ema_slow), (1.0, 2.0, 3.0));
    }

    #[test]
    fn rate_rejects_short_or_bad_lines() {
        for line in [
            "rate",
            "rate,",
            "rate,1.0,2.0",
            "rate,1.0,,3.0",
            "rate,1.0,abc,3.0",
            "rate,nan,1,2",
            "rate,1,inf,2",
            "rates,1,2,3",
            "Rate,1,2,3",
            " ,rate,1,2,3",
        ] {
            assert_eq!(parse_line(line), Err(Unparseable), "{line:?}");
        }
    }

    #[test]
    fn gap_filters_empty_fields() {
        let g = gap("gap,,0.05,,0.04,").expect("gap record");
        assert_eq!(g.ema_diff, 0.05);
        assert_eq!(g.variance, 0.04);
        assert_eq!(parse_line("gap,0.05,,"), Err(Unparseable));
        assert_eq!(parse_line("gap,0.05,x"), Err(Unparseable));
    }

    #[test]
    fn gap_keeps_negative_variance() {
        let g = gap("gap,-0.010000,-0.000001").expect("gap record");
        assert_eq!(g.variance, -0.000001);
    }

    #[test]
    fn tolerates_whitespace_and_crlf() {
        assert!(rate("  rate,1, 2 ,3\r\n").is_some());
        assert!(gap("gap,0.1,0.2\r").is_some());
    }

    #[test]
    fn rejects_noise() {
        for line in ["", "   ", "garbage", "Starting up...", "onHold: 5", "gap"] {
            assert_eq!(parse_line(line), Err(Unparseable), "{line:?}");
        }
    }

    #[test]
    fn decode_drops_invalid_bytes() {
        let line = decode_line(b"\xffrate,1,2,3\r\n");
        assert_eq!(line, "rate,1,2,3");
        let r = rate(&line).expect("rate record");
        assert_eq!((r.raw_rate, r.ema_fast, r.ema_slow), (1.0, 2.0, 3.0));

        let r = rate(&decode_line(b"rate,1.\xff5,2,3\n")).expect("rate record");
        assert_eq!(r.raw_rate, 1.5);

        assert_eq!(decode_line(b"\xfe\xffgap,0.1,0.2\xc3\n"), "gap,0.1,0.2");
        assert_eq!(decode_line("gap,\u{b5}".as_bytes()), "gap,\u{b5}");
    }
}

//! Frame-number substitution for file name templates.
//!
//! A template such as `"smoke.####.vdb"` has its run of `#` characters
//! replaced by the current frame, zero padded to the length of the run.

/// Host time units per second used for tick-based numbering.
pub const TICKS_PER_SECOND: f64 = 6000.0;

/// How sub-frame times are written into a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberingScheme {
    /// Whole frame, followed by `.tick` when the time falls between frames.
    #[default]
    FrameSubTick,
    /// Whole frame followed by the fractional part, e.g. `0012.5`.
    Fractional,
    /// Global tick count since time zero.
    GlobalTicks,
}

/// Current time expressed in frames at a given frame rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    pub frame: f64,
    pub fps: f64,
}

impl FrameTime {
    pub fn new(frame: f64, fps: f64) -> Self {
        Self { frame, fps }
    }

    fn ticks_per_frame(&self) -> f64 {
        TICKS_PER_SECOND / self.fps
    }
}

/// Replaces the span from the first to the last `#` in `template` with the
/// frame number for `time`. Templates without `#` are left unchanged.
pub fn insert_frame_number(template: &mut String, time: FrameTime, scheme: NumberingScheme) {
    let (Some(first), Some(last)) = (template.find('#'), template.rfind('#')) else {
        return;
    };
    let width = last + 1 - first;
    let number = format_frame(time, scheme, width);
    template.replace_range(first..=last, &number);
}

fn format_frame(time: FrameTime, scheme: NumberingScheme, width: usize) -> String {
    let tpf = time.ticks_per_frame();
    let whole = time.frame.trunc() as i64;

    match scheme {
        NumberingScheme::Fractional => {
            let mut out = format!("{whole:0width$}");
            let repr = format_significant(time.frame, 6);
            if let Some(dot) = repr.find('.') {
                out.push_str(&repr[dot..]);
            }
            out
        }
        NumberingScheme::GlobalTicks => {
            let ticks = (time.frame * tpf).round() as i64;
            format!("{ticks:0width$}")
        }
        NumberingScheme::FrameSubTick => {
            let mut out = format!("{whole:0width$}");
            let tick = ((time.frame - whole as f64) * tpf).round() as i64;
            if tick > 0 {
                let digits = (tpf as i64).max(1).ilog10() as usize + 1;
                out.push_str(&format!(".{tick:0digits$}"));
            }
            out
        }
    }
}

/// `value` with `digits` significant digits in the shortest of fixed or
/// exponent notation, trailing zeros removed (printf `%g`).
fn format_significant(value: f64, digits: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    let digits = digits.max(1);
    let sci = format!("{:.*e}", digits - 1, value);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= digits as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs());
    }
    let decimals = (digits as i32 - 1 - exp).max(0) as usize;
    trim_fraction(&format!("{value:.decimals$}")).to_string()
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(template: &str, frame: f64, scheme: NumberingScheme) -> String {
        let mut s = template.to_string();
        insert_frame_number(&mut s, FrameTime::new(frame, 24.0), scheme);
        s
    }

    #[test]
    fn pads_whole_frames_to_hash_run() {
        assert_eq!(render("smoke.####.vdb", 12.0, NumberingScheme::FrameSubTick), "smoke.0012.vdb");
        assert_eq!(render("smoke.#.vdb", 120.0, NumberingScheme::FrameSubTick), "smoke.120.vdb");
    }

    #[test]
    fn template_without_hash_is_untouched() {
        assert_eq!(render("smoke.vdb", 3.0, NumberingScheme::GlobalTicks), "smoke.vdb");
    }

    #[test]
    fn hash_span_covers_first_to_last() {
        assert_eq!(render("a#b#.vdb", 7.0, NumberingScheme::FrameSubTick), "a007.vdb");
    }

    #[test]
    fn sub_tick_suffix_between_frames() {
        // 24 fps -> 250 ticks per frame, three digits.
        assert_eq!(render("f.###.vdb", 10.5, NumberingScheme::FrameSubTick), "f.010.125.vdb");
        assert_eq!(render("f.###.vdb", 10.02, NumberingScheme::FrameSubTick), "f.010.005.vdb");
    }

    #[test]
    fn fractional_scheme_keeps_fraction() {
        assert_eq!(render("f.####.vdb", 12.5, NumberingScheme::Fractional), "f.0012.5.vdb");
        assert_eq!(render("f.####.vdb", 12.0, NumberingScheme::Fractional), "f.0012.vdb");
    }

    #[test]
    fn fractional_scheme_keeps_six_significant_digits() {
        assert_eq!(render("f.####.vdb", 12.3456789, NumberingScheme::Fractional), "f.0012.3457.vdb");
        assert_eq!(render("f.##.vdb", 0.25, NumberingScheme::Fractional), "f.00.25.vdb");
        assert_eq!(render("f.####.vdb", 1234.56789, NumberingScheme::Fractional), "f.1234.57.vdb");
    }

    #[test]
    fn significant_digit_formatting() {
        assert_eq!(format_significant(12.5, 6), "12.5");
        assert_eq!(format_significant(100.0, 6), "100");
        assert_eq!(format_significant(0.0001234567, 6), "0.000123457");
        assert_eq!(format_significant(1234567.0, 6), "1.23457e+06");
        assert_eq!(format_significant(999999.5, 6), "1e+06");
    }

    #[test]
    fn global_ticks_scheme() {
        assert_eq!(render("f.#####.vdb", 2.0, NumberingScheme::GlobalTicks), "f.00500.vdb");
    }
}

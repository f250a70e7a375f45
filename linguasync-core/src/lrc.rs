use serde::Serialize;

const MILLIS_PER_MINUTE: u64 = 60 * 1000;
const MILLIS_PER_SECOND: u64 = 1000;

/// A single lyric line with the offset at which it becomes active.
///
/// Lines are immutable once constructed and never carry empty text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimedLine {
    offset_ms: u64,
    text: String,
}

impl TimedLine {
    /// Create a line, trimming the text. Returns `None` when nothing is left.
    #[must_use]
    pub fn new(offset_ms: u64, text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            offset_ms,
            text: text.to_string(),
        })
    }

    /// Milliseconds from track start at which this line becomes active
    #[must_use]
    pub const fn offset_ms(&self) -> u64 {
        self.offset_ms
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ordered sequence of timed lyric lines for one track.
///
/// Sorted ascending by offset; lines sharing an offset keep their input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    lines: Vec<TimedLine>,
}

impl Timeline {
    /// Parse timestamp-tagged lyric text into a timeline.
    ///
    /// Each line is read as `[mm:ss]`, `[mm:ss.fff]` or `[mm:ss:fff]` followed by
    /// the lyric text. Lines without that prefix (ID tags, blank lines, garbage)
    /// are skipped, as are lines whose text is empty. Only the first bracket group
    /// of a line is interpreted.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let lines = input.lines().filter_map(parse_lyric_line).collect();
        Self::from_lines(lines)
    }

    /// Build a timeline from already-constructed lines, sorting them stably.
    #[must_use]
    pub fn from_lines(mut lines: Vec<TimedLine>) -> Self {
        lines.sort_by_key(TimedLine::offset_ms);
        Self { lines }
    }

    #[must_use]
    pub fn lines(&self) -> &[TimedLine] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TimedLine> {
        self.lines.get(index)
    }
}

/// Parse a lyric line like `[00:12.34]Hello world`
fn parse_lyric_line(line: &str) -> Option<TimedLine> {
    let remaining = line.trim_start().strip_prefix('[')?;
    let end = remaining.find(']')?;
    let offset_ms = parse_timestamp(&remaining[..end])?;
    TimedLine::new(offset_ms, &remaining[end + 1..])
}

/// Parse the inside of a timestamp bracket: `mm:ss`, `mm:ss.f{1,3}` or `mm:ss:f{1,3}`
fn parse_timestamp(s: &str) -> Option<u64> {
    let (minutes, rest) = s.split_once(':')?;
    if !(1..=2).contains(&minutes.len()) || !is_ascii_digits(minutes) {
        return None;
    }

    let (seconds, fraction) = match rest.find(['.', ':']) {
        Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
        None => (rest, None),
    };
    if seconds.len() != 2 || !is_ascii_digits(seconds) {
        return None;
    }

    let millis = match fraction {
        Some(fraction) => parse_fraction(fraction)?,
        None => 0,
    };

    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    Some(minutes * MILLIS_PER_MINUTE + seconds * MILLIS_PER_SECOND + millis)
}

/// Right-pad a 1-3 digit fraction to milliseconds: "5" -> 500, "05" -> 50
fn parse_fraction(fraction: &str) -> Option<u64> {
    if !(1..=3).contains(&fraction.len()) || !is_ascii_digits(fraction) {
        return None;
    }
    format!("{fraction:0<3}").parse().ok()
}

fn is_ascii_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

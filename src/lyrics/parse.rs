use once_cell::sync::Lazy;
use regex::Regex;

use crate::lyrics::types::LyricLine;

static TIME_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d{1,2}):(\d{1,2})(?:\.(\d{1,3}))?\]").unwrap());

/// Lines split by timing availability. A field is `None` (not an empty list)
/// when no lines of that kind were found, so presence doubles as an
/// availability flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLyrics {
    pub synced: Option<Vec<LyricLine>>,
    pub unsynced: Option<Vec<LyricLine>>,
}

/// Parse `[mm:ss.xx]`-tagged lyric text into timestamped lines.
///
/// A line may carry several leading tags; each tag yields one synced line
/// sharing the text after the last tag. Fractional seconds are right-padded
/// to 3 digits before conversion (`.5` and `.500` both mean 500ms). Untagged
/// lines with non-empty text become unsynced lines. The synced list is
/// sorted ascending by time with a stable sort.
pub fn parse_time_tagged(raw: &str) -> ParsedLyrics {
    let mut synced = Vec::new();
    let mut unsynced = Vec::new();

    for line in raw.lines() {
        let mut times = Vec::new();
        let mut last_tag_end = 0;
        for cap in TIME_TAG_RE.captures_iter(line) {
            let min: u64 = cap[1].parse().unwrap_or(0);
            let sec: u64 = cap[2].parse().unwrap_or(0);
            let ms = cap
                .get(3)
                .map(|frac| pad_fraction_ms(frac.as_str()))
                .unwrap_or(0);
            times.push(min * 60_000 + sec * 1_000 + ms);
            last_tag_end = cap.get(0).map(|m| m.end()).unwrap_or(last_tag_end);
        }

        if times.is_empty() {
            let text = line.trim();
            if !text.is_empty() {
                unsynced.push(LyricLine::unsynced(text));
            }
            continue;
        }

        let text = line[last_tag_end..].trim();
        for time in times {
            synced.push(LyricLine::synced(time, text));
        }
    }

    synced.sort_by_key(|line| line.time);

    ParsedLyrics {
        synced: (!synced.is_empty()).then_some(synced),
        unsynced: (!unsynced.is_empty()).then_some(unsynced),
    }
}

fn pad_fraction_ms(frac: &str) -> u64 {
    let mut padded = frac.to_string();
    while padded.len() < 3 {
        padded.push('0');
    }
    padded.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_centisecond_tag() {
        let parsed = parse_time_tagged("[01:02.50] Hello");
        let synced = parsed.synced.unwrap();
        assert_eq!(synced, vec![LyricLine::synced(62_500, "Hello")]);
        assert!(parsed.unsynced.is_none());
    }

    #[test]
    fn fraction_is_right_padded_to_millis() {
        let cases = [("[00:00.5] A", 500), ("[00:00.50] A", 500), ("[00:00.500] A", 500)];
        for (raw, expected) in cases {
            let synced = parse_time_tagged(raw).synced.unwrap();
            assert_eq!(synced[0].time, Some(expected), "for {raw}");
        }
    }

    #[test]
    fn multiple_tags_share_trailing_text() {
        let synced = parse_time_tagged("[00:01][00:02]text").synced.unwrap();
        assert_eq!(
            synced,
            vec![
                LyricLine::synced(1_000, "text"),
                LyricLine::synced(2_000, "text"),
            ]
        );
    }

    #[test]
    fn synced_output_is_sorted_and_stable() {
        let raw = "[00:10] late\n[00:02] b\n[00:02] c\n[00:01] first";
        let synced = parse_time_tagged(raw).synced.unwrap();
        let texts: Vec<&str> = synced.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "b", "c", "late"]);
        assert!(synced.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn untagged_lines_become_unsynced() {
        let parsed = parse_time_tagged("First line\n\n  \nSecond line");
        assert!(parsed.synced.is_none());
        assert_eq!(
            parsed.unsynced.unwrap(),
            vec![LyricLine::unsynced("First line"), LyricLine::unsynced("Second line")]
        );
    }

    #[test]
    fn mixed_input_splits_by_kind() {
        let parsed = parse_time_tagged("[00:01] tagged\nplain");
        assert_eq!(parsed.synced.unwrap().len(), 1);
        assert_eq!(parsed.unsynced.unwrap().len(), 1);
    }

    #[test]
    fn empty_input_has_neither_kind() {
        assert_eq!(parse_time_tagged(""), ParsedLyrics::default());
    }
}

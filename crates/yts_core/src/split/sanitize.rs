//! Output file naming for split tracks.

use std::collections::HashMap;

/// Title used when nothing of the original survives sanitizing.
const UNKNOWN_TITLE: &str = "Unknown";

/// Build the basename `"NNN - [Artist - ]Title"` (extension added by the caller).
///
/// Characters other than alphanumerics, whitespace, `-` and `.` are deleted.
/// Any whitespace left is normalized to a plain space so tabs and newlines
/// never reach the filesystem. A blank artist is treated as absent and a
/// title with nothing left becomes `Unknown`.
pub fn sanitize_basename(sequence_number: u32, title: &str, artist: Option<&str>) -> String {
    let title = match clean_part(title) {
        t if t.is_empty() => UNKNOWN_TITLE.to_string(),
        t => t,
    };
    match artist.map(clean_part).filter(|a| !a.is_empty()) {
        Some(artist) => format!("{:03} - {} - {}", sequence_number, artist, title),
        None => format!("{:03} - {}", sequence_number, title),
    }
}

fn clean_part(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '.')
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect::<String>()
        .trim_start()
        .trim_end_matches(['.', ' '])
        .to_string()
}

/// Hands out unique basenames within one output directory.
///
/// The first claim of a name keeps it; later claims get ` (2)`, ` (3)`...
/// Comparison is case-insensitive, matching case-insensitive filesystems.
#[derive(Debug, Default)]
pub struct BasenameAllocator {
    seen: HashMap<String, u32>,
}

impl BasenameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `base`, or a suffixed variant if it was already handed out.
    pub fn allocate(&mut self, base: String) -> String {
        let key = base.to_lowercase();
        let Some(count) = self.seen.get(&key).copied() else {
            self.seen.insert(key, 1);
            return base;
        };

        let mut n = count + 1;
        loop {
            let candidate = format!("{} ({})", base, n);
            let candidate_key = candidate.to_lowercase();
            if !self.seen.contains_key(&candidate_key) {
                self.seen.insert(key, n);
                self.seen.insert(candidate_key, 1);
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_and_without_artist() {
        assert_eq!(
            sanitize_basename(7, "Strobe", Some("deadmau5")),
            "007 - deadmau5 - Strobe"
        );
        assert_eq!(sanitize_basename(12, "Intro", None), "012 - Intro");
        assert_eq!(sanitize_basename(1, "Intro", Some("  ")), "001 - Intro");
        assert_eq!(sanitize_basename(1234, "Long", None), "1234 - Long");
    }

    #[test]
    fn strips_disallowed_characters() {
        let name = sanitize_basename(1, "Foo/Bar: Baz?", Some("A&B"));
        assert!(!name.contains(['/', ':', '?', '&']));
        assert_eq!(name, "001 - AB - FooBar Baz");

        let positions: Vec<usize> = ["A", "B", "Foo", "Bar", "Baz"]
            .iter()
            .map(|part| name.find(part).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn keeps_unicode_and_periods() {
        assert_eq!(
            sanitize_basename(2, "Café v1.2", Some("Sigur Rós")),
            "002 - Sigur Rós - Café v1.2"
        );
        assert_eq!(sanitize_basename(3, "Line\tBreak\n", None), "003 - Line Break");
    }

    #[test]
    fn empty_title_becomes_unknown() {
        assert_eq!(sanitize_basename(1, "???", None), "001 - Unknown");
        assert_eq!(sanitize_basename(2, " ... ", Some("DJ")), "002 - DJ - Unknown");
        assert_eq!(sanitize_basename(3, "Song", Some("&&")), "003 - Song");
    }

    #[test]
    fn allocator_disambiguates_collisions() {
        let mut names = BasenameAllocator::new();
        assert_eq!(names.allocate("001 - ID".to_string()), "001 - ID");
        assert_eq!(names.allocate("001 - ID".to_string()), "001 - ID (2)");
        assert_eq!(names.allocate("001 - id".to_string()), "001 - id (3)");
        assert_eq!(names.allocate("002 - Other".to_string()), "002 - Other");
    }

    #[test]
    fn allocator_skips_names_already_taken() {
        let mut names = BasenameAllocator::new();
        assert_eq!(names.allocate("A (2)".to_string()), "A (2)");
        assert_eq!(names.allocate("A".to_string()), "A");
        assert_eq!(names.allocate("A".to_string()), "A (3)");
    }
}

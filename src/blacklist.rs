use regex::{Regex, RegexBuilder};

/// One entry of the user's blacklist.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches when the URL contains the text verbatim.
    Literal(String),
    /// A `/body/flags` entry.
    Regex(Regex),
}

impl Pattern {
    /// Parses one line. Blank lines and unparsable regexes yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_matches([' ', '\t', '\r', '\x0b', '\x0c']);
        if line.is_empty() {
            return None;
        }
        if !line.starts_with('/') {
            return Some(Pattern::Literal(line.to_owned()));
        }

        let (body, flags) = match line.rfind('/') {
            Some(end) if end > 0 => (&line[1..end], &line[end + 1..]),
            _ => (line, ""),
        };
        let mut builder = RegexBuilder::new(body);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'g' | 'u' | 'y' => &mut builder,
                other => {
                    log::debug!("skipping blacklist entry {line:?}: unsupported flag {other:?}");
                    return None;
                }
            };
        }
        match builder.build() {
            Ok(regex) => Some(Pattern::Regex(regex)),
            Err(err) => {
                log::debug!("skipping blacklist entry {line:?}: {err}");
                None
            }
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        match self {
            Pattern::Literal(text) => url.contains(text.as_str()),
            Pattern::Regex(regex) => regex.is_match(url),
        }
    }
}

/// Parses a newline-separated blacklist.
pub fn parse(blacklist: &str) -> Vec<Pattern> {
    blacklist.lines().filter_map(Pattern::parse).collect()
}

/// True when any entry of `blacklist` matches the full page URL.
pub fn is_blacklisted(blacklist: &str, url: &str) -> bool {
    parse(blacklist).iter().any(|pattern| pattern.matches(url))
}

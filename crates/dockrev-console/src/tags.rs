/// The major[.minor] grouping a tag belongs to. Derived per comparison and
/// never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TagSeries {
    pub major: u64,
    pub minor: Option<u64>,
    pub precision: u8,
}

/// Parse a loosely semver-like tag into its series.
///
/// An optional leading `v` is stripped and everything from the first `+` or
/// `-` is treated as prerelease/build metadata and discarded. The remaining
/// core must be 1-3 dot-separated all-digit groups; anything else is
/// unparseable.
pub fn parse_tag_series(tag: &str) -> Option<TagSeries> {
    let trimmed = tag.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let core = trimmed.split(['+', '-']).next().unwrap_or("");
    if core.is_empty() {
        return None;
    }

    let groups: Vec<&str> = core.split('.').collect();
    if groups.len() > 3 {
        return None;
    }
    for group in &groups {
        if group.is_empty() || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    Some(TagSeries {
        major: groups[0].parse().ok()?,
        minor: match groups.get(1) {
            Some(g) => Some(g.parse().ok()?),
            None => None,
        },
        precision: groups.len() as u8,
    })
}

/// Whether `candidate` is a same-series upgrade relative to `current`.
///
/// `None` when either side is unparseable; the caller must treat that as
/// "unknown, needs confirmation", never as a hard mismatch. A bare-major
/// current tag (e.g. `"16"`) is a floating alias: the user opted out of
/// series pinning, so any parseable candidate counts as same-series.
/// Multi-component tags require equal major and minor; the patch component
/// never participates.
pub fn tag_series_matches(current: &str, candidate: &str) -> Option<bool> {
    let cur = parse_tag_series(current)?;
    let cand = parse_tag_series(candidate)?;

    if cur.precision == 1 {
        return Some(true);
    }
    if cur.major != cand.major {
        return Some(false);
    }
    Some(cur.minor == cand.minor)
}

//! Content negotiation over the `Accept` header.
//!
//! The cache keys a response under its media type, so the request phase
//! needs to know which media type the client most prefers. [`preferred`]
//! parses the `Accept` header into media ranges with quality factors and
//! returns the highest ranked concrete `type/subtype`.

use smol_str::SmolStr;

/// A concrete `type/subtype` pair chosen from an `Accept` header.
///
/// Wildcards are not resolved: a `*/*` winner is returned literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    kind: SmolStr,
    subtype: SmolStr,
}

impl MediaType {
    /// Creates a media type from its two name components.
    pub fn new(kind: &str, subtype: &str) -> Self {
        MediaType {
            kind: SmolStr::new(kind),
            subtype: SmolStr::new(subtype),
        }
    }

    /// The primary type name.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The subtype name.
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// The `type/subtype` form used for key suffixing.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.kind, self.subtype)
    }
}

#[derive(Debug)]
struct MediaRange {
    media: MediaType,
    quality: f32,
}

/// Parses one media range (`type/subtype;param=value;...`).
///
/// Returns `None` for segments without a well-formed `type/subtype` part.
/// A missing or unparseable `q` parameter defaults to `1.0`.
fn parse_media_range(segment: &str) -> Option<MediaRange> {
    let mut parts = segment.split(';');
    let range = parts.next()?.trim();
    let (kind, subtype) = range.split_once('/')?;
    let kind = kind.trim();
    let subtype = subtype.trim();
    if kind.is_empty() || subtype.is_empty() {
        return None;
    }

    let mut quality = 1.0f32;
    for param in parts {
        if let Some((name, value)) = param.split_once('=') {
            if name.trim() == "q" {
                quality = value.trim().parse().unwrap_or(1.0);
            }
        }
    }

    Some(MediaRange {
        media: MediaType::new(kind, subtype),
        quality,
    })
}

/// Returns the highest-ranked media type from an `Accept` header.
///
/// Ranges are sorted by ascending quality with a stable sort and the last
/// entry wins, so the later-listed range takes precedence among equal `q`
/// values. Invalid segments are skipped silently; a blank header, or one
/// with no parseable ranges, yields `None`. The winner is returned
/// verbatim, wildcards included.
pub fn preferred(header: &str) -> Option<MediaType> {
    let mut ranges: Vec<MediaRange> = header.split(',').filter_map(parse_media_range).collect();
    if ranges.is_empty() {
        return None;
    }
    ranges.sort_by(|a, b| a.quality.total_cmp(&b.quality));
    ranges.pop().map(|range| range.media)
}

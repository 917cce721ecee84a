//! Content negotiation for semantic responses

use crate::rdf::RdfSerialization;

/// Pick the serialization for a response.
///
/// The `Accept` header is parsed into a priority-ordered list; the first entry the server
/// supports wins. A range such as `text/*` matches `default` if it is of that type, else
/// the first supported serialization of that type. A missing header, `*/*` or a list with
/// no supported entry yields `default` rather than an error.
pub fn negotiate(accept_header: Option<&str>, default: RdfSerialization) -> RdfSerialization {
    let Some(accept) = accept_header else {
        return default;
    };

    for (media_type, quality) in parse_accept_header(accept) {
        if quality <= 0.0 {
            continue;
        }
        if let Some(range) = media_type.strip_suffix("/*") {
            match serialization_in_range(range, default) {
                Some(serialization) => return serialization,
                None => continue,
            }
        }
        if let Some(serialization) = RdfSerialization::from_media_type(&media_type) {
            return serialization;
        }
    }

    default
}

fn serialization_in_range(range: &str, default: RdfSerialization) -> Option<RdfSerialization> {
    if range == "*" {
        return Some(default);
    }
    std::iter::once(default)
        .chain(RdfSerialization::ALL)
        .find(|serialization| serialization.media_type().split('/').next() == Some(range))
}

/// Serialization of a request body from its `Content-Type`, falling back to `default`.
pub fn request_serialization(
    content_type: Option<&str>,
    default: RdfSerialization,
) -> RdfSerialization {
    content_type.and_then(RdfSerialization::from_media_type).unwrap_or(default)
}

/// Parse Accept header into list of (media_type, quality) pairs, highest quality first.
/// Entries with equal quality keep their header order.
fn parse_accept_header(accept: &str) -> Vec<(String, f32)> {
    let mut types: Vec<(String, f32)> = accept
        .split(',')
        .filter_map(|part| {
            let mut segments = part.trim().split(';');
            let media_type = segments.next()?.trim().to_lowercase();
            if media_type.is_empty() {
                return None;
            }

            let quality = segments
                .find_map(|seg| seg.trim().strip_prefix("q=").and_then(|q| q.parse::<f32>().ok()))
                .unwrap_or(1.0);

            Some((media_type, quality))
        })
        .collect();

    types.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    types
}

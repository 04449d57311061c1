//! Correlates decoded route geometry with scraped instruction fragments.
//!
//! The provider ships a route's geometry (encoded polyline) and its
//! turn-by-turn instructions in separate parts of the page. This module
//! aligns the two: it partitions the decoded coordinate sequence into
//! contiguous, non-overlapping runs and attaches one instruction fragment
//! to each run, producing the path's ordered segment list.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;
use crate::model::{fresh_id, Location, Segment};
use crate::polyline::Polyline;

/// One scraped turn-by-turn instruction, before correlation.
///
/// `point_index` is the provider's hint for which coordinate in the decoded
/// sequence this instruction starts at. Hints are optional and, per the
/// provider's habit, occasionally inconsistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionFragment {
    pub id: String,
    pub point_index: Option<usize>,
    pub text: String,
    pub distance: String,
    pub duration: String,
}

/// Partitions `series` into segments, one per instruction fragment.
///
/// The provider's coordinate sequence omits the literal query endpoints, so
/// the first segment is seeded with `start` and the final destination is
/// appended to the last segment afterwards. The boundary point that closes
/// a segment also opens the next one (shared, physically duplicated).
///
/// Hint inconsistencies never lose geometry: a point arriving past its
/// fragment's declared boundary, or after the final fragment, is merged into
/// the most recently closed segment and reported on the warning channel.
pub fn correlate(
    start: &Location,
    end: &Location,
    series: &Polyline,
    fragments: &[InstructionFragment],
) -> Result<Vec<Segment>, Error> {
    if fragments.is_empty() {
        return Err(Error::NoDirectionsFound);
    }

    let total = series.len();
    let mut segments: Vec<Segment> = Vec::new();
    let mut buffer: Vec<Location> = vec![start.clone()];
    let mut pending = 0usize;
    let mut seed_offset = 0usize;
    let mut consumed = 0usize;

    for coord in series.points() {
        consumed += 1;
        let point = Location::from_coordinate(*coord);

        if pending >= fragments.len() {
            warn!(
                point = consumed,
                "point after final instruction fragment; merging into previous segment"
            );
            if let Some(last) = segments.last_mut() {
                last.append_point(point);
            }
            continue;
        }

        buffer.push(point.clone());

        // A boundary hint equal to the current count closes immediately,
        // possibly several times in a row: a segment whose only own point
        // is its endpoint is a valid instantaneous maneuver.
        while pending < fragments.len() {
            let close = match fragments.get(pending + 1) {
                Some(next) => match next.point_index {
                    Some(hint) => {
                        if consumed > hint {
                            warn!(
                                hint,
                                consumed,
                                fragment = %next.id,
                                "instruction hint out of order; closing segment late"
                            );
                            true
                        } else {
                            consumed == hint
                        }
                    }
                    // no hint to delimit on; keep buffering
                    None => false,
                },
                // final leg: runs to the end of the geometry
                None => consumed == total,
            };

            if !close {
                break;
            }
            let points = std::mem::replace(&mut buffer, vec![point.clone()]);
            segments.push(build_segment(&fragments[pending], points, seed_offset));
            seed_offset = consumed;
            pending += 1;
        }
    }

    if pending < fragments.len() && buffer.len() > 1 {
        // trailing fragments whose hints never matched; flush what we have
        if pending + 1 < fragments.len() {
            warn!(
                unconsumed = fragments.len() - pending - 1,
                "instruction fragments left unconsumed after geometry ended"
            );
        }
        segments.push(build_segment(&fragments[pending], buffer, seed_offset));
    } else if segments.is_empty() {
        // empty geometry: a single leg straight from start to destination
        segments.push(build_segment(&fragments[0], buffer, 0));
    }

    if let Some(last) = segments.last_mut() {
        last.finish(end.clone());
    }

    Ok(segments)
}

fn build_segment(
    fragment: &InstructionFragment,
    points: Vec<Location>,
    seed_offset: usize,
) -> Segment {
    let id = if fragment.id.is_empty() {
        fresh_id("seg")
    } else {
        fragment.id.clone()
    };
    Segment::new(
        points,
        fragment.distance.clone(),
        fragment.duration.clone(),
        fragment.text.clone(),
        fragment.point_index.unwrap_or(seed_offset),
        id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyline::Coordinate;

    fn series(coords: &[(f64, f64)]) -> Polyline {
        Polyline::new(
            coords
                .iter()
                .map(|&(lat, lon)| Coordinate::from_degrees(lat, lon))
                .collect(),
        )
    }

    fn fragment(id: &str, point_index: Option<usize>, text: &str) -> InstructionFragment {
        InstructionFragment {
            id: id.to_string(),
            point_index,
            text: text.to_string(),
            distance: "0.5 mi".to_string(),
            duration: "2 mins".to_string(),
        }
    }

    fn start() -> Location {
        Location::new(36.0, -115.0).with_title("start")
    }

    fn end() -> Location {
        Location::new(36.5, -115.5).with_title("end")
    }

    /// Concatenated segment points, boundary points counted once, must
    /// reconstruct [start] + decoded points + [end].
    fn assert_partition_complete(
        segments: &[Segment],
        start: &Location,
        end: &Location,
        series: &Polyline,
    ) {
        let mut coords = Vec::new();
        for (i, segment) in segments.iter().enumerate() {
            let points = segment.points();
            let skip = if i == 0 { 0 } else { 1 };
            coords.extend(points.iter().skip(skip).map(|p| p.coordinate()));
        }
        let mut expected = vec![start.coordinate()];
        expected.extend_from_slice(series.points());
        expected.push(end.coordinate());
        assert_eq!(coords, expected);
    }

    #[test]
    fn test_zero_fragments_is_no_directions() {
        let geometry = series(&[(36.1, -115.1)]);
        let result = correlate(&start(), &end(), &geometry, &[]);
        assert!(matches!(result, Err(Error::NoDirectionsFound)));
    }

    #[test]
    fn test_single_fragment_spans_whole_route() {
        let geometry = series(&[(36.1, -115.1), (36.2, -115.2), (36.3, -115.3)]);
        let fragments = vec![fragment("f0", None, "Head north")];
        let segments = correlate(&start(), &end(), &geometry, &fragments).unwrap();
        assert_eq!(segments.len(), 1);
        // start + 3 decoded + destination
        assert_eq!(segments[0].points().len(), 5);
        assert_eq!(segments[0].from().title(), Some("start"));
        assert_eq!(segments[0].to().title(), Some("end"));
        assert_partition_complete(&segments, &start(), &end(), &geometry);
    }

    #[test]
    fn test_hinted_partition() {
        let geometry = series(&[
            (36.10, -115.10),
            (36.11, -115.11),
            (36.12, -115.12),
            (36.13, -115.13),
            (36.14, -115.14),
        ]);
        let fragments = vec![
            fragment("f0", None, "Head north"),
            fragment("f1", Some(2), "Turn left"),
            fragment("f2", Some(4), "Turn right"),
        ];
        let segments = correlate(&start(), &end(), &geometry, &fragments).unwrap();
        assert_eq!(segments.len(), 3);

        // segment 0: start + points 1..=2
        assert_eq!(segments[0].points().len(), 3);
        assert_eq!(segments[0].instruction(), "Head north");
        // segment 1: boundary + points 3..=4
        assert_eq!(segments[1].points().len(), 3);
        assert_eq!(segments[1].point_index(), 2);
        // segment 2: boundary + point 5 + destination
        assert_eq!(segments[2].points().len(), 3);
        assert_eq!(segments[2].to().title(), Some("end"));

        assert_partition_complete(&segments, &start(), &end(), &geometry);
    }

    #[test]
    fn test_shared_boundary_point() {
        let geometry = series(&[(36.10, -115.10), (36.11, -115.11), (36.12, -115.12)]);
        let fragments = vec![
            fragment("f0", None, "Head north"),
            fragment("f1", Some(2), "Turn left"),
        ];
        let segments = correlate(&start(), &end(), &geometry, &fragments).unwrap();
        assert_eq!(segments.len(), 2);
        let boundary = segments[0].points().last().unwrap();
        let opener = segments[1].points().first().unwrap();
        assert_eq!(boundary.coordinate(), opener.coordinate());
    }

    #[test]
    fn test_fragment_metadata_copied_verbatim() {
        let geometry = series(&[(36.1, -115.1)]);
        let fragments = vec![fragment("step-7", None, "Make a U-turn")];
        let segments = correlate(&start(), &end(), &geometry, &fragments).unwrap();
        assert_eq!(segments[0].id(), "step-7");
        assert_eq!(segments[0].instruction(), "Make a U-turn");
        assert_eq!(segments[0].distance(), "0.5 mi");
        assert_eq!(segments[0].duration(), "2 mins");
    }

    #[test]
    fn test_zero_distance_maneuver() {
        // U-turn: the geometry repeats a point, so the segment delimited
        // there has numerically identical first and last points.
        let geometry = series(&[
            (36.10, -115.10),
            (36.10, -115.10),
            (36.20, -115.20),
        ]);
        let fragments = vec![
            fragment("f0", None, "Head north"),
            fragment("f1", Some(2), "Make a U-turn"),
            fragment("f2", Some(2), "Head south"),
        ];
        let segments = correlate(&start(), &end(), &geometry, &fragments).unwrap();
        assert_eq!(segments.len(), 3);
        let uturn = &segments[1];
        assert_eq!(
            uturn.points().first().unwrap().coordinate(),
            uturn.points().last().unwrap().coordinate()
        );
        assert_partition_complete(&segments, &start(), &end(), &geometry);
    }

    #[test]
    fn test_out_of_order_hint_keeps_all_points() {
        let geometry = series(&[
            (36.10, -115.10),
            (36.11, -115.11),
            (36.12, -115.12),
            (36.13, -115.13),
            (36.14, -115.14),
        ]);
        // f2's hint points before f1's boundary; the correlator closes the
        // middle segment late instead of dropping geometry.
        let fragments = vec![
            fragment("f0", None, "Head north"),
            fragment("f1", Some(3), "Turn left"),
            fragment("f2", Some(2), "Turn right"),
        ];
        let segments = correlate(&start(), &end(), &geometry, &fragments).unwrap();
        assert_eq!(segments.len(), 3);
        assert_partition_complete(&segments, &start(), &end(), &geometry);
    }

    #[test]
    fn test_unhinted_middle_fragment_flushes_tail() {
        let geometry = series(&[(36.10, -115.10), (36.11, -115.11), (36.12, -115.12)]);
        // f1 closes at 1; f2 carries no hint, so f1's buffer runs to the
        // end of the geometry and f2 goes unconsumed.
        let fragments = vec![
            fragment("f0", None, "Head north"),
            fragment("f1", Some(1), "Turn left"),
            fragment("f2", None, "Turn right"),
        ];
        let segments = correlate(&start(), &end(), &geometry, &fragments).unwrap();
        assert_eq!(segments.len(), 2);
        assert_partition_complete(&segments, &start(), &end(), &geometry);
    }

    #[test]
    fn test_empty_geometry_single_leg() {
        let geometry = series(&[]);
        let fragments = vec![fragment("f0", None, "Walk across the street")];
        let segments = correlate(&start(), &end(), &geometry, &fragments).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].points().len(), 2);
        assert_partition_complete(&segments, &start(), &end(), &geometry);
    }
}

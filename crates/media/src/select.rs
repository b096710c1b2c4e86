//! Format selection.
//!
//! Picks one [`FormatDescriptor`] for a [`MediaKind`]. Video requests need a
//! muxed rendition (audio and video in one file); audio requests prefer an
//! audio-only rendition and fall back to anything that carries audio.

use std::cmp::Ordering;

use reelbot_common::types::{MediaKind, QualityPreference, TieBreak};

use crate::source::FormatDescriptor;

/// How to choose among candidate formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub prefer: QualityPreference,
    pub tie_break: TieBreak,
    /// Video only: ignore renditions taller than this when others remain.
    pub max_height: Option<u32>,
}

/// Choose a format for `kind`, or `None` when nothing suitable is listed.
#[must_use]
pub fn select_format<'a>(
    formats: &'a [FormatDescriptor],
    kind: MediaKind,
    policy: &SelectionPolicy,
) -> Option<&'a FormatDescriptor> {
    let candidates = candidates(formats, kind, policy.max_height);
    if candidates.is_empty() {
        return None;
    }

    if policy.prefer == QualityPreference::FirstListed
        || !candidates.iter().any(|f| is_ranked(f, kind))
    {
        return candidates.first().copied();
    }

    let mut best = candidates[0];
    for &candidate in &candidates[1..] {
        match compare(candidate, best, kind) {
            Ordering::Greater => best = candidate,
            Ordering::Equal if policy.tie_break == TieBreak::LastListed => best = candidate,
            _ => {},
        }
    }
    Some(best)
}

fn candidates(
    formats: &[FormatDescriptor],
    kind: MediaKind,
    max_height: Option<u32>,
) -> Vec<&FormatDescriptor> {
    match kind {
        MediaKind::Video => {
            let muxed: Vec<_> = formats
                .iter()
                .filter(|f| f.has_video() && f.has_audio())
                .collect();
            let Some(limit) = max_height else {
                return muxed;
            };
            let capped: Vec<_> = muxed
                .iter()
                .copied()
                .filter(|f| f.height.is_none_or(|h| h <= limit))
                .collect();
            if capped.is_empty() { muxed } else { capped }
        },
        MediaKind::Audio => {
            let audio_only: Vec<_> = formats.iter().filter(|f| f.is_audio_only()).collect();
            if audio_only.is_empty() {
                formats.iter().filter(|f| f.has_audio()).collect()
            } else {
                audio_only
            }
        },
    }
}

fn is_ranked(f: &FormatDescriptor, kind: MediaKind) -> bool {
    f.rank.is_some()
        || f.total_bitrate.is_some()
        || match kind {
            MediaKind::Video => f.height.is_some(),
            MediaKind::Audio => f.audio_bitrate.is_some(),
        }
}

/// Lexicographic on (rank, height or audio bitrate, total bitrate).
fn compare(a: &FormatDescriptor, b: &FormatDescriptor, kind: MediaKind) -> Ordering {
    let secondary = |f: &FormatDescriptor| match kind {
        MediaKind::Video => f.height.map(f64::from),
        MediaKind::Audio => f.audio_bitrate,
    };
    cmp_opt(a.rank, b.rank)
        .then_with(|| cmp_opt(secondary(a), secondary(b)))
        .then_with(|| cmp_opt(a.total_bitrate, b.total_bitrate))
}

/// Unknown sorts below any known value.
fn cmp_opt(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn muxed(id: &str, rank: Option<f64>, height: Option<u32>) -> FormatDescriptor {
        FormatDescriptor {
            rank,
            height,
            video_codec: Some("avc1".into()),
            audio_codec: Some("mp4a".into()),
            container: Some("mp4".into()),
            ..FormatDescriptor::new(id)
        }
    }

    fn audio(id: &str, abr: Option<f64>) -> FormatDescriptor {
        FormatDescriptor {
            audio_bitrate: abr,
            video_codec: Some("none".into()),
            audio_codec: Some("opus".into()),
            container: Some("webm".into()),
            ..FormatDescriptor::new(id)
        }
    }

    fn video_only(id: &str, height: u32) -> FormatDescriptor {
        FormatDescriptor {
            height: Some(height),
            rank: Some(100.0),
            video_codec: Some("vp9".into()),
            audio_codec: Some("none".into()),
            ..FormatDescriptor::new(id)
        }
    }

    fn pick<'a>(
        formats: &'a [FormatDescriptor],
        kind: MediaKind,
        policy: SelectionPolicy,
    ) -> Option<&'a str> {
        select_format(formats, kind, &policy).map(|f| f.id.as_str())
    }

    #[test]
    fn highest_ranked_muxed_video_wins() {
        let formats = vec![
            muxed("18", Some(6.0), Some(360)),
            video_only("137", 1080),
            muxed("22", Some(8.0), Some(720)),
            audio("251", Some(130.0)),
        ];
        assert_eq!(
            pick(&formats, MediaKind::Video, SelectionPolicy::default()),
            Some("22")
        );
    }

    #[test]
    fn video_without_muxed_format_is_none() {
        let formats = vec![video_only("137", 1080), audio("251", Some(130.0))];
        assert_eq!(
            pick(&formats, MediaKind::Video, SelectionPolicy::default()),
            None
        );
        assert_eq!(pick(&[], MediaKind::Video, SelectionPolicy::default()), None);
    }

    #[test]
    fn audio_prefers_audio_only() {
        let formats = vec![
            muxed("18", Some(6.0), Some(360)),
            audio("139", Some(48.0)),
            audio("251", Some(130.0)),
        ];
        assert_eq!(
            pick(&formats, MediaKind::Audio, SelectionPolicy::default()),
            Some("251")
        );
    }

    #[test]
    fn audio_falls_back_to_muxed() {
        let formats = vec![
            video_only("137", 1080),
            muxed("18", Some(6.0), Some(360)),
            muxed("22", Some(8.0), Some(720)),
        ];
        assert_eq!(
            pick(&formats, MediaKind::Audio, SelectionPolicy::default()),
            Some("22")
        );
    }

    #[test]
    fn unranked_formats_pick_first_listed() {
        let formats = vec![muxed("a", None, None), muxed("b", None, None)];
        for tie_break in [TieBreak::FirstListed, TieBreak::LastListed] {
            let policy = SelectionPolicy {
                tie_break,
                ..SelectionPolicy::default()
            };
            assert_eq!(pick(&formats, MediaKind::Video, policy), Some("a"));
        }
    }

    #[rstest]
    #[case(TieBreak::FirstListed, "a")]
    #[case(TieBreak::LastListed, "c")]
    fn ties_follow_policy(#[case] tie_break: TieBreak, #[case] expected: &str) {
        let formats = vec![
            muxed("a", Some(5.0), Some(720)),
            muxed("low", Some(1.0), Some(144)),
            muxed("b", Some(5.0), Some(720)),
            muxed("c", Some(5.0), Some(720)),
        ];
        let policy = SelectionPolicy {
            tie_break,
            ..SelectionPolicy::default()
        };
        assert_eq!(pick(&formats, MediaKind::Video, policy), Some(expected));
    }

    #[test]
    fn first_listed_preference_ignores_rank() {
        let formats = vec![muxed("18", Some(1.0), None), muxed("22", Some(9.0), None)];
        let policy = SelectionPolicy {
            prefer: QualityPreference::FirstListed,
            ..SelectionPolicy::default()
        };
        assert_eq!(pick(&formats, MediaKind::Video, policy), Some("18"));
    }

    #[test]
    fn max_height_caps_unless_nothing_fits() {
        let formats = vec![
            muxed("360", Some(6.0), Some(360)),
            muxed("720", Some(8.0), Some(720)),
        ];
        let capped = SelectionPolicy {
            max_height: Some(480),
            ..SelectionPolicy::default()
        };
        assert_eq!(pick(&formats, MediaKind::Video, capped), Some("360"));

        let too_small = SelectionPolicy {
            max_height: Some(100),
            ..SelectionPolicy::default()
        };
        assert_eq!(pick(&formats, MediaKind::Video, too_small), Some("720"));
    }

    #[test]
    fn height_breaks_equal_rank() {
        let formats = vec![
            muxed("small", Some(5.0), Some(360)),
            muxed("big", Some(5.0), Some(720)),
            muxed("unknown", Some(5.0), None),
        ];
        assert_eq!(
            pick(&formats, MediaKind::Video, SelectionPolicy::default()),
            Some("big")
        );
    }
}

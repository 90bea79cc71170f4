//! Tempo estimation from a decoded audio buffer.
//!
//! Onsets are detected where the signal rises sharply between adjacent
//! samples, then inter-onset intervals are rounded to the nearest 100
//! samples, histogrammed, and the dominant interval is converted to BPM
//! and folded into a 75..=150 range.

use std::collections::BTreeMap;

/// First-difference rise that counts as an onset.
const ONSET_THRESHOLD: f32 = 0.25;

/// Fewer detected onsets than this falls back to [`FALLBACK_BPM`].
const MIN_ONSETS: usize = 10;

/// Default tempo when the material gives no usable onsets.
pub const FALLBACK_BPM: u32 = 120;

/// Intervals are grouped by rounding to the nearest multiple of this.
const BUCKET_SIZE: usize = 100;

/// Indices where the signal rises by more than the threshold relative to
/// the previous sample. The difference is signed, so an upward
/// zero-crossing (say -0.5 to 0.5) is an onset too.
pub fn detect_onsets(samples: &[f32]) -> Vec<usize> {
    let mut onsets = Vec::new();
    for i in 1..samples.len() {
        if samples[i] - samples[i - 1] > ONSET_THRESHOLD {
            onsets.push(i);
        }
    }
    onsets
}

/// Fold a raw tempo into the 75..=150 BPM range by octave doubling/halving.
pub fn normalize_bpm(mut bpm: f64) -> f64 {
    while bpm < 75.0 {
        bpm *= 2.0;
    }
    while bpm > 150.0 {
        bpm /= 2.0;
    }
    bpm
}

/// Estimate the tempo of a mono sample buffer, in whole BPM.
///
/// Intervals whose implied tempo falls outside the open (40, 200) range
/// are discarded before grouping. Ties between equally-common rounded
/// intervals resolve to the smallest interval.
pub fn estimate_bpm(samples: &[f32], sample_rate: u32) -> u32 {
    let onsets = detect_onsets(samples);
    if onsets.len() < MIN_ONSETS {
        return FALLBACK_BPM;
    }

    // Ascending by rounded interval, so a strictly-greater count
    // comparison keeps the smallest interval on ties.
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for pair in onsets.windows(2) {
        let interval = pair[1] - pair[0];
        let tempo = 60.0 * sample_rate as f64 / interval as f64;
        if tempo > 40.0 && tempo < 200.0 {
            // Round to nearest, half up, then keep the rounded interval
            // itself as the grouping key.
            let rounded = (interval + BUCKET_SIZE / 2) / BUCKET_SIZE * BUCKET_SIZE;
            *counts.entry(rounded).or_insert(0) += 1;
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (&rounded, &count) in &counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((rounded, count)),
        }
    }

    let Some((rounded, _)) = best else {
        return FALLBACK_BPM;
    };

    let bpm = 60.0 * sample_rate as f64 / rounded as f64;
    normalize_bpm(bpm).round() as u32
}

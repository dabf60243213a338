//! Pure sliding-offset comparison of two fingerprints.
//!
//! Two hash points match when their Hamming distance stays within a
//! bit threshold. For every relative offset of the two point sequences
//! we find the densest run of matching points; the best alignment
//! across all offsets determines the shared boundary. Selection is
//! fully ordered (matched points, then earliest run start, then
//! smallest offset) so repeated runs over identical input pick the
//! identical alignment.

/// Alignment of a probe fingerprint against one peer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Alignment {
    /// Relative offset: probe point `i` lines up with peer point
    /// `i - shift`.
    pub shift: isize,
    /// First point of the matching run, probe index space, inclusive.
    pub run_start: usize,
    /// Last point of the matching run, probe index space, inclusive.
    pub run_end: usize,
    /// Matching points inside the run.
    pub matched: usize,
    /// `matched` over the run span; the confidence score.
    pub density: f64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MatchParams {
    /// Maximum differing bits for two points to match.
    pub bit_threshold: u32,
    /// Shortest run span that counts as a detection.
    pub min_run_points: usize,
    /// Consecutive mismatches tolerated inside a run.
    pub max_run_gap: usize,
    /// Minimum in-run match density.
    pub min_density: f64,
}

pub(crate) fn point_matches(a: u32, b: u32, bit_threshold: u32) -> bool {
    (a ^ b).count_ones() <= bit_threshold
}

/// True when `candidate` should replace `current` as the best known
/// alignment: more matched points, or equally many with an earlier run
/// start, or the same start with a smaller offset.
pub(crate) fn prefer(
    candidate: &Alignment,
    current: Option<&Alignment>,
) -> bool {
    match current {
        None => true,
        Some(best) => {
            candidate.matched > best.matched
                || (candidate.matched == best.matched
                    && (candidate.run_start < best.run_start
                        || (candidate.run_start == best.run_start
                            && candidate.shift < best.shift)))
        }
    }
}

/// Best alignment of `probe` against `peer` over all offsets, or
/// `None` when no run satisfies the length and density gates.
pub(crate) fn best_alignment(
    probe: &[u32],
    peer: &[u32],
    params: &MatchParams,
) -> Option<Alignment> {
    if probe.is_empty() || peer.is_empty() || params.min_run_points == 0 {
        return None;
    }

    let mut best: Option<Alignment> = None;
    let lo = 1 - peer.len() as isize;
    let hi = probe.len() as isize - 1;
    for shift in lo..=hi {
        let start = shift.max(0) as usize;
        let end = (peer.len() as isize + shift)
            .clamp(0, probe.len() as isize) as usize;
        if end.saturating_sub(start) < params.min_run_points {
            continue;
        }
        if let Some(candidate) = best_run(probe, peer, shift, start, end, params)
            && prefer(&candidate, best.as_ref())
        {
            best = Some(candidate);
        }
    }
    best
}

/// Densest qualifying run at one offset. `start..end` is the probe
/// index range where the two sequences overlap.
fn best_run(
    probe: &[u32],
    peer: &[u32],
    shift: isize,
    start: usize,
    end: usize,
    params: &MatchParams,
) -> Option<Alignment> {
    // (run_start, last_match, matched)
    let mut best: Option<(usize, usize, usize)> = None;
    let mut open: Option<(usize, usize, usize)> = None;

    for i in start..end {
        let j = (i as isize - shift) as usize;
        if !point_matches(probe[i], peer[j], params.bit_threshold) {
            continue;
        }
        open = match open {
            None => Some((i, i, 1)),
            Some((run_start, last, matched))
                if i - last > params.max_run_gap + 1 =>
            {
                commit(&mut best, (run_start, last, matched));
                Some((i, i, 1))
            }
            Some((run_start, _, matched)) => Some((run_start, i, matched + 1)),
        };
    }
    if let Some(run) = open {
        commit(&mut best, run);
    }

    let (run_start, run_end, matched) = best?;
    let span = run_end - run_start + 1;
    if span < params.min_run_points {
        return None;
    }
    let density = matched as f64 / span as f64;
    if density < params.min_density {
        return None;
    }
    Some(Alignment {
        shift,
        run_start,
        run_end,
        matched,
        density,
    })
}

fn commit(
    best: &mut Option<(usize, usize, usize)>,
    run: (usize, usize, usize),
) {
    let replace = match best {
        None => true,
        Some(current) => {
            run.2 > current.2 || (run.2 == current.2 && run.0 < current.0)
        }
    };
    if replace {
        *best = Some(run);
    }
}

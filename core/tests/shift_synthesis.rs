//! Greedy shift synthesis: containment, fidelity, minimum duration.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use staffplan_core::{
    coverage::coverage_report,
    integerizer_stage::IntegerDemandCurve,
    shift_synthesis_stage::{synthesize_shifts, SynthesisParams},
    window::StaffingWindow,
};

fn curve(start_slot: usize, heads: &[u32]) -> IntegerDemandCurve {
    let window = StaffingWindow::from_slots(start_slot, start_slot + heads.len())
        .expect("valid window");
    IntegerDemandCurve::from_window_heads(window, heads).expect("heads fit window")
}

/// Piecewise-flat curve: a handful of plateaus of random height.
fn random_heads(rng: &mut Pcg64Mcg) -> Vec<u32> {
    let mut heads = Vec::new();
    for _ in 0..rng.gen_range(1..7) {
        let height = rng.gen_range(0..5);
        let width = rng.gen_range(1..8);
        heads.extend(std::iter::repeat(height).take(width));
    }
    heads
}

#[test]
fn spike_inside_minimum_keeps_shifts_open() {
    // 1 head, spike to 2, then nothing; minimum 3h = 12 slots.
    let mut heads = vec![1, 1, 1, 1, 2, 2];
    heads.extend(vec![0; 18]);
    let c = curve(40, &heads);
    let params = SynthesisParams {
        min_shift_slots:     12,
        max_starts_per_slot: None,
    };
    let set = synthesize_shifts(&c, "server", params);

    let spans: Vec<_> = set.iter().map(|s| (s.start_slot, s.end_slot)).collect();
    assert_eq!(spans, vec![(40, 52), (44, 56)]);
    assert!(set.iter().all(|s| s.duration_slots() >= 12));

    let report = coverage_report(&c, &set);
    assert_eq!(report.at(46).map(|s| s.covered), Some(2));
    assert_eq!(report.at(46).map(|s| s.over()), Some(2));
    assert_eq!(report.under_units(), 0);
}

#[test]
fn shifts_stay_inside_the_window() {
    let mut rng = Pcg64Mcg::seed_from_u64(0x5EED_0101);
    for case in 0..300 {
        let heads = random_heads(&mut rng);
        let start = rng.gen_range(0..=96 - heads.len());
        let c = curve(start, &heads);
        let params = SynthesisParams {
            min_shift_slots:     rng.gen_range(1..16),
            max_starts_per_slot: if rng.gen_bool(0.5) { Some(rng.gen_range(1..3)) } else { None },
        };
        let set = synthesize_shifts(&c, "cook", params);
        let end = start + heads.len();

        for shift in set.iter() {
            assert!(shift.start_slot >= start, "case {case}: {shift:?}");
            assert!(shift.end_slot <= end, "case {case}: {shift:?}");
            assert!(shift.start_slot < shift.end_slot, "case {case}: {shift:?}");
            if shift.clamped_at_day_end {
                assert_eq!(shift.end_slot, end, "case {case}: {shift:?}");
                assert!(shift.duration_slots() < params.min_shift_slots);
            } else {
                assert!(
                    shift.duration_slots() >= params.min_shift_slots,
                    "case {case}: {shift:?}"
                );
            }
        }
    }
}

#[test]
fn unbounded_starts_never_leave_a_slot_short() {
    let mut rng = Pcg64Mcg::seed_from_u64(0x5EED_0102);
    for case in 0..300 {
        let heads = random_heads(&mut rng);
        let c = curve(44, &heads);
        let params = SynthesisParams {
            min_shift_slots:     rng.gen_range(1..16),
            max_starts_per_slot: None,
        };
        let set = synthesize_shifts(&c, "server", params);
        let report = coverage_report(&c, &set);
        assert_eq!(report.under_units(), 0, "case {case}: heads = {heads:?}");
    }
}

#[test]
fn plateaus_no_shorter_than_the_minimum_are_covered_exactly() {
    let mut rng = Pcg64Mcg::seed_from_u64(0x5EED_0104);
    for case in 0..300 {
        let min_shift_slots = rng.gen_range(1..7);
        let mut heads = Vec::new();
        for _ in 0..rng.gen_range(1..6) {
            let height = rng.gen_range(0..5);
            let width = rng.gen_range(min_shift_slots..min_shift_slots + 7);
            heads.extend(std::iter::repeat(height).take(width));
        }
        let start = rng.gen_range(0..=96 - heads.len());
        let c = curve(start, &heads);
        let params = SynthesisParams {
            min_shift_slots,
            max_starts_per_slot: None,
        };
        let set = synthesize_shifts(&c, "server", params);

        let report = coverage_report(&c, &set);
        assert!(report.is_exact(), "case {case}: heads = {heads:?}, min = {min_shift_slots}");
        assert_eq!(set.clamped_count(), 0, "case {case}");
    }
}

#[test]
fn long_plateaus_are_covered_exactly() {
    let mut heads = vec![1; 8];
    heads.extend(vec![3; 16]);
    heads.extend(vec![1; 16]);
    let c = curve(40, &heads);
    let params = SynthesisParams {
        min_shift_slots:     8,
        max_starts_per_slot: None,
    };
    let set = synthesize_shifts(&c, "server", params);

    assert_eq!(set.len(), 3);
    assert!(coverage_report(&c, &set).is_exact());
    assert_eq!(set.clamped_count(), 0);
}

#[test]
fn staggering_limits_starts_per_slot() {
    let c = curve(40, &[3; 8]);
    let params = SynthesisParams {
        min_shift_slots:     4,
        max_starts_per_slot: Some(1),
    };
    let set = synthesize_shifts(&c, "server", params);

    let mut starts: Vec<_> = set.iter().map(|s| s.start_slot).collect();
    starts.sort_unstable();
    let before = starts.len();
    starts.dedup();
    assert_eq!(starts.len(), before, "two shifts share a start slot");
}

#[test]
fn synthesis_is_deterministic() {
    let mut rng = Pcg64Mcg::seed_from_u64(0x5EED_0103);
    let heads = random_heads(&mut rng);
    let c = curve(46, &heads);
    let params = SynthesisParams {
        min_shift_slots:     12,
        max_starts_per_slot: Some(1),
    };
    assert_eq!(
        synthesize_shifts(&c, "server", params),
        synthesize_shifts(&c, "server", params)
    );
}

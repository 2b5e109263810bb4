use midiseq::prelude::*;
use pretty_assertions::assert_eq;

fn configurations() -> Vec<TimeUnits> {
    vec![
        TimeUnits::DEFAULT,
        TimeUnits::new(3, 90., 96),
        TimeUnits::new(7, 172.5, 5),
        TimeUnits::new(1, 60., 1),
    ]
}

#[test]
fn test_ticks_survive_the_round_trip() {
    for units in configurations() {
        for ticks in (0..5_000).step_by(7).chain([1 << 40, i64::MAX / 2]) {
            let time = BarBeatTime::from_ticks(ticks, units);
            assert_eq!(time.to_ticks(), ticks, "{units:?}");
            assert!(time.beat() < units.beats_per_bar);
            assert!(time.subbeat() < units.subbeat_divisor);
        }
    }
}

#[test]
fn test_add_then_subtract_is_identity() {
    for units in configurations() {
        let samples: Vec<BarBeatTime> = [-4_321, -17, -1, 0, 1, 13, 480, 9_999]
            .into_iter()
            .map(|t| BarBeatTime::from_ticks(t, units))
            .collect();
        for a in &samples {
            for b in &samples {
                assert_eq!((*a + *b) - *b, *a, "{a} {b}");
                assert_eq!((*a - *b).to_ticks(), a.to_ticks() - b.to_ticks());
            }
        }
    }
}

#[test]
fn test_equality_uses_tick_counts() {
    let one_beat_bars = TimeUnits::DEFAULT.with_beats_per_bar(1);
    let four_beat_bars = TimeUnits::DEFAULT;

    // beat 3 does not fit in a one beat bar, so it carries into the bar
    let a = BarBeatTime::new(4, 3, 2, one_beat_bars);
    let b = BarBeatTime::new(4, 3, 2, four_beat_bars);
    assert_ne!(a, b);
    assert_eq!(a.to_ticks(), 7 * 480 + 2);
    assert_eq!(b.to_ticks(), 19 * 480 + 2);

    // different radices, same position
    let c = BarBeatTime::new(1, 0, 0, TimeUnits::new(3, 120., 480));
    let d = BarBeatTime::new(0, 3, 0, four_beat_bars);
    assert_eq!(c, d);
}

#[test]
fn test_seconds() {
    let units = TimeUnits::new(4, 90., 480);
    let time = BarBeatTime::new(2, 1, 240, units);
    assert_eq!(time.total_beats(), 9.5);
    assert_eq!(time.to_seconds(), 9.5 * 60. / 90.);
    assert_eq!(BarBeatTime::from_seconds(time.to_seconds(), units), time);
}

#[test]
fn test_text_form_recovers_everything() {
    let units = TimeUnits::new(5, 133.25, 12);
    for ticks in [-61, 0, 7, 61, 600] {
        let time = BarBeatTime::from_ticks(ticks, units);
        let parsed: BarBeatTime = time.to_string().parse().unwrap();
        assert_eq!(parsed, time);
        assert_eq!(parsed.units(), units);
    }
}

#[test]
fn test_changing_radix_keeps_ticks() {
    let mut time = BarBeatTime::new(3, 2, 100, TimeUnits::DEFAULT);
    let ticks = time.to_ticks();

    time.set_beats_per_bar(3);
    assert_eq!(time.to_ticks(), ticks);
    assert_eq!((time.bar(), time.beat(), time.subbeat()), (4, 2, 100));

    // twice as many subbeats per beat: the same ticks cover half the beats
    time.set_subbeat_divisor(960);
    assert_eq!(time.to_ticks(), ticks);
    assert_eq!((time.bar(), time.beat(), time.subbeat()), (2, 1, 100));
}

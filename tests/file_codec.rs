use midiseq::prelude::*;
use pretty_assertions::assert_eq;
use uuid::Uuid;

const HEADER: [u8; 14] = [
    0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, 0x00, 0x01, 0x00, 0x01, 0x01, 0xE0,
];

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn with_track(body: &[u8]) -> Vec<u8> {
    let mut bytes = HEADER.to_vec();
    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
    bytes.extend_from_slice(body);
    bytes
}

/// (bytes without delta, delta) for every event of every track
fn tuples(tracks: &[TrackChunk]) -> Vec<Vec<(Vec<u8>, Option<u32>)>> {
    tracks
        .iter()
        .map(|track| {
            track
                .events()
                .iter()
                .map(|e| (e.to_bytes(), e.delta()))
                .collect()
        })
        .collect()
}

#[test]
fn test_tempo_then_end_of_track() {
    init();
    let bytes = with_track(&[
        0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // 500000 us per quarter
        0x83, 0x60, 0xFF, 0x2F, 0x00, // delta 480, end of track
    ]);

    let (header, tracks) = decode(&bytes).unwrap();
    assert_eq!(header.format(), 1);
    assert_eq!(header.track_count(), 1);
    assert_eq!(header.division(), 480);

    let events: Vec<&Event> = tracks[0].events().iter().collect();
    assert_eq!(events.len(), 2);

    let tempo = events[0].as_meta().unwrap();
    assert_eq!(tempo.data(), &MetaData::Tempo(Tempo::from_bpm(120.)));
    assert_eq!(events[0].time().to_ticks(), 0);
    assert_eq!((events[0].time().bar(), events[0].time().beat()), (0, 0));

    assert_eq!(events[1].as_meta().unwrap().data(), &MetaData::EndOfTrack);
    assert_eq!(events[1].time().to_ticks(), 480);
    assert_eq!((events[1].time().bar(), events[1].time().beat()), (0, 1));
    assert_eq!(events[1].delta(), Some(480));

    assert_eq!(encode(&header, &tracks), bytes);
}

#[test]
fn test_latin1_track_name_survives_a_round_trip() {
    init();
    let bytes = with_track(&[
        0x00, 0xFF, 0x03, 0x04, b'C', b'a', b'f', 0xE9, // "Café" in Latin-1
        0x00, 0xFF, 0x2F, 0x00,
    ]);

    let (header, tracks) = decode(&bytes).unwrap();
    assert_eq!(tracks[0].name().as_deref(), Some("Caf\u{FFFD}"));
    assert_eq!(encode(&header, &tracks), bytes);
}

#[test]
fn test_extreme_trajectory_survives_a_round_trip() {
    init();
    let trajectory = Trajectory::new(1e-300, -f64::MAX, 5e-324, f64::MAX);
    let node = NodeEvent::add(
        NodeIdentifier::new(Uuid::from_bytes([3; 16])),
        trajectory,
        NoteGenerator {
            channel: 0,
            note: 60,
            velocity: 100,
            duration: Duration::Quarter,
        },
        BarBeatTime::zero(TimeUnits::DEFAULT),
    );
    let file = MidiFile::new(480, vec![TrackChunk::from_events([node])]);

    let parsed = MidiFile::parse(&file.to_bytes()).unwrap();
    let event = parsed.tracks()[0].events().iter().next().unwrap();
    let NodeAction::Add {
        trajectory: decoded,
        ..
    } = event.as_node().unwrap().action()
    else {
        panic!("expected an add event, got {event}");
    };
    assert_eq!(*decoded, trajectory);
}

#[test]
fn test_round_trip_keeps_kinds_data_and_deltas() {
    init();
    let units = TimeUnits::new(4, 120., 96);
    let at = |ticks| BarBeatTime::from_ticks(ticks, units);
    let node = NodeIdentifier::in_loop(Uuid::from_bytes([1; 16]), Uuid::from_bytes([2; 16]));

    let lead = TrackChunk::from_events([
        Event::from(MetaEvent::new(MetaData::TrackName("lead".into()), at(0))),
        Event::from(MetaEvent::new(MetaData::time_signature(TimeSignature::THREE_FOUR), at(0))),
        Event::from(ChannelEvent::note_on(3, 64, 90, at(0))),
        Event::from(ChannelEvent::new(
            Status::new(StatusKind::ProgramChange, 3),
            12,
            None,
            at(24),
        )),
        Event::from(ChannelEvent::new(
            Status::new(StatusKind::PitchBend, 3),
            0,
            Some(64),
            at(24),
        )),
        Event::from(ChannelEvent::note_off(3, 64, at(200_000))),
        Event::from(MetaEvent::new(
            MetaData::Other {
                kind: 0x7F,
                data: vec![0, 0, 0x41],
            },
            at(200_000),
        )),
    ]);
    let nodes = TrackChunk::from_events([
        Event::from(NodeEvent::add(
            node,
            Trajectory::new(0.5, -1., 2., 0.25),
            NoteGenerator {
                channel: 9,
                note: 36,
                velocity: 127,
                duration: Duration::DottedSixteenth,
            },
            at(96),
        )),
        Event::from(NodeEvent::remove(node, at(192))),
    ]);

    let file = MidiFile::new(96, vec![lead, nodes]);
    let bytes = file.to_bytes();
    let (header, tracks) = decode(&bytes).unwrap();
    assert_eq!(header, *file.header());

    let again = encode(&header, &tracks);
    assert_eq!(again, bytes);
    assert_eq!(tuples(&decode(&again).unwrap().1), tuples(&tracks));

    // end of track appended on write
    assert_eq!(tracks[0].events().len(), 8);
    assert_eq!(tracks[1].events().len(), 3);
    assert_eq!(tracks[0].name().as_deref(), Some("lead"));
    assert_eq!(tracks[1].events().node_events().count(), 2);

    let deltas: Vec<Option<u32>> = tracks[0].events().iter().map(Event::delta).collect();
    assert_eq!(
        deltas,
        vec![Some(0), Some(0), Some(0), Some(24), Some(0), Some(199_976), Some(0), Some(0)]
    );
}

#[test]
fn test_events_out_of_order_are_clamped() {
    let units = TimeUnits::default();
    let track = TrackChunk::from_events([
        ChannelEvent::note_on(0, 60, 100, BarBeatTime::new(1, 0, 0, units)),
        ChannelEvent::note_on(0, 62, 100, BarBeatTime::new(0, 2, 0, units)),
    ]);
    let bytes = MidiFile::new(480, vec![track]).to_bytes();
    let (_, tracks) = decode(&bytes).unwrap();

    let ticks: Vec<i64> = tracks[0].events().iter().map(|e| e.time().to_ticks()).collect();
    assert_eq!(ticks, vec![1_920, 1_920, 1_920]);
}

#[test]
fn test_structural_errors() {
    let mut bad_tag = with_track(&[0x00, 0xFF, 0x2F, 0x00]);
    bad_tag[14..18].copy_from_slice(b"MTrx");
    let err = decode(&bad_tag).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::StructurallyUnsound);
    assert_eq!(
        err.parse_error_kind(),
        Some(&ParseError::Chunk(ChunkError::Tag {
            expected: *b"MTrk",
            found: *b"MTrx"
        }))
    );

    // declared length runs past the end of the buffer
    let mut short = with_track(&[0x00, 0xFF, 0x2F, 0x00]);
    short[21] = 0x10;
    assert_eq!(
        decode(&short).unwrap_err().category(),
        ErrorCategory::StructurallyUnsound
    );

    // a meta payload that runs past the declared chunk
    let overrun = with_track(&[0x00, 0xFF, 0x03, 0x09, b'a']);
    assert_eq!(
        decode(&overrun).unwrap_err().category(),
        ErrorCategory::StructurallyUnsound
    );

    assert!(decode(&HEADER[..10]).unwrap_err().is_out_of_bounds());
}

#[test]
fn test_unsupported_format_and_event() {
    let mut format_zero = with_track(&[0x00, 0xFF, 0x2F, 0x00]);
    format_zero[9] = 0x00;
    let err = decode(&format_zero).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnsupportedFormat);
    assert_eq!(
        err.parse_error_kind(),
        Some(&ParseError::Header(HeaderError::UnsupportedFormat(0)))
    );

    let sysex = with_track(&[0x00, 0xF0, 0x01, 0xF7, 0x00, 0xFF, 0x2F, 0x00]);
    let err = decode(&sysex).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnsupportedEvent);
    assert_eq!(err.parse_error_kind(), Some(&ParseError::UnsupportedEvent(0xF0)));
    // reported just past the status byte
    assert_eq!(err.position(), 24);
}

#[test]
fn test_loops_survive_a_file() {
    init();
    let units = TimeUnits::default();
    let body: EventContainer = [
        ChannelEvent::note_on(0, 60, 100, BarBeatTime::zero(units)),
        ChannelEvent::note_off(0, 60, BarBeatTime::new(0, 1, 0, units)),
    ]
    .into_iter()
    .collect();
    let looped = LoopSpec::new(
        Uuid::from_bytes([7; 16]),
        BarBeatTime::new(2, 0, 0, units),
        BarBeatTime::new(3, 0, 0, units),
        body,
    )
    .with_repetitions(4)
    .with_repeat_delay(240);

    let track = TrackChunk::from_events(looped.marked_events());
    let (_, tracks) = decode(&MidiFile::new(480, vec![track]).to_bytes()).unwrap();

    let markers: Vec<_> = tracks[0].events().markers().map(|(_, text)| text).collect();
    assert_eq!(
        markers,
        vec![
            "start(07070707-0707-0707-0707-070707070707):4:240",
            "end(07070707-0707-0707-0707-070707070707)",
        ]
    );

    let (rest, loops) = split_loops(tracks[0].events()).unwrap();
    // only the end of track is left outside the loop
    assert_eq!(rest.len(), 1);
    assert_eq!(loops.len(), 1);
    assert_eq!(loops[0].identifier(), looped.identifier());
    assert_eq!(loops[0].repetitions(), 4);
    assert_eq!(loops[0].repeat_delay(), 240);
    assert_eq!(loops[0].start(), looped.start());
    assert_eq!(loops[0].end(), looped.end());
    assert_eq!(
        tuples(&[TrackChunk::new(loops[0].stored_events().clone())]),
        vec![vec![
            (vec![0x90, 60, 100], Some(0)),
            (vec![0x80, 60, 0], Some(480)),
        ]]
    );
}

//! Stream-level robustness properties of the framer, exercised through the
//! public API: arbitrary corruption may cost a frame, never the stream.

use spalink_core::protocol::framing::{Frame, FrameReader, MAX_FRAME_LEN, SENTINEL};

fn feed_all(reader: &mut FrameReader, bytes: &[u8]) -> Vec<Frame> {
    bytes.iter().filter_map(|b| reader.feed(*b)).collect()
}

fn sample_frames() -> Vec<Frame> {
    vec![
        Frame::new(0xFE, 0xBF, 0x00, vec![]),
        Frame::new(0x10, 0xBF, 0x06, vec![]),
        Frame::new(0x10, 0xBF, 0x22, vec![0x20, 0xFF, 0x00]),
        Frame::new(0xFF, 0xAF, 0x13, vec![0x55; 24]),
    ]
}

fn stream_of(frames: &[Frame]) -> Vec<u8> {
    frames
        .iter()
        .flat_map(|f| f.encode().unwrap())
        .collect()
}

#[test]
fn test_clean_stream_yields_every_frame() {
    let frames = sample_frames();
    let mut reader = FrameReader::new();
    let decoded = feed_all(&mut reader, &stream_of(&frames));
    assert_eq!(decoded, frames);
    assert_eq!(reader.frames_with_errors(), 0);
}

#[test]
fn test_single_byte_corruption_costs_at_most_one_frame() {
    let frames = sample_frames();
    let clean = stream_of(&frames);

    for position in 0..clean.len() {
        for flip in [0x01u8, 0x80, 0xFF] {
            let mut corrupted = clean.clone();
            corrupted[position] ^= flip;
            let mut reader = FrameReader::new();
            let decoded = feed_all(&mut reader, &corrupted);

            // Every originally-sent frame except at most one must survive,
            // and nothing fabricated may carry a valid CRC by accident at
            // the position of a dropped frame boundary.
            let survivors = frames
                .iter()
                .filter(|f| decoded.contains(f))
                .count();
            assert!(
                survivors + 1 >= frames.len(),
                "flip {flip:#04X} at {position} lost {} frames",
                frames.len() - survivors
            );
            assert!(
                decoded.len() <= frames.len() + 1,
                "flip {flip:#04X} at {position} fabricated frames"
            );
        }
    }
}

#[test]
fn test_stream_recovers_after_burst_noise() {
    let mut stream = vec![0x00, 0x13, 0x7E, 0x7E, 0x42, 0x99];
    let frame = Frame::new(0x10, 0xBF, 0x07, vec![]);
    stream.extend(frame.encode().unwrap());
    let mut reader = FrameReader::new();
    let decoded = feed_all(&mut reader, &stream);
    assert_eq!(decoded, vec![frame]);
}

#[test]
fn test_unterminated_garbage_never_wedges_the_reader() {
    let mut reader = FrameReader::new();
    // A sentinel followed by far more than a frame's worth of non-sentinel
    // bytes must be abandoned.
    reader.feed(SENTINEL);
    for _ in 0..(3 * MAX_FRAME_LEN) {
        reader.feed(0x20);
    }
    let frame = Frame::new(0x10, 0xBF, 0x06, vec![]);
    let decoded = feed_all(&mut reader, &frame.encode().unwrap());
    assert_eq!(decoded, vec![frame]);
}

#[test]
fn test_emitted_frames_satisfy_wire_bounds() {
    for frame in sample_frames() {
        let encoded = frame.encode().unwrap();
        assert!(encoded.len() <= MAX_FRAME_LEN);
        assert_eq!(encoded[0], SENTINEL);
        assert_eq!(*encoded.last().unwrap(), SENTINEL);
        assert_eq!(usize::from(encoded[1]), encoded.len() - 2);
    }
}

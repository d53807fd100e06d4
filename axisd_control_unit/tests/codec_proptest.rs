//! Property tests for the frame codec.

use axisd_control_unit::protocol::codec::{
    DecodeError, FRAME_MAGIC, Frames, HEADER_LEN, decode_next, encode_frame, from_fixed_point,
    to_fixed_point,
};
use axisd_control_unit::protocol::tag::Tag;
use proptest::prelude::*;

fn any_tag() -> impl Strategy<Value = Tag> {
    (0u8..=255).prop_filter_map("known tag", Tag::from_u8)
}

proptest! {
    #[test]
    fn frames_survive_leading_garbage(
        garbage in proptest::collection::vec(any::<u8>(), 0..32),
        tag in any_tag(),
        payload in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        // Garbage containing the magic could start a bogus frame.
        prop_assume!(!garbage.windows(FRAME_MAGIC.len()).any(|w| w == FRAME_MAGIC));

        let mut bytes = garbage.clone();
        encode_frame(tag, &payload, &mut bytes);

        let mut cursor = 0;
        let frame = decode_next(&bytes, &mut cursor).unwrap();
        prop_assert_eq!(frame.tag(), Some(tag));
        prop_assert_eq!(frame.payload, &payload[..]);
        prop_assert_eq!(cursor, bytes.len());
    }

    #[test]
    fn truncated_frame_is_not_found(
        tag in any_tag(),
        payload in proptest::collection::vec(any::<u8>(), 1..64),
        cut in 1usize..64,
    ) {
        let mut bytes = Vec::new();
        encode_frame(tag, &payload, &mut bytes);
        let cut = cut.min(payload.len());
        bytes.truncate(bytes.len() - cut);

        let mut cursor = 0;
        prop_assert_eq!(decode_next(&bytes, &mut cursor), Err(DecodeError::NotFound));
        prop_assert_eq!(cursor, 0);
    }

    #[test]
    fn fixed_point_error_is_below_resolution(value in -200_000.0f32..200_000.0) {
        let back = from_fixed_point(to_fixed_point(value));
        prop_assert!((back - value).abs() <= 1e-4 + value.abs() * 1e-6);
    }
}

#[test]
fn bytes_without_magic_yield_no_frame() {
    let bytes = b"AX_FRAME? no, just text";
    let mut cursor = 0;
    assert_eq!(decode_next(bytes, &mut cursor), Err(DecodeError::NotFound));
    assert_eq!(Frames::new(bytes).count(), 0);
}

#[test]
fn back_to_back_frames_decode_in_order() {
    let mut bytes = Vec::new();
    encode_frame(Tag::SystemInit, &[], &mut bytes);
    encode_frame(Tag::ForceLimit, &[1, 2, 3, 4], &mut bytes);
    encode_frame(Tag::Ping, &[], &mut bytes);

    let tags: Vec<u8> = Frames::new(&bytes).map(|f| f.tag).collect();
    assert_eq!(tags, vec![18, 14, 255]);
    assert_eq!(bytes.len(), 3 * HEADER_LEN + 4);
}

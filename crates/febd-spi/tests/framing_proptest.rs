//! Property-based tests for the chip framers.
//! Every frame any framer can build must satisfy the window invariants.

use febd_spi::chips::{ad5535, ad7194, ltc2668, m95256, max111xx};
use febd_spi::config::{FILL_HIGH, FILL_LOW, MAX_PAYLOAD, PAD_BYTES};
use febd_spi::{SpiFrame, Window};

fn assert_frame_invariants(frame: &SpiFrame) {
    assert!(frame.validate().is_ok(), "invalid frame: {frame:?}");
    for w in [frame.sclk(), frame.cs(), frame.mosi(), frame.miso()] {
        assert!(
            w.fits(frame.cycle()),
            "{w:?} outside cycle {}",
            frame.cycle()
        );
    }
    assert!(frame.payload().len() * 8 >= frame.cycle() as usize);
    assert_eq!(frame.mosi(), Window::new(0, frame.cycle()));
}

proptest::proptest! {
    /// AD5535 frames are always 7 bytes, low-padded, 19 clocks.
    #[test]
    fn ad5535_frames_are_valid(channel in 0u8..=255, value in 0u16..=u16::MAX) {
        let frame = ad5535::frame(channel, value).unwrap();
        assert_frame_invariants(&frame);
        assert_eq!(frame.payload().len(), 7);
        assert_eq!(frame.sclk().len(), ad5535::WORD_BITS);
        assert_eq!(&frame.payload()[..2], &[FILL_LOW; 2]);
        // Trailing 5 bits of the word are don't-care zeros
        assert_eq!(frame.payload()[4] & 0x1F, 0);
    }

    /// LTC2668 command byte is command nibble + channel for channels 0-15.
    #[test]
    fn ltc2668_frames_are_valid(channel in 0u8..16, value in 0u16..=u16::MAX) {
        let frame = ltc2668::frame(channel, value).unwrap();
        assert_frame_invariants(&frame);
        assert_eq!(frame.payload()[2], 0x30 | channel);
        assert_eq!(
            u16::from_be_bytes([frame.payload()[3], frame.payload()[4]]),
            value
        );
        assert_eq!(frame.cs().start + 1, frame.sclk().start);
        assert_eq!(frame.cs().end, frame.sclk().end + 1);
    }

    /// AD7194 frames hold the 0x00 prefix and a read window of the requested size.
    #[test]
    fn ad7194_frames_are_valid(
        command in proptest::collection::vec(0u8..=255, 1..8),
        read in 0usize..8,
    ) {
        let frame = ad7194::frame(&command, read).unwrap();
        assert_frame_invariants(&frame);
        assert_eq!(frame.payload()[2], 0x00);
        assert_eq!(&frame.payload()[3..3 + command.len()], &command[..]);
        assert_eq!(frame.miso().len() as usize, 8 * read);
        assert_eq!(frame.sclk().end, frame.miso().end + 1);
        assert_eq!(
            frame.payload().len(),
            2 * PAD_BYTES + 1 + command.len() + read
        );
    }

    /// M95256 frames keep /S exactly over command plus read region.
    #[test]
    fn m95256_frames_are_valid(
        command in proptest::collection::vec(0u8..=255, 1..(MAX_PAYLOAD - 2 * PAD_BYTES)),
        read in 0usize..3,
    ) {
        proptest::prop_assume!(command.len() + read <= MAX_PAYLOAD - 2 * PAD_BYTES);
        let frame = m95256::frame(&command, read).unwrap();
        assert_frame_invariants(&frame);
        assert_eq!(frame.cs().len() as usize, 8 * (command.len() + read));
        assert_eq!(frame.sclk().end, frame.cs().end + 1);
        assert!(frame.payload()[2 + command.len()..]
            .iter()
            .all(|&b| b == FILL_HIGH));
    }

    /// MAX111xx frames are always one 16-bit word.
    #[test]
    fn max111xx_frames_are_valid(word in 0u16..=u16::MAX) {
        let frame = max111xx::frame(word).unwrap();
        assert_frame_invariants(&frame);
        assert_eq!(frame.payload().len(), 6);
        assert_eq!(frame.miso(), frame.sclk());
        assert_eq!(frame.miso_bytes(), 2..4);
    }

    /// Oversized commands are rejected instead of truncated.
    #[test]
    fn oversized_commands_are_rejected(extra in 1usize..16) {
        let command = vec![0u8; MAX_PAYLOAD];
        assert!(m95256::frame(&command, extra).is_err());
        assert!(ad7194::frame(&command, extra).is_err());
    }
}

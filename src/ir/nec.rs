//! NEC 32-bit pulse-distance codec.
//!
//! A data frame is a 9ms leader mark, a 4.5ms space, 32 bits encoded in the
//! space length after a fixed-width mark, and a trailing mark: 67 durations
//! total. Held buttons produce a short repeat frame (leader mark, 2.25ms
//! space, single mark) that carries no data. Bits are taken most significant
//! first, so `0x20DF40BF` reads back as the same four bytes a universal
//! remote database lists.

use super::{IrProtocol, ProtocolCodec, PulseTrain};

const LEADER_MARK: u32 = 9000;
const LEADER_SPACE: u32 = 4500;
const BIT_MARK: u32 = 560;
const ONE_SPACE: u32 = 1690;
const ZERO_SPACE: u32 = 560;
const REPEAT_SPACE: u32 = 2250;

const BITS: usize = 32;
/// Leader pair + one mark/space pair per bit + trailing mark.
const FRAME_LEN: usize = 2 + BITS * 2 + 1;
const REPEAT_LEN: usize = 3;

/// Consumer-grade receivers distort pulses noticeably; a quarter of the
/// nominal duration covers what shows up in practice.
fn near(actual: u32, nominal: u32) -> bool {
    let tolerance = nominal / 4;
    actual >= nominal - tolerance && actual <= nominal + tolerance
}

#[derive(Debug, Default)]
pub struct NecCodec;

impl ProtocolCodec for NecCodec {
    fn protocol(&self) -> IrProtocol {
        IrProtocol::Nec
    }

    fn encode(&self, value: u32) -> PulseTrain {
        let mut durations = Vec::with_capacity(FRAME_LEN);
        durations.push(LEADER_MARK);
        durations.push(LEADER_SPACE);
        for bit in (0..BITS).rev() {
            durations.push(BIT_MARK);
            if value >> bit & 1 == 1 {
                durations.push(ONE_SPACE);
            } else {
                durations.push(ZERO_SPACE);
            }
        }
        durations.push(BIT_MARK);
        PulseTrain::new(durations)
    }

    fn decode(&self, train: &PulseTrain) -> Option<(u32, bool)> {
        let d = train.durations();

        if d.len() == REPEAT_LEN
            && near(d[0], LEADER_MARK)
            && near(d[1], REPEAT_SPACE)
            && near(d[2], BIT_MARK)
        {
            return Some((0, true));
        }

        if d.len() != FRAME_LEN || !near(d[0], LEADER_MARK) || !near(d[1], LEADER_SPACE) {
            return None;
        }

        let mut value: u32 = 0;
        for bit in 0..BITS {
            let mark = d[2 + bit * 2];
            let space = d[3 + bit * 2];
            if !near(mark, BIT_MARK) {
                return None;
            }
            value <<= 1;
            if near(space, ONE_SPACE) {
                value |= 1;
            } else if !near(space, ZERO_SPACE) {
                return None;
            }
        }

        if !near(d[FRAME_LEN - 1], BIT_MARK) {
            return None;
        }
        Some((value, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_produces_full_frame() {
        let train = NecCodec.encode(0x20DF40BF);
        assert_eq!(train.len(), 67);
        assert_eq!(train.durations()[0], LEADER_MARK);
        assert_eq!(train.durations()[1], LEADER_SPACE);
        assert_eq!(train.durations()[66], BIT_MARK);
    }

    #[test]
    fn roundtrip() {
        for value in [0x0, 0x20DF40BF, 0xFFFFFFFF, 0x12345678, 0xFF8D72] {
            let train = NecCodec.encode(value);
            assert_eq!(NecCodec.decode(&train), Some((value, false)));
        }
    }

    #[test]
    fn decode_tolerates_receiver_jitter() {
        let nominal = NecCodec.encode(0x20DF40BF);
        let jittered: Vec<u32> = nominal
            .durations()
            .iter()
            .enumerate()
            .map(|(i, &d)| if i % 2 == 0 { d + d / 8 } else { d - d / 8 })
            .collect();
        let decoded = NecCodec.decode(&PulseTrain::new(jittered));
        assert_eq!(decoded, Some((0x20DF40BF, false)));
    }

    #[test]
    fn decode_repeat_frame() {
        let train = PulseTrain::new(vec![9000, 2250, 560]);
        assert_eq!(NecCodec.decode(&train), Some((0, true)));
    }

    #[test]
    fn rejects_noise() {
        assert_eq!(NecCodec.decode(&PulseTrain::new(vec![])), None);
        assert_eq!(NecCodec.decode(&PulseTrain::new(vec![500, 500, 500])), None);
        // right length, wrong leader
        let mut d = NecCodec.encode(0x1234).durations().to_vec();
        d[0] = 3000;
        assert_eq!(NecCodec.decode(&PulseTrain::new(d)), None);
    }

    #[test]
    fn rejects_truncated_frame() {
        let mut d = NecCodec.encode(0x1234).durations().to_vec();
        d.truncate(40);
        assert_eq!(NecCodec.decode(&PulseTrain::new(d)), None);
    }
}

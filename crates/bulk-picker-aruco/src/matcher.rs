//! Dictionary matching and rotation helpers.

use crate::Dictionary;

/// A dictionary match for an observed marker code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    /// Marker id in the dictionary.
    pub id: u32,
    /// Rotation `0..=3` such that: `observed_code == rotate(dict_code, rotation)`.
    pub rotation: u8,
    /// Hamming distance between observed and dictionary code (after rotation).
    pub hamming: u8,
}

/// Brute-force matcher over every id and rotation of one dictionary.
#[derive(Clone, Debug)]
pub struct Matcher {
    dict: Dictionary,
    max_hamming: u8,
    rotated: Vec<[u64; 4]>,
}

impl Matcher {
    /// Build a matcher; `max_hamming` is capped by the dictionary's correction capacity.
    pub fn new(dict: Dictionary, max_hamming: u8) -> Self {
        let n = dict.marker_size;
        let rotated = dict
            .codes
            .iter()
            .map(|&base| [0, 1, 2, 3].map(|r| rotate_code_u64(base, n, r)))
            .collect();
        let max_hamming = max_hamming.min(dict.max_correction_bits);
        Self {
            dict,
            max_hamming,
            rotated,
        }
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    #[inline]
    pub fn max_hamming(&self) -> u8 {
        self.max_hamming
    }

    /// Find the closest id/rotation within `max_hamming`.
    pub fn match_code(&self, observed: u64) -> Option<Match> {
        let mut best: Option<Match> = None;

        for (id, rots) in self.rotated.iter().enumerate() {
            for (rot, &cand) in rots.iter().enumerate() {
                let h = (observed ^ cand).count_ones() as u8;
                if h > self.max_hamming {
                    continue;
                }
                if best.map(|b| h < b.hamming).unwrap_or(true) {
                    best = Some(Match {
                        id: id as u32,
                        rotation: rot as u8,
                        hamming: h,
                    });
                    if h == 0 {
                        return best;
                    }
                }
            }
        }

        best
    }
}

/// Rotate a code stored in row-major bits: `idx = y * N + x`.
pub fn rotate_code_u64(code: u64, n: usize, rot: u8) -> u64 {
    let rot = rot & 3;
    if rot == 0 {
        return code;
    }

    let mut out = 0u64;
    for y in 0..n {
        for x in 0..n {
            let (sx, sy) = match rot {
                1 => (y, n - 1 - x),
                2 => (n - 1 - x, n - 1 - y),
                _ => (n - 1 - y, x),
            };
            out |= ((code >> (sy * n + sx)) & 1) << (y * n + x);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> Dictionary {
        Dictionary {
            name: "TEST_6X6_3".into(),
            marker_size: 6,
            max_correction_bits: 3,
            codes: vec![0x0_9A3C_5E1F, 0x6_1C87_F0A3, 0xD_4E21_9B6C],
        }
    }

    #[test]
    fn rotate_four_times_is_identity() {
        let code = 0x0123_4567_89ab_cdef_u64;
        let r = (0..4).fold(code, |c, _| rotate_code_u64(c, 8, 1));
        assert_eq!(code, r);
    }

    #[test]
    fn matcher_finds_rotated_code() {
        let d = dict();
        let observed = rotate_code_u64(d.codes[2], d.marker_size, 3);
        let m = Matcher::new(d, 0).match_code(observed).expect("match");
        assert_eq!((m.id, m.rotation, m.hamming), (2, 3, 0));
    }

    #[test]
    fn matcher_tolerates_bit_flips_up_to_limit() {
        let d = dict();
        let observed = d.codes[1] ^ 0b101;
        let matcher = Matcher::new(d.clone(), 2);
        let m = matcher.match_code(observed).expect("match");
        assert_eq!((m.id, m.hamming), (1, 2));
        assert!(Matcher::new(d, 1).match_code(observed).is_none());
    }

    #[test]
    fn max_hamming_is_capped_by_dictionary() {
        assert_eq!(Matcher::new(dict(), 9).max_hamming(), 3);
    }
}

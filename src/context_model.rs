//! EBCOT context modeling (Annex D): maps a coefficient's neighborhood
//! significance state to one of the 19 MQ contexts used by the bit-plane
//! coder.
//!
//! Context labels: 0-8 zero coding (significance), 9-13 sign coding,
//! 14-16 magnitude refinement, 17 run-length, 18 uniform. Tables and
//! thresholds follow Annex D.3.1/D.3.2/D.3.3 (Tables D.1, D.2, D.4).

use crate::subband::SubbandOrientation;

/// The number of significant neighbors in each of the three directions
/// around a coefficient, each already clamped to its meaningful range
/// (horizontal/vertical to 0-2, diagonal to 0-4).
#[derive(Debug, Clone, Copy, Default)]
pub struct Neighborhood {
    pub horizontal: u8,
    pub vertical: u8,
    pub diagonal: u8,
}

/// Zero-coding (significance) context label, Table D.1. `LH` is treated
/// like `LL` (same table); `HL` swaps the roles of horizontal and
/// vertical; `HH` uses the sum of horizontal+vertical against the
/// diagonal count.
pub fn significance_context(subband: SubbandOrientation, mut nb: Neighborhood) -> u8 {
    if subband == SubbandOrientation::HL {
        std::mem::swap(&mut nb.horizontal, &mut nb.vertical);
    }

    match subband {
        SubbandOrientation::HH => {
            let hv = nb.horizontal + nb.vertical;
            match (hv, nb.diagonal) {
                (_, d) if d >= 3 => 8,
                (hv, 2) if hv >= 1 => 7,
                (0, 2) => 6,
                (hv, 1) if hv >= 2 => 5,
                (1, 1) => 4,
                (0, 1) => 3,
                (hv, 0) if hv >= 2 => 2,
                (1, 0) => 1,
                _ => 0,
            }
        }
        SubbandOrientation::LL | SubbandOrientation::LH | SubbandOrientation::HL => {
            match (nb.horizontal, nb.vertical, nb.diagonal) {
                (2, ..) => 8,
                (1, v, _) if v >= 1 => 7,
                (1, 0, d) if d >= 1 => 6,
                (1, 0, 0) => 5,
                (0, 2, _) => 4,
                (0, 1, _) => 3,
                (0, 0, d) if d >= 2 => 2,
                (0, 0, 1) => 1,
                _ => 0,
            }
        }
    }
}

/// Sign-coding context label and XOR-prediction bit, Table D.2.
/// `h`/`v` are the signed, clamped-to-[-1,1] contributions of the two
/// horizontal and two vertical neighbors (each neighbor contributes
/// +1 if significant-and-positive, -1 if significant-and-negative, 0
/// if insignificant).
pub fn sign_context(h: i8, v: i8) -> (u8, u8) {
    match (h, v) {
        (1, 1) => (13, 0),
        (1, 0) => (12, 0),
        (1, -1) => (11, 0),
        (0, 1) => (10, 0),
        (0, 0) => (9, 0),
        (0, -1) => (10, 1),
        (-1, 1) => (11, 1),
        (-1, 0) => (12, 1),
        (-1, -1) => (13, 1),
        _ => unreachable!("h and v must each be clamped to [-1, 1]"),
    }
}

/// Clamps a raw signed neighbor-contribution sum to `[-1, 1]` as
/// required before calling [`sign_context`].
pub fn clamp_sign_contribution(sum: i32) -> i8 {
    sum.clamp(-1, 1) as i8
}

/// Magnitude-refinement context label, Table D.4: 16 if the coefficient
/// has already undergone at least one refinement pass, 15 if any of its
/// eight neighbors is significant, else 14.
pub fn magnitude_refinement_context(already_refined: bool, any_neighbor_significant: bool) -> u8 {
    if already_refined {
        16
    } else if any_neighbor_significant {
        15
    } else {
        14
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ll_context_matches_table_d1_corners() {
        let nb = |h, v, d| Neighborhood { horizontal: h, vertical: v, diagonal: d };
        assert_eq!(significance_context(SubbandOrientation::LL, nb(0, 0, 0)), 0);
        assert_eq!(significance_context(SubbandOrientation::LL, nb(0, 0, 1)), 1);
        assert_eq!(significance_context(SubbandOrientation::LL, nb(0, 0, 2)), 2);
        assert_eq!(significance_context(SubbandOrientation::LL, nb(0, 1, 0)), 3);
        assert_eq!(significance_context(SubbandOrientation::LL, nb(0, 2, 0)), 4);
        assert_eq!(significance_context(SubbandOrientation::LL, nb(1, 0, 0)), 5);
        assert_eq!(significance_context(SubbandOrientation::LL, nb(1, 0, 1)), 6);
        assert_eq!(significance_context(SubbandOrientation::LL, nb(1, 1, 0)), 7);
        assert_eq!(significance_context(SubbandOrientation::LL, nb(2, 0, 0)), 8);
    }

    #[test]
    fn hl_swaps_horizontal_and_vertical() {
        let nb = Neighborhood { horizontal: 0, vertical: 2, diagonal: 0 };
        // Under HL, horizontal/vertical are swapped before lookup, so
        // (h=0,v=2) behaves like the LL table's (h=2,v=0) entry.
        assert_eq!(significance_context(SubbandOrientation::HL, nb), 8);
    }

    #[test]
    fn hh_uses_combined_horizontal_vertical_sum() {
        let nb = |h, v, d| Neighborhood { horizontal: h, vertical: v, diagonal: d };
        assert_eq!(significance_context(SubbandOrientation::HH, nb(0, 0, 0)), 0);
        assert_eq!(significance_context(SubbandOrientation::HH, nb(1, 0, 0)), 1);
        assert_eq!(significance_context(SubbandOrientation::HH, nb(0, 2, 0)), 2);
        assert_eq!(significance_context(SubbandOrientation::HH, nb(0, 0, 1)), 3);
        assert_eq!(significance_context(SubbandOrientation::HH, nb(1, 0, 1)), 4);
        assert_eq!(significance_context(SubbandOrientation::HH, nb(0, 2, 1)), 5);
        assert_eq!(significance_context(SubbandOrientation::HH, nb(0, 0, 2)), 6);
        assert_eq!(significance_context(SubbandOrientation::HH, nb(1, 0, 2)), 7);
        assert_eq!(significance_context(SubbandOrientation::HH, nb(0, 0, 3)), 8);
    }

    #[test]
    fn sign_context_table_covers_all_nine_combinations() {
        assert_eq!(sign_context(1, 1), (13, 0));
        assert_eq!(sign_context(0, 0), (9, 0));
        assert_eq!(sign_context(-1, -1), (13, 1));
        assert_eq!(sign_context(0, -1), (10, 1));
    }

    #[test]
    fn clamp_sign_contribution_saturates() {
        assert_eq!(clamp_sign_contribution(2), 1);
        assert_eq!(clamp_sign_contribution(-2), -1);
        assert_eq!(clamp_sign_contribution(0), 0);
    }

    #[test]
    fn magnitude_refinement_context_precedence() {
        assert_eq!(magnitude_refinement_context(true, true), 16);
        assert_eq!(magnitude_refinement_context(true, false), 16);
        assert_eq!(magnitude_refinement_context(false, true), 15);
        assert_eq!(magnitude_refinement_context(false, false), 14);
    }
}

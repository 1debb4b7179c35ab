//! EBCOT Tier-1: three-pass (SPP, MRP, CP) bit-plane coding over a
//! code-block, driving the MQ coder through the context model (§4.6).
//!
//! Encoder and decoder share the pass bodies below; they differ only in
//! whether a bit is pulled from the known coefficient magnitude and fed
//! to the MQ coder, or pulled from the MQ coder and written into the
//! magnitude being reconstructed. That distinction is abstracted by the
//! [`Side`] trait.

use log::trace;

use crate::context_model::{
    clamp_sign_contribution, magnitude_refinement_context, significance_context, sign_context,
    Neighborhood,
};
use crate::error::{Jp2kError, Result};
use crate::mq_coder::{ContextStateArray, MqCoder, RUN_LENGTH_CONTEXT, UNIFORM_CONTEXT};
use crate::options::{Tier1Options, TerminationMode};
use crate::subband::{validate_dimensions, CodeBlock, SubbandOrientation};

const SIGNIFICANT: u8 = 1 << 0;
const SIGN_NEGATIVE: u8 = 1 << 1;
const CODED_THIS_PASS: u8 = 1 << 2;
const REFINED: u8 = 1 << 3;

/// Per-coefficient flags plus the magnitude accumulated so far, for one
/// code-block's encode or decode. Owned locally to the call; never
/// escapes (§3 Ownership/lifecycle).
struct CodeBlockState {
    width: usize,
    height: usize,
    subband: SubbandOrientation,
    flags: Vec<u8>,
    magnitudes: Vec<u32>,
}

impl CodeBlockState {
    fn new(width: usize, height: usize, subband: SubbandOrientation) -> Self {
        let n = width * height;
        Self {
            width,
            height,
            subband,
            flags: vec![0; n],
            magnitudes: vec![0; n],
        }
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn is_significant(&self, x: isize, y: isize) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return false;
        }
        self.flags[self.idx(x as usize, y as usize)] & SIGNIFICANT != 0
    }

    fn sign_contribution(&self, x: isize, y: isize) -> i32 {
        if !self.is_significant(x, y) {
            return 0;
        }
        if self.flags[self.idx(x as usize, y as usize)] & SIGN_NEGATIVE != 0 {
            -1
        } else {
            1
        }
    }

    /// Counts of significant 8-neighbors, clipped per Table D.1 (the
    /// clipping itself lives in [`significance_context`]; this just
    /// counts).
    fn neighborhood(&self, x: usize, y: usize) -> Neighborhood {
        let (ix, iy) = (x as isize, y as isize);
        let horizontal =
            self.is_significant(ix - 1, iy) as u8 + self.is_significant(ix + 1, iy) as u8;
        let vertical =
            self.is_significant(ix, iy - 1) as u8 + self.is_significant(ix, iy + 1) as u8;
        let diagonal = self.is_significant(ix - 1, iy - 1) as u8
            + self.is_significant(ix + 1, iy - 1) as u8
            + self.is_significant(ix - 1, iy + 1) as u8
            + self.is_significant(ix + 1, iy + 1) as u8;
        Neighborhood { horizontal, vertical, diagonal }
    }

    fn any_neighbor_significant(&self, x: usize, y: usize) -> bool {
        let nb = self.neighborhood(x, y);
        nb.horizontal > 0 || nb.vertical > 0 || nb.diagonal > 0
    }

    fn sign_ctx_for(&self, x: usize, y: usize) -> (u8, u8) {
        let (ix, iy) = (x as isize, y as isize);
        let h = clamp_sign_contribution(
            self.sign_contribution(ix - 1, iy) + self.sign_contribution(ix + 1, iy),
        );
        let v = clamp_sign_contribution(
            self.sign_contribution(ix, iy - 1) + self.sign_contribution(ix, iy + 1),
        );
        sign_context(h, v)
    }
}

fn clear_coded_this_pass(state: &mut CodeBlockState) {
    for f in state.flags.iter_mut() {
        *f &= !CODED_THIS_PASS;
    }
}

/// Factors encoder and decoder into a single set of pass bodies: each
/// `code` call either emits `bit` to the MQ coder (encode) or ignores
/// `bit` and returns the decoded value (decode).
trait Side {
    fn code(&mut self, contexts: &mut ContextStateArray, cx: usize, bit: u8) -> u8;
    fn code_bypass(&mut self, bit: u8) -> u8;
}

struct Encode<'a> {
    mq: &'a mut MqCoder,
}

impl Side for Encode<'_> {
    fn code(&mut self, contexts: &mut ContextStateArray, cx: usize, bit: u8) -> u8 {
        self.mq.encode(contexts, cx, bit);
        bit
    }

    fn code_bypass(&mut self, bit: u8) -> u8 {
        self.mq.encode_bypass(bit);
        bit
    }
}

struct Decode<'a> {
    mq: &'a mut MqCoder,
}

impl Side for Decode<'_> {
    fn code(&mut self, contexts: &mut ContextStateArray, cx: usize, _bit: u8) -> u8 {
        self.mq.decode_bit(contexts, cx)
    }

    fn code_bypass(&mut self, _bit: u8) -> u8 {
        self.mq.decode_bypass()
    }
}

fn code_significance_and_sign<S: Side>(
    state: &mut CodeBlockState,
    side: &mut S,
    contexts: &mut ContextStateArray,
    x: usize,
    y: usize,
    b: u8,
) {
    let idx = state.idx(x, y);
    let nb = state.neighborhood(x, y);
    let cx = significance_context(state.subband, nb) as usize;
    let known_bit = ((state.magnitudes[idx] >> b) & 1) as u8;
    let bit = side.code(contexts, cx, known_bit);
    state.flags[idx] |= CODED_THIS_PASS;
    if bit == 1 {
        state.magnitudes[idx] |= 1u32 << b;
        state.flags[idx] |= SIGNIFICANT;

        let (sign_cx, xor) = state.sign_ctx_for(x, y);
        let known_sign = (state.flags[idx] & SIGN_NEGATIVE != 0) as u8;
        let coded = known_sign ^ xor;
        let result = side.code(contexts, sign_cx as usize, coded);
        let actual_sign = result ^ xor;
        if actual_sign == 1 {
            state.flags[idx] |= SIGN_NEGATIVE;
        } else {
            state.flags[idx] &= !SIGN_NEGATIVE;
        }
    }
}

/// Significance Propagation Pass (§4.6): codes one significance bit for
/// every not-yet-significant coefficient with a significant neighbor.
fn significance_propagation_pass<S: Side>(
    state: &mut CodeBlockState,
    side: &mut S,
    contexts: &mut ContextStateArray,
    b: u8,
) {
    let (width, height) = (state.width, state.height);
    let mut y0 = 0;
    while y0 < height {
        let stripe_h = (height - y0).min(4);
        for x in 0..width {
            for r in 0..stripe_h {
                let y = y0 + r;
                let idx = state.idx(x, y);
                if state.flags[idx] & (SIGNIFICANT | CODED_THIS_PASS) != 0 {
                    continue;
                }
                if !state.any_neighbor_significant(x, y) {
                    continue;
                }
                code_significance_and_sign(state, side, contexts, x, y, b);
            }
        }
        y0 += 4;
    }
}

/// Magnitude Refinement Pass (§4.6): codes one refinement bit for every
/// already-significant coefficient not yet coded this plane.
fn magnitude_refinement_pass<S: Side>(
    state: &mut CodeBlockState,
    side: &mut S,
    contexts: &mut ContextStateArray,
    b: u8,
    bypass: bool,
) {
    let (width, height) = (state.width, state.height);
    let mut y0 = 0;
    while y0 < height {
        let stripe_h = (height - y0).min(4);
        for x in 0..width {
            for r in 0..stripe_h {
                let y = y0 + r;
                let idx = state.idx(x, y);
                if state.flags[idx] & SIGNIFICANT == 0 || state.flags[idx] & CODED_THIS_PASS != 0 {
                    continue;
                }
                let known_bit = ((state.magnitudes[idx] >> b) & 1) as u8;
                let bit = if bypass {
                    side.code_bypass(known_bit)
                } else {
                    let already_refined = state.flags[idx] & REFINED != 0;
                    let any_sig = state.any_neighbor_significant(x, y);
                    let cx = magnitude_refinement_context(already_refined, any_sig) as usize;
                    side.code(contexts, cx, known_bit)
                };
                if bit == 1 {
                    state.magnitudes[idx] |= 1u32 << b;
                }
                state.flags[idx] |= CODED_THIS_PASS | REFINED;
            }
        }
        y0 += 4;
    }
}

/// Cleanup Pass (§4.6): codes every coefficient not yet coded this
/// plane, with a two-part run-length shortcut for whole not-yet-
/// touched stripe-columns that have no significant neighbor: a single
/// run-length-context symbol answers "does any of these four become
/// significant", and, only when it does, a 2-bit uniform-context symbol
/// pinpoints which of the four (0-3, top-to-bottom) is the first.
fn cleanup_pass<S: Side>(
    state: &mut CodeBlockState,
    side: &mut S,
    contexts: &mut ContextStateArray,
    b: u8,
) {
    let (width, height) = (state.width, state.height);
    let mut y0 = 0;
    while y0 < height {
        let stripe_h = (height - y0).min(4);
        for x in 0..width {
            if stripe_h == 4 {
                let idxs = [
                    state.idx(x, y0),
                    state.idx(x, y0 + 1),
                    state.idx(x, y0 + 2),
                    state.idx(x, y0 + 3),
                ];
                let eligible = idxs
                    .iter()
                    .all(|&idx| state.flags[idx] & (SIGNIFICANT | CODED_THIS_PASS) == 0)
                    && (0..4).all(|r| !state.any_neighbor_significant(x, y0 + r));
                if eligible {
                    let any_becomes_sig =
                        idxs.iter().any(|&idx| (state.magnitudes[idx] >> b) & 1 == 1) as u8;
                    let bit = side.code(contexts, RUN_LENGTH_CONTEXT, any_becomes_sig);
                    if bit == 0 {
                        for &idx in &idxs {
                            state.flags[idx] |= CODED_THIS_PASS;
                        }
                        continue;
                    }

                    let known_pos = idxs
                        .iter()
                        .position(|&idx| (state.magnitudes[idx] >> b) & 1 == 1)
                        .unwrap_or(0) as u8;
                    let hi = side.code(contexts, UNIFORM_CONTEXT, (known_pos >> 1) & 1);
                    let lo = side.code(contexts, UNIFORM_CONTEXT, known_pos & 1);
                    let pos = ((hi << 1) | lo) as usize;

                    for &idx in &idxs[..pos] {
                        state.flags[idx] |= CODED_THIS_PASS;
                    }

                    let idx = idxs[pos];
                    state.magnitudes[idx] |= 1u32 << b;
                    state.flags[idx] |= SIGNIFICANT | CODED_THIS_PASS;
                    let (sign_cx, xor) = state.sign_ctx_for(x, y0 + pos);
                    let known_sign = (state.flags[idx] & SIGN_NEGATIVE != 0) as u8;
                    let coded = known_sign ^ xor;
                    let result = side.code(contexts, sign_cx as usize, coded);
                    let actual_sign = result ^ xor;
                    if actual_sign == 1 {
                        state.flags[idx] |= SIGN_NEGATIVE;
                    } else {
                        state.flags[idx] &= !SIGN_NEGATIVE;
                    }

                    for r in (pos + 1)..4 {
                        let y = y0 + r;
                        let idx = state.idx(x, y);
                        if state.flags[idx] & (SIGNIFICANT | CODED_THIS_PASS) != 0 {
                            continue;
                        }
                        code_significance_and_sign(state, side, contexts, x, y, b);
                    }
                    continue;
                }
            }
            for r in 0..stripe_h {
                let y = y0 + r;
                let idx = state.idx(x, y);
                if state.flags[idx] & (SIGNIFICANT | CODED_THIS_PASS) != 0 {
                    continue;
                }
                code_significance_and_sign(state, side, contexts, x, y, b);
            }
        }
        y0 += 4;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PassKind {
    Spp,
    Mrp,
    Cp,
}

/// The ordered sequence of (bit-plane, pass) the standard requires for
/// `p` significant bit-planes: the most significant plane carries only
/// a cleanup pass (no coefficient can yet be significant, so SPP and
/// MRP would code nothing); every plane below it carries all three.
fn build_pass_plan(p: u32) -> Vec<(u8, PassKind)> {
    let mut plan = Vec::new();
    for b in (0..p).rev() {
        if b == p - 1 {
            plan.push((b as u8, PassKind::Cp));
        } else {
            plan.push((b as u8, PassKind::Spp));
            plan.push((b as u8, PassKind::Mrp));
            plan.push((b as u8, PassKind::Cp));
        }
    }
    plan
}

/// Total passes implied by `p` significant bit-planes (§8 property 6):
/// 1 for the top plane, 3 for every plane below it.
fn max_passes_for_plane_count(p: u32) -> u32 {
    if p == 0 {
        0
    } else {
        1 + 3 * (p - 1)
    }
}

fn bit_length(v: u32) -> u32 {
    32 - v.leading_zeros()
}

/// Encodes a code-block of quantised signed coefficients into an opaque
/// Tier-1 byte stream (§6 DWT/Tier-1 contracts).
///
/// `max_passes`, if given, truncates emission after that many coding
/// passes across all bit-planes (quality-layer rate control lives
/// above this crate; this is the hook it drives).
pub fn bitplane_encode(
    coeffs: &[i32],
    width: usize,
    height: usize,
    subband: SubbandOrientation,
    bit_depth: u8,
    options: Tier1Options,
    max_passes: Option<u32>,
) -> Result<(Vec<u8>, u32, u8, Option<Vec<u32>>)> {
    validate_dimensions(width, height)?;
    if coeffs.len() != width * height {
        return Err(Jp2kError::ShapeMismatch);
    }
    if bit_depth == 0 || bit_depth > 32 {
        return Err(Jp2kError::InvalidBitDepth);
    }
    if let Some(mp) = max_passes {
        if mp > max_passes_for_plane_count(bit_depth as u32) {
            return Err(Jp2kError::InvalidMaxPasses);
        }
    }

    let mut state = CodeBlockState::new(width, height, subband);
    let mut max_abs: u32 = 0;
    for (idx, &c) in coeffs.iter().enumerate() {
        let mag = c.unsigned_abs();
        state.magnitudes[idx] = mag;
        if c < 0 {
            state.flags[idx] |= SIGN_NEGATIVE;
        }
        max_abs = max_abs.max(mag);
    }

    let p = if max_abs == 0 { 0 } else { bit_length(max_abs) };
    if p > bit_depth as u32 {
        return Err(Jp2kError::InvalidBitDepth);
    }
    let zero_bit_planes = bit_depth as u32 - p;

    let plan = build_pass_plan(p);
    let limit = max_passes
        .map(|mp| mp as usize)
        .unwrap_or(plan.len())
        .min(plan.len());

    trace!(
        "bitplane_encode: {}x{} subband={:?} p={} zero_bit_planes={} planned_passes={}",
        width, height, subband, p, zero_bit_planes, limit
    );

    let mut mq = MqCoder::new();
    let mut contexts = ContextStateArray::new();
    let mut pass_segment_lengths: Option<Vec<u32>> =
        (options.termination == TerminationMode::Predictable).then(Vec::new);
    let mut prev_total = 0usize;
    let mut pass_count: u32 = 0;

    for &(b, kind) in plan.iter().take(limit) {
        match kind {
            PassKind::Spp => {
                let mut side = Encode { mq: &mut mq };
                significance_propagation_pass(&mut state, &mut side, &mut contexts, b);
            }
            PassKind::Mrp => {
                let bypass_active = options.bypass_applies_at(b);
                if bypass_active {
                    mq.prepare_for_bypass_encode();
                }
                {
                    let mut side = Encode { mq: &mut mq };
                    magnitude_refinement_pass(&mut state, &mut side, &mut contexts, b, bypass_active);
                }
                if bypass_active {
                    mq.resume_coding_encode();
                }
            }
            PassKind::Cp => {
                {
                    let mut side = Encode { mq: &mut mq };
                    cleanup_pass(&mut state, &mut side, &mut contexts, b);
                }
                clear_coded_this_pass(&mut state);
            }
        }
        pass_count += 1;

        if options.termination == TerminationMode::Predictable {
            mq.finish(TerminationMode::Predictable);
            let total = mq.buffer().len();
            pass_segment_lengths
                .as_mut()
                .expect("predictable termination always allocates segment lengths")
                .push((total - prev_total) as u32);
            prev_total = total;
            mq.reset();
            contexts.reset();
        }
    }

    if options.termination != TerminationMode::Predictable && pass_count > 0 {
        mq.finish(options.termination);
    }

    Ok((
        mq.buffer().to_vec(),
        pass_count,
        zero_bit_planes as u8,
        pass_segment_lengths,
    ))
}

/// Decodes a Tier-1 byte stream back into signed coefficients, given
/// the same shape/subband/bit-depth/pass metadata the encoder reported
/// (§6). Mirrors [`bitplane_encode`]'s scan order and context
/// selection exactly.
pub fn bitplane_decode(
    bytes: &[u8],
    width: usize,
    height: usize,
    subband: SubbandOrientation,
    bit_depth: u8,
    pass_count: u32,
    zero_bit_planes: u8,
    options: Tier1Options,
    pass_segment_lengths: Option<&[u32]>,
) -> Result<Vec<i32>> {
    validate_dimensions(width, height)?;
    if bit_depth == 0 || bit_depth > 32 {
        return Err(Jp2kError::InvalidBitDepth);
    }
    if zero_bit_planes as u32 > bit_depth as u32 {
        return Err(Jp2kError::InvalidBitDepth);
    }
    let p = bit_depth as u32 - zero_bit_planes as u32;
    if pass_count > max_passes_for_plane_count(p) {
        return Err(Jp2kError::TruncatedStream);
    }

    let plan = build_pass_plan(p);
    let limit = pass_count as usize;

    trace!(
        "bitplane_decode: {}x{} subband={:?} p={} pass_count={}",
        width, height, subband, p, pass_count
    );

    let mut state = CodeBlockState::new(width, height, subband);
    let mut mq = MqCoder::new();
    let mut contexts = ContextStateArray::new();

    if options.termination == TerminationMode::Predictable {
        let seglens = pass_segment_lengths.ok_or(Jp2kError::MissingPassSegmentLengths)?;
        if seglens.len() != limit {
            return Err(Jp2kError::PassSegmentLengthMismatch);
        }
        let total: u64 = seglens.iter().map(|&x| x as u64).sum();
        if total != bytes.len() as u64 {
            return Err(Jp2kError::PassSegmentLengthMismatch);
        }

        let mut offset = 0usize;
        for (&(b, kind), &seg_len) in plan.iter().take(limit).zip(seglens.iter()) {
            let seg_len = seg_len as usize;
            if offset + seg_len > bytes.len() {
                return Err(Jp2kError::TruncatedStream);
            }
            let segment = &bytes[offset..offset + seg_len];
            offset += seg_len;

            mq.init_decoder(segment);
            run_pass_decode(&mut state, &mut mq, &mut contexts, b, kind, &options);
            contexts.reset();
        }
    } else {
        mq.init_decoder(bytes);
        for &(b, kind) in plan.iter().take(limit) {
            run_pass_decode(&mut state, &mut mq, &mut contexts, b, kind, &options);
        }
    }

    Ok(reconstruct_signed(&state))
}

fn run_pass_decode(
    state: &mut CodeBlockState,
    mq: &mut MqCoder,
    contexts: &mut ContextStateArray,
    b: u8,
    kind: PassKind,
    options: &Tier1Options,
) {
    match kind {
        PassKind::Spp => {
            let mut side = Decode { mq };
            significance_propagation_pass(state, &mut side, contexts, b);
        }
        PassKind::Mrp => {
            let bypass_active = options.bypass_applies_at(b);
            if bypass_active {
                mq.prepare_for_bypass_decode();
            }
            {
                let mut side = Decode { mq };
                magnitude_refinement_pass(state, &mut side, contexts, b, bypass_active);
            }
            if bypass_active {
                mq.resume_coding_decode();
            }
        }
        PassKind::Cp => {
            {
                let mut side = Decode { mq };
                cleanup_pass(state, &mut side, contexts, b);
            }
            clear_coded_this_pass(state);
        }
    }
}

fn reconstruct_signed(state: &CodeBlockState) -> Vec<i32> {
    state
        .flags
        .iter()
        .zip(state.magnitudes.iter())
        .map(|(&flags, &mag)| {
            if mag == 0 {
                0
            } else if flags & SIGN_NEGATIVE != 0 {
                -(mag as i32)
            } else {
                mag as i32
            }
        })
        .collect()
}

impl CodeBlock {
    /// Encodes `coeffs` into this code-block's `compressed_data`,
    /// `pass_count`, `zero_bit_planes` and (under predictable
    /// termination) `pass_segment_lengths`.
    pub fn encode(
        &mut self,
        coeffs: &[i32],
        bit_depth: u8,
        options: Tier1Options,
        max_passes: Option<u32>,
    ) -> Result<()> {
        let (bytes, pass_count, zero_bit_planes, pass_segment_lengths) = bitplane_encode(
            coeffs,
            self.width,
            self.height,
            self.subband,
            bit_depth,
            options,
            max_passes,
        )?;
        self.compressed_data = bytes;
        self.pass_count = pass_count;
        self.zero_bit_planes = zero_bit_planes;
        self.pass_segment_lengths = pass_segment_lengths;
        Ok(())
    }

    /// Decodes this code-block's `compressed_data` back into signed
    /// coefficients.
    pub fn decode(&self, bit_depth: u8, options: Tier1Options) -> Result<Vec<i32>> {
        bitplane_decode(
            &self.compressed_data,
            self.width,
            self.height,
            self.subband,
            bit_depth,
            self.pass_count,
            self.zero_bit_planes,
            options,
            self.pass_segment_lengths.as_deref(),
        )
    }
}

//! Construction of the per-document structural index.
//!
//! The index is built in four word-wise passes over the raw bytes: character
//! bitmaps for the five structural characters, removal of escaped quotes,
//! the string mask, and the leveled colon bitmaps produced by brace
//! matching.

pub mod backend;

mod index;

pub use self::index::{Positions, StructuralIndex};

use num::Integer;
use smallvec::SmallVec;

use crate::bit;
use crate::errors::{ErrorKind, Result};

use self::backend::{Backend, Bitmap, FallbackBackend};

/// A index builder
#[derive(Debug, Default)]
pub struct IndexBuilder<B: Backend = FallbackBackend> {
    backend: B,
    level: usize,
}

impl<B: Backend> IndexBuilder<B> {
    /// Create a builder producing leveled colon bitmaps down to `level`.
    pub fn new(backend: B, level: usize) -> Self {
        Self { backend, level }
    }

    /// Build a structural index from a slice of bytes.
    pub fn build(&self, record: &[u8]) -> Result<StructuralIndex> {
        let mut bitmaps = build_structural_character_bitmaps(record, &self.backend);
        if bitmaps.is_empty() {
            return Ok(StructuralIndex {
                bitmaps,
                b_string: vec![],
                b_colon: vec![vec![]; self.level],
            });
        }

        // Step2: remove unstructural quotes
        remove_unstructural_quotes(&mut bitmaps)?;

        // Step3: build the string mask and remove unstructural colons and
        // braces from the bitmaps
        let b_string = build_string_mask_bitmap(&bitmaps)?;
        for (b, s) in izip!(&mut bitmaps, &b_string) {
            b.colon &= !s;
            b.left_brace &= !s;
            b.right_brace &= !s;
        }

        // Step4: build leveled bitmaps of colons, from (cleaned) character
        // bitmaps
        let b_colon = build_leveled_colon_bitmaps(&bitmaps, self.level)?;

        trace!(
            "structural index built: {} words, {} colon levels",
            bitmaps.len(),
            self.level
        );

        Ok(StructuralIndex {
            bitmaps,
            b_string,
            b_colon,
        })
    }
}

fn build_structural_character_bitmaps<B: Backend>(s: &[u8], backend: &B) -> Vec<Bitmap> {
    let mut result = Vec::with_capacity((s.len() + 63) / 64);

    for i in 0..(s.len() / 64) {
        result.push(backend.create_full_bitmap(s, i * 64));
    }

    if s.len() % 64 != 0 {
        result.push(backend.create_partial_bitmap(s, (s.len() / 64) * 64));
    }

    result
}

fn remove_unstructural_quotes(bitmaps: &mut [Bitmap]) -> Result<()> {
    let mut uu = 0u64;
    for i in 0..bitmaps.len() {
        // extract the backslash bitmap, whose succeeding element is a quote.
        let q1 = bitmaps[i].quote;
        let q2 = if i + 1 == bitmaps.len() {
            0
        } else {
            bitmaps[i + 1].quote
        };
        let mut bsq = (q1 >> 1 | q2 << 63) & bitmaps[i].backslash;

        // extract the bits for escaping a quote from `bsq`.
        let mut u = 0u64;
        while bsq != 0 {
            // The target backslash bit.
            let target = bit::E(bsq);
            let pos = 64 - target.leading_zeros();
            if consecutive_ones(&bitmaps[0..i + 1], pos)?.is_odd() {
                u |= target;
            }
            bsq ^= target; // clear the target bit.
        }

        bitmaps[i].quote &= !(uu >> 63 | u << 1);

        // save the current result for next iteration
        uu = u;
    }
    Ok(())
}

/// Compute the length of the consecutive ones in the backslash bitmap ending
/// just below `pos` in the last word of `b`.
#[inline]
fn consecutive_ones(b: &[Bitmap], pos: u32) -> Result<u32> {
    let mut ones = bit::leading_ones(b[b.len() - 1].backslash, pos);
    if ones > pos {
        return Err(ErrorKind::InternalInvariant("backslash run exceeds its window").into());
    }
    if ones < pos {
        return Ok(ones);
    }

    for b in b[0..b.len() - 1].iter().rev() {
        let l = bit::leading_ones(b.backslash, 64);
        if l < 64 {
            return Ok(ones + l);
        }
        ones += 64;
    }
    Ok(ones)
}

fn build_string_mask_bitmap(bitmaps: &[Bitmap]) -> Result<Vec<u64>> {
    let mut b_string = Vec::with_capacity(bitmaps.len());

    // The number of quotes in structural quote bitmap
    let mut n: u64 = 0;

    for b in bitmaps {
        let mut m_quote = b.quote;
        let mut m_string = 0u64;
        while m_quote != 0 {
            // invert all of bits from the rightmost 1 of `m_quote` to the end
            m_string ^= bit::S(m_quote);
            // remove the rightmost 1 from `m_quote`
            m_quote = bit::R(m_quote);
            n += 1;
        }

        if n.is_odd() {
            m_string ^= !0u64;
        }

        b_string.push(m_string);
    }

    if n.is_odd() {
        return Err(ErrorKind::MalformedString(last_quote_offset(bitmaps)).into());
    }

    Ok(b_string)
}

/// Offset of the last structural quote, for reporting a dangling quote.
fn last_quote_offset(bitmaps: &[Bitmap]) -> usize {
    for (i, b) in bitmaps.iter().enumerate().rev() {
        if b.quote != 0 {
            return i * 64 + 63 - b.quote.leading_zeros() as usize;
        }
    }
    0
}

fn build_leveled_colon_bitmaps(bitmaps: &[Bitmap], level: usize) -> Result<Vec<Vec<u64>>> {
    let mut b_colon = vec![Vec::with_capacity(bitmaps.len()); level];
    for c in &mut b_colon {
        c.extend(bitmaps.iter().map(|b| b.colon));
    }

    let mut s: SmallVec<[(usize, u64); 16]> = SmallVec::new();
    for (i, b) in bitmaps.iter().enumerate() {
        let mut m_left = b.left_brace;
        let mut m_right = b.right_brace;

        loop {
            let m_rightbit = bit::E(m_right);
            let mut m_leftbit = bit::E(m_left);
            while m_leftbit != 0 && (m_rightbit == 0 || m_leftbit < m_rightbit) {
                s.push((i, m_leftbit));
                m_left = bit::R(m_left);
                m_leftbit = bit::E(m_left);
            }

            if m_rightbit != 0 {
                let (j, mlb) = s.pop().ok_or_else(|| {
                    ErrorKind::UnbalancedBraces(i * 64 + m_rightbit.trailing_zeros() as usize)
                })?;
                m_leftbit = mlb;

                // colons enclosed by the popped pair are deeper than the
                // surrounding object's level; erase them from its bitmap
                if s.len() > 0 && s.len() - 1 < level {
                    let b_colon = &mut b_colon[s.len() - 1];
                    if i == j {
                        b_colon[i] &= !(m_rightbit.wrapping_sub(m_leftbit));
                    } else {
                        b_colon[j] &= m_leftbit.wrapping_sub(1);
                        b_colon[i] &= !(m_rightbit.wrapping_sub(1));
                        for k in j + 1..i {
                            b_colon[k] = 0;
                        }
                    }
                }
            }

            m_right = bit::R(m_right);

            if m_rightbit == 0 {
                break;
            }
        }
    }

    if let Some(&(j, mlb)) = s.last() {
        return Err(ErrorKind::UnbalancedBraces(j * 64 + mlb.trailing_zeros() as usize).into());
    }

    Ok(b_colon)
}

//! Reserved tokens.
//!
//! Downstream models often expect an unknown-word marker (or an
//! end-of-sentence marker) at a fixed index. The functions in this module
//! find such markers and synthesize embeddings for them when they are
//! missing from the loaded vocabulary.

use ndarray::{Array1, ArrayView1, Axis};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xorshift::XorShiftRng;

use crate::error::{display_token, Error, Result};
use crate::table::VocabTable;
use crate::vocab::{SimpleVocab, Token};

/// Spellings of the unknown-word marker.
pub const UNK_CANDIDATES: [&str; 2] = ["<unk>", "<UNK>"];

/// Find the unknown-word marker in a vocabulary.
///
/// Returns `None` if no candidate is present and fails if more than one
/// candidate is present.
pub fn infer_unk_id(vocab: &SimpleVocab) -> Result<Option<Token>> {
    let present: Vec<&str> = UNK_CANDIDATES
        .iter()
        .copied()
        .filter(|candidate| vocab.contains(candidate.as_bytes()))
        .collect();

    match present.as_slice() {
        [] => Ok(None),
        [unk] => Ok(Some(unk.as_bytes().to_vec())),
        _ => Err(Error::AmbiguousUnk(
            present.into_iter().map(ToOwned::to_owned).collect(),
        )),
    }
}

/// Average the embeddings of the `n` least common tokens.
///
/// Tokens are ranked by the attached frequencies; among tokens with the
/// same count, lower indices rank first. Without frequencies, the `n`
/// tokens with the highest indices are used.
pub fn create_unk_least_common(table: &VocabTable, n: usize) -> Result<Array1<f32>> {
    let len = table.len();
    if n > len {
        return Err(Error::IndexOutOfBounds { index: n, len });
    }
    if n == 0 {
        return Err(Error::InvalidArgument(String::from(
            "Cannot average the embeddings of zero tokens",
        )));
    }

    let rows: Vec<usize> = match table.frequencies() {
        Some(freqs) => {
            let words = table.vocab().words();
            let mut by_freq: Vec<usize> = (0..len).collect();
            by_freq.sort_by_key(|&idx| freqs.get(&words[idx]));
            by_freq.truncate(n);
            by_freq
        }
        None => (len - n..len).collect(),
    };

    tracing::debug!("Averaging {} least common embeddings", n);

    table
        .matrix()
        .select(Axis(0), &rows)
        .mean_axis(Axis(0))
        .ok_or_else(|| Error::InvalidArgument(String::from("Cannot average empty matrix")))
}

/// Sample a vector from N(0, `std`²).
///
/// `std` must be positive and finite. The same seed always yields the
/// same vector.
pub fn create_random_vector(dims: usize, std: f32, seed: u64) -> Result<Array1<f32>> {
    if !std.is_finite() || std <= 0.0 {
        return Err(Error::InvalidArgument(format!(
            "Standard deviation must be positive and finite, got: {}",
            std
        )));
    }

    let normal = Normal::new(0f32, std).map_err(|e| {
        Error::InvalidArgument(format!("Invalid standard deviation {}: {}", std, e))
    })?;
    let mut rng = XorShiftRng::seed_from_u64(seed);

    Ok((0..dims).map(|_| normal.sample(&mut rng)).collect())
}

/// Put `token` at `index`.
///
/// If the token is in the table, it is moved to `index` and its old
/// index is returned. Otherwise it is inserted at `index` with the
/// embedding `vector`.
pub fn ensure_reserved(
    table: &mut VocabTable,
    token: &[u8],
    index: usize,
    vector: ArrayView1<f32>,
) -> Result<Option<usize>> {
    if table.vocab().contains(token) {
        let old = table.move_token(token, index)?;
        tracing::debug!(
            "Moved reserved token '{}' from index {} to {}",
            display_token(token),
            old,
            index
        );
        Ok(Some(old))
    } else {
        table.insert(token, index, vector)?;
        tracing::debug!(
            "Inserted reserved token '{}' at index {}",
            display_token(token),
            index
        );
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, arr2};

    use super::{create_random_vector, create_unk_least_common, ensure_reserved, infer_unk_id};
    use crate::error::Error;
    use crate::frequency::Frequencies;
    use crate::table::VocabTable;
    use crate::vocab::SimpleVocab;

    fn table() -> VocabTable {
        VocabTable::new(
            vec![b"the".to_vec(), b",".to_vec(), b".".to_vec()],
            arr2(&[[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]]),
        )
        .unwrap()
    }

    #[test]
    fn infer_unk() {
        let vocab = SimpleVocab::new(vec![b"the".to_vec()]).unwrap();
        assert_eq!(infer_unk_id(&vocab).unwrap(), None);

        let vocab = SimpleVocab::new(vec![b"the".to_vec(), b"<UNK>".to_vec()]).unwrap();
        assert_eq!(infer_unk_id(&vocab).unwrap(), Some(b"<UNK>".to_vec()));

        let vocab = SimpleVocab::new(vec![b"<unk>".to_vec(), b"<UNK>".to_vec()]).unwrap();
        assert!(matches!(infer_unk_id(&vocab), Err(Error::AmbiguousUnk(_))));
    }

    #[test]
    fn least_common_without_frequencies() {
        let unk = create_unk_least_common(&table(), 2).unwrap();
        assert_abs_diff_eq!(unk, arr1(&[0.4f32, 0.5]), epsilon = 1e-6);
    }

    #[test]
    fn least_common_with_frequencies() {
        let mut table = table();
        let freqs: Frequencies = vec![
            (b"the".to_vec(), 10),
            (b",".to_vec(), 1),
            (b".".to_vec(), 5),
        ]
        .into_iter()
        .collect();
        table.set_frequencies(Some(freqs));

        let unk = create_unk_least_common(&table, 1).unwrap();
        assert_abs_diff_eq!(unk, arr1(&[0.3f32, 0.4]), epsilon = 1e-6);

        let unk = create_unk_least_common(&table, 2).unwrap();
        assert_abs_diff_eq!(unk, arr1(&[0.4f32, 0.5]), epsilon = 1e-6);
    }

    #[test]
    fn least_common_bounds() {
        assert!(matches!(
            create_unk_least_common(&table(), 4),
            Err(Error::IndexOutOfBounds { index: 4, len: 3 })
        ));
        assert!(create_unk_least_common(&table(), 0).is_err());
    }

    #[test]
    fn random_vector_is_seeded() {
        let a = create_random_vector(10, 0.5, 42).unwrap();
        let b = create_random_vector(10, 0.5, 42).unwrap();
        let c = create_random_vector(10, 0.5, 43).unwrap();
        assert_eq!(a.len(), 10);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn random_vector_requires_positive_std() {
        for &std in &[0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                create_random_vector(10, std, 42),
                Err(Error::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn ensure_reserved_moves_existing() {
        let mut table = table();
        let old = ensure_reserved(&mut table, b".", 0, arr1(&[0., 0.]).view()).unwrap();
        assert_eq!(old, Some(2));
        assert_eq!(table.vocab().idx(b"."), Some(0));
        assert_eq!(table.vocab().idx(b"the"), Some(1));
        assert_eq!(table.embedding(b".").unwrap(), arr1(&[0.5, 0.6]));
    }

    #[test]
    fn ensure_reserved_inserts_missing() {
        let mut table = table();
        let old = ensure_reserved(&mut table, b"<unk>", 1, arr1(&[0.7, 0.8]).view()).unwrap();
        assert_eq!(old, None);
        assert_eq!(table.len(), 4);
        assert_eq!(table.vocab().idx(b"<unk>"), Some(1));
        assert_eq!(table.vocab().idx(b","), Some(2));
        assert_eq!(table.embedding(b"<unk>").unwrap(), arr1(&[0.7, 0.8]));
    }
}

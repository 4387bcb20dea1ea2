use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use word_embedding_loader::prelude::*;

const N_WORDS: usize = 10_000;
const DIMS: usize = 100;

fn random_table() -> VocabTable {
    let mut rng = XorShiftRng::seed_from_u64(42);
    let words: Vec<Token> = (0..N_WORDS)
        .map(|idx| format!("word{}", idx).into_bytes())
        .collect();
    let matrix = Array2::from_shape_fn((N_WORDS, DIMS), |_| rng.gen_range(-1f32..1f32));
    VocabTable::new(words, matrix).unwrap()
}

fn serialize(table: &VocabTable, format: Format) -> Vec<u8> {
    let mut data = Vec::new();
    EmbeddingStore::new(table.clone())
        .save(&mut data, format)
        .unwrap();
    data
}

fn read_benchmark(c: &mut Criterion) {
    let table = random_table();

    for &format in &Format::ALL {
        let data = serialize(&table, format);
        c.bench_function(&format!("read-{}", format.name()), |b| {
            b.iter(|| {
                let options = LoadOptions::default().with_format(format);
                EmbeddingStore::load(&mut Cursor::new(&data), options).unwrap()
            })
        });
    }

    let data = serialize(&table, Format::Word2VecText);
    c.bench_function("classify-word2vec-text", |b| {
        b.iter(|| classify(&mut Cursor::new(&data)).unwrap())
    });
}

fn write_benchmark(c: &mut Criterion) {
    let store = EmbeddingStore::new(random_table());

    for &format in &Format::ALL {
        c.bench_function(&format!("write-{}", format.name()), |b| {
            b.iter(|| {
                let mut data = Vec::new();
                store.save(&mut data, format).unwrap();
                black_box(data)
            })
        });
    }
}

criterion_group!(benches, read_benchmark, write_benchmark);
criterion_main!(benches);

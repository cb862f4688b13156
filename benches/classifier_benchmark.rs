use std::collections::HashMap;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use veritas::{
    decide, Calibration, CharacterFilterNormalizer, Classifier, LabelMapping, LinearModel,
    TextNormalizer, TfidfVectorizer, Vectorizer,
};

const VOCABULARY_SIZE: usize = 5_000;
const CLASSES: usize = 5;

fn term(i: usize) -> String {
    let mut s = String::from("w");
    let mut n = i;
    loop {
        s.push((b'a' + (n % 26) as u8) as char);
        n /= 26;
        if n == 0 {
            break;
        }
    }
    s
}

fn setup_benchmark_classifier() -> Classifier {
    let vocabulary: HashMap<String, usize> = (0..VOCABULARY_SIZE).map(|i| (term(i), i)).collect();
    let idf = (0..VOCABULARY_SIZE).map(|i| 1.0 + (i % 7) as f32 * 0.3).collect();
    let vectorizer = TfidfVectorizer::new(vocabulary, idf).unwrap();

    let coefficients = Array2::from_shape_fn((CLASSES, VOCABULARY_SIZE), |(c, f)| {
        if f % CLASSES == c { 2.0 } else { -0.5 }
    });
    let intercepts = ndarray::Array1::zeros(CLASSES);
    let model = LinearModel::new(coefficients, intercepts, Calibration::Softmax).unwrap();

    Classifier::builder()
        .with_vectorizer(Arc::new(vectorizer))
        .with_model(Arc::new(model))
        .with_label_mapping(LabelMapping::veracity())
        .build()
        .unwrap()
}

fn sample_text(words: usize) -> String {
    (0..words).map(|i| term(i * 37 % VOCABULARY_SIZE)).collect::<Vec<_>>().join(" ")
}

fn bench_normalization(c: &mut Criterion) {
    let normalizer = CharacterFilterNormalizer;
    let mut group = c.benchmark_group("Normalization");
    group.sample_size(50);

    let text = "Guvernul a anunțat ASTĂZI, 12 mai, noi măsuri: taxe, amenzi și controale! "
        .repeat(20);
    group.bench_function("character_filter", |b| {
        b.iter(|| normalizer.normalize(black_box(&text)).unwrap())
    });
    group.finish();
}

fn bench_vectorization(c: &mut Criterion) {
    let vocabulary: HashMap<String, usize> = (0..VOCABULARY_SIZE).map(|i| (term(i), i)).collect();
    let vectorizer = TfidfVectorizer::new(vocabulary, vec![1.0; VOCABULARY_SIZE]).unwrap();
    let mut group = c.benchmark_group("Vectorization");
    group.sample_size(50);

    for words in [10, 100, 1000] {
        let text = sample_text(words);
        group.bench_function(format!("tfidf_{}_words", words), |b| {
            b.iter(|| vectorizer.transform(black_box(&text)).unwrap())
        });
    }
    group.finish();
}

fn bench_classification(c: &mut Criterion) {
    let classifier = setup_benchmark_classifier();
    let mut group = c.benchmark_group("Classification");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let short = sample_text(20);
    let long = sample_text(500);
    group.bench_function("short_text", |b| b.iter(|| classifier.classify(black_box(&short))));
    group.bench_function("long_text", |b| b.iter(|| classifier.classify(black_box(&long))));

    let labels = LabelMapping::veracity();
    let probabilities = [0.15, 0.75, 0.05, 0.03, 0.02];
    group.bench_function("decide_middle_tier", |b| {
        b.iter(|| decide(black_box(&probabilities), &labels).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_normalization, bench_vectorization, bench_classification);
criterion_main!(benches);

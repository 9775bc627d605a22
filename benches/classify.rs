use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use osm2feature::{Classifier, ClassifTree, DrawingRules, Element, ElementKind, NoMetadata};

fn element(kind: ElementKind, tags: &[(&str, &str)]) -> Element {
    let mut element = Element::new(kind);
    for (key, value) in tags {
        element.add_tag(*key, *value);
    }
    element
}

fn samples() -> Vec<(&'static str, Element)> {
    vec![
        (
            "primary",
            element(
                ElementKind::Line,
                &[
                    ("highway", "primary"),
                    ("name", "Hauptstraße"),
                    ("name:en", "Main Street"),
                    ("oneway", "yes"),
                    ("lit", "yes"),
                    ("ref", "B96"),
                    ("maxspeed", "50"),
                ],
            ),
        ),
        (
            "building",
            element(
                ElementKind::Area,
                &[
                    ("building", "yes"),
                    ("addr:housenumber", "12"),
                    ("addr:street", "Elm Street"),
                    ("addr:flats", "1-4"),
                ],
            ),
        ),
        (
            "station",
            element(
                ElementKind::Point,
                &[
                    ("railway", "station"),
                    ("station", "subway"),
                    ("network", "London Underground"),
                    ("name", "Angel"),
                ],
            ),
        ),
        (
            "unmatched",
            element(
                ElementKind::Point,
                &[
                    ("source", "survey"),
                    ("note", "to be checked"),
                    ("created_by", "JOSM"),
                ],
            ),
        ),
    ]
}

fn classify(c: &mut Criterion) {
    let definition = include_str!("../data/classificator.txt");
    let tree: ClassifTree = definition.parse().unwrap();
    let classifier = Classifier::new(&tree, DrawingRules::from_tree(&tree)).unwrap();

    let mut group = c.benchmark_group("Classifier");
    for (name, sample) in samples() {
        group.bench_with_input(BenchmarkId::new("process", name), &sample, |b, sample| {
            b.iter_batched(
                || sample.clone(),
                |mut element| classifier.process(&mut element, &NoMetadata),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, classify);
criterion_main!(benches);

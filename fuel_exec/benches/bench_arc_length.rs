//! # Arc Length Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fuel_lib::arc;
use path_if::{GeoPoint, Path};

fn bench_arc_length(c: &mut Criterion) {
    // A long lawnmower pattern of rows roughly 11 m apart
    let mut path = Path::new_empty();
    for row in 0..100 {
        let lat = 40.0 + row as f64 * 0.0001;
        let (lon_0, lon_1) = match row % 2 {
            0 => (-105.0, -104.999),
            _ => (-104.999, -105.0),
        };

        path.add_point(GeoPoint::new(lat, lon_0, 1600.0), None).unwrap();
        path.add_point(GeoPoint::new(lat, lon_1, 1600.0), None).unwrap();
    }

    let ned = path.to_ned_from_first().unwrap();

    c.bench_function("project path", |b| {
        b.iter(|| black_box(&path).to_ned_from_first())
    });
    c.bench_function("cumulative length", |b| {
        b.iter(|| arc::cumulative_length(black_box(&ned.points_cm)))
    });
    c.bench_function("partial length", |b| {
        b.iter(|| arc::partial_length(black_box(&ned.points_cm), black_box(120)))
    });
}

criterion_group!(benches, bench_arc_length);
criterion_main!(benches);

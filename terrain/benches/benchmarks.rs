use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::{fs, path::Path};
use tempfile::TempDir;
use terrain::{CoverEngine, ElevationEngine, TileType};

fn write_tile(dir: &Path, name: &str, n: usize) {
    let mut bytes = Vec::with_capacity(2 * n * n);
    for k in 0..n * n {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        bytes.extend_from_slice(&((k % 4000) as i16).to_be_bytes());
    }
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), bytes).unwrap();
}

fn tile_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_tile(&dir.path().join("3arcsecond"), "N44W072.hgt", 1201);
    write_tile(&dir.path().join("9arcsecond"), "N44W072.hgt", 401);
    write_tile(&dir.path().join("9arcsecond"), "N44W071.hgt", 401);
    write_tile(&dir.path().join("81arcsecond"), "N22W090.hgt", 1001);
    dir
}

fn elevation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Elevation");
    let dir = tile_dir();
    let engine = ElevationEngine::new(dir.path()).unwrap();

    let mt_washington = (-71.30325, 44.2705);
    let ocean = (-30.0, 30.0);

    group.bench_function("most accurate", |b| {
        b.iter(|| engine.elevation(black_box(mt_washington.0), black_box(mt_washington.1)))
    });
    group.bench_function("fallback", |b| {
        b.iter(|| engine.elevation(black_box(-70.5), black_box(44.5)))
    });
    group.bench_function("sea", |b| {
        b.iter(|| engine.elevation(black_box(ocean.0), black_box(ocean.1)))
    });
    group.bench_function("tier", |b| {
        b.iter(|| {
            engine.elevation_for_tier(
                black_box(mt_washington.0),
                black_box(mt_washington.1),
                TileType::Dem81_1001,
            )
        })
    });
}

fn cover(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    write_tile(dir.path(), "N44W072.hgt", 361);
    let engine = CoverEngine::new(dir.path()).unwrap();
    c.bench_function("Cover", |b| {
        b.iter(|| engine.cover_type(black_box(-71.5), black_box(44.5)))
    });
}

criterion_group!(benches, elevation, cover);
criterion_main!(benches);

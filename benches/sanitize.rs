use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rich_note::chip::{ChipPayload, chip_html};
use rich_note::sanitize::{Profile, sanitize};
use rich_note::{Surface, SurfaceConfig};

fn report_note() -> String {
    let chip = chip_html(&ChipPayload::PullRequest {
        number: 42,
        title: "Reduce allocation in hot path".to_string(),
        url: "https://x/pull/42".to_string(),
        state: Some("merged".to_string()),
        source_id: None,
    });
    let mut note = String::new();
    for i in 0..50 {
        note.push_str(&format!(
            "<p>Paragraph {i} with <b>bold</b>, <i>italic</i>, and a chip {chip} inline.</p>"
        ));
    }
    note
}

fn bench_sanitize_save(c: &mut Criterion) {
    let note = report_note();
    let profile = Profile::save();
    c.bench_function("sanitize_save", |b| {
        b.iter(|| black_box(sanitize(black_box(&note), &profile)))
    });
}

fn bench_sanitize_external(c: &mut Criterion) {
    let note = report_note();
    let profile = Profile::external_paste();
    c.bench_function("sanitize_external", |b| {
        b.iter(|| black_box(sanitize(black_box(&note), &profile)))
    });
}

fn bench_surface_keystroke(c: &mut Criterion) {
    let note = report_note();
    c.bench_function("surface_keystroke", |b| {
        b.iter(|| {
            let mut surface = Surface::new(SurfaceConfig {
                value: note.clone(),
                ..SurfaceConfig::default()
            });
            surface.insert_text("x", 0);
            black_box(surface.value());
        })
    });
}

criterion_group!(
    benches,
    bench_sanitize_save,
    bench_sanitize_external,
    bench_surface_keystroke
);
criterion_main!(benches);

//! Screen benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use vtmux::core::Screen;
use vtmux::render::Renderer;
use vtmux::Terminal;

fn bench_screen_print(c: &mut Criterion) {
    let mut group = c.benchmark_group("screen");
    let text: Vec<char> = "Hello, World! ".chars().collect();

    group.bench_function("print_chars", |b| {
        b.iter(|| {
            let mut screen = Screen::new(24, 80, None);
            for &ch in &text {
                screen.print(ch);
            }
            black_box(screen)
        })
    });

    group.finish();
}

fn bench_screen_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("screen");
    let input: String = (0..100)
        .map(|i| format!("Line {}: Some text content here\r\n", i))
        .collect();
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("scroll_into_scrollback", |b| {
        b.iter(|| {
            let mut term = Terminal::new(24, 80, Some(1000));
            term.process(input.as_bytes());
            black_box(term)
        })
    });

    group.finish();
}

fn bench_screen_full_redraw(c: &mut Criterion) {
    let mut group = c.benchmark_group("screen");

    // Simulate a full-screen application repainting every row
    let mut input = String::from("\x1b[H\x1b[2J");
    for row in 1..=24 {
        input.push_str(&format!("\x1b[{};1H", row));
        input.push_str(&"X".repeat(80));
    }
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("full_redraw", |b| {
        b.iter(|| {
            let mut term = Terminal::new(24, 80, None);
            term.process(input.as_bytes());
            black_box(term)
        })
    });

    group.finish();
}

fn bench_render_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    let mut term = Terminal::new(24, 80, None);
    for row in 0..24 {
        let line = format!("\x1b[{};1H\x1b[1mrow {}\x1b[0m {}", row + 1, row, "-".repeat(60));
        term.process(line.as_bytes());
    }

    group.bench_function("full_frame", |b| {
        let mut out = Vec::with_capacity(16 * 1024);
        b.iter(|| {
            let mut renderer = Renderer::new();
            out.clear();
            renderer.render(term.screen(), &mut out).ok();
            black_box(out.len())
        })
    });

    group.bench_function("unchanged_frame", |b| {
        let mut renderer = Renderer::new();
        let mut out = Vec::with_capacity(16 * 1024);
        renderer.render(term.screen(), &mut out).ok();
        b.iter(|| {
            out.clear();
            renderer.render(term.screen(), &mut out).ok();
            black_box(out.len())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_screen_print,
    bench_screen_scroll,
    bench_screen_full_redraw,
    bench_render_diff
);

criterion_main!(benches);

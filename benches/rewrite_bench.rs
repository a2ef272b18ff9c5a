use criterion::{black_box, criterion_group, criterion_main, Criterion};

use breakpoint_override::document::StyleSheetDocument;
use breakpoint_override::scheduler::Scheduler;
use breakpoint_override::{generate, BreakpointPair, OverrideConfig, Rewriter, ORIGINAL_BREAKPOINTS};

// Roughly the size of a block-heavy page's compiled inline styles
fn theme_css(blocks: usize) -> String {
    let mut css = String::new();
    for i in 0..blocks {
        css.push_str(&format!(
            "@media all and (max-width: 1024px){{.kb-row-{i}{{padding:10px}}}}\
             @media all and (min-width: 1025px){{.kb-row-{i}{{padding:40px}}}}\
             @media all and (max-width: 767px){{.kb-col-{i}{{width:100%}}}}\
             .kb-btn-{i}{{color:#333;max-width:800px}}"
        ));
    }
    css
}

fn bench_rewrite(c: &mut Criterion) {
    let css = theme_css(500);
    let rewriter = Rewriter::new(ORIGINAL_BREAKPOINTS, BreakpointPair::new(900, 600));

    c.bench_function("rewrite_theme_css", |b| {
        b.iter(|| {
            let _ = rewriter.apply(black_box(&css));
        })
    });

    let rewritten = rewriter.apply(&css).into_owned();
    c.bench_function("rewrite_already_rewritten", |b| {
        b.iter(|| {
            let _ = rewriter.apply(black_box(&rewritten));
        })
    });
}

fn bench_pass(c: &mut Criterion) {
    let scheduler = Scheduler::new(BreakpointPair::new(900, 600), OverrideConfig::default());
    let styles: Vec<String> = (0..40).map(|_| theme_css(10)).collect();

    c.bench_function("scheduler_pass_40_styles", |b| {
        b.iter(|| {
            let mut doc = StyleSheetDocument::from_styles(styles.iter().cloned());
            let _ = scheduler.run_pass(&mut doc);
        })
    });

    c.bench_function("generate", |b| {
        b.iter(|| {
            let _ = generate(black_box(BreakpointPair::new(900, 600)));
        })
    });
}

criterion_group!(benches, bench_rewrite, bench_pass);
criterion_main!(benches);

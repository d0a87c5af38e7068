use super::*;
use crate::render::fonts::FontConfig;

fn under(limit: f32) -> impl Fn(&f32) -> bool {
    move |h: &f32| *h <= limit
}

#[test]
fn shrink_to_fit_keeps_full_size_when_it_fits() {
    let got = shrink_to_fit(0.4, |s| Ok(s * 80.0), under(100.0)).unwrap();
    assert_eq!(got, Some(80.0));
}

#[test]
fn shrink_to_fit_steps_down_until_it_fits() {
    let mut tried = Vec::new();
    let got = shrink_to_fit(
        0.4,
        |s| {
            tried.push(s);
            Ok(s * 100.0)
        },
        under(70.0),
    )
    .unwrap()
    .unwrap();
    // 1.0 -> 0.9 -> 0.81 -> 0.729 -> 0.6561
    assert_eq!(tried.len(), 5);
    assert!((got - 65.61).abs() < 1e-2);
}

#[test]
fn shrink_to_fit_gives_up_below_min_scale() {
    let mut calls = 0;
    let got = shrink_to_fit(
        0.5,
        |s| {
            calls += 1;
            Ok(s)
        },
        |_| false,
    )
    .unwrap();
    assert!(got.is_none());
    // 1.0, 0.9, 0.81, 0.729, 0.6561, 0.59049, 0.531441
    assert_eq!(calls, 7);
}

#[test]
fn shrink_to_fit_propagates_build_errors() {
    let err = shrink_to_fit::<f32>(0.4, |_| Err(QuoteReelError::config("boom")), |_| true)
        .unwrap_err();
    assert_eq!(err.stage(), "config");
}

#[test]
fn brush_copies_straight_channels() {
    let b: TextBrushRgba8 = Rgba8::rgba(1, 2, 3, 4).into();
    assert_eq!(
        b,
        TextBrushRgba8 {
            r: 1,
            g: 2,
            b: 3,
            a: 4
        }
    );
}

fn run(size_px: f32) -> RunStyle {
    RunStyle {
        size_px,
        line_height: 1.4,
        brush: TextBrushRgba8::default(),
    }
}

fn system_fonts() -> Option<FontSet> {
    FontSet::resolve(&FontConfig::default()).ok()
}

#[test]
fn long_quotes_wrap_within_the_max_width() {
    let Some(fonts) = system_fonts() else {
        return;
    };
    let mut engine = TextLayoutEngine::new();
    let quote = "Let yourself be silently drawn by the strange pull of what you really love. \
                 It will not lead you astray.";
    let text = layout_slide_text(
        &mut engine,
        &fonts,
        &TextStyle::default(),
        quote,
        "- Rumi",
        TextBox {
            max_width: 400.0,
            max_height: 1000.0,
        },
    )
    .unwrap();
    assert!(text.quote.line_count() > 1);
    assert!(text.width() <= 400.0 + 1.0);
    assert!(text.height() > 0.0);
    assert_eq!(text.scale, 1.0);
}

#[test]
fn oversized_text_shrinks_or_fails_with_render_context() {
    let Some(fonts) = system_fonts() else {
        return;
    };
    let mut engine = TextLayoutEngine::new();
    let quote = "word ".repeat(120);

    let shrunk = layout_slide_text(
        &mut engine,
        &fonts,
        &TextStyle::default(),
        &quote,
        "- Rumi",
        TextBox {
            max_width: 800.0,
            max_height: 400.0,
        },
    );
    if let Ok(text) = shrunk {
        assert!(text.scale < 1.0);
        assert!(text.height() <= 400.0);
    }

    let err = layout_slide_text(
        &mut engine,
        &fonts,
        &TextStyle::default(),
        &quote,
        "- Rumi",
        TextBox {
            max_width: 200.0,
            max_height: 20.0,
        },
    )
    .err()
    .unwrap();
    assert!(err.to_string().contains("does not fit"));
}

#[test]
fn markup_like_text_is_laid_out_verbatim() {
    let Some(fonts) = system_fonts() else {
        return;
    };
    let mut engine = TextLayoutEngine::new();
    let plain = engine
        .layout_plain("<b>bold</b> & co", &fonts.regular, run(40.0), None)
        .unwrap();
    let stripped = engine
        .layout_plain("bold & co", &fonts.regular, run(40.0), None)
        .unwrap();
    let width = |l: &parley::Layout<TextBrushRgba8>| {
        l.lines()
            .map(|line| visible_line_width(line.metrics()))
            .fold(0.0, f32::max)
    };
    assert!(width(&plain) > width(&stripped));
}

#[test]
fn layout_rejects_non_positive_size() {
    let mut engine = TextLayoutEngine::new();
    let font = LoadedFont {
        bytes: std::sync::Arc::new(Vec::new()),
        index: 0,
        family: "none".to_string(),
        origin: "test:none".to_string(),
    };
    let err = engine
        .layout_plain("x", &font, run(0.0), None)
        .err()
        .unwrap();
    assert_eq!(err.stage(), "config");

    let err = engine
        .layout_plain(
            "x",
            &font,
            RunStyle {
                line_height: 0.0,
                ..run(40.0)
            },
            None,
        )
        .err()
        .unwrap();
    assert_eq!(err.stage(), "config");
}

#[test]
fn unbroken_words_wrap_inside_the_text_box() {
    let Some(fonts) = system_fonts() else {
        return;
    };
    let mut engine = TextLayoutEngine::new();
    let quote = "a".repeat(300);
    let text = layout_slide_text(
        &mut engine,
        &fonts,
        &TextStyle::default(),
        &quote,
        "- Rumi",
        TextBox {
            max_width: 800.0,
            max_height: 1016.0,
        },
    )
    .unwrap();
    assert!(text.quote.line_count() > 1);
    assert!(
        text.width() <= 800.0 + 1.0,
        "text block {} px wider than the box",
        text.width()
    );
}

#[test]
fn line_width_ignores_trailing_spaces() {
    let Some(fonts) = system_fonts() else {
        return;
    };
    let mut engine = TextLayoutEngine::new();
    let bare = engine
        .layout_plain("silence", &fonts.regular, run(40.0), None)
        .unwrap();
    let padded = engine
        .layout_plain("silence   ", &fonts.regular, run(40.0), None)
        .unwrap();
    let first = |l: &parley::Layout<TextBrushRgba8>| {
        let line = l.lines().next().unwrap();
        (line.metrics().advance, visible_line_width(line.metrics()))
    };
    let (bare_adv, bare_vis) = first(&bare);
    let (padded_adv, padded_vis) = first(&padded);
    assert!(padded_adv > bare_adv);
    assert!((padded_vis - bare_vis).abs() < 0.01);
}

#[test]
fn line_height_spreads_wrapped_lines() {
    let Some(fonts) = system_fonts() else {
        return;
    };
    let mut engine = TextLayoutEngine::new();
    let quote = "Out beyond ideas of wrongdoing and rightdoing there is a field";
    let tight = engine
        .layout_plain(
            quote,
            &fonts.regular,
            RunStyle {
                line_height: 1.0,
                ..run(40.0)
            },
            Some(300.0),
        )
        .unwrap();
    let loose = engine
        .layout_plain(quote, &fonts.regular, run(40.0), Some(300.0))
        .unwrap();
    assert_eq!(tight.len(), loose.len());
    assert!(loose.len() > 1);
    assert!(loose.height() > tight.height());
}

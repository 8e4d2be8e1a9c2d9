//! Integration tests: widgets driven end-to-end against capture sinks,
//! including the cross-thread protocols and shutdown ordering.

use liveline::{ansi, BarStyle, CancelToken, Matrix, ProgressBar, Sink, Spinner, SpinnerStyle};
use std::thread;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(10);

fn wait_for(capture: &liveline::Capture, needle: &str) {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if capture.contents().contains(needle) {
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!(
        "{needle:?} never appeared; captured: {:?}",
        capture.contents()
    );
}

// ============================================================================
// Matrix
// ============================================================================

#[test]
fn matrix_background_loop_paints_row_updates() {
    let (sink, capture) = Sink::capture();
    let matrix = Matrix::new(sink, Duration::from_millis(1));
    let guard = matrix.start().expect("first start");

    matrix.new_row().update("[alpha]");
    wait_for(&capture, "[alpha]");
    guard.stop();
}

#[test]
fn matrix_rewrites_only_modified_rows() {
    let (sink, capture) = Sink::capture();
    let matrix = Matrix::new(sink, Duration::from_millis(1));

    matrix.new_row().update("one");
    let row = matrix.new_row();
    row.update("stale");
    matrix.new_row().update("three");
    row.update("two");

    let guard = matrix.start().expect("first start");
    let expected = format!("{e}one\n{e}two\n{e}three\n", e = ansi::ERASE_LINE);
    wait_for(&capture, &expected);
    guard.stop();
}

#[test]
fn matrix_unmodified_rows_are_skipped_as_newlines() {
    let (sink, capture) = Sink::capture();
    let matrix = Matrix::new(sink, Duration::from_millis(1));
    matrix.new_range(4);

    let guard = matrix.start().expect("first start");
    wait_for(&capture, "\n\n\n\n");
    guard.stop();
}

#[test]
fn matrix_stop_drains_then_goes_quiet() {
    let (sink, capture) = Sink::capture();
    let matrix = Matrix::new(sink, Duration::from_millis(1));
    let row = matrix.new_row();
    let guard = matrix.start().expect("first start");

    row.update("final words");
    guard.stop();

    assert!(capture.contents().contains("final words"));
    let len = capture.len();
    thread::sleep(Duration::from_millis(200));
    assert_eq!(capture.len(), len, "sink must stay quiet after stop");
}

#[test]
fn matrix_concurrent_writers_land_on_their_own_rows() {
    const ROWS: usize = 100;
    const WRITES: usize = 100;

    let (sink, _capture) = Sink::capture();
    let matrix = Matrix::new(sink, Duration::from_millis(1));
    let rows = matrix.new_range(ROWS);
    let guard = matrix.start().expect("first start");

    let handles: Vec<_> = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            thread::spawn(move || {
                for n in 0..WRITES {
                    row.update(&format!("worker-{i}-{n}"));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("writer thread");
    }
    guard.stop();

    for i in 0..ROWS {
        let value = matrix.row(i).expect("row exists").value();
        assert!(
            value.starts_with(&format!("worker-{i}-")),
            "row {i} corrupted: {value:?}"
        );
    }
}

// ============================================================================
// Progress bar
// ============================================================================

#[test]
fn bar_handle_is_shareable_across_threads() {
    let (sink, capture) = Sink::capture();
    let bar = ProgressBar::new(sink, 40, 100, 20, BarStyle::default());
    let token = CancelToken::new();
    let handle = bar.start(&token).expect("start");

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..10 {
                    handle.tick(None);
                }
            });
        }
    });
    assert!(bar.is_done());
    handle.wait();
    assert!(capture.contents().contains("100%"));
}

#[test]
fn bar_cancel_drain_reaches_full_frame() {
    let (sink, capture) = Sink::capture();
    let bar = ProgressBar::new(sink, 50, 100, 20, BarStyle::default());
    let token = CancelToken::new();
    let handle = bar.start(&token).expect("start");

    assert!(handle.tick(Some("partial")));
    token.cancel();
    handle.wait();

    assert!(bar.is_done());
    assert!(capture.contents().contains("100%"));

    let len = capture.len();
    thread::sleep(Duration::from_millis(200));
    assert_eq!(capture.len(), len, "no writes after the drain completed");
}

#[test]
fn bar_messages_flow_through_the_owner() {
    let (sink, capture) = Sink::capture();
    let bar = ProgressBar::new(sink, 3, 100, 20, BarStyle::with_message_width(16));
    let token = CancelToken::new();
    let handle = bar.start(&token).expect("start");

    handle.tick(Some("resolving"));
    handle.tick(Some("fetching"));
    handle.tick(Some("linking"));
    handle.wait();

    let contents = capture.contents();
    for msg in ["resolving", "fetching", "linking"] {
        assert!(contents.contains(msg), "missing {msg:?} in {contents:?}");
    }
}

// ============================================================================
// Spinner
// ============================================================================

#[test]
fn spinner_title_updates_from_another_thread() {
    let (sink, capture) = Sink::capture();
    let spinner = Spinner::new(sink, "T0", Duration::from_millis(1), SpinnerStyle::default());
    let token = CancelToken::new();
    spinner.start(&token).expect("start");
    wait_for(&capture, "T0");

    thread::scope(|scope| {
        scope.spawn(|| spinner.set_title("T1").expect("spinner is active"));
    });
    wait_for(&capture, "T1");
    spinner.stop("bye").expect("stop");
    assert!(capture.contents().ends_with("bye"));
}

// ============================================================================
// Shared-sink sequencing
// ============================================================================

#[test]
fn widgets_interleave_cleanly_at_stop_boundaries() {
    let (sink, capture) = Sink::capture();

    // Spinner runs first and is fully stopped...
    let spinner = Spinner::new(
        sink.clone(),
        "phase one",
        Duration::from_millis(1),
        SpinnerStyle::default(),
    );
    let token = CancelToken::new();
    spinner.start(&token).expect("start spinner");
    wait_for(&capture, "phase one");
    spinner.stop("phase one done").expect("stop spinner");
    let boundary = capture.len();

    // ...before the bar takes over the same sink.
    let bar = ProgressBar::new(sink, 5, 100, 10, BarStyle::default());
    let bar_token = CancelToken::new();
    let handle = bar.start(&bar_token).expect("start bar");
    while handle.tick(None) {}
    handle.wait();

    let contents = capture.contents();
    // Everything after the boundary belongs to the bar: the spinner wrote
    // nothing once its stop call returned.
    assert!(contents[..boundary].ends_with("phase one done"));
    assert!(contents[boundary..].contains("100%"));
    assert!(!contents[boundary..].contains("phase one"));
}

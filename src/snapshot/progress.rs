use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Attach a spinner to `mp` for one reconciliation step (a rename,
/// checkout, or clone of a single node).
///
/// Spinners draw to stderr, so the stdout sentinel lines stay
/// machine-parseable.
pub fn step_spinner(mp: &MultiProgress, msg: String) -> ProgressBar {
    let pb = mp.add(ProgressBar::new_spinner());
    pb.set_style(
        ProgressStyle::with_template("\x1b[33m{spinner}\x1b[0m {wide_msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Finish a step spinner with a green check mark.
pub fn finish_ok(pb: &ProgressBar, msg: String) {
    pb.set_style(ProgressStyle::with_template("\x1b[32m✔\x1b[0m {wide_msg}").unwrap());
    pb.finish_with_message(msg);
}

/// Finish a step spinner with a red cross. Used when a node fails to
/// reconcile; the apply continues with the remaining nodes.
pub fn finish_err(pb: &ProgressBar, msg: String) {
    pb.set_style(ProgressStyle::with_template("\x1b[31m✘\x1b[0m {wide_msg}").unwrap());
    pb.finish_with_message(msg);
}

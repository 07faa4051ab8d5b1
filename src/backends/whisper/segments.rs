use anyhow::{Context, Result};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperState};

fn build_full_params(language: &str, threads: usize) -> FullParams<'_, '_> {
    let mut params = FullParams::new(SamplingStrategy::BeamSearch {
        beam_size: 5,
        patience: 1.0,
    });

    params.set_n_threads(i32::try_from(threads).unwrap_or(i32::MAX));
    params.set_translate(false);
    params.set_language(Some(language));
    params.set_no_context(true);
    params.set_single_segment(false);

    params.set_print_progress(false);
    params.set_print_special(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    params
}

fn run_whisper_full(
    ctx: &WhisperContext,
    language: &str,
    threads: usize,
    samples: &[f32],
) -> Result<WhisperState> {
    let params = build_full_params(language, threads);

    let mut state = ctx
        .create_state()
        .context("failed to create whisper state")?;

    state
        .full(params, samples)
        .context("failed to run whisper full()")?;

    Ok(state)
}

/// Transcribe a whole clip and return the text of all segments joined together.
pub(super) fn transcribe_text(
    ctx: &WhisperContext,
    language: &str,
    threads: usize,
    samples: &[f32],
) -> Result<String> {
    let state = run_whisper_full(ctx, language, threads, samples)?;

    let mut text = String::new();
    for segment in state.as_iter() {
        let piece = segment.to_str().context("failed to get segment text")?;
        text.push_str(piece);
    }

    Ok(text.trim().to_owned())
}

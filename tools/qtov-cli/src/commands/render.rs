use std::io::{Read, Write};
use std::sync::Mutex;

use anyhow::Context;

use qtov_common::config::AppConfig;
use qtov_job_model::job::{JobConfig, JobResult};
use qtov_render_engine::{process_video, ProgressCallback, RenderJob, RenderProgress, RenderStage};

pub fn run(config_arg: Option<String>, app_config: AppConfig) -> anyhow::Result<()> {
    let raw = read_job_text(config_arg, std::io::stdin().lock())?;
    let config = JobConfig::from_json(&raw).context("Failed to read render job")?;
    let output_path = config.output_path.clone();

    let job = RenderJob::new(config, app_config.render);
    let outcome = process_video(&job, Some(progress_logger()))?;

    tracing::info!(
        output = %outcome.output_path.display(),
        duration_secs = outcome.duration_secs,
        truncated = outcome.truncated,
        audio = outcome.audio.as_str(),
        caption_lines = outcome.caption_lines,
        elapsed_secs = outcome.elapsed_secs,
        "Video processed successfully"
    );

    let line = JobResult::success(output_path).to_json_line()?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()?;
    Ok(())
}

/// The job JSON: the argument when given, otherwise all of `stdin`.
fn read_job_text<R: Read>(config_arg: Option<String>, mut stdin: R) -> anyhow::Result<String> {
    if let Some(arg) = config_arg {
        return Ok(arg);
    }

    let mut raw = String::new();
    stdin
        .read_to_string(&mut raw)
        .context("Failed to read job from stdin")?;
    if raw.trim().is_empty() {
        anyhow::bail!("No job given: pass the job JSON as an argument or on stdin");
    }
    Ok(raw)
}

/// Log progress once per 10% step of each stage.
fn progress_logger() -> ProgressCallback {
    let last: Mutex<Option<(RenderStage, u32)>> = Mutex::new(None);
    Box::new(move |p: RenderProgress| {
        let label = match p.stage {
            RenderStage::MixingAudio => "Mixing audio",
            RenderStage::Encoding => "Processing video",
            _ => return,
        };
        let step = ((p.progress * 10.0).floor() as u32).min(10) * 10;
        let Ok(mut last) = last.lock() else {
            return;
        };
        if *last == Some((p.stage, step)) {
            return;
        }
        *last = Some((p.stage, step));
        tracing::info!(stage = label, percent = step, eta_secs = p.eta_secs, "{label}: {step}% done");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_wins_over_stdin() {
        let text = read_job_text(Some("{\"a\":1}".to_string()), "ignored".as_bytes()).unwrap();
        assert_eq!(text, "{\"a\":1}");
    }

    #[test]
    fn test_stdin_used_without_argument() {
        let text = read_job_text(None, "{\"b\":2}\n".as_bytes()).unwrap();
        assert_eq!(text, "{\"b\":2}\n");
    }

    #[test]
    fn test_empty_stdin_is_an_error() {
        let err = read_job_text(None, "  \n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("No job given"));
    }
}

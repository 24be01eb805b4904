use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use tracing::info;

use whisper_batch::config::Config;
use whisper_batch::error::TranscribeError;
use whisper_batch::transcription::{build_srt, Transcriber, WhisperModel};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("transcribe")
        .version("0.1.0")
        .about("Transcribe a single audio file with an external Whisper backend")
        .arg(
            Arg::new("audio")
                .value_name("AUDIO_FILE")
                .help("Path to the audio file")
                .required(true),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .value_name("SIZE")
                .help("Whisper model size")
                .default_value("base")
                .value_parser(["tiny", "base", "small", "medium", "large"]),
        )
        .arg(
            Arg::new("language")
                .long("language")
                .value_name("LANG")
                .help("Language hint (auto-detect when omitted)"),
        )
        .arg(
            Arg::new("task")
                .long("task")
                .value_name("TASK")
                .help("Transcribe in the source language or translate to English")
                .default_value("transcribe")
                .value_parser(["transcribe", "translate"]),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path for the text output (defaults to <stem>_transcription.txt)"),
        )
        .arg(
            Arg::new("srt")
                .long("srt")
                .help("Also write an SRT subtitle file next to the audio")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("verbose") {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    } else {
        tracing_subscriber::fmt().with_env_filter("info").init();
    }

    let audio = PathBuf::from(matches.get_one::<String>("audio").unwrap());
    if !audio.exists() {
        return Err(TranscribeError::FileNotFound(audio).into());
    }

    let mut config = Config::load().unwrap_or_else(|_| Config::default());
    config.transcription.model = matches.get_one::<String>("model").unwrap().parse()?;
    config.transcription.task = matches.get_one::<String>("task").unwrap().parse()?;
    if let Some(language) = matches.get_one::<String>("language") {
        config.transcription.language = Some(language.clone());
    }

    let model = WhisperModel::load(config.transcription.clone()).await?;
    let result = model.transcribe(&audio).await?;

    println!("{}", result.text);

    let stem = audio
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transcript".to_string());

    let output_path = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("{}_transcription.txt", stem)));

    // Write failures here are fatal on purpose.
    tokio::fs::write(&output_path, &result.text).await?;
    info!("✅ Transcript saved to {}", output_path.display());

    if matches.get_flag("srt") {
        let srt_path = audio.with_file_name(format!("{}_subtitles.srt", stem));
        tokio::fs::write(&srt_path, build_srt(&result.segments)).await?;
        info!("✅ Subtitles saved to {}", srt_path.display());
    }

    Ok(())
}

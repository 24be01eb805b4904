use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use whisper_batch::config::Config;
use whisper_batch::outputs::OutputFormat;
use whisper_batch::processing::{collect_input_files, BatchProcessor};
use whisper_batch::transcription::WhisperModel;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("batch-transcribe")
        .version("0.1.0")
        .about("Batch audio transcription driven by an external Whisper backend")
        .arg(
            Arg::new("files")
                .value_name("FILE")
                .help("Audio files, directories, or glob patterns")
                .num_args(1..)
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
                .value_name("DIR")
                .help("Output directory")
                .default_value("batch_output"),
        )
        .arg(
            Arg::new("parallel")
                .short('p')
                .long("parallel")
                .value_name("NUM")
                .help("Number of concurrent transcriptions")
                .default_value("1"),
        )
        .arg(
            Arg::new("formats")
                .long("formats")
                .value_name("LIST")
                .help("Comma-separated output formats: txt,srt,vtt,json"),
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

    let mut config = Config::load().unwrap_or_else(|_| Config::default());
    config.transcription.model = matches.get_one::<String>("model").unwrap().parse()?;
    config.transcription.task = matches.get_one::<String>("task").unwrap().parse()?;
    if let Some(language) = matches.get_one::<String>("language") {
        config.transcription.language = Some(language.clone());
    }
    if let Some(list) = matches.get_one::<String>("formats") {
        config.output.formats = list
            .split(',')
            .map(|s| s.trim().parse())
            .collect::<Result<Vec<OutputFormat>>>()?;
    }
    config.validate()?;

    let output_dir = PathBuf::from(matches.get_one::<String>("output").unwrap());
    let parallel: usize = matches.get_one::<String>("parallel").unwrap().parse()?;

    let patterns: Vec<String> = matches
        .get_many::<String>("files")
        .unwrap()
        .cloned()
        .collect();
    let files = collect_input_files(&patterns);
    if files.is_empty() {
        error!("❌ No input files found");
        anyhow::bail!("no input files found");
    }
    info!("📁 Found {} files to transcribe", files.len());
    info!("📂 Output directory: {}", output_dir.display());

    let model = WhisperModel::load(config.transcription.clone()).await?;
    let processor = BatchProcessor::new(config, Arc::new(model), parallel);
    let summary = processor.process_files(files, &output_dir).await?;

    info!("✅ Successful: {}", summary.successful);
    info!("❌ Failed: {}", summary.failed);
    for err in &summary.errors {
        info!("  - {}: {}", err.file.display(), err.error);
    }

    Ok(())
}

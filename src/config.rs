use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;

use crate::load::{InputSource, DEFAULT_INPUT};
use crate::prepare::{PipelineOptions, DEFAULT_IQR_FACTOR};
use crate::views::View;

#[derive(Parser, Debug)]
#[command(author, version, about = "Explore the stroke risk-factor dataset", long_about = None)]
pub struct StrokeArgs {
    #[arg(short, long, env = "STROKE_INPUT", default_value = DEFAULT_INPUT, help = "Default input path")]
    pub input: PathBuf,
    #[arg(short, long, help = "Replacement file, used instead of the default input")]
    pub upload: Option<PathBuf>,
    #[arg(long, value_enum, help = "View to render; prints a session summary when absent")]
    pub view: Option<View>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, help = "Output format")]
    pub format: OutputFormat,
    #[arg(long, default_value_t = DEFAULT_IQR_FACTOR, help = "IQR multiple for the outlier fences")]
    pub iqr_factor: f64,
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1),
    help = "Delta degrees of freedom of the standardization std")]
    pub ddof: u8,
    #[arg(long, help = "Print the encoding plan as JSON")]
    pub plan: bool,
    #[arg(long, help = "Never prompt for a replacement file")]
    pub no_prompt: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Verbose level")]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl StrokeArgs {
    pub fn input_source(&self) -> InputSource {
        let source = InputSource::new(&self.input);
        match &self.upload {
            Some(upload) => source.with_replacement(upload),
            None => source,
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            iqr_factor: self.iqr_factor,
            ddof: self.ddof,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

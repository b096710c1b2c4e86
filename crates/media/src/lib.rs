//! Media pipeline adapters: source resolution (yt-dlp), format selection,
//! local staging with guaranteed cleanup, and out-of-process conversion (ffmpeg).

pub mod convert;
pub mod error;
pub mod select;
pub mod source;
pub mod stager;
pub mod tools;

pub use {
    convert::{Converter, FfmpegConverter},
    error::{ConvertError, SourceError, StageError},
    select::{SelectionPolicy, select_format},
    source::{FormatDescriptor, MediaMetadata, MediaSource, MediaStream},
    stager::{StagedFile, Stager},
};

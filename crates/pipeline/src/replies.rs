//! User-facing reply texts.

use crate::request::Mode;

pub const EXAMPLE_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

pub const INVALID_SOURCE: &str = "Invalid YouTube URL. Please provide a valid YouTube video link.";
pub const SOURCE_UNAVAILABLE: &str =
    "Sorry, I couldn't fetch that video. It may be private or no longer available.";
pub const STAGING_FAILED: &str =
    "Sorry, there was an error saving the media on the server. Please try again later.";
pub const CONVERSION_FAILED: &str = "Sorry, audio extraction failed. Please try again later.";
pub const DELIVERY_FAILED: &str =
    "Sorry, I couldn't send the file. It may be too large for Telegram.";
pub const UNEXPECTED: &str = "Sorry, there was an error processing your request.";

const COMMAND_LIST: &str = "/youtube [URL] - Stream a YouTube video\n\
                            /audio [URL] - Extract audio from YouTube\n\
                            /help - Show this help message";

#[must_use]
pub fn welcome() -> String {
    format!("Welcome to the Media Streaming Bot! 🎬\n\nCommands:\n{COMMAND_LIST}")
}

#[must_use]
pub fn help() -> String {
    format!("Media Streaming Bot Commands:\n\n{COMMAND_LIST}")
}

/// Usage hint for a media command sent without its URL.
#[must_use]
pub fn usage(mode: Mode) -> String {
    let command = mode.command().unwrap_or("youtube");
    format!("Please provide a YouTube URL. Example: /{command} {EXAMPLE_URL}")
}

/// Progress reply sent once metadata is known.
#[must_use]
pub fn progress(mode: Mode, title: &str) -> Option<String> {
    match mode {
        Mode::StreamVideo => Some(format!("Preparing to stream: {title}\nPlease wait...")),
        Mode::ExtractAudio => Some(format!("Extracting audio from: {title}\nPlease wait...")),
        Mode::LinkDetected => None,
    }
}

/// Follow-up menu for a link found in free text.
#[must_use]
pub fn link_menu(title: &str) -> String {
    format!(
        "I detected a YouTube link for: {title}\n\n\
         What would you like to do?\n\
         1. Stream video (/youtube)\n\
         2. Extract audio (/audio)"
    )
}

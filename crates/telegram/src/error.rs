use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("{message}")]
    Message { message: String },
}

impl reelbot_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

reelbot_common::impl_context!();

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        teloxide::{ApiError, RequestError},
    };

    #[test]
    fn context_prefixes_message() {
        let parsed: std::result::Result<i64, _> = "abc".parse::<i64>();
        let err = parsed.context("parsing chat id").unwrap_err();
        assert!(matches!(err, Error::Message { .. }));
        assert!(err.to_string().starts_with("parsing chat id: "));

        let missing: Option<u8> = None;
        let err = missing.with_context(|| "no username").unwrap_err();
        assert_eq!(err.to_string(), "no username");
    }

    #[test]
    fn telegram_errors_convert_transparently() {
        let source = RequestError::Api(ApiError::TerminatedByOtherGetUpdates);
        let expected = source.to_string();
        let err: Error = source.into();
        assert!(matches!(
            err,
            Error::Telegram(RequestError::Api(ApiError::TerminatedByOtherGetUpdates))
        ));
        assert_eq!(err.to_string(), expected);
    }
}

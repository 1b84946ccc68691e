use thiserror::Error;

use crate::model::{ParseIdError, PeriodParseError, QuestionError};
use crate::scoring::ScoringError;

/// Any error produced by the domain crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
    #[error(transparent)]
    Period(#[from] PeriodParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SectionId, XpPeriod};

    fn parse(section: &str, period: &str) -> Result<(SectionId, XpPeriod), Error> {
        Ok((section.parse()?, period.parse()?))
    }

    #[test]
    fn converts_domain_errors() {
        assert!(parse("s1", "weekly").is_ok());
        assert!(matches!(parse(" ", "weekly"), Err(Error::ParseId(_))));
        let err = parse("s1", "hourly").unwrap_err();
        assert!(matches!(err, Error::Period(_)));
        assert!(err.to_string().contains("hourly"));
    }
}

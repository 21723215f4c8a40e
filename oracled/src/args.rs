//! Command-line surface.

use std::path::PathBuf;

use chrono::NaiveDate;
use gumdrop::Options;

use crate::OracleError;

/// Command-line options for one oracle run.
#[derive(Debug, Default, Options)]
pub struct Args {
    #[options(help = "print this help message")]
    pub help: bool,

    #[options(
        short = "d",
        meta = "YYYY/MM/DD",
        help = "UTC date to infer a price for (default: the most recent full day)"
    )]
    pub date: Option<String>,

    #[options(short = "p", meta = "PATH", help = "override the block-file directory")]
    pub blocks_dir: Option<PathBuf>,

    #[options(long = "rb", no_short, help = "use the last 144 blocks instead of a date")]
    pub recent_blocks: bool,

    #[options(short = "c", meta = "PATH", help = "read settings from a TOML file")]
    pub config: Option<PathBuf>,

    #[options(no_short, help = "do not write the HTML chart")]
    pub no_html: bool,
}

impl Args {
    /// The parsed target date, if one was given.
    pub fn target_date(&self) -> Result<Option<NaiveDate>, OracleError> {
        match &self.date {
            None => Ok(None),
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y/%m/%d")
                .map(Some)
                .map_err(|_| {
                    OracleError::Config(format!(
                        "cannot interpret {:?} as a date; the format is YYYY/MM/DD",
                        raw
                    ))
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_parses_in_slash_format() {
        let args = Args {
            date: Some("2024/01/15".into()),
            ..Args::default()
        };
        assert_eq!(
            args.target_date().unwrap(),
            Some(NaiveDate::from_ymd(2024, 1, 15))
        );
    }

    #[test]
    fn bad_date_is_a_config_error() {
        let args = Args {
            date: Some("01-15-2024".into()),
            ..Args::default()
        };
        match args.target_date() {
            Err(OracleError::Config(_)) => {}
            other => panic!("expected Config error, got {:?}", other),
        }
    }
}

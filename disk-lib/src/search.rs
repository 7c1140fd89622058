use chrono::{DateTime, NaiveDate, TimeZone, Utc, Duration};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid condition: {0}")]
    InvalidCondition(String),

    #[error("empty name: {0}")]
    EmptyName(String),

    #[error("empty keyword: {0}")]
    EmptyKeyword(String),

    #[error("invalid time keyword: {0}")]
    InvalidTime(String),

    #[error("invalid size keyword: {0}")]
    InvalidSize(String),
}

/// a single `name:keyword` pair of a search expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCondition {
    pub name: String,
    pub keyword: String,
}

impl SearchCondition {
    pub fn new<N, K>(name: N, keyword: K) -> Self
    where
        N: Into<String>,
        K: Into<String>,
    {
        SearchCondition {
            name: name.into(),
            keyword: keyword.into(),
        }
    }
}

/// splits a search expression into its conditions. tokens are separated by
/// spaces and split at the first `:`
pub fn parse(expression: &str) -> Result<Vec<SearchCondition>, ParseError> {
    let mut rtn = Vec::new();

    for token in expression.trim().split(' ') {
        let token = token.trim();

        if token.is_empty() {
            continue;
        }

        rtn.push(parse_condition(token)?);
    }

    Ok(rtn)
}

fn parse_condition(token: &str) -> Result<SearchCondition, ParseError> {
    let Some((name, keyword)) = token.split_once(':') else {
        return Err(ParseError::InvalidCondition(token.to_owned()));
    };

    if name.is_empty() {
        return Err(ParseError::EmptyName(token.to_owned()));
    }

    if keyword.is_empty() {
        return Err(ParseError::EmptyKeyword(token.to_owned()));
    }

    Ok(SearchCondition::new(name, keyword))
}

/// an inclusive range of instants, either side may be open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        if let Some(start) = &self.start {
            if time < start {
                return false;
            }
        }

        if let Some(end) = &self.end {
            if time > end {
                return false;
            }
        }

        true
    }
}

enum TimeValue {
    Instant(DateTime<Utc>),
    Day(DateTime<Utc>),
}

impl TimeValue {
    fn start(&self) -> DateTime<Utc> {
        match self {
            TimeValue::Instant(time) |
            TimeValue::Day(time) => *time,
        }
    }

    fn end(&self) -> DateTime<Utc> {
        match self {
            TimeValue::Instant(time) => *time,
            TimeValue::Day(time) => *time + Duration::days(1) - Duration::milliseconds(1),
        }
    }
}

fn parse_time_value(value: &str, keyword: &str) -> Result<TimeValue, ParseError> {
    if let Ok(millis) = value.parse::<i64>() {
        return Utc.timestamp_millis_opt(millis)
            .single()
            .map(TimeValue::Instant)
            .ok_or_else(|| ParseError::InvalidTime(keyword.to_owned()));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ParseError::InvalidTime(keyword.to_owned()))?;
    let midnight = date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| ParseError::InvalidTime(keyword.to_owned()))?;

    Ok(TimeValue::Day(Utc.from_utc_datetime(&midnight)))
}

/// parses `START..END`, `START..`, `..END` or a single value. values are
/// epoch milliseconds or `YYYY-MM-DD` dates in UTC. a single millisecond
/// value is a lower bound, a single date covers the whole day
pub fn parse_time_range(keyword: &str) -> Result<TimeRange, ParseError> {
    if let Some((start, end)) = keyword.split_once("..") {
        if start.is_empty() && end.is_empty() {
            return Err(ParseError::InvalidTime(keyword.to_owned()));
        }

        let start = if start.is_empty() {
            None
        } else {
            Some(parse_time_value(start, keyword)?.start())
        };

        let end = if end.is_empty() {
            None
        } else {
            Some(parse_time_value(end, keyword)?.end())
        };

        if let (Some(s), Some(e)) = (&start, &end) {
            if s > e {
                return Err(ParseError::InvalidTime(keyword.to_owned()));
            }
        }

        return Ok(TimeRange { start, end });
    }

    match parse_time_value(keyword, keyword)? {
        TimeValue::Instant(time) => Ok(TimeRange {
            start: Some(time),
            end: None,
        }),
        day => Ok(TimeRange {
            start: Some(day.start()),
            end: Some(day.end()),
        })
    }
}

/// a byte size comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeFilter {
    Eq(u64),
    Gt(u64),
    Ge(u64),
    Lt(u64),
    Le(u64),
}

impl SizeFilter {
    pub fn matches(&self, size: u64) -> bool {
        match self {
            SizeFilter::Eq(v) => size == *v,
            SizeFilter::Gt(v) => size > *v,
            SizeFilter::Ge(v) => size >= *v,
            SizeFilter::Lt(v) => size < *v,
            SizeFilter::Le(v) => size <= *v,
        }
    }

    pub fn value(&self) -> u64 {
        match self {
            SizeFilter::Eq(v) |
            SizeFilter::Gt(v) |
            SizeFilter::Ge(v) |
            SizeFilter::Lt(v) |
            SizeFilter::Le(v) => *v,
        }
    }

    /// the comparison operator as written in sql
    pub fn operator(&self) -> &'static str {
        match self {
            SizeFilter::Eq(_) => "=",
            SizeFilter::Gt(_) => ">",
            SizeFilter::Ge(_) => ">=",
            SizeFilter::Lt(_) => "<",
            SizeFilter::Le(_) => "<=",
        }
    }
}

pub fn parse_size(keyword: &str) -> Result<SizeFilter, ParseError> {
    let (ctor, number): (fn(u64) -> SizeFilter, &str) =
        if let Some(rest) = keyword.strip_prefix(">=") {
            (SizeFilter::Ge, rest)
        } else if let Some(rest) = keyword.strip_prefix("<=") {
            (SizeFilter::Le, rest)
        } else if let Some(rest) = keyword.strip_prefix('>') {
            (SizeFilter::Gt, rest)
        } else if let Some(rest) = keyword.strip_prefix('<') {
            (SizeFilter::Lt, rest)
        } else {
            (SizeFilter::Eq, keyword)
        };

    number.parse::<u64>()
        .map(ctor)
        .map_err(|_| ParseError::InvalidSize(keyword.to_owned()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_expression() {
        let result = parse("name:foo time:123").unwrap();

        assert_eq!(result, vec![
            SearchCondition::new("name", "foo"),
            SearchCondition::new("time", "123"),
        ]);
    }

    #[test]
    fn parse_skips_extra_spaces() {
        let result = parse("  name:foo    type:image ").unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[1], SearchCondition::new("type", "image"));
    }

    #[test]
    fn parse_splits_at_first_colon() {
        let result = parse("name:a:b").unwrap();

        assert_eq!(result, vec![SearchCondition::new("name", "a:b")]);
    }

    #[test]
    fn parse_empty() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("   ").unwrap().is_empty());
    }

    #[test]
    fn parse_invalid() {
        assert_eq!(
            parse("badtoken"),
            Err(ParseError::InvalidCondition("badtoken".into()))
        );
        assert_eq!(
            parse("name:foo :bar"),
            Err(ParseError::EmptyName(":bar".into()))
        );
        assert_eq!(
            parse("name:"),
            Err(ParseError::EmptyKeyword("name:".into()))
        );
    }

    #[test]
    fn time_single_millis_is_lower_bound() {
        let range = parse_time_range("1000").unwrap();

        assert_eq!(range.start, Utc.timestamp_millis_opt(1000).single());
        assert_eq!(range.end, None);
    }

    #[test]
    fn time_single_date_covers_day() {
        let range = parse_time_range("2023-05-01").unwrap();
        let inside = Utc.with_ymd_and_hms(2023, 5, 1, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2023, 5, 2, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2023, 4, 30, 23, 59, 59).unwrap();

        assert!(range.contains(&inside));
        assert!(!range.contains(&after));
        assert!(!range.contains(&before));
    }

    #[test]
    fn time_ranges() {
        let range = parse_time_range("2023-01-01..2023-01-31").unwrap();

        assert!(range.contains(&Utc.with_ymd_and_hms(2023, 1, 31, 12, 0, 0).unwrap()));
        assert!(!range.contains(&Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap()));

        let open_end = parse_time_range("100..").unwrap();

        assert!(open_end.end.is_none());

        let open_start = parse_time_range("..100").unwrap();

        assert!(open_start.start.is_none());
        assert_eq!(open_start.end, Utc.timestamp_millis_opt(100).single());
    }

    #[test]
    fn time_invalid() {
        let invalid = ["..", "yesterday", "2023-13-01", "200..100", "1..x"];

        for test in invalid {
            assert!(parse_time_range(test).is_err(), "invalid keyword passed {:?}", test);
        }
    }

    #[test]
    fn size_filters() {
        assert_eq!(parse_size("10").unwrap(), SizeFilter::Eq(10));
        assert_eq!(parse_size(">10").unwrap(), SizeFilter::Gt(10));
        assert_eq!(parse_size(">=10").unwrap(), SizeFilter::Ge(10));
        assert_eq!(parse_size("<10").unwrap(), SizeFilter::Lt(10));
        assert_eq!(parse_size("<=10").unwrap(), SizeFilter::Le(10));

        assert!(SizeFilter::Ge(10).matches(10));
        assert!(!SizeFilter::Gt(10).matches(10));

        assert!(parse_size("big").is_err());
        assert!(parse_size(">-1").is_err());
    }
}

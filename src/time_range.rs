use time::OffsetDateTime;

use crate::error::ApiError;

/// A `[from, to)` interval. `from == to` denotes the single instant `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: OffsetDateTime,
    pub to: OffsetDateTime,
}

impl TimeRange {
    /// Parse a range from Unix seconds as sent in the `fromDateTime` / `toDateTime`
    /// query parameters.
    pub fn from_unix(from: Option<i64>, to: Option<i64>) -> Result<Self, ApiError> {
        Self::parse(from, to, Origin::Query)
    }

    /// Parse a booking interval from a request body. Zero-width ranges are rejected.
    pub fn from_body(from: Option<i64>, to: Option<i64>) -> Result<Self, ApiError> {
        let range = Self::parse(from, to, Origin::Body)?;
        if range.is_instant() {
            return Err(ApiError::bad_request(
                "invalid_parameter_error",
                "Invalid value for toDateTime: must be after fromDateTime",
            ));
        }
        Ok(range)
    }

    /// Both bounds or neither.
    pub fn optional_from_unix(
        from: Option<i64>,
        to: Option<i64>,
    ) -> Result<Option<Self>, ApiError> {
        match (from, to) {
            (None, None) => Ok(None),
            (from, to) => Self::from_unix(from, to).map(Some),
        }
    }

    fn parse(from: Option<i64>, to: Option<i64>, origin: Origin) -> Result<Self, ApiError> {
        let from = parse_bound(from, "fromDateTime", origin)?;
        let to = parse_bound(to, "toDateTime", origin)?;
        if to < from {
            return Err(ApiError::bad_request(
                "invalid_parameter_error",
                format!(
                    "{}: must not be before fromDateTime",
                    origin.invalid("toDateTime")
                ),
            ));
        }
        Ok(Self { from, to })
    }

    pub fn is_instant(&self) -> bool {
        self.from == self.to
    }

    /// Whether the booked interval `[start, end)` intersects this range.
    /// Mirrors the SQL predicate used by the repositories.
    pub fn overlaps(&self, start: OffsetDateTime, end: OffsetDateTime) -> bool {
        (start <= self.from && end > self.from) || (start > self.from && start < self.to)
    }

    /// Whole hours covered by the range, rounded up.
    pub fn billable_hours(&self) -> i64 {
        let secs = (self.to - self.from).whole_seconds();
        (secs + 3599) / 3600
    }
}

/// Where the bounds were read from; only changes the error wording.
#[derive(Debug, Clone, Copy)]
enum Origin {
    Query,
    Body,
}

impl Origin {
    fn invalid(self, name: &str) -> String {
        match self {
            Origin::Query => format!("Invalid value in query parameter {name}"),
            Origin::Body => format!("Invalid value for {name}"),
        }
    }
}

fn parse_bound(
    value: Option<i64>,
    name: &str,
    origin: Origin,
) -> Result<OffsetDateTime, ApiError> {
    let invalid = || ApiError::bad_request("invalid_parameter_error", origin.invalid(name));
    match value {
        Some(secs) if secs > 0 => OffsetDateTime::from_unix_timestamp(secs).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn at(secs: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(secs).unwrap()
    }

    #[test]
    fn accepts_ordered_and_equal_bounds() {
        let r = TimeRange::from_unix(Some(100), Some(200)).unwrap();
        assert_eq!(r.from, at(100));
        assert_eq!(r.to, at(200));

        let r = TimeRange::from_unix(Some(100), Some(100)).unwrap();
        assert!(r.is_instant());
    }

    #[test]
    fn rejects_reversed_missing_and_non_positive_bounds() {
        for (from, to) in [
            (Some(200), Some(100)),
            (None, Some(100)),
            (Some(100), None),
            (Some(0), Some(100)),
            (Some(-5), Some(100)),
            (Some(100), Some(i64::MAX)),
        ] {
            let err = TimeRange::from_unix(from, to).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.code, "invalid_parameter_error");
        }
    }

    #[test]
    fn body_range_rejects_zero_width() {
        assert!(TimeRange::from_body(Some(100), Some(100)).is_err());
        assert!(TimeRange::from_body(Some(100), Some(101)).is_ok());
    }

    #[test]
    fn error_wording_follows_where_bounds_came_from() {
        let err = TimeRange::from_unix(None, Some(100)).unwrap_err();
        assert_eq!(err.description, "Invalid value in query parameter fromDateTime");

        let err = TimeRange::from_body(None, Some(100)).unwrap_err();
        assert_eq!(err.description, "Invalid value for fromDateTime");

        let err = TimeRange::from_body(Some(200), Some(100)).unwrap_err();
        assert_eq!(
            err.description,
            "Invalid value for toDateTime: must not be before fromDateTime"
        );
    }

    #[test]
    fn optional_range_needs_both_bounds() {
        assert_eq!(TimeRange::optional_from_unix(None, None).unwrap(), None);
        assert!(TimeRange::optional_from_unix(Some(10), None).is_err());
        assert!(TimeRange::optional_from_unix(Some(10), Some(20)).unwrap().is_some());
    }

    #[test]
    fn overlap_is_half_open() {
        let r = TimeRange::from_unix(Some(100), Some(200)).unwrap();
        assert!(r.overlaps(at(50), at(150)));
        assert!(r.overlaps(at(150), at(250)));
        assert!(r.overlaps(at(120), at(180)));
        assert!(r.overlaps(at(50), at(250)));
        // touching ends do not overlap
        assert!(!r.overlaps(at(50), at(100)));
        assert!(!r.overlaps(at(200), at(300)));
    }

    #[test]
    fn instant_overlaps_containing_booking() {
        let r = TimeRange::from_unix(Some(100), Some(100)).unwrap();
        assert!(r.overlaps(at(100), at(150)));
        assert!(r.overlaps(at(50), at(150)));
        assert!(!r.overlaps(at(50), at(100)));
        assert!(!r.overlaps(at(101), at(150)));
    }

    #[test]
    fn hours_round_up() {
        assert_eq!(TimeRange::from_unix(Some(100), Some(100)).unwrap().billable_hours(), 0);
        assert_eq!(TimeRange::from_unix(Some(100), Some(101)).unwrap().billable_hours(), 1);
        assert_eq!(TimeRange::from_unix(Some(100), Some(3700)).unwrap().billable_hours(), 1);
        assert_eq!(TimeRange::from_unix(Some(100), Some(3701)).unwrap().billable_hours(), 2);
    }
}

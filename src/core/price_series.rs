use crate::core::error::VarError;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// One observed closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Closing prices of a single instrument, ascending by date.
///
/// The last element is the most recent observation. Every close is
/// strictly positive and finite, and dates strictly increase; both are
/// checked on construction, including when deserializing.
///
/// # Examples
///
/// ```
/// use var_engine::core::price_series::PriceSeries;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let series = PriceSeries::from_closes(start, &[100.0, 102.0, 98.0]).unwrap();
/// assert_eq!(series.len(), 3);
/// assert_eq!(series.last_price(), Some(98.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from validated points.
    pub fn from_points(points: Vec<PricePoint>) -> Result<Self, VarError> {
        let mut series = Self::with_capacity(points.len());
        for point in points {
            series.push(point)?;
        }
        Ok(series)
    }

    /// Build a series of consecutive calendar days starting at `start`.
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Result<Self, VarError> {
        let mut series = Self::with_capacity(closes.len());
        for (offset, &close) in closes.iter().enumerate() {
            let date = start
                .checked_add_days(Days::new(offset as u64))
                .ok_or_else(|| VarError::invalid("date", "date range overflows the calendar"))?;
            series.push(PricePoint::new(date, close))?;
        }
        Ok(series)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Append an observation. It must be newer than the current last one.
    pub fn push(&mut self, point: PricePoint) -> Result<(), VarError> {
        if !point.close.is_finite() || point.close <= 0.0 {
            return Err(VarError::invalid(
                "close",
                format!("price must be positive and finite, got {} on {}", point.close, point.date),
            ));
        }
        if let Some(last) = self.points.last() {
            if point.date <= last.date {
                return Err(VarError::invalid(
                    "date",
                    format!("{} is not after previous observation {}", point.date, last.date),
                ));
            }
        }
        self.points.push(point);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Closing prices in date order.
    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.close)
    }

    /// Most recent closing price.
    pub fn last_price(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }
}

impl TryFrom<Vec<PricePoint>> for PriceSeries {
    type Error = VarError;

    fn try_from(points: Vec<PricePoint>) -> Result<Self, Self::Error> {
        Self::from_points(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_from_closes_assigns_consecutive_dates() {
        let series = PriceSeries::from_closes(day(1), &[10.0, 11.0, 12.0]).unwrap();
        let dates: Vec<_> = series.points().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
        assert_eq!(series.closes().collect::<Vec<_>>(), vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_rejects_non_positive_price() {
        assert!(PriceSeries::from_closes(day(1), &[10.0, 0.0]).is_err());
        assert!(PriceSeries::from_closes(day(1), &[-1.0]).is_err());
        assert!(PriceSeries::from_closes(day(1), &[f64::NAN]).is_err());
    }

    #[test]
    fn test_rejects_out_of_order_dates() {
        let mut series = PriceSeries::new();
        series.push(PricePoint::new(day(5), 10.0)).unwrap();
        let err = series.push(PricePoint::new(day(5), 11.0)).unwrap_err();
        assert!(matches!(err, VarError::InvalidParameter { name: "date", .. }));
        assert!(series.push(PricePoint::new(day(4), 11.0)).is_err());
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_empty_series() {
        let series = PriceSeries::new();
        assert!(series.is_empty());
        assert_eq!(series.last_price(), None);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok = r#"[{"date":"2024-03-01","close":10.0},{"date":"2024-03-02","close":10.5}]"#;
        let series: PriceSeries = serde_json::from_str(ok).unwrap();
        assert_eq!(series.len(), 2);

        let bad = r#"[{"date":"2024-03-01","close":10.0},{"date":"2024-03-02","close":-3.0}]"#;
        assert!(serde_json::from_str::<PriceSeries>(bad).is_err());
    }
}

use crate::context::PipelineContext;
use crate::ols::Features;
use chrono::NaiveDate;
use fnb_core::sales::SalesRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// What a forecast key identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Product,
    Group,
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(Granularity::Product),
            "group" | "product_group" => Ok(Granularity::Group),
            other => Err(format!("unknown granularity '{}', expected product or group", other)),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Product => write!(f, "product"),
            Granularity::Group => write!(f, "group"),
        }
    }
}

/// A product within its group, or a whole product group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ForecastKey {
    pub product_group: String,
    pub product: Option<String>,
}

impl ForecastKey {
    pub fn for_record(record: &SalesRecord, granularity: Granularity) -> Self {
        ForecastKey {
            product_group: record.product_group.clone(),
            product: match granularity {
                Granularity::Product => Some(record.product.clone()),
                Granularity::Group => None,
            },
        }
    }
}

impl fmt::Display for ForecastKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.product {
            Some(product) => write!(f, "{} / {}", self.product_group, product),
            None => write!(f, "{}", self.product_group),
        }
    }
}

/// One historical day of one key, joined with that day's covariates.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub date: NaiveDate,
    pub features: Features,
    pub quantity: f64,
    pub revenue: f64,
}

/// Quantity and revenue of a key on one day, summed over locations.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DailyTotal {
    pub quantity: f64,
    pub revenue: f64,
}

pub type DailyTotals = BTreeMap<ForecastKey, BTreeMap<NaiveDate, DailyTotal>>;

/// Sum in-scope sales per key and date.
pub fn daily_totals<'a, I>(records: I, granularity: Granularity) -> DailyTotals
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut totals = DailyTotals::new();
    for record in records {
        let entry = totals
            .entry(ForecastKey::for_record(record, granularity))
            .or_default()
            .entry(record.date)
            .or_default();
        entry.quantity += record.quantity;
        entry.revenue += record.net_revenue;
    }
    totals
}

/// Training rows per key for a target date.
///
/// Every key with in-scope sales before the target date is present, even
/// when none of its days could be joined with a visitor count and weather,
/// so that the key can still be reported.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub rows: BTreeMap<ForecastKey, Vec<TrainingRow>>,
    /// Key-days dropped for lack of a visitor count or weather.
    pub dropped: usize,
}

impl TrainingSet {
    /// Join the sales strictly before `target` with the visitor and weather
    /// tables.
    pub fn build(
        ctx: &PipelineContext,
        target: NaiveDate,
        locations: &[String],
        granularity: Granularity,
    ) -> Self {
        let history = ctx.sales_in_scope(locations).filter(|r| r.date < target);
        let mut set = TrainingSet::default();
        for (key, days) in daily_totals(history, granularity) {
            let mut rows = Vec::with_capacity(days.len());
            for (date, total) in days {
                let visitors = ctx.visitors.get(&date).map(|v| v.training_visitors());
                let weather = ctx.weather.get(&date);
                match (visitors, weather) {
                    (Some(visitors), Some(weather)) if total.quantity.is_finite() => {
                        rows.push(TrainingRow {
                            date,
                            features: Features::new(
                                visitors,
                                weather.temperature,
                                weather.precipitation,
                            ),
                            quantity: total.quantity,
                            revenue: total.revenue,
                        })
                    }
                    _ => set.dropped += 1,
                }
            }
            set.rows.insert(key, rows);
        }
        if set.dropped > 0 {
            log::debug!(
                "training: dropped {} incomplete key-days before {}",
                set.dropped,
                target
            );
        }
        set
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fnb_core::visitor::{VisitorRecord, VisitorTable};
    use fnb_core::weather::{WeatherHistory, WeatherObservation};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn sale(d: u32, location: &str, group: &str, product: &str, quantity: f64) -> SalesRecord {
        SalesRecord {
            date: day(d),
            location: location.to_string(),
            product_group: group.to_string(),
            product: product.to_string(),
            quantity,
            net_revenue: quantity * 4.5,
        }
    }

    fn context() -> PipelineContext {
        let visitors = VisitorTable::from_records((1..=6).map(|d| VisitorRecord {
            date: day(d),
            budgeted: 500,
            actual: if d < 5 { Some(400 + d * 10) } else { None },
        }));
        // no weather for the 3rd
        let weather = WeatherHistory::from_observations(
            [1, 2, 4, 5, 6].into_iter().map(|d| WeatherObservation {
                date: day(d),
                temperature: 15.0 + d as f64,
                precipitation: 0.5,
            }),
        );
        let sales = vec![
            sale(1, "Entree", "Soepen", "Tomatensoep", 10.0),
            sale(1, "Oranjerie", "Soepen", "Tomatensoep", 5.0),
            sale(1, "Entree", "Soepen", "Erwtensoep", 3.0),
            sale(2, "Entree", "Soepen", "Tomatensoep", 12.0),
            sale(3, "Entree", "Soepen", "Tomatensoep", 9.0),
            sale(4, "Entree", "Soepen", "Tomatensoep", 11.0),
            sale(5, "Entree", "Soepen", "Tomatensoep", 20.0),
            sale(6, "Entree", "Soepen", "Tomatensoep", 30.0),
            sale(2, "Entree", "Salades", "Caesar", 2.0),
        ];
        PipelineContext::new(visitors, weather, sales)
    }

    fn key(group: &str, product: Option<&str>) -> ForecastKey {
        ForecastKey {
            product_group: group.to_string(),
            product: product.map(str::to_string),
        }
    }

    #[test]
    fn rows_are_strictly_before_target() {
        let set = TrainingSet::build(&context(), day(5), &[], Granularity::Product);
        for rows in set.rows.values() {
            assert!(rows.iter().all(|r| r.date < day(5)));
        }
        let tomato = &set.rows[&key("Soepen", Some("Tomatensoep"))];
        assert_eq!(tomato.iter().map(|r| r.date).collect::<Vec<_>>(), vec![day(1), day(2), day(4)]);
        assert_eq!(set.dropped, 1);
    }

    #[test]
    fn locations_are_summed_per_day() {
        let set = TrainingSet::build(&context(), day(5), &[], Granularity::Product);
        let tomato = &set.rows[&key("Soepen", Some("Tomatensoep"))];
        assert_eq!(tomato[0].quantity, 15.0);
        assert_eq!(tomato[0].features.visitors, 410.0);
        assert_eq!(tomato[0].features.temperature, 16.0);
    }

    #[test]
    fn location_scope_is_respected() {
        let scope = vec!["Entree".to_string()];
        let set = TrainingSet::build(&context(), day(5), &scope, Granularity::Product);
        let tomato = &set.rows[&key("Soepen", Some("Tomatensoep"))];
        assert_eq!(tomato[0].quantity, 10.0);
    }

    #[test]
    fn group_granularity_sums_products() {
        let set = TrainingSet::build(&context(), day(5), &[], Granularity::Group);
        let soups = &set.rows[&key("Soepen", None)];
        assert_eq!(soups[0].quantity, 18.0);
        assert_eq!(set.rows.len(), 2);
    }

    #[test]
    fn history_visitors_fall_back_to_budget() {
        let set = TrainingSet::build(&context(), day(7), &[], Granularity::Product);
        let tomato = &set.rows[&key("Soepen", Some("Tomatensoep"))];
        let last = tomato.last().unwrap();
        assert_eq!(last.date, day(6));
        assert_eq!(last.features.visitors, 500.0);
    }

    #[test]
    fn granularity_parses() {
        assert_eq!("Product".parse::<Granularity>(), Ok(Granularity::Product));
        assert_eq!("group".parse::<Granularity>(), Ok(Granularity::Group));
        assert!("location".parse::<Granularity>().is_err());
        assert_eq!(key("Soepen", Some("Tomatensoep")).to_string(), "Soepen / Tomatensoep");
    }
}

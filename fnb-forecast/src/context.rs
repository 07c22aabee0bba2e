use chrono::NaiveDate;
use fnb_core::sales::SalesRecord;
use fnb_core::visitor::VisitorTable;
use fnb_core::weather::WeatherHistory;

/// The loaded tables one request works on.
///
/// Built once per command and shared by every date it forecasts; nothing
/// is read from outside it.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub visitors: VisitorTable,
    pub weather: WeatherHistory,
    pub sales: Vec<SalesRecord>,
}

impl PipelineContext {
    pub fn new(visitors: VisitorTable, weather: WeatherHistory, sales: Vec<SalesRecord>) -> Self {
        Self {
            visitors,
            weather,
            sales,
        }
    }

    /// Sales records whose location is in `locations`. An empty scope
    /// means every location.
    pub fn sales_in_scope<'a>(
        &'a self,
        locations: &'a [String],
    ) -> impl Iterator<Item = &'a SalesRecord> + 'a {
        self.sales
            .iter()
            .filter(move |r| locations.is_empty() || locations.iter().any(|l| *l == r.location))
    }

    /// Whether any in-scope sales were recorded on `date`.
    pub fn has_sales_on(&self, date: NaiveDate, locations: &[String]) -> bool {
        self.sales_in_scope(locations).any(|r| r.date == date)
    }
}

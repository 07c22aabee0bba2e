use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Units sold and net revenue for one product at one location on one day.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub location: String,
    pub product_group: String,
    pub product: String,
    pub quantity: f64,
    pub net_revenue: f64,
}

impl SalesRecord {
    /// Sum point-of-sale lines into one record per
    /// (date, location, product_group, product). Output is ordered by that
    /// tuple.
    pub fn aggregate<I: IntoIterator<Item = SalesRecord>>(lines: I) -> Vec<SalesRecord> {
        let mut sums: BTreeMap<(NaiveDate, String, String, String), (f64, f64)> = BTreeMap::new();
        for line in lines {
            let entry = sums
                .entry((line.date, line.location, line.product_group, line.product))
                .or_insert((0.0, 0.0));
            entry.0 += line.quantity;
            entry.1 += line.net_revenue;
        }
        sums.into_iter()
            .map(
                |((date, location, product_group, product), (quantity, net_revenue))| SalesRecord {
                    date,
                    location,
                    product_group,
                    product,
                    quantity,
                    net_revenue,
                },
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::SalesRecord;
    use chrono::NaiveDate;

    fn line(location: &str, product: &str, quantity: f64, revenue: f64) -> SalesRecord {
        SalesRecord {
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            location: location.to_string(),
            product_group: "Soepen".to_string(),
            product: product.to_string(),
            quantity,
            net_revenue: revenue,
        }
    }

    #[test]
    fn aggregate_sums_duplicate_lines() {
        let aggregated = SalesRecord::aggregate(vec![
            line("Entree", "Tomatensoep", 3.0, 13.5),
            line("Entree", "Tomatensoep", 2.0, 9.0),
            line("Oranjerie", "Tomatensoep", 1.0, 4.5),
            line("Entree", "Erwtensoep", 4.0, 20.0),
        ]);
        assert_eq!(aggregated.len(), 3);
        let entree_tomato = aggregated
            .iter()
            .find(|r| r.location == "Entree" && r.product == "Tomatensoep")
            .unwrap();
        assert_eq!(entree_tomato.quantity, 5.0);
        assert!((entree_tomato.net_revenue - 22.5).abs() < 1e-9);
    }

    #[test]
    fn aggregate_empty() {
        assert!(SalesRecord::aggregate(Vec::new()).is_empty());
    }
}
